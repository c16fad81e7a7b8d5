//! Storage error types.

use edgeload_domain::model::EntityId;
use thiserror::Error;

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Row not found.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: EntityId },

    /// Unique column already taken.
    #[error("duplicate {kind}: {field} '{value}' already exists")]
    Duplicate {
        kind: &'static str,
        field: &'static str,
        value: String,
    },

    /// Referenced row does not exist.
    #[error("{kind} references missing {target}: {id}")]
    ForeignKeyViolation {
        kind: &'static str,
        target: &'static str,
        id: EntityId,
    },

    /// Invalid input error.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Backend unavailable or query failed.
    #[error("database query error: {message}")]
    QueryError { message: String },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_row() {
        let err = StorageError::NotFound { kind: "post", id: 7 };
        assert_eq!(err.to_string(), "post not found: 7");

        let err = StorageError::Duplicate {
            kind: "user",
            field: "email",
            value: "a@example.com".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate user: email 'a@example.com' already exists"
        );
    }
}
