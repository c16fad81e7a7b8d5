//! Domain error types for relation loading and resolution.

use thiserror::Error;

/// Domain-specific errors for relation loading and field resolution.
///
/// Errors are `Clone` because a single failed batch fetch is reported to
/// every resolution joined on that batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The backing store failed while serving a fetch.
    #[error("storage error: {message}")]
    Storage { message: String },

    /// A batch fetch did not complete within the configured timeout.
    #[error("fetch timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The request carries no authenticated caller identity.
    #[error("unauthorized")]
    Unauthorized,

    /// A mutation targeted an entity that does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },

    /// A mutation was called with invalid arguments.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
