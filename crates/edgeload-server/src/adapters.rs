//! Adapters that bridge the storage layer to the domain layer.
//!
//! The loader's fetch callbacks and the resolvers speak `DomainResult`;
//! `DataStore` speaks `StorageResult`. Every store call made on behalf of a
//! request goes through [`IntoDomainResult::into_domain`] so storage
//! failures reach the caller as domain errors instead of being unwrapped.

use edgeload_domain::error::{DomainError, DomainResult};
use edgeload_storage::{StorageError, StorageResult};

/// Maps a storage error to the domain taxonomy.
///
/// - `NotFound` keeps its kind and id.
/// - Constraint and validation failures become `InvalidInput`.
/// - Backend failures become `Storage`.
pub fn storage_to_domain(err: StorageError) -> DomainError {
    match err {
        StorageError::NotFound { kind, id } => DomainError::NotFound { kind, id },
        StorageError::Duplicate { .. }
        | StorageError::ForeignKeyViolation { .. }
        | StorageError::InvalidInput { .. } => DomainError::InvalidInput {
            message: err.to_string(),
        },
        StorageError::QueryError { .. } => DomainError::Storage {
            message: err.to_string(),
        },
    }
}

/// Conversion from `StorageResult` to `DomainResult`.
pub trait IntoDomainResult<T> {
    fn into_domain(self) -> DomainResult<T>;
}

impl<T> IntoDomainResult<T> for StorageResult<T> {
    fn into_domain(self) -> DomainResult<T> {
        self.map_err(storage_to_domain)
    }
}
