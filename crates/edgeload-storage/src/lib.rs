//! edgeload-storage: Backing store abstraction
//!
//! This crate provides the storage layer the relation loader fetches from:
//! - DataStore trait with id-batch and foreign-key-batch lookups
//! - In-memory implementation with query counting for tests
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              edgeload-storage                │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs   - DataStore trait definition   │
//! │  memory.rs   - In-memory implementation     │
//! │  error.rs    - Storage error types          │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use memory::MemoryDataStore;
pub use traits::{DataStore, NewClient, NewImage, NewPost, NewUser, NewVideo, PostUpdate};
