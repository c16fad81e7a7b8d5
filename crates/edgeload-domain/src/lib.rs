//! edgeload-domain: Request-scoped relation batching
//!
//! This crate contains the core of edgeload:
//! - Entity and relation descriptors for the blog/media graph
//! - The per-request entity cache
//! - The in-flight registry deduplicating concurrent batch fetches
//! - The relation loader (belongs-to / has-many strategies)
//! - The request context tying them together
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               edgeload-domain                │
//! ├─────────────────────────────────────────────┤
//! │  model/    - Entities & relation descriptors │
//! │  cache/    - Request-scoped entity cache     │
//! │  inflight/ - Batch-key deduplication         │
//! │  loader/   - Batched edge traversal          │
//! │  context   - Per-request ownership           │
//! └─────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod context;
pub mod error;
pub mod inflight;
pub mod loader;
pub mod model;

// Re-export commonly used types at the crate root
pub use cache::EntityCache;
pub use context::{LoaderStats, LoaderStatsSnapshot, RequestContext};
pub use error::{DomainError, DomainResult};
pub use inflight::{BatchKey, InFlightRegistry};
pub use loader::{register_loader_metrics, LoaderConfig, RelationLoader};
