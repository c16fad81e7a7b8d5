//! The `Entity` trait implemented by every cacheable record.

use std::fmt::Debug;

/// Integer primary key shared by all entity types.
pub type EntityId = i64;

/// A typed record identified by an integer id.
///
/// Entities are immutable snapshots once handed to the cache; a new
/// snapshot for the same id replaces the old one instead of mutating it.
pub trait Entity: Debug + Clone + Send + Sync + 'static {
    /// Stable type tag used for logging and relation identity.
    const KIND: &'static str;

    /// Returns the primary key of this snapshot.
    fn id(&self) -> EntityId;
}
