//! Entity and relation definitions.
//!
//! This module contains:
//! - The `Entity` trait and relation descriptors used by the loader
//! - Concrete records of the blog/media graph (users, posts, media)
//! - Static relation descriptors for every edge of that graph

mod entity;
mod relation;
mod relations;
mod types;

pub use entity::{Entity, EntityId};
pub use relation::{BelongsTo, Cardinality, HasMany, RelationId};
pub use relations::*;
pub use types::*;
