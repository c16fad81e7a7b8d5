//! Typed relation descriptors.
//!
//! A descriptor pairs the static identity of an edge with a compile-time
//! accessor for its foreign key, so the loader never reads attributes by
//! name at runtime.

use std::fmt;
use std::marker::PhantomData;

use super::entity::{Entity, EntityId};

/// Static identity of an edge between two entity types.
///
/// Used as the relation half of a batch key and as the scope of
/// children-loaded markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationId {
    /// Entity type the traversal starts from.
    pub source: &'static str,
    /// Entity type the traversal produces.
    pub target: &'static str,
    /// Name of the foreign-key field.
    pub foreign_key: &'static str,
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}({})", self.source, self.target, self.foreign_key)
    }
}

/// Number of targets an edge yields per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    ToOne,
    ToMany,
}

/// To-one edge: the foreign key lives on the source `S` and points at `T`.
pub struct BelongsTo<S, T> {
    foreign_key: &'static str,
    extract: fn(&S) -> Option<EntityId>,
    _target: PhantomData<fn() -> T>,
}

impl<S, T> BelongsTo<S, T> {
    /// Creates a descriptor from the foreign-key name and its accessor.
    pub const fn new(foreign_key: &'static str, extract: fn(&S) -> Option<EntityId>) -> Self {
        Self {
            foreign_key,
            extract,
            _target: PhantomData,
        }
    }

    /// Reads the foreign key from a source snapshot.
    pub fn foreign_key_of(&self, source: &S) -> Option<EntityId> {
        (self.extract)(source)
    }

    pub const fn cardinality(&self) -> Cardinality {
        Cardinality::ToOne
    }
}

impl<S: Entity, T: Entity> BelongsTo<S, T> {
    pub fn id(&self) -> RelationId {
        RelationId {
            source: S::KIND,
            target: T::KIND,
            foreign_key: self.foreign_key,
        }
    }
}

impl<S, T> Clone for BelongsTo<S, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, T> Copy for BelongsTo<S, T> {}

impl<S: Entity, T: Entity> fmt::Debug for BelongsTo<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BelongsTo").field("id", &self.id()).finish()
    }
}

/// To-many edge: the foreign key lives on the target `T` and points back
/// at the source `S`.
pub struct HasMany<S, T> {
    foreign_key: &'static str,
    extract: fn(&T) -> Option<EntityId>,
    _source: PhantomData<fn() -> S>,
}

impl<S, T> HasMany<S, T> {
    /// Creates a descriptor from the foreign-key name and its accessor on
    /// the target type.
    pub const fn new(foreign_key: &'static str, extract: fn(&T) -> Option<EntityId>) -> Self {
        Self {
            foreign_key,
            extract,
            _source: PhantomData,
        }
    }

    /// Reads the back-reference from a target snapshot.
    pub fn foreign_key_of(&self, target: &T) -> Option<EntityId> {
        (self.extract)(target)
    }

    pub const fn cardinality(&self) -> Cardinality {
        Cardinality::ToMany
    }
}

impl<S: Entity, T: Entity> HasMany<S, T> {
    pub fn id(&self) -> RelationId {
        RelationId {
            source: S::KIND,
            target: T::KIND,
            foreign_key: self.foreign_key,
        }
    }
}

impl<S, T> Clone for HasMany<S, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, T> Copy for HasMany<S, T> {}

impl<S: Entity, T: Entity> fmt::Debug for HasMany<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HasMany").field("id", &self.id()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Post, User, POST_AUTHOR, USER_POSTS};

    #[test]
    fn test_relation_ids_distinguish_direction() {
        assert_ne!(POST_AUTHOR.id(), USER_POSTS.id());
        assert_eq!(POST_AUTHOR.id().source, Post::KIND);
        assert_eq!(POST_AUTHOR.id().target, User::KIND);
        assert_eq!(USER_POSTS.id().source, User::KIND);
        assert_eq!(USER_POSTS.id().target, Post::KIND);
    }

    #[test]
    fn test_cardinality_matches_descriptor_kind() {
        assert_eq!(POST_AUTHOR.cardinality(), Cardinality::ToOne);
        assert_eq!(USER_POSTS.cardinality(), Cardinality::ToMany);
    }

    #[test]
    fn test_relation_id_display() {
        assert_eq!(POST_AUTHOR.id().to_string(), "post->user(author_id)");
    }
}
