//! Request-scoped entity cache.
//!
//! The cache maps each entity type to a table of id → snapshot. It is the
//! memoization substrate of the relation loader: every batch fetch lands
//! here, and every later traversal reads from here first.
//!
//! # Semantics
//!
//! - **Merge**: insert-or-overwrite by id (last write wins). Merging an
//!   identical snapshot twice leaves exactly one stored copy.
//! - **No deletion**: entries are never evicted or invalidated. The whole
//!   cache is dropped together with its `RequestContext`.
//! - **Negative entries**: ids confirmed missing from the store and parents
//!   whose to-many children were fetched are recorded separately, so that a
//!   legitimately empty result is not fetched again within the request.
//!
//! # Concurrency
//!
//! Buckets live in a `DashMap`, so concurrent resolutions of the same
//! request may share the cache without external locking. Guards are never
//! held across an `.await`.
//!
//! # Example
//!
//! ```rust
//! use edgeload_domain::cache::EntityCache;
//! use edgeload_domain::model::User;
//!
//! let cache = EntityCache::new();
//! cache.merge(vec![User {
//!     id: 9,
//!     email: "ada@example.com".to_string(),
//!     name: "Ada".to_string(),
//!     password_hash: String::new(),
//! }]);
//!
//! assert_eq!(cache.get::<User>(9).map(|u| u.name.clone()), Some("Ada".to_string()));
//! ```

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;

use crate::model::{Entity, EntityId, RelationId};

/// Snapshots and known-absent ids for a single entity type.
struct Bucket<E> {
    entries: HashMap<EntityId, Arc<E>>,
    absent: HashSet<EntityId>,
}

impl<E> Default for Bucket<E> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            absent: HashSet::new(),
        }
    }
}

/// Per-type mapping from id to entity snapshot, scoped to one request.
#[derive(Default)]
pub struct EntityCache {
    /// One `Bucket<E>` per entity type, keyed by `TypeId::of::<E>()`.
    buckets: DashMap<TypeId, Box<dyn Any + Send + Sync>>,
    /// Bucket labels for diagnostics.
    kinds: DashMap<TypeId, &'static str>,
    /// Parent ids whose to-many children have been fetched, per relation.
    children_loaded: DashMap<RelationId, HashSet<EntityId>>,
}

impl std::fmt::Debug for EntityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<&'static str> = self.kinds.iter().map(|k| *k.value()).collect();
        f.debug_struct("EntityCache")
            .field("kinds", &kinds)
            .field("relations_marked", &self.children_loaded.len())
            .finish()
    }
}

impl EntityCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn read<E: Entity, R>(&self, f: impl FnOnce(&Bucket<E>) -> R) -> Option<R> {
        let bucket = self.buckets.get(&TypeId::of::<E>())?;
        bucket.downcast_ref::<Bucket<E>>().map(f)
    }

    fn write<E: Entity, R>(&self, f: impl FnOnce(&mut Bucket<E>) -> R) -> R {
        let type_id = TypeId::of::<E>();
        self.kinds.entry(type_id).or_insert(E::KIND);
        let mut bucket = self
            .buckets
            .entry(type_id)
            .or_insert_with(|| Box::new(Bucket::<E>::default()));
        let bucket = bucket
            .downcast_mut::<Bucket<E>>()
            .expect("bucket stored under TypeId::of::<E>() is always Bucket<E>");
        f(bucket)
    }

    /// Returns the cached snapshot for `id`, if any.
    pub fn get<E: Entity>(&self, id: EntityId) -> Option<Arc<E>> {
        self.read::<E, _>(|bucket| bucket.entries.get(&id).cloned())
            .flatten()
    }

    /// Returns true if a snapshot for `id` is cached.
    pub fn contains<E: Entity>(&self, id: EntityId) -> bool {
        self.read::<E, _>(|bucket| bucket.entries.contains_key(&id))
            .unwrap_or(false)
    }

    /// Returns every cached snapshot of type `E`, sorted by id.
    pub fn get_all<E: Entity>(&self) -> Vec<Arc<E>> {
        let mut all = self
            .read::<E, _>(|bucket| bucket.entries.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        all.sort_by_key(|e| e.id());
        all
    }

    /// Returns the cached snapshots of type `E` matching `predicate`,
    /// sorted by id.
    pub fn filter<E: Entity>(&self, predicate: impl Fn(&E) -> bool) -> Vec<Arc<E>> {
        let mut matching = self
            .read::<E, _>(|bucket| {
                bucket
                    .entries
                    .values()
                    .filter(|e| predicate(e))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        matching.sort_by_key(|e| e.id());
        matching
    }

    /// Returns the ids of every cached snapshot of type `E`, sorted.
    pub fn ids<E: Entity>(&self) -> Vec<EntityId> {
        let mut ids = self
            .read::<E, _>(|bucket| bucket.entries.keys().copied().collect::<Vec<_>>())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// Number of cached snapshots of type `E`.
    pub fn len<E: Entity>(&self) -> usize {
        self.read::<E, _>(|bucket| bucket.entries.len())
            .unwrap_or(0)
    }

    /// Returns true if nothing of type `E` is cached.
    pub fn is_empty<E: Entity>(&self) -> bool {
        self.len::<E>() == 0
    }

    /// Inserts or overwrites snapshots by id.
    ///
    /// Merging an id previously marked absent clears the mark.
    pub fn merge<E: Entity>(&self, entities: impl IntoIterator<Item = E>) {
        self.write::<E, _>(|bucket| {
            for entity in entities {
                let id = entity.id();
                bucket.absent.remove(&id);
                bucket.entries.insert(id, Arc::new(entity));
            }
        });
    }

    /// Records ids confirmed missing from the store.
    ///
    /// Ids that already have a snapshot are left untouched.
    pub fn mark_absent<E: Entity>(&self, ids: impl IntoIterator<Item = EntityId>) {
        self.write::<E, _>(|bucket| {
            for id in ids {
                if !bucket.entries.contains_key(&id) {
                    bucket.absent.insert(id);
                }
            }
        });
    }

    /// Returns true if `id` was confirmed missing from the store.
    pub fn is_absent<E: Entity>(&self, id: EntityId) -> bool {
        self.read::<E, _>(|bucket| bucket.absent.contains(&id))
            .unwrap_or(false)
    }

    /// Records that the children of `parent_ids` along `relation` have been
    /// fetched, including parents that turned out to have none.
    pub fn mark_children_loaded(
        &self,
        relation: RelationId,
        parent_ids: impl IntoIterator<Item = EntityId>,
    ) {
        self.children_loaded
            .entry(relation)
            .or_default()
            .extend(parent_ids);
    }

    /// Returns true if the children of `parent_id` along `relation` have
    /// been fetched.
    pub fn children_loaded(&self, relation: RelationId, parent_id: EntityId) -> bool {
        self.children_loaded
            .get(&relation)
            .is_some_and(|ids| ids.contains(&parent_id))
    }
}
