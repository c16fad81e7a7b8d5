//! Deterministic batch keys.

use std::fmt;

use crate::model::{EntityId, RelationId};

/// Identity of one batched fetch: the relation plus the sorted, deduplicated
/// set of ids that still require a fetch.
///
/// Equal inputs always produce equal keys regardless of the order in which
/// ids were collected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchKey {
    relation: RelationId,
    ids: Vec<EntityId>,
}

impl BatchKey {
    /// Creates a key, sorting and deduplicating `ids`.
    pub fn new(relation: RelationId, ids: impl IntoIterator<Item = EntityId>) -> Self {
        let mut ids: Vec<EntityId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self { relation, ids }
    }

    pub fn relation(&self) -> RelationId {
        self.relation
    }

    /// The residual ids, ascending.
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.relation)?;
        for (i, id) in self.ids.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", id)?;
        }
        write!(f, "]")
    }
}
