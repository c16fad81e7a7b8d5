//! Relation loader: batched traversal of to-one and to-many edges.
//!
//! Every edge traversal of a request goes through [`RelationLoader`]. For a
//! given parent it computes the set of ids the relation still needs,
//! widens that set with the parent's siblings already in the cache, and
//! issues at most one fetch per distinct [`BatchKey`]. Results are merged
//! into the request's [`EntityCache`](crate::cache::EntityCache) and the
//! slice relevant to the parent is read back from there.
//!
//! # Strategies
//!
//! - **belongs-to** ([`RelationLoader::belongs_to`]): the foreign key lives on
//!   the parent. The batch dimension is target ids.
//! - **has-many** ([`RelationLoader::has_many`]): the foreign key lives on the
//!   children. The batch dimension is parent ids; fetched children are
//!   grouped back by their foreign key.
//!
//! With negative caching on, both are idempotent once the batch has
//! settled: resolving the same parent again reads from the cache without
//! issuing another fetch. With it off, missing targets and childless
//! parents are fetched again on every access.
//!
//! # Widening
//!
//! Batching across every sibling already cached is best-effort. A parent
//! that is not yet in the cache when a sibling resolves is not part of that
//! batch and triggers its own, smaller fetch later.

mod config;

#[cfg(test)]
mod tests;

pub use config::LoaderConfig;

use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::sync::Arc;

use tokio::time::timeout;
use tracing::{debug, instrument};

use crate::context::RequestContext;
use crate::error::{DomainError, DomainResult};
use crate::inflight::{BatchKey, JoinOutcome};
use crate::model::{BelongsTo, Entity, EntityId, HasMany};

/// Batched edge traversal bound to one request context.
#[derive(Debug, Clone, Copy)]
pub struct RelationLoader<'a> {
    ctx: &'a RequestContext,
}

impl<'a> RelationLoader<'a> {
    pub fn new(ctx: &'a RequestContext) -> Self {
        Self { ctx }
    }

    /// Resolves a to-one edge for `parent`.
    ///
    /// `fetch` receives the sorted ids missing from the target cache and
    /// must return the rows that exist; it is invoked at most once per
    /// distinct batch and not at all when the cache already covers the
    /// batch.
    ///
    /// Returns `Ok(None)` when the foreign key is null or points at a row
    /// that does not exist.
    #[instrument(
        level = "debug",
        skip_all,
        fields(relation = %relation.id(), parent = parent.id())
    )]
    pub async fn belongs_to<S, T, F, Fut>(
        &self,
        parent: &S,
        relation: &BelongsTo<S, T>,
        fetch: F,
    ) -> DomainResult<Option<Arc<T>>>
    where
        S: Entity,
        T: Entity,
        F: FnOnce(Vec<EntityId>) -> Fut,
        Fut: Future<Output = DomainResult<Vec<T>>>,
    {
        let cache = self.ctx.cache();
        let config = self.ctx.config();

        let Some(wanted) = relation.foreign_key_of(parent) else {
            return Ok(None);
        };

        let mut candidates = BTreeSet::from([wanted]);
        if config.widen_batches {
            candidates.extend(
                cache
                    .get_all::<S>()
                    .iter()
                    .filter_map(|sibling| relation.foreign_key_of(sibling)),
            );
        }

        let missing: Vec<EntityId> = candidates
            .into_iter()
            .filter(|id| {
                !cache.contains::<T>(*id) && !(config.negative_caching && cache.is_absent::<T>(*id))
            })
            .collect();

        if missing.is_empty() {
            self.record_hit();
        } else {
            let key = BatchKey::new(relation.id(), missing.iter().copied());
            let negative_caching = config.negative_caching;
            self.run_batch(key, || async move {
                let fetched = self.fetch_with_timeout(fetch(missing.clone())).await?;
                let returned: HashSet<EntityId> = fetched.iter().map(Entity::id).collect();
                self.ctx.stats().record_fetched(fetched.len());
                cache.merge(fetched);
                if negative_caching {
                    cache.mark_absent::<T>(missing.into_iter().filter(|id| !returned.contains(id)));
                }
                Ok(())
            })
            .await?;
        }

        Ok(cache.get::<T>(wanted))
    }

    /// Resolves a to-many edge for `parent`.
    ///
    /// `fetch` receives the sorted parent ids whose children are not yet
    /// cached and must return every child referencing any of them.
    ///
    /// With negative caching enabled a parent counts as loaded once a batch
    /// containing it has settled, so children cached through other edges
    /// never stand in for the full set. Without it, a parent with any cached
    /// child counts as loaded and a parent with no children is fetched
    /// again on every access.
    ///
    /// Returns the cached children of `parent`, sorted by id.
    #[instrument(
        level = "debug",
        skip_all,
        fields(relation = %relation.id(), parent = parent.id())
    )]
    pub async fn has_many<S, T, F, Fut>(
        &self,
        parent: &S,
        relation: &HasMany<S, T>,
        fetch: F,
    ) -> DomainResult<Vec<Arc<T>>>
    where
        S: Entity,
        T: Entity,
        F: FnOnce(Vec<EntityId>) -> Fut,
        Fut: Future<Output = DomainResult<Vec<T>>>,
    {
        let cache = self.ctx.cache();
        let config = self.ctx.config();
        let relation_id = relation.id();
        let parent_id = parent.id();

        let mut candidates = BTreeSet::from([parent_id]);
        if config.widen_batches {
            candidates.extend(cache.ids::<S>());
        }

        // With markers, only a completed batch counts as loaded. Without them,
        // any cached child referencing the parent does.
        let missing: Vec<EntityId> = if config.negative_caching {
            candidates
                .into_iter()
                .filter(|id| !cache.children_loaded(relation_id, *id))
                .collect()
        } else {
            let referenced: HashSet<EntityId> = cache
                .get_all::<T>()
                .iter()
                .filter_map(|child| relation.foreign_key_of(child))
                .collect();
            candidates
                .into_iter()
                .filter(|id| !referenced.contains(id))
                .collect()
        };

        if missing.is_empty() {
            self.record_hit();
        } else {
            let key = BatchKey::new(relation_id, missing.iter().copied());
            let negative_caching = config.negative_caching;
            self.run_batch(key, || async move {
                let fetched = self.fetch_with_timeout(fetch(missing.clone())).await?;
                self.ctx.stats().record_fetched(fetched.len());
                cache.merge(fetched);
                if negative_caching {
                    cache.mark_children_loaded(relation_id, missing);
                }
                Ok(())
            })
            .await?;
        }

        Ok(cache.filter::<T>(|child| relation.foreign_key_of(child) == Some(parent_id)))
    }

    async fn run_batch<F, Fut>(&self, key: BatchKey, start: F) -> DomainResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DomainResult<()>>,
    {
        metrics::counter!("edgeload_cache_misses_total").increment(1);
        debug!(batch = %key, "batch required");

        match self.ctx.in_flight().join_or_start(key, start).await? {
            JoinOutcome::Started => {
                metrics::counter!("edgeload_batch_fetches_total").increment(1);
                self.ctx.stats().record_fetch();
            }
            JoinOutcome::Joined => {
                metrics::counter!("edgeload_inflight_joins_total").increment(1);
                self.ctx.stats().record_join();
            }
        }
        Ok(())
    }

    async fn fetch_with_timeout<T, Fut>(&self, fetch: Fut) -> DomainResult<Vec<T>>
    where
        Fut: Future<Output = DomainResult<Vec<T>>>,
    {
        let limit = self.ctx.config().fetch_timeout;
        match timeout(limit, fetch).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::Timeout {
                duration_ms: limit.as_millis() as u64,
            }),
        }
    }

    fn record_hit(&self) {
        metrics::counter!("edgeload_cache_hits_total").increment(1);
        self.ctx.stats().record_hit();
    }
}

/// Registers relation loader metric descriptions.
///
/// Call once during application startup. Optional, but gives the counters
/// readable descriptions in the metrics backend.
///
/// # Metrics Registered
///
/// - `edgeload_cache_hits_total` - Traversals fully served from the request cache
/// - `edgeload_cache_misses_total` - Traversals that needed a batch
/// - `edgeload_batch_fetches_total` - Batch fetches actually executed
/// - `edgeload_inflight_joins_total` - Traversals that joined another caller's batch
pub fn register_loader_metrics() {
    metrics::describe_counter!(
        "edgeload_cache_hits_total",
        "Total number of relation traversals served from the request cache"
    );
    metrics::describe_counter!(
        "edgeload_cache_misses_total",
        "Total number of relation traversals that required a batch"
    );
    metrics::describe_counter!(
        "edgeload_batch_fetches_total",
        "Total number of batch fetches executed against the store"
    );
    metrics::describe_counter!(
        "edgeload_inflight_joins_total",
        "Total number of traversals that joined an in-flight batch"
    );
}
