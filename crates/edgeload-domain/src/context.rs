//! Request-scoped context owning the entity cache and in-flight registry.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::cache::EntityCache;
use crate::error::{DomainError, DomainResult};
use crate::inflight::InFlightRegistry;
use crate::loader::{LoaderConfig, RelationLoader};
use crate::model::ClientIdentity;

/// State for resolving one inbound request.
///
/// Created by the transport layer when a request arrives and dropped when
/// it completes; never shared across requests. Dropping the context
/// discards every cached snapshot and in-flight entry it owns.
#[derive(Debug, Default)]
pub struct RequestContext {
    cache: EntityCache,
    in_flight: InFlightRegistry,
    identity: Option<ClientIdentity>,
    config: LoaderConfig,
    stats: LoaderStats,
}

impl RequestContext {
    /// Creates a context with the default loader configuration.
    pub fn new(identity: Option<ClientIdentity>) -> Self {
        Self::with_config(identity, LoaderConfig::default())
    }

    /// Creates a context for an unauthenticated caller.
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn with_config(identity: Option<ClientIdentity>, config: LoaderConfig) -> Self {
        Self {
            cache: EntityCache::new(),
            in_flight: InFlightRegistry::new(),
            identity,
            config,
            stats: LoaderStats::default(),
        }
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.in_flight
    }

    /// The pre-validated caller identity, if the request carried one.
    pub fn identity(&self) -> Option<&ClientIdentity> {
        self.identity.as_ref()
    }

    /// Returns the caller identity or `Unauthorized`.
    pub fn require_identity(&self) -> DomainResult<&ClientIdentity> {
        self.identity.as_ref().ok_or(DomainError::Unauthorized)
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn stats(&self) -> &LoaderStats {
        &self.stats
    }

    /// Returns a relation loader bound to this context.
    pub fn loader(&self) -> RelationLoader<'_> {
        RelationLoader::new(self)
    }
}

/// Per-request loader counters.
#[derive(Debug, Default)]
pub struct LoaderStats {
    fetches: AtomicU64,
    joins: AtomicU64,
    cache_hits: AtomicU64,
    entities_fetched: AtomicU64,
}

/// Point-in-time copy of [`LoaderStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStatsSnapshot {
    /// Batch fetches executed.
    pub fetches: u64,
    /// Traversals that waited on another traversal's batch.
    pub joins: u64,
    /// Traversals served entirely from the cache.
    pub cache_hits: u64,
    /// Entities returned by all fetches.
    pub entities_fetched: u64,
}

impl LoaderStats {
    pub(crate) fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_join(&self) {
        self.joins.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fetched(&self, count: usize) {
        self.entities_fetched
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LoaderStatsSnapshot {
        LoaderStatsSnapshot {
            fetches: self.fetches.load(Ordering::Relaxed),
            joins: self.joins.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            entities_fetched: self.entities_fetched.load(Ordering::Relaxed),
        }
    }
}
