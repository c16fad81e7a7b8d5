//! Per-request context creation.

use std::sync::Arc;

use tracing::{debug, info};

use edgeload_domain::error::DomainResult;
use edgeload_domain::model::ClientIdentity;
use edgeload_domain::{register_loader_metrics, LoaderConfig, LoaderStatsSnapshot, RequestContext};
use edgeload_storage::DataStore;

use crate::adapters::IntoDomainResult;
use crate::config::ServerConfig;
use crate::resolvers::Resolver;
use crate::seed::ensure_demo_client;

/// Creates one [`RequestContext`] per inbound request.
///
/// The transport layer calls [`begin`](Self::begin) when a request arrives,
/// hands the context to every resolver of that request, and passes it to
/// [`finish`](Self::finish) when the response is complete.
pub struct RequestFactory<S: DataStore + ?Sized> {
    store: Arc<S>,
    loader: LoaderConfig,
}

impl<S: DataStore + ?Sized> RequestFactory<S> {
    pub fn new(store: Arc<S>, loader: LoaderConfig) -> Self {
        Self { store, loader }
    }

    /// Builds a factory from configuration.
    ///
    /// Registers loader metric descriptions and, in development, seeds the
    /// demo client.
    pub async fn bootstrap(store: Arc<S>, config: &ServerConfig) -> DomainResult<Self> {
        register_loader_metrics();

        if config.should_seed() {
            ensure_demo_client(store.as_ref(), &config.seed).await?;
        }

        info!(
            environment = %config.environment,
            negative_caching = config.loader.negative_caching,
            widen_batches = config.loader.widen_batches,
            "request factory ready"
        );
        Ok(Self::new(store, config.loader.to_loader_config()))
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn loader_config(&self) -> &LoaderConfig {
        &self.loader
    }

    /// Starts a request. `identity` is the caller as already validated by
    /// the auth layer, or `None` for anonymous requests.
    pub fn begin(&self, identity: Option<ClientIdentity>) -> RequestContext {
        RequestContext::with_config(identity, self.loader.clone())
    }

    /// Resolves a validated client id to a request identity.
    ///
    /// Returns `None` when no such client is registered.
    pub async fn identify(&self, client_id: &str) -> DomainResult<Option<ClientIdentity>> {
        let client = self
            .store
            .find_client_by_client_id(client_id)
            .await
            .into_domain()?;
        Ok(client.as_ref().map(ClientIdentity::from))
    }

    /// Resolvers for `ctx` over this factory's store.
    pub fn resolver<'a>(&'a self, ctx: &'a RequestContext) -> Resolver<'a, S> {
        Resolver::new(self.store.as_ref(), ctx)
    }

    /// Ends a request, discarding its cache, and returns its loader stats.
    pub fn finish(&self, ctx: RequestContext) -> LoaderStatsSnapshot {
        let stats = ctx.stats().snapshot();
        debug!(
            fetches = stats.fetches,
            joins = stats.joins,
            cache_hits = stats.cache_hits,
            entities_fetched = stats.entities_fetched,
            "request finished"
        );
        stats
    }
}
