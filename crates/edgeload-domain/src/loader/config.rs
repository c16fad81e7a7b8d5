//! Configuration for the relation loader.

use std::time::Duration;

/// Configuration for the relation loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Record empty results so they are not fetched again within a request.
    ///
    /// When enabled, ids that a to-one fetch did not return are remembered
    /// as absent, and parents whose to-many children were fetched are
    /// remembered even if they have no children. When disabled, such ids
    /// look "not yet fetched" and are re-requested on every access.
    pub negative_caching: bool,
    /// Widen each batch with the foreign keys of every sibling already in
    /// the parent's cache bucket.
    pub widen_batches: bool,
    /// Upper bound on a single batch fetch.
    pub fetch_timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            negative_caching: true,
            widen_batches: true,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl LoaderConfig {
    /// Enables or disables negative caching.
    pub fn with_negative_caching(mut self, enabled: bool) -> Self {
        self.negative_caching = enabled;
        self
    }

    /// Enables or disables sibling widening.
    pub fn with_widening(mut self, enabled: bool) -> Self {
        self.widen_batches = enabled;
        self
    }

    /// Sets the fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}
