//! In-flight registry for deduplicating concurrent batch fetches.
//!
//! When several field resolutions of one request need the same batch,
//! only the first one (the *leader*) runs the fetch; every other caller
//! (a *follower*) waits for the leader's outcome.
//!
//! Each batch is identified by a [`BatchKey`]: the relation identity plus
//! the sorted set of ids still missing from the cache. Because the key
//! encodes the exact residual id set, a new batch issued after part of the
//! data landed in the cache never collides with a settled one.
//!
//! # Settlement
//!
//! Only pending batches are joined. Once the leader publishes its outcome
//! the entry is removed, and the cache is what serves later traversals.
//!
//! - **Success**: current followers return `Joined`. A later caller with
//!   the same key registers afresh and runs its own fetch.
//! - **Failure**: every current follower receives the same error.
//! - **Leader dropped**: the guard removes the entry; followers see the
//!   channel close and retry, one of them becoming the new leader.

mod key;

pub use key::BatchKey;

use std::future::Future;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;

use crate::error::{DomainError, DomainResult};

/// Settlement state shared between a leader and its followers.
/// `None` while the fetch is pending.
type Settlement = Option<Result<(), DomainError>>;

/// Result of trying to acquire a slot for a batch key.
pub enum InFlightSlot {
    /// We won the race and must run the fetch.
    /// Contains the sender used to publish the outcome.
    Leader(watch::Sender<Settlement>),
    /// Another task registered this key first; wait on its outcome.
    Follower(watch::Receiver<Settlement>),
}

/// How a `join_or_start` call was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// This caller ran the fetch.
    Started,
    /// This caller waited on (or found) another caller's fetch.
    Joined,
}

/// Registry of outstanding batch fetches for one request.
///
/// Registration uses `DashMap`'s entry API, so check-and-insert is atomic
/// even when the request's futures are polled from several threads.
#[derive(Default)]
pub struct InFlightRegistry {
    in_flight: DashMap<BatchKey, watch::Receiver<Settlement>>,
}

impl std::fmt::Debug for InFlightRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlightRegistry")
            .field("entries", &self.in_flight.len())
            .finish()
    }
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically try to acquire a slot for `key`.
    ///
    /// Returns `Leader` if this caller must execute the fetch, or
    /// `Follower` if an entry is already registered.
    pub fn acquire(&self, key: BatchKey) -> InFlightSlot {
        match self.in_flight.entry(key) {
            Entry::Occupied(entry) => InFlightSlot::Follower(entry.get().clone()),
            Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(None);
                entry.insert(rx);
                InFlightSlot::Leader(tx)
            }
        }
    }

    /// Remove the entry for `key`.
    pub fn remove(&self, key: &BatchKey) {
        self.in_flight.remove(key);
    }

    /// Returns true if a fetch for `key` is pending.
    pub fn contains(&self, key: &BatchKey) -> bool {
        self.in_flight.contains_key(key)
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Join the fetch registered for `key`, or start it with `start`.
    ///
    /// The slot is registered synchronously on the first poll, before
    /// `start` runs or anything is awaited, so two resolutions issued back
    /// to back can never both run the fetch for one key.
    pub async fn join_or_start<F, Fut>(&self, key: BatchKey, start: F) -> DomainResult<JoinOutcome>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DomainResult<()>>,
    {
        let sender = loop {
            match self.acquire(key.clone()) {
                InFlightSlot::Follower(mut receiver) => {
                    debug!(relation = %key.relation(), ids = key.len(), "joining in-flight batch");
                    match receiver.wait_for(Option::is_some).await {
                        Ok(settled) => match &*settled {
                            Some(Ok(())) => return Ok(JoinOutcome::Joined),
                            Some(Err(err)) => return Err(err.clone()),
                            None => continue,
                        },
                        // Leader was dropped before settling; its guard
                        // removed the entry, so compete for the slot again.
                        Err(_) => continue,
                    }
                }
                InFlightSlot::Leader(sender) => break sender,
            }
        };

        let guard = InFlightGuard::new(self, key);
        let result = start().await;

        // Publish before unregistering: followers already holding a
        // receiver observe the outcome, later callers find no entry.
        sender.send_replace(Some(result.clone()));
        drop(guard);

        result.map(|()| JoinOutcome::Started)
    }
}

/// RAII guard that unregisters the leader's entry on drop.
///
/// Dropped after the outcome is published, or early if the leader's future
/// is cancelled or panics mid-fetch, so followers never wait forever.
pub struct InFlightGuard<'a> {
    registry: &'a InFlightRegistry,
    key: BatchKey,
}

impl<'a> InFlightGuard<'a> {
    pub fn new(registry: &'a InFlightRegistry, key: BatchKey) -> Self {
        Self { registry, key }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry.remove(&self.key);
    }
}
