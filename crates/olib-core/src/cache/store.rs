//! TTL cache store with single-flight fetch coalescing.
//!
//! Each key holds either a stored entry or a marker for a fetch in progress.
//! The marker is inserted atomically with the miss decision (under the key's
//! shard lock), so concurrent requests for the same cold key all await one
//! fetch. Fetches run on their own task: a caller that gives up does not
//! cancel the fetch, and its result still lands in the store.

use super::clock::Clock;
use super::key::CacheKey;
use super::types::{CacheEntry, CacheStats, Lookup};
use crate::error::{OlibError, Result};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

type FetchOutcome<V> = std::result::Result<CacheEntry<V>, OlibError>;
type InFlight<V> = Shared<BoxFuture<'static, FetchOutcome<V>>>;

enum Slot<V> {
    Ready(CacheEntry<V>),
    Pending { generation: u64, fetch: InFlight<V> },
}

impl<V> Slot<V> {
    fn is_pending(&self, generation: u64) -> bool {
        matches!(self, Slot::Pending { generation: g, .. } if *g == generation)
    }
}

/// What a lookup decided while holding the key's lock.
enum Plan<V> {
    Hit(CacheEntry<V>),
    Join(InFlight<V>),
    Start,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    fetch_failures: AtomicU64,
}

struct Inner<V> {
    slots: DashMap<CacheKey, Slot<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    next_generation: AtomicU64,
    counters: Counters,
}

/// Shared cache of fetched values.
///
/// Cloning is cheap and every clone sees the same key space. Construct one at
/// startup and hand clones to whoever needs it.
pub struct CacheStore<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for CacheStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> CacheStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a store whose entries live for `ttl`.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: DashMap::new(),
                ttl,
                clock,
                next_generation: AtomicU64::new(0),
                counters: Counters::default(),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    /// Get a stored entry if it is still fresh.
    ///
    /// An expired entry found here is evicted.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry<V>> {
        let now = self.inner.clock.now();
        let entry = match self.inner.slots.get(key).as_deref() {
            Some(Slot::Ready(entry)) => entry.clone(),
            _ => return None,
        };

        if entry.is_fresh_at(now) {
            return Some(entry);
        }

        self.inner.slots.remove_if(key, |_, slot| {
            matches!(slot, Slot::Ready(stale) if !stale.is_fresh_at(now))
        });
        None
    }

    /// Return the fresh entry for `key`, or fetch it exactly once.
    ///
    /// If a fetch for `key` is already running, this awaits it instead of
    /// starting another. On success the value is stored with
    /// `expires_at = now + ttl`; on failure nothing is stored and every
    /// waiter receives the same error.
    pub async fn get_or_fetch<F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<Lookup<V>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let now = self.inner.clock.now();
        let in_flight = match self.inner.slots.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let plan = match occupied.get() {
                    Slot::Ready(entry) if entry.is_fresh_at(now) => Plan::Hit(entry.clone()),
                    Slot::Ready(_) => Plan::Start,
                    Slot::Pending { fetch, .. } => Plan::Join(fetch.clone()),
                };
                match plan {
                    Plan::Hit(entry) => {
                        self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
                        debug!(key = %key, "cache hit");
                        return Ok(Lookup {
                            entry,
                            from_cache: true,
                        });
                    }
                    Plan::Join(in_flight) => {
                        self.inner.counters.coalesced.fetch_add(1, Ordering::Relaxed);
                        debug!(key = %key, "joining in-flight fetch");
                        in_flight
                    }
                    Plan::Start => {
                        self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
                        debug!(key = %key, "cache entry expired, refetching");
                        let (generation, in_flight) = self.spawn_fetch(key.clone(), fetch);
                        occupied.insert(Slot::Pending {
                            generation,
                            fetch: in_flight.clone(),
                        });
                        in_flight
                    }
                }
            }
            Entry::Vacant(vacant) => {
                self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "cache miss");
                let (generation, in_flight) = self.spawn_fetch(key.clone(), fetch);
                vacant.insert(Slot::Pending {
                    generation,
                    fetch: in_flight.clone(),
                });
                in_flight
            }
        };

        let entry = in_flight.await?;
        Ok(Lookup {
            entry,
            from_cache: false,
        })
    }

    /// Remove the entry and any in-flight marker for `key`.
    ///
    /// A fetch still running for the key completes for its waiters but its
    /// result is not stored.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.inner.slots.remove(key).is_some()
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.inner.clock.now();
        let mut removed = 0;
        self.inner.slots.retain(|_, slot| match slot {
            Slot::Ready(entry) if !entry.is_fresh_at(now) => {
                removed += 1;
                false
            }
            _ => true,
        });
        removed
    }

    /// Drop all entries and in-flight markers.
    pub fn clear(&self) {
        self.inner.slots.clear();
    }

    /// Number of stored entries, expired ones included until evicted.
    pub fn len(&self) -> usize {
        self.inner
            .slots
            .iter()
            .filter(|slot| matches!(slot.value(), Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let (mut entries, mut in_flight) = (0, 0);
        for slot in self.inner.slots.iter() {
            match slot.value() {
                Slot::Ready(_) => entries += 1,
                Slot::Pending { .. } => in_flight += 1,
            }
        }
        let counters = &self.inner.counters;
        CacheStats {
            entries,
            in_flight,
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            coalesced: counters.coalesced.load(Ordering::Relaxed),
            fetch_failures: counters.fetch_failures.load(Ordering::Relaxed),
            ttl_secs: self.inner.ttl.as_secs(),
        }
    }

    /// Periodically evict expired entries until the returned handle is aborted.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = store.sweep_expired();
                if removed > 0 {
                    debug!(removed, "swept expired cache entries");
                }
            }
        })
    }

    fn spawn_fetch<F, Fut>(&self, key: CacheKey, fetch: F) -> (u64, InFlight<V>)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);

        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let task: JoinHandle<FetchOutcome<V>> = tokio::spawn(async move {
            let result = match AssertUnwindSafe(async move { fetch().await })
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(_) => Err(OlibError::internal("upstream fetch panicked")),
            };
            inner.complete(task_key, generation, result)
        });

        let inner = Arc::clone(&self.inner);
        let in_flight = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    inner.abandon(&key, generation);
                    Err(OlibError::internal(format!(
                        "fetch task did not complete: {}",
                        err
                    )))
                }
            }
        }
        .boxed()
        .shared();

        (generation, in_flight)
    }
}

impl<V> Inner<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn complete(&self, key: CacheKey, generation: u64, result: Result<V>) -> FetchOutcome<V> {
        match result {
            Ok(value) => {
                let cached_at = self.clock.now();
                let entry = CacheEntry {
                    value,
                    cached_at,
                    expires_at: expiry(cached_at, self.ttl),
                };
                match self.slots.get_mut(&key) {
                    Some(mut slot) if slot.is_pending(generation) => {
                        *slot = Slot::Ready(entry.clone());
                    }
                    _ => debug!(key = %key, "key invalidated during fetch, result not stored"),
                }
                Ok(entry)
            }
            Err(err) => {
                self.counters.fetch_failures.fetch_add(1, Ordering::Relaxed);
                self.abandon(&key, generation);
                Err(err)
            }
        }
    }

    fn abandon(&self, key: &CacheKey, generation: u64) {
        self.slots
            .remove_if(key, |_, slot| slot.is_pending(generation));
    }
}

fn expiry(cached_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    cached_at
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
