//! Cache entry and statistics types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached value with its lifetime.
///
/// Entries are never mutated; a refresh replaces the whole entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// The cached payload.
    pub value: V,
    /// When the entry was written.
    pub cached_at: DateTime<Utc>,
    /// First instant at which the entry is no longer fresh.
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// Fresh means strictly before `expires_at`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Age in whole seconds at `now`, never negative.
    pub fn age_secs_at(&self, now: DateTime<Utc>) -> u64 {
        now.signed_duration_since(self.cached_at)
            .num_seconds()
            .max(0) as u64
    }
}

/// Outcome of [`CacheStore::get_or_fetch`](super::CacheStore::get_or_fetch).
#[derive(Debug, Clone)]
pub struct Lookup<V> {
    pub entry: CacheEntry<V>,
    /// `true` when served from a stored entry, `false` when this call (or a
    /// fetch it joined) went upstream.
    pub from_cache: bool,
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Stored entries, including expired ones not yet evicted.
    pub entries: usize,
    /// Fetches currently in progress.
    pub in_flight: usize,
    pub hits: u64,
    pub misses: u64,
    /// Requests that joined a fetch already in progress.
    pub coalesced: u64,
    pub fetch_failures: u64,
    pub ttl_secs: u64,
}
