//! In-memory response cache with fixed TTL and single-flight fetches.
//!
//! - [`CacheStore`] owns the key space; every read and write goes through it
//! - [`Clock`] is injected so expiry can be driven by a fake clock in tests
//! - [`CacheKey`] is the normalized identity of one logical request

mod clock;
mod key;
mod store;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use key::CacheKey;
pub use store::CacheStore;
pub use types::{CacheEntry, CacheStats, Lookup};
