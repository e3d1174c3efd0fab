//! Response assembly: cached payload plus cache metadata.

use crate::cache::Lookup;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a response body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Upstream,
}

/// Cache metadata attached to every successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    /// Served from a stored entry.
    pub cached: bool,
    /// When this response was produced.
    pub fetched_at: DateTime<Utc>,
    /// When the underlying entry was written.
    pub cached_at: DateTime<Utc>,
    #[serde(rename = "cache_expires_at")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "cache_age_secs")]
    pub age_secs: u64,
    pub source: Source,
}

impl CacheMeta {
    pub fn from_lookup<V>(lookup: &Lookup<V>, now: DateTime<Utc>) -> Self {
        Self {
            cached: lookup.from_cache,
            fetched_at: now,
            cached_at: lookup.entry.cached_at,
            expires_at: lookup.entry.expires_at,
            age_secs: lookup.entry.age_secs_at(now),
            source: if lookup.from_cache {
                Source::Cache
            } else {
                Source::Upstream
            },
        }
    }

    fn fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Merge `meta` into `value`.
///
/// Object payloads keep every field they have; metadata only fills keys the
/// payload does not use. Anything else is wrapped as `{"data": value, ...}`.
pub fn assemble(value: &Value, meta: &CacheMeta) -> Value {
    let mut body = match value {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other.clone());
            map
        }
    };
    for (key, field) in meta.fields() {
        body.entry(key).or_insert(field);
    }
    Value::Object(body)
}
