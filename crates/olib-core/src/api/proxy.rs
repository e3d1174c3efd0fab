//! Request handling for LibraryProxy.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::assembler::{assemble, CacheMeta};
use crate::cache::{CacheKey, CacheStats, CacheStore};
use crate::config::ProxyConfig;
use crate::error::{OlibError, Result};
use crate::router::{fetch_with_retry, Route};
use crate::LibraryProxy;

/// A successful response: the assembled JSON body and its cache metadata.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub key: CacheKey,
    pub body: Value,
    pub meta: CacheMeta,
}

impl LibraryProxy {
    /// Serve one request.
    ///
    /// `path` is the request path (`/library/llama3:8b`) and `query` the raw
    /// query string without the leading `?`. Invalid requests fail before
    /// the cache is consulted.
    pub async fn handle(&self, path: &str, query: Option<&str>) -> Result<ProxyResponse> {
        let route = Route::parse(path, query)?;
        let kind = route.intent.kind();

        let fetcher = Arc::clone(&self.fetcher);
        let retry = self.retry.clone();
        let intent = route.intent;
        let lookup = self
            .cache
            .get_or_fetch(&route.key, move || async move {
                fetch_with_retry(fetcher.as_ref(), &intent, &retry).await
            })
            .await
            .inspect_err(|err| match err {
                OlibError::UpstreamParse { url, message } => {
                    error!(key = %route.key, "upstream markup not understood at {}: {}", url, message)
                }
                OlibError::UpstreamUnavailable { .. } => {
                    warn!(key = %route.key, "upstream unavailable: {}", err)
                }
                OlibError::Internal { .. } => error!(key = %route.key, "fetch failed: {}", err),
                _ => debug!(key = %route.key, "request failed: {}", err),
            })?;

        let meta = CacheMeta::from_lookup(&lookup, self.cache.now());
        debug!(key = %route.key, kind, cached = meta.cached, "serving response");
        Ok(ProxyResponse {
            body: assemble(&lookup.entry.value, &meta),
            key: route.key,
            meta,
        })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The shared response cache.
    pub fn cache(&self) -> &CacheStore<Value> {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Start the periodic sweep if the config enables one.
    pub fn spawn_sweeper(&self) -> Option<JoinHandle<()>> {
        self.config
            .sweep_interval
            .filter(|every| !every.is_zero())
            .map(|every| self.cache.spawn_sweeper(every))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Clock, ManualClock};
    use crate::network::RetryConfig;
    use crate::upstream::{FetchIntent, Fetcher};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
        fail_with: Option<OlibError>,
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        async fn fetch(&self, intent: &FetchIntent) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(json!({"kind": intent.kind(), "source": "payload"})),
            }
        }
    }

    fn proxy(fetcher: Arc<CountingFetcher>, clock: Arc<ManualClock>) -> LibraryProxy {
        LibraryProxy::builder(ProxyConfig::default())
            .with_fetcher(fetcher)
            .with_clock(clock)
            .with_retry(RetryConfig::no_retry())
            .build()
            .unwrap()
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_blob_fetched_once_then_cached() {
        let fetcher = Arc::new(CountingFetcher::default());
        let clock = clock();
        let proxy = proxy(fetcher.clone(), clock.clone());

        let first = proxy.handle("/library/llama3:8b/blobs/model", None).await.unwrap();
        assert_eq!(first.key.as_str(), "blob:llama3:8b:model");
        assert!(!first.meta.cached);
        assert_eq!(first.body["cached"], false);
        assert_eq!(first.body["kind"], "blob");
        assert_eq!(first.body["source"], "payload");

        clock.advance(Duration::from_secs(300));
        let second = proxy.handle("/library/llama3:8b/blobs/model", None).await.unwrap();
        assert!(second.meta.cached);
        assert_eq!(second.body["cached"], true);
        assert_eq!(second.body["cache_age_secs"], 300);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let fetcher = Arc::new(CountingFetcher::default());
        let clock = clock();
        let proxy = proxy(fetcher.clone(), clock.clone());

        proxy.handle("/library", Some("o=newest")).await.unwrap();
        clock.advance(Duration::from_secs(6 * 60 * 60));
        let again = proxy.handle("/library", Some("o=NEWEST")).await.unwrap();
        assert!(!again.meta.cached);
        assert_eq!(again.meta.cached_at, clock.now());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_bad_request_touches_nothing() {
        let fetcher = Arc::new(CountingFetcher::default());
        let proxy = proxy(fetcher.clone(), clock());

        let err = proxy.handle("/library/:8b", None).await.unwrap_err();
        assert!(matches!(err, OlibError::BadRequest { .. }));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(proxy.stats().misses, 0);
        assert!(proxy.cache().is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let fetcher = Arc::new(CountingFetcher {
            fail_with: Some(OlibError::unavailable("connection refused")),
            ..Default::default()
        });
        let proxy = proxy(fetcher.clone(), clock());

        for _ in 0..2 {
            let err = proxy.handle("/library/llama3/tags", None).await.unwrap_err();
            assert!(err.is_retryable());
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert!(proxy.cache().get(&"tags:llama3".into()).is_none());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = ProxyConfig::default().with_upstream_base_url("ftp://ollama.com");
        let result = LibraryProxy::builder(config)
            .with_fetcher(Arc::new(CountingFetcher::default()))
            .build();
        assert!(matches!(result, Err(OlibError::Config { .. })));
    }

    #[tokio::test]
    async fn test_sweeper_follows_config() {
        let fetcher = Arc::new(CountingFetcher::default());
        let disabled = LibraryProxy::builder(ProxyConfig::default().with_sweep_interval(None))
            .with_fetcher(fetcher.clone())
            .build()
            .unwrap();
        assert!(disabled.spawn_sweeper().is_none());

        let enabled = proxy(fetcher, clock());
        let handle = enabled.spawn_sweeper().unwrap();
        handle.abort();
    }
}
