//! Builder for configuring LibraryProxy initialization.

use std::sync::Arc;

use crate::cache::{CacheStore, Clock, SystemClock};
use crate::config::ProxyConfig;
use crate::error::Result;
use crate::network::RetryConfig;
use crate::parse::HtmlPageParser;
use crate::upstream::{Fetcher, UpstreamFetcher};
use crate::LibraryProxy;

/// Builder for configuring LibraryProxy initialization.
///
/// Every component has a production default; tests swap in fakes.
///
/// # Example
///
/// ```rust,ignore
/// use olib_core::{LibraryProxy, ManualClock, ProxyConfig};
///
/// let proxy = LibraryProxy::builder(ProxyConfig::default())
///     .with_clock(Arc::new(ManualClock::new(Utc::now())))
///     .with_fetcher(Arc::new(MyFakeFetcher::default()))
///     .build()?;
/// ```
pub struct LibraryProxyBuilder {
    config: ProxyConfig,
    fetcher: Option<Arc<dyn Fetcher>>,
    clock: Option<Arc<dyn Clock>>,
    retry: Option<RetryConfig>,
}

impl LibraryProxyBuilder {
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            config,
            fetcher: None,
            clock: None,
            retry: None,
        }
    }

    /// Use `fetcher` instead of the HTTP fetcher built from the config.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Clock for cache expiry and relative-date parsing.
    ///
    /// Default: the system clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Override the retry policy derived from `fetch_attempts`.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Validate the configuration and assemble the proxy.
    pub fn build(self) -> Result<LibraryProxy> {
        self.config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => {
                let parser = HtmlPageParser::new(self.config.upstream_base_url.clone())
                    .with_clock(Arc::clone(&clock));
                Arc::new(UpstreamFetcher::new(&self.config)?.with_parser(Arc::new(parser)))
            }
        };
        let retry = self
            .retry
            .unwrap_or_else(|| RetryConfig::upstream(self.config.fetch_attempts));
        let cache = CacheStore::new(self.config.cache_ttl, clock);

        tracing::info!(
            upstream = %self.config.upstream_base_url,
            ttl_secs = self.config.cache_ttl.as_secs(),
            attempts = retry.max_attempts,
            "library proxy initialized"
        );

        Ok(LibraryProxy {
            config: self.config,
            cache,
            fetcher,
            retry,
        })
    }
}
