//! Centralized configuration for olib.
//!
//! Constant tables hold the built-in defaults; [`ProxyConfig`] is the runtime
//! value constructed once at startup and passed into the components that need
//! it. Nothing in the library reads configuration ad hoc.

use crate::error::{OlibError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const UPSTREAM_BASE_URL: &'static str = "https://ollama.com";
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const USER_AGENT: &'static str = concat!("olib/", env!("CARGO_PKG_VERSION"));
    /// Total attempts per upstream fetch, so one retry.
    pub const FETCH_ATTEMPTS: u32 = 2;
    pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);
    pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(2);
}

/// Cache defaults.
pub struct CacheDefaults;

impl CacheDefaults {
    pub const TTL: Duration = Duration::from_secs(6 * 60 * 60);
    pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);
}

/// Runtime configuration for a proxy instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProxyConfig {
    /// Base URL of the upstream library site.
    pub upstream_base_url: String,
    /// URL this proxy is reachable at, used for links on the landing page.
    pub public_base_url: Option<String>,
    /// Time-to-live for every cache entry.
    pub cache_ttl: Duration,
    /// Bounded timeout for each upstream call.
    pub request_timeout: Duration,
    /// Interval of the background sweep for expired entries (`None` = lazy only).
    pub sweep_interval: Option<Duration>,
    /// Serve the HTML landing page at `/`.
    pub static_site: bool,
    /// Upstream attempts per fetch, including the first.
    pub fetch_attempts: u32,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            upstream_base_url: NetworkConfig::UPSTREAM_BASE_URL.to_string(),
            public_base_url: None,
            cache_ttl: CacheDefaults::TTL,
            request_timeout: NetworkConfig::REQUEST_TIMEOUT,
            sweep_interval: Some(CacheDefaults::SWEEP_INTERVAL),
            static_site: true,
            fetch_attempts: NetworkConfig::FETCH_ATTEMPTS,
        }
    }
}

impl ProxyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upstream_base_url(mut self, url: impl Into<String>) -> Self {
        self.upstream_base_url = url.into();
        self
    }

    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the TTL from fractional hours.
    ///
    /// Fails for negative, non-finite or out-of-range values.
    pub fn with_ttl_hours(self, hours: f64) -> Result<Self> {
        let ttl = Duration::try_from_secs_f64(hours * 3600.0).map_err(|e| OlibError::Config {
            message: format!("invalid cache TTL of {} hours: {}", hours, e),
        })?;
        Ok(self.with_cache_ttl(ttl))
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Option<Duration>) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_static_site(mut self, enable: bool) -> Self {
        self.static_site = enable;
        self
    }

    pub fn with_fetch_attempts(mut self, attempts: u32) -> Self {
        self.fetch_attempts = attempts;
        self
    }

    /// Public base URL without a trailing slash, falling back to a relative root.
    pub fn public_root(&self) -> &str {
        self.public_base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .unwrap_or("")
    }

    /// Check the values that cannot be represented by the type alone.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.upstream_base_url).map_err(|e| OlibError::Config {
            message: format!("invalid upstream base URL '{}': {}", self.upstream_base_url, e),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(OlibError::Config {
                message: format!("upstream base URL must be http(s), got '{}'", parsed.scheme()),
            });
        }
        if self.cache_ttl.is_zero() {
            return Err(OlibError::Config {
                message: "cache TTL must be greater than zero".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(OlibError::Config {
                message: "request timeout must be greater than zero".to_string(),
            });
        }
        if self.fetch_attempts == 0 {
            return Err(OlibError::Config {
                message: "fetch attempts must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
