//! olib core - Caching fetch layer for the Ollama model library.
//!
//! This crate turns requests such as `/library/llama3:8b` into JSON scraped
//! from the upstream library site and keeps every response in a
//! time-bounded in-memory cache. It can be used programmatically without
//! the HTTP layer in `olib-server`.
//!
//! # Example
//!
//! ```rust,ignore
//! use olib_core::{LibraryProxy, ProxyConfig};
//!
//! #[tokio::main]
//! async fn main() -> olib_core::Result<()> {
//!     let proxy = LibraryProxy::new(ProxyConfig::default())?;
//!
//!     // First call goes upstream, the second is served from the cache
//!     let tags = proxy.handle("/library/llama3/tags", None).await?;
//!     println!("cached: {}", tags.meta.cached);
//!
//!     let search = proxy.handle("/search", Some("q=vision&o=newest")).await?;
//!     println!("{}", search.body);
//!
//!     Ok(())
//! }
//! ```

pub mod assembler;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod network;
pub mod parse;
pub mod router;
pub mod upstream;

mod api;

// Re-export commonly used types
pub use assembler::{assemble, CacheMeta, Source};
pub use cache::{CacheEntry, CacheKey, CacheStats, CacheStore, Clock, ManualClock, SystemClock};
pub use config::ProxyConfig;
pub use error::{OlibError, Result};
pub use network::RetryConfig;
pub use router::Route;
pub use upstream::{BlobId, FetchIntent, Fetcher, ModelRef, SortOrder, UpstreamFetcher};

// Re-export builder from api module
pub use api::{LibraryProxyBuilder, ProxyResponse};

use serde_json::Value;
use std::sync::Arc;

/// Main entry point: validated routing, caching and upstream fetching.
///
/// One instance serves the whole process. Share it behind an `Arc`; all
/// methods take `&self`.
pub struct LibraryProxy {
    config: ProxyConfig,
    cache: CacheStore<Value>,
    fetcher: Arc<dyn Fetcher>,
    retry: RetryConfig,
}

impl LibraryProxy {
    /// Create a builder for LibraryProxy.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let proxy = LibraryProxy::builder(config)
    ///     .with_fetcher(Arc::new(fake))
    ///     .build()?;
    /// ```
    pub fn builder(config: ProxyConfig) -> LibraryProxyBuilder {
        LibraryProxyBuilder::new(config)
    }

    /// Create a proxy that fetches from `config.upstream_base_url`.
    pub fn new(config: ProxyConfig) -> Result<Self> {
        Self::builder(config).build()
    }
}
