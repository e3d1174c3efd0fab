//! Fetching from the upstream model library.
//!
//! A [`Fetcher`] turns one [`FetchIntent`] into a JSON payload. It performs
//! no caching and no retries; both belong to the layers above it.

mod fetcher;
mod intent;

pub use fetcher::UpstreamFetcher;
pub use intent::{full_model_name, BlobId, FetchIntent, ModelRef, SortOrder, LIBRARY_NAMESPACE};

use crate::Result;
use async_trait::async_trait;

/// Retrieves and parses upstream content for one intent.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, intent: &FetchIntent) -> Result<serde_json::Value>;
}
