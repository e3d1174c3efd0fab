//! Production fetcher: HTTP client plus page parser.

use super::{BlobId, FetchIntent, Fetcher, ModelRef, SortOrder};
use crate::config::ProxyConfig;
use crate::models::{
    filter_by_capabilities, BlobDetails, FileSummary, FilterInfo, ListingResponse, SearchResponse,
};
use crate::network::{HttpClient, RawPage};
use crate::parse::{parse_gguf_snippet, HtmlPageParser, PageParser};
use crate::{OlibError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fetches pages from the upstream site and parses them.
pub struct UpstreamFetcher {
    http: HttpClient,
    base_url: String,
    parser: Arc<dyn PageParser>,
}

impl UpstreamFetcher {
    pub fn new(config: &ProxyConfig) -> Result<Self> {
        let base_url = config.upstream_base_url.trim_end_matches('/').to_string();
        Ok(Self {
            http: HttpClient::with_timeout(config.request_timeout)?,
            parser: Arc::new(HtmlPageParser::new(base_url.clone())),
            base_url,
        })
    }

    /// Replace the page parser.
    pub fn with_parser(mut self, parser: Arc<dyn PageParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn listing_url(
        &self,
        path: &str,
        sort_param: &str,
        sort: SortOrder,
        capabilities: &[String],
    ) -> String {
        let mut url = format!("{}{}{}={}", self.base_url, path, sort_param, sort);
        if !capabilities.is_empty() {
            url.push_str("&c=");
            url.push_str(&urlencoding::encode(&capabilities.join(",")));
        }
        url
    }

    /// GET a model page, retrying under the library namespace when a
    /// user-namespace page does not exist.
    async fn get_model_page(
        &self,
        model: &ModelRef,
        path_of: impl Fn(&ModelRef) -> String,
    ) -> Result<(RawPage, ModelRef)> {
        match self.http.get_page(&self.url(&path_of(model))).await {
            Err(OlibError::NotFound { .. }) if !model.is_library() => {
                let library = model.in_library();
                debug!(
                    "{} not found upstream, trying {}",
                    model.full_name(),
                    library.full_name()
                );
                match self.http.get_page(&self.url(&path_of(&library))).await {
                    Ok(page) => Ok((page, library)),
                    Err(OlibError::NotFound { .. }) => Err(OlibError::not_found(format!(
                        "model '{}' (and '{}/{}') not found",
                        model.full_name(),
                        library.namespace,
                        library.name
                    ))),
                    Err(e) => Err(e),
                }
            }
            Err(OlibError::NotFound { .. }) => Err(OlibError::not_found(format!(
                "model '{}' not found",
                path_of(model).trim_start_matches('/')
            ))),
            other => other.map(|page| (page, model.clone())),
        }
    }

    async fn listing(
        &self,
        namespace: &str,
        sort: SortOrder,
        capabilities: &[String],
    ) -> Result<Value> {
        let url = self.listing_url(&format!("/{}", namespace), "?sort", sort, capabilities);
        let page = self.http.get_page(&url).await.map_err(|e| match e {
            OlibError::NotFound { .. } => {
                OlibError::not_found(format!("namespace '{}' not found", namespace))
            }
            other => other,
        })?;
        let items = self.parser.parse_listing(&page)?;

        Ok(serde_json::to_value(ListingResponse {
            queried_namespace: namespace.to_string(),
            sort_order: sort,
            filters: FilterInfo::from_capabilities(capabilities),
            results: filter_by_capabilities(items, capabilities),
        })?)
    }

    async fn search(&self, query: &str, sort: SortOrder, capabilities: &[String]) -> Result<Value> {
        let path = format!("/search?q={}", urlencoding::encode(query));
        let url = self.listing_url(&path, "&o", sort, capabilities);
        let page = self.http.get_page(&url).await?;
        let items = self.parser.parse_listing(&page)?;

        Ok(serde_json::to_value(SearchResponse {
            query: query.to_string(),
            sort_order: sort,
            filters: FilterInfo::from_capabilities(capabilities),
            results: filter_by_capabilities(items, capabilities),
        })?)
    }

    async fn model_detail(&self, model: &ModelRef, tag: Option<&str>) -> Result<Value> {
        let (page, _) = self.get_model_page(model, |m| m.path(tag)).await?;
        let mut parsed = self.parser.parse_model_page(&page)?;
        if let Some(tag) = tag {
            parsed.set_active_tag(tag);
        }
        Ok(serde_json::to_value(parsed)?)
    }

    async fn tags(&self, model: &ModelRef) -> Result<Value> {
        let (page, resolved) = self
            .get_model_page(model, |m| format!("{}/tags", m.path(None)))
            .await?;
        let parsed = self.parser.parse_tags_page(&page, &resolved)?;
        Ok(serde_json::to_value(parsed)?)
    }

    async fn blob(&self, model: &ModelRef, tag: &str, blob: &BlobId) -> Result<Value> {
        let (page, resolved) = self.get_model_page(model, |m| m.path(Some(tag))).await?;
        let parsed = self.parser.parse_model_page(&page)?;
        let full_tag = resolved.full_tag_name(tag);

        let file = parsed
            .tag_files_summary
            .iter()
            .find(|f| blob.matches(&f.name, f.digest.as_deref()))
            .ok_or_else(|| {
                OlibError::not_found(format!("blob '{}' not found for '{}'", blob, full_tag))
            })?;

        let mut details = BlobDetails {
            name_full_tag: full_tag,
            canonical_name: file.name.clone(),
            source_url: file.blob_url.clone(),
            digest: file.digest.clone().unwrap_or_else(|| "unknown".to_string()),
            size_str: file.size_str.clone(),
            text_content: None,
            parsed_json_content: None,
            gguf_metadata_snippet: None,
            parsed_gguf_metadata: None,
            listing_updated_str: file.updated_str.clone(),
            listing_updated_iso: file.updated_iso,
        };
        let snippet = Some(file.snippet.clone()).filter(|s| !s.is_empty());

        if BlobId::TEXT_NAMES.contains(&file.name.as_str()) {
            let text = self.blob_text(file).await?.or(snippet);
            if file.name == "params" {
                details.parsed_json_content = text
                    .as_deref()
                    .and_then(|t| serde_json::from_str::<Value>(t).ok())
                    .filter(|v| v.is_object() || v.is_array());
            }
            details.text_content = text;
        } else if file.name == "model" {
            details.parsed_gguf_metadata = parse_gguf_snippet(&file.snippet);
            details.gguf_metadata_snippet = snippet;
        } else {
            details.text_content = snippet;
        }

        Ok(serde_json::to_value(details)?)
    }

    /// Full text of a text layer, or `None` when the blob page is missing or
    /// has no text. Transient failures propagate.
    async fn blob_text(&self, file: &FileSummary) -> Result<Option<String>> {
        match self.http.get_page(&file.blob_url).await {
            Ok(page) => Ok(self.parser.parse_blob_text(&page)),
            Err(OlibError::NotFound { .. }) => {
                warn!("Blob page {} not found, using snippet", file.blob_url);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Fetcher for UpstreamFetcher {
    async fn fetch(&self, intent: &FetchIntent) -> Result<Value> {
        debug!(kind = intent.kind(), "fetching from upstream");
        match intent {
            FetchIntent::Listing {
                namespace,
                sort,
                capabilities,
            } => self.listing(namespace, *sort, capabilities).await,
            FetchIntent::Search {
                query,
                sort,
                capabilities,
            } => self.search(query, *sort, capabilities).await,
            FetchIntent::ModelDetail { model, tag } => {
                self.model_detail(model, tag.as_deref()).await
            }
            FetchIntent::Tags { model } => self.tags(model).await,
            FetchIntent::Blob { model, tag, blob } => self.blob(model, tag, blob).await,
        }
    }
}
