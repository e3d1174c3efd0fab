//! HTTP client for upstream page fetches.
//!
//! Thin wrapper around reqwest with:
//! - A bounded per-request timeout
//! - A fixed user-agent
//! - Status classification into olib error kinds
//!
//! It never retries; that decision belongs to the router.

use crate::config::NetworkConfig;
use crate::{OlibError, Result};
use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Raw content of one upstream page.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// Final URL the content was fetched from.
    pub url: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawPage {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: body.into(),
        }
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("text/html"))
            .unwrap_or(false)
    }
}

/// HTTP client with a bounded timeout.
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with the given per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| OlibError::Config {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET a page and return its body.
    ///
    /// - network failure or timeout: `UpstreamUnavailable`
    /// - 404: `NotFound`
    /// - any other non-success status: `UpstreamUnavailable`
    pub async fn get_page(&self, url: &str) -> Result<RawPage> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                OlibError::unavailable(format!("GET {} timed out after {:?}", url, self.timeout))
            } else {
                OlibError::unavailable(format!("GET {} failed: {}", url, e))
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(OlibError::not_found(format!(
                "{} has no page at {}",
                extract_domain(url),
                url
            )));
        }
        if !status.is_success() {
            let hint = if Self::is_retryable_status(status) {
                "transient"
            } else {
                "unexpected"
            };
            return Err(OlibError::unavailable(format!(
                "{} returned {} ({}) for {}",
                extract_domain(url),
                status.as_u16(),
                hint,
                url
            )));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.text().await.map_err(|e| {
            OlibError::unavailable(format!("reading body of {} failed: {}", url, e))
        })?;

        Ok(RawPage {
            url: final_url,
            content_type,
            body,
        })
    }

    /// Check if an HTTP status code indicates a transient upstream problem.
    pub fn is_retryable_status(status: StatusCode) -> bool {
        matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
    }
}

/// Extract domain from a URL.
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.host_str().unwrap_or("unknown").to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
