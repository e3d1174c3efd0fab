//! Error types for olib.
//!
//! Every failure a request can hit maps to one variant here, and each variant
//! carries the HTTP status the server surfaces for it. Errors are `Clone` so a
//! single upstream fetch outcome can be handed to every coalesced waiter.

use thiserror::Error;

/// Main error type for the olib library.
#[derive(Debug, Clone, Error)]
pub enum OlibError {
    /// Malformed identifier or query, fixable by the caller.
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Unknown route, or upstream reports no such resource.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Transient network failure or timeout talking to upstream.
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable { message: String },

    /// Upstream content no longer matches the structure the parser expects.
    #[error("Unexpected upstream content at {url}: {message}")]
    UpstreamParse { url: String, message: String },

    // Startup configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Result type alias for olib operations.
pub type Result<T> = std::result::Result<T, OlibError>;

impl From<serde_json::Error> for OlibError {
    fn from(err: serde_json::Error) -> Self {
        OlibError::Internal {
            message: format!("JSON error: {}", err),
        }
    }
}

impl OlibError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        OlibError::BadRequest {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        OlibError::NotFound {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        OlibError::UpstreamUnavailable {
            message: message.into(),
        }
    }

    pub fn parse(url: impl Into<String>, message: impl Into<String>) -> Self {
        OlibError::UpstreamParse {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        OlibError::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            OlibError::BadRequest { .. } => "bad_request",
            OlibError::NotFound { .. } => "not_found",
            OlibError::UpstreamUnavailable { .. } => "upstream_unavailable",
            OlibError::UpstreamParse { .. } => "upstream_parse_error",
            OlibError::Config { .. } => "config_error",
            OlibError::Internal { .. } => "internal_error",
        }
    }

    /// HTTP status code the server responds with.
    ///
    /// - 400: malformed request
    /// - 404: unknown route or resource
    /// - 502: upstream content changed shape
    /// - 503: upstream unreachable (retryable)
    /// - 500: everything else
    pub fn status_code(&self) -> u16 {
        match self {
            OlibError::BadRequest { .. } => 400,
            OlibError::NotFound { .. } => 404,
            OlibError::UpstreamParse { .. } => 502,
            OlibError::UpstreamUnavailable { .. } => 503,
            OlibError::Config { .. } | OlibError::Internal { .. } => 500,
        }
    }

    /// Check if this error should trigger a retry.
    ///
    /// Only transient upstream failures qualify. A parse error means the
    /// upstream markup changed and retrying would fail the same way.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OlibError::UpstreamUnavailable { .. })
    }
}
