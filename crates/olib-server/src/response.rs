//! HTTP responses for proxy results and errors.
//!
//! Successful bodies are already assembled by `olib-core`; this module adds
//! the cache headers. Errors share one JSON shape:
//! `{"error": {"kind", "message", "retryable"}}`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use olib_core::{OlibError, ProxyResponse};
use serde_json::json;

/// Seconds clients are asked to wait after a 503.
const RETRY_AFTER_SECS: u64 = 30;

/// `200 OK` with `X-Cache` and `Age` headers.
pub fn proxy_response(response: ProxyResponse) -> Response {
    let cache_status = if response.meta.cached { "HIT" } else { "MISS" };
    let age = response.meta.age_secs;

    let mut http = (StatusCode::OK, Json(response.body)).into_response();
    let headers = http.headers_mut();
    headers.insert("x-cache", HeaderValue::from_static(cache_status));
    headers.insert(header::AGE, HeaderValue::from(age));
    http
}

/// Error body with the status code of the error kind.
pub fn error_response(err: &OlibError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = error_body(err.kind(), &err.to_string(), err.is_retryable());

    let mut http = (status, Json(body)).into_response();
    if status == StatusCode::SERVICE_UNAVAILABLE {
        http.headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
    }
    http
}

/// `405` for anything other than GET and HEAD on library routes.
pub fn method_not_allowed(method: &str) -> Response {
    let body = error_body(
        "method_not_allowed",
        &format!("Method {} is not allowed, library routes are read-only", method),
        false,
    );
    let mut http = (StatusCode::METHOD_NOT_ALLOWED, Json(body)).into_response();
    http.headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
    http
}

fn error_body(kind: &str, message: &str, retryable: bool) -> serde_json::Value {
    json!({
        "error": {
            "kind": kind,
            "message": message,
            "retryable": retryable,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (OlibError::bad_request("empty tag"), StatusCode::BAD_REQUEST),
            (OlibError::not_found("no such model"), StatusCode::NOT_FOUND),
            (OlibError::parse("https://ollama.com/library", "no cards"), StatusCode::BAD_GATEWAY),
            (OlibError::unavailable("timed out"), StatusCode::SERVICE_UNAVAILABLE),
            (OlibError::internal("fetch task panicked"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(error_response(&err).status(), status, "{}", err.kind());
        }
    }

    #[test]
    fn test_retry_after_only_on_unavailable() {
        let unavailable = error_response(&OlibError::unavailable("timed out"));
        assert_eq!(unavailable.headers()[header::RETRY_AFTER], "30");

        let not_found = error_response(&OlibError::not_found("gone"));
        assert!(not_found.headers().get(header::RETRY_AFTER).is_none());
    }

    #[test]
    fn test_method_not_allowed() {
        let response = method_not_allowed("POST");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, HEAD");
    }
}
