//! HTTP request handlers.

use crate::response::{error_response, method_not_allowed, proxy_response};
use crate::server::AppState;
use axum::{
    extract::State,
    http::{Method, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use olib_core::OlibError;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Health check with cache statistics.
pub async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({"status": "ok", "cache": state.proxy.stats()}))
}

/// Landing page, or `404` when the static site is disabled.
pub async fn handle_index(State(state): State<Arc<AppState>>) -> Response {
    let config = state.proxy.config();
    if !config.static_site {
        return error_response(&OlibError::not_found("no route for '/'"));
    }
    Html(landing_page(config.public_root())).into_response()
}

/// Every library route: listings, search, model pages, tags and blobs.
pub async fn handle_library(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return method_not_allowed(method.as_str());
    }

    debug!("{} {}", method, uri);
    match state.proxy.handle(uri.path(), uri.query()).await {
        Ok(response) => proxy_response(response),
        Err(err) => error_response(&err),
    }
}

const ENDPOINTS: &[(&str, &str)] = &[
    ("/library?o=popular", "Models in the official library"),
    ("/library?o=newest&c=vision", "Newest vision models"),
    ("/search?q=llama", "Search the library"),
    ("/library/llama3", "Model details"),
    ("/library/llama3:8b", "Details of one tag"),
    ("/library/llama3/tags", "All tags of a model"),
    ("/library/llama3:8b/blobs/model", "GGUF metadata of a tag"),
    ("/library/llama3:8b/blobs/params", "Default parameters of a tag"),
    ("/health", "Health and cache statistics"),
];

fn landing_page(root: &str) -> String {
    let rows: String = ENDPOINTS
        .iter()
        .map(|(path, what)| {
            format!(
                "<li><a href=\"{root}{path}\"><code>{path}</code></a> {what}</li>",
                path = path.replace('&', "&amp;"),
            )
        })
        .collect();
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>olib</title></head>\
         <body><h1>olib</h1><p>Cached JSON for the Ollama model library.</p>\
         <ul>{rows}</ul></body></html>\n"
    )
}
