//! HTTP server implementation using Axum.

use crate::handler::{handle_health, handle_index, handle_library};
use axum::{routing::get, Router};
use olib_core::LibraryProxy;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    /// Routing, cache and upstream access
    pub proxy: LibraryProxy,
}

/// Build the application router.
///
/// Everything that is not `/` or `/health` is a library route and is
/// validated by the proxy.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Read-only API, open to any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .fallback(handle_library)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server and the cache sweeper.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(proxy: LibraryProxy, host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    if proxy.spawn_sweeper().is_some() {
        info!("Cache sweeper started");
    }

    let app = build_router(Arc::new(AppState { proxy }));

    // Parse the address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    // Bind to the address
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    // Spawn the server in the background
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}
