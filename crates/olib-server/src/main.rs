//! olib server - caching HTTP proxy for the Ollama model library.
//!
//! This binary serves the routes of `olib-core` over HTTP and keeps
//! responses in an in-memory cache shared by all clients.

mod handler;
mod response;
mod server;

use anyhow::Result;
use clap::Parser;
use olib_core::{LibraryProxy, ProxyConfig};
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "olib-server")]
#[command(about = "Caching proxy for the Ollama model library")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Base URL of the upstream library site
    #[arg(long, default_value = "https://ollama.com")]
    upstream_url: String,

    /// URL clients reach this proxy at (used on the landing page)
    #[arg(long)]
    public_url: Option<String>,

    /// Cache time-to-live in hours
    #[arg(long, default_value = "6")]
    ttl_hours: f64,

    /// Timeout for each upstream request in seconds
    #[arg(long, default_value = "15")]
    timeout_secs: u64,

    /// Interval of the expired-entry sweep in seconds (0 = disabled)
    #[arg(long, default_value = "600")]
    sweep_interval_secs: u64,

    /// Serve the HTML landing page at /
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    static_site: bool,
}

impl Args {
    fn proxy_config(&self) -> olib_core::Result<ProxyConfig> {
        let sweep = Some(Duration::from_secs(self.sweep_interval_secs)).filter(|d| !d.is_zero());
        let mut config = ProxyConfig::new()
            .with_upstream_base_url(self.upstream_url.clone())
            .with_ttl_hours(self.ttl_hours)?
            .with_request_timeout(Duration::from_secs(self.timeout_secs))
            .with_sweep_interval(sweep)
            .with_static_site(self.static_site);
        if let Some(url) = &self.public_url {
            config = config.with_public_base_url(url.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting olib server");

    let proxy = LibraryProxy::new(args.proxy_config()?)?;

    // Start the server
    let addr = server::start_server(proxy, &args.host, args.port).await?;

    // Machine-readable port line for supervisors and tests
    println!("LISTEN_PORT={}", addr.port());

    info!("olib server running on {}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
