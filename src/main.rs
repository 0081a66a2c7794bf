//! Path-embedded HTTP forward proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────┐
//!                          │                 FORWARD PROXY                │
//!  GET /proxy/<url>        │  ┌─────────┐   ┌──────────┐   ┌───────────┐  │
//!  ────────────────────────┼─▶│  http   │──▶│ resolve  │──▶│  forward  │──┼──▶ Origin
//!                          │  │ server  │   │TargetUrl │   │  engine   │  │
//!                          │  └─────────┘   └──────────┘   └─────┬─────┘  │
//!                          │                                     │        │
//!  ◀───────────────────────┼─── filtered headers, rewritten ─────┘        │
//!   streamed response      │    Location, bounded-chunk body              │
//!                          │                                              │
//!                          │  config · observability · lifecycle · net    │
//!                          └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use forward_proxy::config::{load_config, ProxyConfig};
use forward_proxy::lifecycle::signals::spawn_signal_listener;
use forward_proxy::lifecycle::Shutdown;
use forward_proxy::observability::{logging, metrics};
use forward_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "forward-proxy")]
#[command(about = "HTTP forward proxy for targets embedded in the request path", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);

    tracing::info!("forward-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        route_prefix = %config.forwarding.route_prefix,
        access_mode = ?config.forwarding.access_mode,
        timeout_secs = config.forwarding.timeout_secs,
        chunk_size = config.forwarding.chunk_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let addr: SocketAddr = config.listener.bind_address.parse()?;
    let tls = config.listener.tls.clone();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config)?;
    spawn_signal_listener(shutdown);

    match tls {
        Some(tls) => server.run_tls(addr, &tls, server_shutdown).await?,
        None => {
            let listener = TcpListener::bind(addr).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, server_shutdown).await?
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
