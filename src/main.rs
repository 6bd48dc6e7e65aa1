//! txtdirect: redirects driven by DNS TXT records.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                    TXTDIRECT                     │
//!                      │                                                  │
//!  Client Request      │  ┌─────────┐   ┌────────────┐   ┌────────────┐  │
//!  ────────────────────┼─▶│  http   │──▶│  redirect  │──▶│  routing   │  │
//!                      │  │ server  │   │ dispatcher │   │ root/walk  │  │
//!                      │  └─────────┘   └─────┬──────┘   └─────┬──────┘  │
//!                      │                      │                │         │
//!                      │                      ▼                ▼         │
//!                      │  ┌────────────────────────┐   ┌────────────┐    │
//!  Client Response     │  │ registry │ gomod │     │   │ dns + TXT  │◀───┼──── DNS
//!  ◀───────────────────┼──│ upstream (proxy, tor)  │   │ record     │    │
//!                      │  └────────────────────────┘   └────────────┘    │
//!                      │                                                  │
//!                      │  config · observability · lifecycle · net (TLS)  │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use txtdirect::config::{load_config, Config};
use txtdirect::dns::HickoryTxtResolver;
use txtdirect::lifecycle::{spawn_signal_listener, Shutdown};
use txtdirect::observability::metrics::init_metrics;
use txtdirect::observability::{init_logging, NoopMetrics, PrometheusMetrics, RedirectMetrics};
use txtdirect::{HttpServer, Redirector};

#[derive(Parser)]
#[command(name = "txtdirect")]
#[command(about = "Redirect HTTP requests using DNS TXT records", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults apply when omitted.
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
        None => Config::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability)?;
    tracing::info!("txtdirect v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        features = ?config.redirect.enabled(),
        resolver = config.redirect.resolver.as_deref().unwrap_or("system"),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    if config.tor.data_dir.is_some() || config.tor.torrc.is_some() {
        tracing::warn!(
            port = config.tor.port,
            "The onion router is not started by txtdirect; data_dir and torrc are ignored"
        );
    }

    let shutdown = Shutdown::new();
    spawn_signal_listener(&shutdown);

    let metrics: Arc<dyn RedirectMetrics> = if config.prometheus.enable {
        let _exporter = init_metrics(&config.prometheus, &shutdown)
            .await
            .map_err(|e| e as Box<dyn std::error::Error>)?;
        Arc::new(PrometheusMetrics::new(&config.prometheus))
    } else {
        Arc::new(NoopMetrics)
    };

    let resolver = Arc::new(HickoryTxtResolver::from_config(
        config.redirect.resolver.as_deref(),
    )?);

    let config = Arc::new(config);
    let redirector = Arc::new(Redirector::new(Arc::clone(&config), resolver, metrics)?);
    let server = HttpServer::new(redirector);

    match &config.listener.tls {
        Some(tls) => {
            let addr: SocketAddr = config.listener.bind_address.parse()?;
            server.run_tls(addr, tls, shutdown).await?;
        }
        None => {
            let listener = TcpListener::bind(&config.listener.bind_address).await?;
            server.run(listener, shutdown).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
