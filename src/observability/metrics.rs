//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define the redirect metrics observer used by the dispatcher
//! - Record counters through the `metrics` facade
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `txtdirect_redirect_count_total` (counter): requests by host
//! - `txtdirect_redirect_status_count_total` (counter): responses by host, status
//! - `txtdirect_redirect_type_count_total` (counter): resolved records by host, type
//! - `txtdirect_fallback_type_count_total` (counter): fallbacks by host, type, fallback
//! - `txtdirect_redirect_path_count_total` (counter): whitelisted paths by host, path
//!
//! # Design Decisions
//! - The dispatcher only sees the [`RedirectMetrics`] trait
//! - Counter updates are atomic increments, no locks on the request path
//! - The scrape endpoint runs on its own listener, apart from redirect traffic

use std::collections::HashSet;

use axum::http::StatusCode;
use axum::routing::get;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;

use crate::config::PrometheusConfig;
use crate::lifecycle::Shutdown;
use crate::record::RecordType;

pub const REQUESTS_TOTAL: &str = "txtdirect_redirect_count_total";
pub const STATUS_TOTAL: &str = "txtdirect_redirect_status_count_total";
pub const TYPE_TOTAL: &str = "txtdirect_redirect_type_count_total";
pub const FALLBACK_TOTAL: &str = "txtdirect_fallback_type_count_total";
pub const PATH_TOTAL: &str = "txtdirect_redirect_path_count_total";

/// Which branch of the fallback policy answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackKind {
    /// Redirect to the record's own target.
    To,
    /// Redirect to the configured default target.
    Default,
    /// Nothing to redirect to.
    NotFound,
}

impl FallbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackKind::To => "to",
            FallbackKind::Default => "default",
            FallbackKind::NotFound => "not-found",
        }
    }
}

/// Observer notified by the dispatcher.
pub trait RedirectMetrics: Send + Sync {
    fn request(&self, host: &str);
    fn status(&self, host: &str, status: StatusCode);
    fn record_type(&self, host: &str, record_type: RecordType);
    fn fallback(&self, host: &str, record_type: RecordType, kind: FallbackKind);
    fn path(&self, host: &str, path: &str);
}

/// Discards every observation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl RedirectMetrics for NoopMetrics {
    fn request(&self, _host: &str) {}
    fn status(&self, _host: &str, _status: StatusCode) {}
    fn record_type(&self, _host: &str, _record_type: RecordType) {}
    fn fallback(&self, _host: &str, _record_type: RecordType, _kind: FallbackKind) {}
    fn path(&self, _host: &str, _path: &str) {}
}

/// Counters recorded through the global `metrics` recorder.
#[derive(Debug, Default, Clone)]
pub struct PrometheusMetrics {
    path_whitelist: HashSet<String>,
}

impl PrometheusMetrics {
    pub fn new(config: &PrometheusConfig) -> Self {
        Self {
            path_whitelist: config.path_whitelist.iter().cloned().collect(),
        }
    }
}

impl RedirectMetrics for PrometheusMetrics {
    fn request(&self, host: &str) {
        metrics::counter!(REQUESTS_TOTAL, "host" => host.to_string()).increment(1);
    }

    fn status(&self, host: &str, status: StatusCode) {
        metrics::counter!(
            STATUS_TOTAL,
            "host" => host.to_string(),
            "status" => status.as_u16().to_string()
        )
        .increment(1);
    }

    fn record_type(&self, host: &str, record_type: RecordType) {
        metrics::counter!(
            TYPE_TOTAL,
            "host" => host.to_string(),
            "type" => record_type.as_str()
        )
        .increment(1);
    }

    fn fallback(&self, host: &str, record_type: RecordType, kind: FallbackKind) {
        metrics::counter!(
            FALLBACK_TOTAL,
            "host" => host.to_string(),
            "type" => record_type.as_str(),
            "fallback" => kind.as_str()
        )
        .increment(1);
    }

    fn path(&self, host: &str, path: &str) {
        if !self.path_whitelist.contains(path) {
            return;
        }
        metrics::counter!(
            PATH_TOTAL,
            "host" => host.to_string(),
            "path" => path.to_string()
        )
        .increment(1);
    }
}

/// Install the Prometheus recorder and serve it on `config.address`.
///
/// The returned task stops when `shutdown` fires.
pub async fn init_metrics(
    config: &PrometheusConfig,
    shutdown: &Shutdown,
) -> Result<tokio::task::JoinHandle<()>, Box<dyn std::error::Error + Send + Sync>> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    let listener = TcpListener::bind(&config.address).await?;

    tracing::info!(
        address = %listener.local_addr()?,
        path = %config.path,
        "Metrics endpoint listening"
    );

    let app = metrics_router(&config.path, handle);
    let mut rx = shutdown.subscribe();
    Ok(tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.recv().await;
            })
            .await;
        if let Err(e) = result {
            tracing::error!(error = %e, "Metrics endpoint failed");
        }
    }))
}

fn metrics_router(path: &str, handle: PrometheusHandle) -> axum::Router {
    axum::Router::new().route(path, get(move || std::future::ready(handle.render())))
}
