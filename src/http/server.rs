//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the redirect middleware
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve plain HTTP or TLS on the configured listener
//! - Stop accepting and drain on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{Config, TlsConfig};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::lifecycle::Shutdown;
use crate::net::load_tls_config;
use crate::redirect::Redirector;

/// Time allowed for in-flight TLS connections after shutdown.
const TLS_DRAIN_GRACE: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub redirector: Arc<Redirector>,
}

/// HTTP server for the redirector.
pub struct HttpServer {
    router: Router,
    config: Arc<Config>,
}

impl HttpServer {
    /// Create a new HTTP server around `redirector`.
    pub fn new(redirector: Arc<Redirector>) -> Self {
        let config = Arc::clone(&redirector.config);
        let router = Self::build_router(&config, AppState { redirector });
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &Config, state: AppState) -> Router {
        Router::new()
            .fallback(no_handler)
            .layer(middleware::from_fn_with_state(state, redirect_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        request_id = %request.request_id(),
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                }),
            )
            .layer(set_request_id_layer())
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.signalled())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: &TlsConfig,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let rustls = load_tls_config(tls).await?;
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        let signalled = shutdown.signalled();
        tokio::spawn(async move {
            signalled.await;
            drain.graceful_shutdown(Some(TLS_DRAIN_GRACE));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Runs the redirector; disabled record types fall through to `next`.
async fn redirect_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match state.redirector.redirect(&mut request).await {
        Ok(response) => response,
        Err(e) if e.is_disabled() => {
            tracing::debug!(reason = %e, "Passing request to next handler");
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Answer for requests nothing else handled.
async fn no_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 page not found\n")
}
