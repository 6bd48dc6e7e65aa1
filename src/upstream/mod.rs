//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Request + target URL
//!     → proxy.rs (rewrite URL, strip hop-by-hop headers, stream body)
//!     → reqwest client (direct, or through the local SOCKS port in tor.rs)
//!     → upstream response streamed back to the client
//! ```
//!
//! # Design Decisions
//! - One pooled client per route kind, built at startup
//! - Upstream redirects are returned to the client, never followed
//! - Transport failures answer 502

pub mod proxy;
pub mod tor;

use axum::http::StatusCode;
use thiserror::Error;

pub use proxy::ReverseProxy;
pub use tor::AnonymizedProxy;

/// Upstream forwarding failures.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("could not build upstream client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("upstream request to {target} failed: {source}")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unsupported module proxy path `{0}`")]
    UnsupportedPath(String),

    #[error("could not build upstream response: {0}")]
    Response(#[from] axum::http::Error),
}

impl UpstreamError {
    /// The upstream could not be reached or did not answer in time.
    pub fn is_transport(&self) -> bool {
        matches!(self, UpstreamError::Transport { .. })
    }

    /// Status answered to the client for this failure.
    pub fn status(&self) -> StatusCode {
        if self.is_transport() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
