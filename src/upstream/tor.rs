//! Anonymized proxying through a local onion-routing SOCKS port.
//!
//! The onion router itself runs outside this process; only its SOCKS
//! listener on `127.0.0.1:<tor.port>` is used here.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use url::Url;

use crate::config::TorConfig;
use crate::error::Error;
use crate::record::Record;
use crate::upstream::{ReverseProxy, UpstreamError};

/// Reverse proxy whose connections leave through the SOCKS port.
#[derive(Debug, Clone)]
pub struct AnonymizedProxy {
    proxy: ReverseProxy,
    socks_addr: SocketAddr,
}

impl AnonymizedProxy {
    pub fn new(config: &TorConfig, timeout: Duration) -> Result<Self, UpstreamError> {
        let socks_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.port));
        Ok(Self {
            proxy: ReverseProxy::socks(socks_addr, timeout)?,
            socks_addr,
        })
    }

    pub fn socks_addr(&self) -> SocketAddr {
        self.socks_addr
    }

    /// Forward `request` to the record's target.
    pub async fn proxy(&self, request: Request<Body>, record: &Record) -> Result<Response, Error> {
        let target = Url::parse(&record.to).map_err(|source| Error::InvalidTarget {
            target: record.to.clone(),
            source,
        })?;
        tracing::debug!(target = %target, socks = %self.socks_addr, "Proxying through onion router");
        Ok(self.proxy.forward(request, &target).await?)
    }
}
