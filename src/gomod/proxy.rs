//! Go module proxy relay.
//!
//! # Responsibilities
//! - Accept the module proxy protocol paths (`@v/list`, `@v/<v>.info`,
//!   `@v/<v>.mod`, `@v/<v>.zip`, `@latest`)
//! - Relay them to the configured upstream module proxy
//!
//! Anything else is rejected before a connection is made.

use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use url::Url;

use crate::config::GomodsConfig;
use crate::error::Error;
use crate::upstream::{ReverseProxy, UpstreamError};

const VERSION_FILES: [&str; 3] = [".info", ".mod", ".zip"];

/// Relay for module proxy requests.
#[derive(Debug, Clone)]
pub struct ModuleProxy {
    upstream: Url,
    proxy: ReverseProxy,
}

impl ModuleProxy {
    pub fn new(config: &GomodsConfig, timeout: Duration) -> Result<Self, Error> {
        let upstream = Url::parse(&config.upstream).map_err(|source| Error::InvalidTarget {
            target: config.upstream.clone(),
            source,
        })?;
        Ok(Self {
            upstream,
            proxy: ReverseProxy::new(timeout)?,
        })
    }

    /// Relay `request` for `path` upstream.
    pub async fn serve(&self, request: Request<Body>, path: &str) -> Result<Response, Error> {
        if !is_module_path(path) {
            return Err(UpstreamError::UnsupportedPath(path.to_string()).into());
        }
        tracing::debug!(path = %path, upstream = %self.upstream, "Relaying module request");
        Ok(self.proxy.forward(request, &self.upstream).await?)
    }
}

/// True for the paths of the module proxy protocol.
pub fn is_module_path(path: &str) -> bool {
    if let Some(module) = path.strip_suffix("/@latest") {
        return !module.trim_start_matches('/').is_empty();
    }
    let Some((module, file)) = path.rsplit_once("/@v/") else {
        return false;
    };
    if module.trim_start_matches('/').is_empty() {
        return false;
    }
    file == "list"
        || VERSION_FILES
            .iter()
            .any(|ext| file.strip_suffix(ext).is_some_and(|v| !v.is_empty() && !v.contains('/')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_paths() {
        assert!(is_module_path("/example.com/pkg/@v/list"));
        assert!(is_module_path("/example.com/pkg/@v/v1.2.3.info"));
        assert!(is_module_path("/example.com/pkg/@v/v1.2.3.mod"));
        assert!(is_module_path("/example.com/pkg/@v/v1.2.3.zip"));
        assert!(is_module_path("/example.com/pkg/@latest"));

        assert!(!is_module_path("/"));
        assert!(!is_module_path("/@latest"));
        assert!(!is_module_path("/example.com/pkg"));
        assert!(!is_module_path("/example.com/pkg/@v/.zip"));
        assert!(!is_module_path("/example.com/pkg/@v/v1.2.3.tar"));
    }

    #[tokio::test]
    async fn test_unsupported_path_is_rejected() {
        let proxy = ModuleProxy::new(&GomodsConfig::default(), Duration::from_secs(5)).unwrap();
        let request = Request::builder().uri("/readme").body(Body::empty()).unwrap();
        let result = proxy.serve(request, "/readme").await;
        assert!(matches!(
            result,
            Err(Error::Upstream(UpstreamError::UnsupportedPath(_)))
        ));
    }
}
