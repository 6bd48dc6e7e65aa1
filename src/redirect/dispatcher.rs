//! Per-request redirect state machine.
//!
//! # Responsibilities
//! - Resolve the root record for the request host
//! - Execute the behaviour of the record's type
//! - Route recoverable failures to the fallback policy
//! - Report every outcome to the metrics observer
//!
//! # Design Decisions
//! - One dispatch per request; records are never cached
//! - The request is borrowed mutably so a disabled type can hand it on
//!   untouched; proxy branches take the body only once they commit
//! - Types are matched exhaustively so a new type cannot be forgotten

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use url::Url;

use crate::config::schema::{DEFAULT_PROTOCOL, DEFAULT_SUB};
use crate::config::{Config, Feature};
use crate::dns::TxtResolver;
use crate::error::Error;
use crate::gomod::{self, ModuleProxy};
use crate::http::request::{request_host, strip_port};
use crate::observability::RedirectMetrics;
use crate::record::{has_placeholders, substitute, PlaceholderError, Record, RecordType};
use crate::redirect::fallback::FallbackTarget;
use crate::redirect::response;
use crate::registry;
use crate::routing::{resolve_root, walk};
use crate::upstream::{AnonymizedProxy, ReverseProxy};

/// Path answered with 404 before any lookup.
pub const FAVICON_PATH: &str = "/favicon.ico";

/// Resolves requests to redirect or proxy responses.
pub struct Redirector {
    pub(crate) config: Arc<Config>,
    resolver: Arc<dyn TxtResolver>,
    pub(crate) metrics: Arc<dyn RedirectMetrics>,
    proxy: ReverseProxy,
    tor: AnonymizedProxy,
    gomods: ModuleProxy,
}

impl Redirector {
    /// Create a redirector, building the upstream clients up front.
    pub fn new(
        config: Arc<Config>,
        resolver: Arc<dyn TxtResolver>,
        metrics: Arc<dyn RedirectMetrics>,
    ) -> Result<Self, Error> {
        let timeout = Duration::from_secs(config.timeouts.proxy_secs);
        Ok(Self {
            proxy: ReverseProxy::new(timeout)?,
            tor: AnonymizedProxy::new(&config.tor, timeout)?,
            gomods: ModuleProxy::new(&config.gomods, timeout)?,
            config,
            resolver,
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Answer `request`.
    ///
    /// [`Error::Disabled`] leaves the request untouched for the next
    /// handler. Other errors are hard failures.
    pub async fn redirect(&self, request: &mut Request<Body>) -> Result<Response, Error> {
        let host = request_host(request);
        let path = request.uri().path().to_string();
        self.metrics.request(&host);

        if path == FAVICON_PATH {
            self.metrics.status(&host, StatusCode::NOT_FOUND);
            return Ok(response::not_found());
        }

        let head = request_head(request);
        let record = match resolve_root(&host, &head, &self.config, self.resolver.as_ref()).await {
            Ok(record) => record,
            Err(Error::Lookup(e)) if e.is_not_found() => {
                tracing::debug!(host = %host, error = %e, "No record for host");
                return self.missing_record(request, &host, &path);
            }
            Err(e) => return Err(e),
        };
        self.metrics.record_type(&host, record.record_type);

        let (target, code) = base_target(&record, &head)?;
        let fallback = FallbackTarget {
            target,
            code,
            record_type: record.record_type,
        };

        if record.is_fallback_only() {
            return self.fallback(request, &host, &fallback);
        }

        if record.record_type == RecordType::Path {
            return self
                .dispatch_path(request, &head, &host, &record, &fallback)
                .await;
        }

        let import_path = strip_port(&host).to_string();
        self.dispatch(request, &head, &host, record, &import_path, &fallback)
            .await
    }

    /// The host has no record: default target, `www` subdomain, or 404.
    fn missing_record(
        &self,
        request: &Request<Body>,
        host: &str,
        path: &str,
    ) -> Result<Response, Error> {
        let location = match self.config.redirect.default_target() {
            Some(target) => target.to_string(),
            None if self.config.is_enabled(Feature::Www) => {
                format!("{DEFAULT_PROTOCOL}://{DEFAULT_SUB}.{host}")
            }
            None => {
                self.metrics.status(host, StatusCode::NOT_FOUND);
                return Ok(response::not_found());
            }
        };

        tracing::info!(status = 301, "{host}{path} > {location}");
        self.metrics.status(host, StatusCode::MOVED_PERMANENTLY);
        response::redirect(request.method(), &location, StatusCode::MOVED_PERMANENTLY)
    }

    async fn dispatch_path(
        &self,
        request: &mut Request<Body>,
        head: &Request<()>,
        host: &str,
        record: &Record,
        fallback: &FallbackTarget,
    ) -> Result<Response, Error> {
        let path = head.uri().path();
        if path == "/" {
            if record.root.is_empty() {
                return self.fallback(request, host, fallback);
            }
            return self.redirect_to(request, host, &record.root, record.code);
        }

        match walk(host, path, head, &self.config, self.resolver.as_ref()).await {
            Ok(found) => {
                self.metrics.path(host, &found.path);
                self.metrics.record_type(host, found.record.record_type);
                let import_path = format!("{}{}", strip_port(host), found.path);
                self.dispatch(request, head, host, found.record, &import_path, fallback)
                    .await
            }
            Err(e) => {
                tracing::info!(host = %host, path = %path, error = %e, "Fallback is triggered because an error has occurred");
                self.fallback(request, host, fallback)
            }
        }
    }

    /// Execute a record by its type.
    async fn dispatch(
        &self,
        request: &mut Request<Body>,
        head: &Request<()>,
        host: &str,
        record: Record,
        import_path: &str,
        fallback: &FallbackTarget,
    ) -> Result<Response, Error> {
        match record.record_type {
            RecordType::Host => match base_target(&record, head) {
                Ok((to, code)) if !to.is_empty() => self.redirect_to(request, host, &to, code),
                Ok(_) => {
                    tracing::info!(host = %host, "Record has no target, fallback triggered");
                    self.fallback(request, host, fallback)
                }
                Err(e) => {
                    tracing::info!(host = %host, error = %e, "Fallback is triggered because an error has occurred");
                    self.fallback(request, host, fallback)
                }
            },

            RecordType::Path => {
                tracing::info!(host = %host, "Nested path record, fallback triggered");
                self.fallback(request, host, fallback)
            }

            RecordType::Proxy => {
                let to = match base_target(&record, head) {
                    Ok((to, _)) => to,
                    Err(e) => {
                        tracing::info!(host = %host, error = %e, "Fallback is triggered because an error has occurred");
                        return self.fallback(request, host, fallback);
                    }
                };
                let target = Url::parse(&to).map_err(|source| Error::InvalidTarget {
                    target: to.clone(),
                    source,
                })?;
                tracing::info!(host = %host, from = %record.from, "{host} > {target} (proxy)");
                let result = self.proxy.forward(take_request(request), &target).await;
                self.proxied(host, result.map_err(Error::from))
            }

            RecordType::ContainerRegistry => {
                if !registry::is_container_client(head) {
                    tracing::info!(host = %host, "The request is not from docker client, fallback triggered");
                    return self.fallback(request, host, fallback);
                }
                match registry::redirect_registry(head, &record) {
                    Ok(response) => {
                        self.metrics.status(host, response.status());
                        Ok(response)
                    }
                    Err(e) => {
                        tracing::warn!(host = %host, error = %e, "Couldn't redirect to the requested container");
                        self.fallback(request, host, fallback)
                    }
                }
            }

            RecordType::ModuleMetadata => {
                let response = gomod::render(&record, import_path)?;
                self.metrics.status(host, response.status());
                Ok(response)
            }

            RecordType::ModuleProxy => {
                let result = self.gomods.serve(take_request(request), head.uri().path()).await;
                self.proxied(host, result)
            }

            RecordType::AnonymizedProxy => {
                let result = self.tor.proxy(take_request(request), &record).await;
                self.proxied(host, result)
            }
        }
    }

    /// Record the status of a proxied exchange.
    ///
    /// Transport failures become a 502 response; other errors surface.
    fn proxied(&self, host: &str, result: Result<Response, Error>) -> Result<Response, Error> {
        match result {
            Ok(response) => {
                self.metrics.status(host, response.status());
                Ok(response)
            }
            Err(Error::Upstream(e)) if e.is_transport() => {
                tracing::warn!(host = %host, error = %e, "Upstream request failed");
                self.metrics.status(host, StatusCode::BAD_GATEWAY);
                Ok((StatusCode::BAD_GATEWAY, "Upstream request failed").into_response())
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) fn redirect_to(
        &self,
        request: &Request<Body>,
        host: &str,
        location: &str,
        code: StatusCode,
    ) -> Result<Response, Error> {
        tracing::info!(status = code.as_u16(), "{host}{} > {location}", request.uri().path());
        let response = response::redirect(request.method(), location, code)?;
        self.metrics.status(host, code);
        Ok(response)
    }
}

/// Target and status of a record, resolving placeholders left in `to=`.
pub fn base_target<B>(
    record: &Record,
    request: &Request<B>,
) -> Result<(String, StatusCode), PlaceholderError> {
    let to = if has_placeholders(&record.to) {
        substitute(&record.to, request)?
    } else {
        record.to.clone()
    };
    Ok((to, record.code))
}

/// Copy of the request line and headers.
///
/// The body type is not `Sync`, so lookups borrow this copy instead of the
/// request itself.
fn request_head(request: &Request<Body>) -> Request<()> {
    let mut head = Request::new(());
    *head.method_mut() = request.method().clone();
    *head.uri_mut() = request.uri().clone();
    *head.version_mut() = request.version();
    *head.headers_mut() = request.headers().clone();
    head
}

/// Move the request out, leaving an empty body behind.
fn take_request(request: &mut Request<Body>) -> Request<Body> {
    let body = std::mem::take(request.body_mut());
    let (mut parts, ()) = request_head(request).into_parts();
    parts.extensions = request.extensions().clone();
    Request::from_parts(parts, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_target_without_placeholders() {
        let record = Record {
            to: "https://example.com/a".into(),
            code: StatusCode::MOVED_PERMANENTLY,
            ..Default::default()
        };
        let request = Request::builder().uri("/").body(()).unwrap();
        assert_eq!(
            base_target(&record, &request).unwrap(),
            ("https://example.com/a".to_string(), StatusCode::MOVED_PERMANENTLY)
        );
    }

    #[test]
    fn test_base_target_resolves_leftover_placeholders() {
        let record = Record {
            to: "https://example.com/{method}".into(),
            ..Default::default()
        };
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .body(())
            .unwrap();
        assert_eq!(
            base_target(&record, &request).unwrap().0,
            "https://example.com/POST"
        );
    }

    #[test]
    fn test_take_request_keeps_head() {
        let mut request = Request::builder()
            .method("PUT")
            .uri("http://example.com/upload?x=1")
            .header("x-test", "1")
            .body(Body::from("payload"))
            .unwrap();
        let taken = take_request(&mut request);
        assert_eq!(taken.method(), "PUT");
        assert_eq!(taken.uri(), "http://example.com/upload?x=1");
        assert_eq!(taken.headers()["x-test"], "1");
    }
}
