//! Single-host reverse proxy.
//!
//! # Responsibilities
//! - Rewrite the request URL onto the target (path joined, query merged)
//! - Drop hop-by-hop headers in both directions
//! - Append the client address to `X-Forwarded-For`
//! - Stream request and response bodies without buffering

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::{Body, HttpBody};
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Uri};
use axum::response::Response;
use url::Url;

use crate::http::request::request_host;
use crate::upstream::UpstreamError;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Forwards requests to a single target URL.
#[derive(Debug, Clone)]
pub struct ReverseProxy {
    client: reqwest::Client,
}

impl ReverseProxy {
    /// Direct connections to the target.
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        Self::from_builder(reqwest::Client::builder().timeout(timeout).no_proxy())
    }

    /// Connections tunnelled through a SOCKS5 proxy.
    ///
    /// Names are resolved by the proxy (`socks5h`).
    pub fn socks(proxy_addr: SocketAddr, timeout: Duration) -> Result<Self, UpstreamError> {
        let proxy = reqwest::Proxy::all(format!("socks5h://{proxy_addr}"))
            .map_err(UpstreamError::Client)?;
        Self::from_builder(reqwest::Client::builder().timeout(timeout).proxy(proxy))
    }

    fn from_builder(builder: reqwest::ClientBuilder) -> Result<Self, UpstreamError> {
        let client = builder
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(UpstreamError::Client)?;
        Ok(Self { client })
    }

    /// Forward `request` to `target` and stream the answer back.
    pub async fn forward(
        &self,
        request: Request<Body>,
        target: &Url,
    ) -> Result<Response, UpstreamError> {
        let url = upstream_url(target, request.uri());
        let headers = forwarded_headers(&request);
        let (parts, body) = request.into_parts();
        // HTTP/2 bodies may arrive without any length header.
        let has_body = !body.is_end_stream();

        tracing::debug!(url = %url, method = %parts.method, "Forwarding request upstream");

        let mut outbound = self
            .client
            .request(parts.method, url.clone())
            .headers(headers);
        if has_body {
            outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = outbound
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                target: url.to_string(),
                source,
            })?;

        let mut builder = Response::builder().status(upstream.status());
        if let Some(headers) = builder.headers_mut() {
            for (name, value) in upstream.headers() {
                if !HOP_BY_HOP.contains(name) {
                    headers.append(name.clone(), value.clone());
                }
            }
        }
        Ok(builder.body(Body::from_stream(upstream.bytes_stream()))?)
    }
}

/// Target URL with the request path joined and the queries merged.
pub fn upstream_url(target: &Url, uri: &Uri) -> Url {
    let mut url = target.clone();
    url.set_path(&join_paths(target.path(), uri.path()));

    let query = match (target.query().filter(|q| !q.is_empty()), uri.query()) {
        (Some(a), Some(b)) => Some(format!("{a}&{b}")),
        (Some(a), None) => Some(a.to_string()),
        (None, Some(b)) => Some(b.to_string()),
        (None, None) => None,
    };
    url.set_query(query.as_deref());
    url
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

fn forwarded_headers(request: &Request<Body>) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(request.headers().len() + 2);
    for (name, value) in request.headers() {
        if !HOP_BY_HOP.contains(name) && *name != header::HOST {
            headers.append(name.clone(), value.clone());
        }
    }

    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        let client_ip = addr.ip().to_string();
        let value = match request
            .headers()
            .get(&X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
        {
            Some(prior) => format!("{prior}, {client_ip}"),
            None => client_ip,
        };
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }

    if let Ok(host) = HeaderValue::from_str(&request_host(request)) {
        if !host.is_empty() {
            headers.insert(X_FORWARDED_HOST, host);
        }
    }
    headers
}
