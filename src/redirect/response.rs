//! Redirect and not-found responses.

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Response;

use crate::error::Error;

/// `Cache-Control` max-age attached to permanent redirects (one week).
pub const STATUS_301_CACHE_AGE: u32 = 604_800;

/// Redirect to `location` with `code`.
///
/// GET and HEAD requests get a short HTML body naming the target. 301
/// responses carry the cache header.
pub fn redirect(method: &Method, location: &str, code: StatusCode) -> Result<Response, Error> {
    let mut builder = Response::builder()
        .status(code)
        .header(header::LOCATION, location);
    if code == StatusCode::MOVED_PERMANENTLY {
        builder = builder.header(header::CACHE_CONTROL, cache_control());
    }

    let body = if method == Method::GET || method == Method::HEAD {
        builder = builder.header(header::CONTENT_TYPE, "text/html; charset=utf-8");
        let reason = code.canonical_reason().unwrap_or("Redirect");
        Body::from(format!(
            "<a href=\"{}\">{reason}</a>.\n",
            escape_html(location)
        ))
    } else {
        Body::empty()
    };
    Ok(builder.body(body)?)
}

/// Redirect without content type or body.
pub fn bare_redirect(location: &str, code: StatusCode) -> Result<Response, Error> {
    Ok(Response::builder()
        .status(code)
        .header(header::LOCATION, location)
        .body(Body::empty())?)
}

/// Plain-text 404.
pub fn not_found() -> Response {
    let mut response = Response::new(Body::from("404 page not found\n"));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn cache_control() -> String {
    format!("max-age={STATUS_301_CACHE_AGE}")
}

/// Escape text for use inside HTML attributes and elements.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
