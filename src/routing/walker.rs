//! Path zone walker.
//!
//! # Responsibilities
//! - Turn URL path segments into zones below the request host
//! - Resolve from the most specific zone towards the host
//! - Report the first record that resolves
//!
//! # Design Decisions
//! - Failed or missing zones move one segment up; a broken record stops the walk
//! - Empty path segments are ignored (`/a//b` walks like `/a/b`)

use axum::http::Request;

use crate::config::Config;
use crate::dns::{path_zone, LookupError, TxtResolver};
use crate::error::Error;
use crate::http::request::strip_port;
use crate::record::Record;
use crate::routing::root::resolve_root;

/// The record found for a request path.
#[derive(Debug, Clone)]
pub struct PathMatch {
    pub record: Record,
    /// Path prefix whose zone answered, e.g. `/docs/api`.
    pub path: String,
}

/// Walk the zones for `path` below `host`.
pub async fn walk<B>(
    host: &str,
    path: &str,
    request: &Request<B>,
    config: &Config,
    resolver: &dyn TxtResolver,
) -> Result<PathMatch, Error> {
    let host = strip_port(host);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let mut last_error = LookupError::NotFound {
        zone: host.to_string(),
    };
    for depth in (1..=segments.len()).rev() {
        let zone = path_zone(host, &segments[..depth]);
        match resolve_root(&zone, request, config, resolver).await {
            Ok(record) => {
                tracing::debug!(zone = %zone, "Path record resolved");
                return Ok(PathMatch {
                    record,
                    path: format!("/{}", segments[..depth].join("/")),
                });
            }
            Err(Error::Lookup(e)) => {
                tracing::debug!(zone = %zone, error = %e, "No record for path zone");
                last_error = e;
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.into())
}
