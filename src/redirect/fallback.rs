//! Fallback policy.
//!
//! Applied whenever a record cannot be served:
//! 1. the record's own target, with the record's code
//! 2. the configured default target as a bare 403, when `www` is enabled
//! 3. 404

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;

use crate::config::Feature;
use crate::error::Error;
use crate::observability::FallbackKind;
use crate::record::RecordType;
use crate::redirect::dispatcher::Redirector;
use crate::redirect::response;

/// Where a failed request goes, computed from the root record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackTarget {
    pub target: String,
    pub code: StatusCode,
    pub record_type: RecordType,
}

impl Redirector {
    /// Answer `request` through the fallback policy.
    pub fn fallback(
        &self,
        request: &Request<Body>,
        host: &str,
        fallback: &FallbackTarget,
    ) -> Result<Response, Error> {
        let path = request.uri().path();

        let (kind, status, response) = if !fallback.target.is_empty() {
            tracing::info!(status = fallback.code.as_u16(), "{host}{path} > {}", fallback.target);
            let response = response::redirect(request.method(), &fallback.target, fallback.code)?;
            (FallbackKind::To, fallback.code, response)
        } else if let Some(default) = self
            .config
            .redirect
            .default_target()
            .filter(|_| self.config.is_enabled(Feature::Www))
        {
            tracing::info!(status = 403, "{host}{path} > {default}");
            let response = response::bare_redirect(default, StatusCode::FORBIDDEN)?;
            (FallbackKind::Default, StatusCode::FORBIDDEN, response)
        } else {
            (FallbackKind::NotFound, StatusCode::NOT_FOUND, response::not_found())
        };

        self.metrics.status(host, status);
        self.metrics.fallback(host, fallback.record_type, kind);
        Ok(response)
    }
}
