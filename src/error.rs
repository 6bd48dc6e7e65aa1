//! Crate-level error type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::dns::LookupError;
use crate::record::{GrammarError, PlaceholderError, RecordType};
use crate::upstream::UpstreamError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while resolving and dispatching a request.
#[derive(Debug, Error)]
pub enum Error {
    /// The record's type is not enabled. Not a failure: the request belongs
    /// to whatever handles requests after the redirector.
    #[error("{0} type is not enabled in configuration")]
    Disabled(RecordType),

    #[error("could not parse record: {0}")]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("invalid target `{target}`: {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("could not build response: {0}")]
    Response(#[from] axum::http::Error),
}

impl Error {
    /// Status answered for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Disabled(_) => StatusCode::NOT_FOUND,
            Error::Upstream(e) => e.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for the pass-through sentinel.
    pub fn is_disabled(&self) -> bool {
        matches!(self, Error::Disabled(_))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_disabled() {
            return (status, "Not Found").into_response();
        }
        tracing::error!(error = %self, status = status.as_u16(), "Redirect failed");
        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason).into_response()
    }
}
