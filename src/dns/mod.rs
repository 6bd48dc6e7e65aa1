//! DNS resolution subsystem.
//!
//! # Data Flow
//! ```text
//! host ("docs.example.com:443")
//!     → zone.rs (strip port, prefix "_redirect", make absolute)
//!     → TxtResolver (hickory in production, static map in tests)
//!     → Vec<String> (one entry per TXT resource record)
//! ```
//!
//! # Design Decisions
//! - The resolver is a trait object so tests can serve records from memory
//! - "No such host" is a distinct error; callers fall back on it
//! - Lookups are plain futures: dropping the request cancels them

pub mod resolver;
pub mod zone;

use async_trait::async_trait;
use thiserror::Error;

pub use resolver::HickoryTxtResolver;
pub use zone::{lookup_zone, path_zone, wildcard_host, BASE_ZONE, WILDCARD_LABEL};

/// DNS lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The zone does not exist or holds no TXT records.
    #[error("could not get TXT record for {zone}: no such host")]
    NotFound { zone: String },

    /// Any other resolver failure (timeout, SERVFAIL, network).
    #[error("could not get TXT record for {zone}: {reason}")]
    Failed { zone: String, reason: String },

    /// The zone answered with other than exactly one TXT record.
    #[error("could not parse TXT record with {count} records")]
    RecordCount { count: usize },
}

impl LookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound { .. })
    }
}

/// Source of TXT answers for absolute zone names.
#[async_trait]
pub trait TxtResolver: Send + Sync {
    async fn lookup_txt(&self, zone: &str) -> Result<Vec<String>, LookupError>;
}

/// Look up the TXT answers for `host`.
pub async fn query(host: &str, resolver: &dyn TxtResolver) -> Result<Vec<String>, LookupError> {
    let zone = lookup_zone(host);
    resolver.lookup_txt(&zone).await
}
