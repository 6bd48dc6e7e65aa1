//! Root record resolution with the wildcard retry.

use axum::http::Request;

use crate::config::Config;
use crate::dns::{query, wildcard_host, LookupError, TxtResolver};
use crate::error::Error;
use crate::record::Record;

/// Look up `host`, retrying exactly once under the wildcard name.
///
/// The retry happens when the direct lookup fails or its first answer is
/// empty. A failing wildcard lookup is final.
pub async fn lookup_with_wildcard(
    host: &str,
    resolver: &dyn TxtResolver,
) -> Result<Vec<String>, LookupError> {
    match query(host, resolver).await {
        Ok(answers) if answers.first().is_some_and(|a| !a.is_empty()) => return Ok(answers),
        Ok(_) => tracing::debug!(host = %host, "Empty TXT answer, trying wildcard"),
        Err(e) => tracing::debug!(host = %host, error = %e, "Initial DNS query failed"),
    }

    let wildcard = wildcard_host(host);
    query(&wildcard, resolver).await.map_err(|e| {
        tracing::debug!(host = %wildcard, error = %e, "Wildcard DNS query failed");
        e
    })
}

/// Resolve and parse the single record published for `host`.
pub async fn resolve_root<B>(
    host: &str,
    request: &Request<B>,
    config: &Config,
    resolver: &dyn TxtResolver,
) -> Result<Record, Error> {
    let answers = lookup_with_wildcard(host, resolver).await?;
    match answers.as_slice() {
        [answer] => Record::parse(answer, request, config),
        _ => Err(LookupError::RecordCount {
            count: answers.len(),
        }
        .into()),
    }
}
