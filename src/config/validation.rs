//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs before the server starts
//! - Reject contradictory feature lists
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Config → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::Config;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("`enable` and `disable` cannot both be set")]
    EnableAndDisable,

    #[error("resolver `{0}` is not a socket address")]
    InvalidResolver(String),

    #[error("default redirect `{0}` is not a valid URL")]
    InvalidDefaultRedirect(String),

    #[error("bind address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("prometheus address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("prometheus path `{0}` must start with '/'")]
    InvalidMetricsPath(String),

    #[error("tor port must be non-zero")]
    InvalidTorPort,

    #[error("gomods upstream `{0}` is not a valid URL")]
    InvalidGomodsUpstream(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.redirect.enable.is_some() && config.redirect.disable.is_some() {
        errors.push(ValidationError::EnableAndDisable);
    }

    if let Some(resolver) = &config.redirect.resolver {
        if resolver.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidResolver(resolver.clone()));
        }
    }

    if let Some(target) = config.redirect.default_target() {
        if Url::parse(target).is_err() {
            errors.push(ValidationError::InvalidDefaultRedirect(target.to_string()));
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.prometheus.enable && config.prometheus.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.prometheus.address.clone(),
        ));
    }

    if config.prometheus.enable && !config.prometheus.path.starts_with('/') {
        errors.push(ValidationError::InvalidMetricsPath(
            config.prometheus.path.clone(),
        ));
    }

    if config.tor.enable && config.tor.port == 0 {
        errors.push(ValidationError::InvalidTorPort);
    }

    if config.gomods.enable && Url::parse(&config.gomods.upstream).is_err() {
        errors.push(ValidationError::InvalidGomodsUpstream(
            config.gomods.upstream.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 || config.timeouts.proxy_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Feature;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = Config::default();
        config.redirect.enable = Some([Feature::Host].into_iter().collect());
        config.redirect.disable = Some([Feature::Www].into_iter().collect());
        config.redirect.resolver = Some("not-an-address".into());
        config.redirect.default_redirect = Some("::nope".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::EnableAndDisable));
        assert!(errors.contains(&ValidationError::InvalidResolver("not-an-address".into())));
    }

    #[test]
    fn test_prometheus_checked_only_when_enabled() {
        let mut config = Config::default();
        config.prometheus.address = "localhost".into();
        config.prometheus.path = "metrics".into();
        assert!(validate_config(&config).is_ok());

        config.prometheus.enable = true;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![
                ValidationError::InvalidMetricsAddress("localhost".into()),
                ValidationError::InvalidMetricsPath("metrics".into()),
            ]
        );
    }

    #[test]
    fn test_tor_port_checked_only_when_enabled() {
        let mut config = Config::default();
        config.tor.port = 0;
        assert!(validate_config(&config).is_ok());

        config.tor.enable = true;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::InvalidTorPort]
        );
    }
}
