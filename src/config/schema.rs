//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the redirector.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::record::RecordType;

/// Scheme used when redirecting to the default `www` subdomain.
pub const DEFAULT_PROTOCOL: &str = "https";

/// Subdomain used by the `www` feature.
pub const DEFAULT_SUB: &str = "www";

/// Root configuration for the redirector.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    /// Feature switches and resolution settings.
    pub redirect: RedirectConfig,

    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// Prometheus metrics settings.
    pub prometheus: PrometheusConfig,

    /// Onion service proxy settings.
    pub tor: TorConfig,

    /// Go module proxy settings.
    pub gomods: GomodsConfig,
}

impl Config {
    /// Returns true if the given feature is enabled.
    ///
    /// `[tor] enable` and `[gomods] enable` switch on their record types in
    /// addition to the `[redirect]` lists.
    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::AnonymizedProxy if self.tor.enable => true,
            Feature::ModuleProxy if self.gomods.enable => true,
            _ => self.redirect.contains(feature),
        }
    }

    /// Returns true if records of the given type may be served.
    pub fn is_type_enabled(&self, record_type: RecordType) -> bool {
        self.is_enabled(Feature::from(record_type))
    }
}

/// A feature that can be switched on or off in `[redirect]`.
///
/// Every record type is a feature; `www` is the only feature without a
/// record type behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    Host,
    Path,
    #[serde(alias = "gometa")]
    ModuleMetadata,
    Www,
    #[serde(alias = "gomods")]
    ModuleProxy,
    #[serde(alias = "dockerv2")]
    ContainerRegistry,
    Proxy,
    #[serde(alias = "torproxy")]
    AnonymizedProxy,
}

impl Feature {
    /// Features enabled when the config names neither `enable` nor `disable`.
    pub const DEFAULTS: [Feature; 4] = [
        Feature::Host,
        Feature::Path,
        Feature::ModuleMetadata,
        Feature::Www,
    ];
}

impl From<RecordType> for Feature {
    fn from(record_type: RecordType) -> Self {
        match record_type {
            RecordType::Host => Feature::Host,
            RecordType::Path => Feature::Path,
            RecordType::Proxy => Feature::Proxy,
            RecordType::ContainerRegistry => Feature::ContainerRegistry,
            RecordType::ModuleMetadata => Feature::ModuleMetadata,
            RecordType::ModuleProxy => Feature::ModuleProxy,
            RecordType::AnonymizedProxy => Feature::AnonymizedProxy,
        }
    }
}

/// Redirect behaviour configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RedirectConfig {
    /// Features to enable. Mutually exclusive with `disable`.
    pub enable: Option<BTreeSet<Feature>>,

    /// Features to remove from the defaults. Mutually exclusive with `enable`.
    pub disable: Option<BTreeSet<Feature>>,

    /// Target used when a host has no record at all.
    pub default_redirect: Option<String>,

    /// Custom DNS resolver address (e.g., "127.0.0.1:53").
    pub resolver: Option<String>,
}

impl RedirectConfig {
    /// Compute the effective feature set.
    pub fn enabled(&self) -> BTreeSet<Feature> {
        match (&self.enable, &self.disable) {
            (Some(enable), _) => enable.clone(),
            (None, Some(disable)) => Feature::DEFAULTS
                .iter()
                .copied()
                .filter(|f| !disable.contains(f))
                .collect(),
            (None, None) => Feature::DEFAULTS.iter().copied().collect(),
        }
    }

    /// Whether `feature` is in the effective set, without building it.
    pub fn contains(&self, feature: Feature) -> bool {
        match (&self.enable, &self.disable) {
            (Some(enable), _) => enable.contains(&feature),
            (None, Some(disable)) => {
                Feature::DEFAULTS.contains(&feature) && !disable.contains(&feature)
            }
            (None, None) => Feature::DEFAULTS.contains(&feature),
        }
    }

    /// The default redirect target, if one is configured and non-empty.
    pub fn default_target(&self) -> Option<&str> {
        self.default_redirect.as_deref().filter(|s| !s.is_empty())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for lookup and response) in seconds.
    pub request_secs: u64,

    /// Timeout for proxied upstream requests in seconds.
    pub proxy_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            proxy_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format.
    pub log_format: LogFormat,

    /// Log destination: "stdout", "stderr", "none" or a file path.
    pub log_output: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            log_output: "stdout".to_string(),
        }
    }
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PrometheusConfig {
    /// Enable metrics collection and the scrape endpoint.
    pub enable: bool,

    /// Scrape endpoint bind address.
    pub address: String,

    /// Scrape endpoint path.
    pub path: String,

    /// Paths counted by `txtdirect_redirect_path_count_total`.
    pub path_whitelist: Vec<String>,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enable: false,
            address: "127.0.0.1:9183".to_string(),
            path: "/metrics".to_string(),
            path_whitelist: Vec::new(),
        }
    }
}

/// Default SOCKS port of the local onion service.
pub const DEFAULT_ONION_SERVICE_PORT: u16 = 4242;

/// Onion service proxy configuration.
///
/// The tor process itself is managed outside this crate; only the SOCKS
/// port is used here.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TorConfig {
    pub enable: bool,

    /// Local SOCKS5 port of the tor instance.
    pub port: u16,

    pub data_dir: Option<String>,

    pub torrc: Option<String>,
}

impl Default for TorConfig {
    fn default() -> Self {
        Self {
            enable: false,
            port: DEFAULT_ONION_SERVICE_PORT,
            data_dir: None,
            torrc: None,
        }
    }
}

/// Go module proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GomodsConfig {
    pub enable: bool,

    /// Upstream module proxy that serves module content.
    pub upstream: String,
}

impl Default for GomodsConfig {
    fn default() -> Self {
        Self {
            enable: false,
            upstream: "https://proxy.golang.org".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_features() {
        let config = Config::default();
        assert!(config.is_enabled(Feature::Host));
        assert!(config.is_enabled(Feature::Www));
        assert!(config.is_type_enabled(RecordType::ModuleMetadata));
        assert!(!config.is_type_enabled(RecordType::Proxy));
    }

    #[test]
    fn test_disable_removes_from_defaults() {
        let redirect = RedirectConfig {
            disable: Some([Feature::Www, Feature::Path].into_iter().collect()),
            ..Default::default()
        };
        let enabled = redirect.enabled();
        assert!(enabled.contains(&Feature::Host));
        assert!(enabled.contains(&Feature::ModuleMetadata));
        assert!(!enabled.contains(&Feature::Www));
        assert!(!enabled.contains(&Feature::Path));
    }

    #[test]
    fn test_contains_matches_effective_set() {
        let all = [
            Feature::Host,
            Feature::Path,
            Feature::ModuleMetadata,
            Feature::Www,
            Feature::ModuleProxy,
            Feature::ContainerRegistry,
            Feature::Proxy,
            Feature::AnonymizedProxy,
        ];
        let configs = [
            RedirectConfig::default(),
            RedirectConfig {
                enable: Some([Feature::Proxy, Feature::Www].into_iter().collect()),
                ..Default::default()
            },
            RedirectConfig {
                disable: Some([Feature::Host].into_iter().collect()),
                ..Default::default()
            },
        ];
        for redirect in configs {
            let enabled = redirect.enabled();
            for feature in all {
                assert_eq!(redirect.contains(feature), enabled.contains(&feature), "{feature:?}");
            }
        }
    }

    #[test]
    fn test_feature_aliases() {
        let config: Config = toml::from_str(
            r#"
            [redirect]
            enable = ["host", "gometa", "dockerv2", "torproxy", "module-proxy"]
            "#,
        )
        .unwrap();
        assert!(config.is_enabled(Feature::ModuleMetadata));
        assert!(config.is_enabled(Feature::ContainerRegistry));
        assert!(config.is_enabled(Feature::AnonymizedProxy));
        assert!(config.is_enabled(Feature::ModuleProxy));
        assert!(!config.is_enabled(Feature::Www));
    }

    #[test]
    fn test_empty_default_redirect_is_ignored() {
        let redirect = RedirectConfig {
            default_redirect: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(redirect.default_target(), None);
    }

    #[test]
    fn test_section_enable_switches_type_on() {
        let mut config = Config::default();
        assert!(!config.is_type_enabled(RecordType::AnonymizedProxy));
        config.tor.enable = true;
        config.gomods.enable = true;
        assert!(config.is_type_enabled(RecordType::AnonymizedProxy));
        assert!(config.is_type_enabled(RecordType::ModuleProxy));
    }
}
