//! TXT lookups through hickory-dns.
//!
//! # Responsibilities
//! - Build a resolver from the system configuration or a custom nameserver
//! - Flatten TXT character-strings into one answer per resource record
//! - Classify NXDOMAIN/NODATA and unusable names as "no such host"
//!
//! # Design Decisions
//! - The resolver cache is disabled; every request sees live answers
//! - No retries here; the wildcard retry belongs to the routing layer

use std::net::SocketAddr;

use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::Name;
use hickory_resolver::{ResolveError, Resolver};

use crate::dns::{LookupError, TxtResolver};

/// TXT resolver backed by hickory.
pub struct HickoryTxtResolver {
    inner: Resolver<TokioConnectionProvider>,
    description: String,
}

impl std::fmt::Debug for HickoryTxtResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryTxtResolver")
            .field("description", &self.description)
            .finish()
    }
}

impl HickoryTxtResolver {
    /// Use the nameservers from the system configuration.
    pub fn system() -> Result<Self, ResolveError> {
        let (config, options) = hickory_resolver::system_conf::read_system_conf()?;
        let mut builder = Resolver::builder_with_config(config, TokioConnectionProvider::default());
        *builder.options_mut() = options;
        builder.options_mut().cache_size = 0;

        Ok(Self {
            inner: builder.build(),
            description: "system".to_string(),
        })
    }

    /// Send every query to a single nameserver.
    pub fn custom(addr: SocketAddr) -> Self {
        let servers = NameServerConfigGroup::from_ips_clear(&[addr.ip()], addr.port(), true);
        let config = ResolverConfig::from_parts(None, vec![], servers);
        let mut builder = Resolver::builder_with_config(config, TokioConnectionProvider::default());
        builder.options_mut().cache_size = 0;

        Self {
            inner: builder.build(),
            description: format!("udp://{addr}"),
        }
    }

    /// Build the resolver selected by the `resolver` config value.
    pub fn from_config(resolver: Option<&str>) -> Result<Self, LookupError> {
        match resolver {
            Some(addr) => {
                let addr: SocketAddr = addr.parse().map_err(|_| LookupError::Failed {
                    zone: String::new(),
                    reason: format!("invalid resolver address `{addr}`"),
                })?;
                Ok(Self::custom(addr))
            }
            None => Self::system().map_err(|e| LookupError::Failed {
                zone: String::new(),
                reason: format!("could not read system resolver configuration: {e}"),
            }),
        }
    }
}

#[async_trait]
impl TxtResolver for HickoryTxtResolver {
    async fn lookup_txt(&self, zone: &str) -> Result<Vec<String>, LookupError> {
        tracing::trace!(zone = %zone, resolver = %self.description, "TXT lookup");

        // A host that cannot form a DNS name has no record by definition.
        let name = Name::from_ascii(zone).map_err(|e| {
            tracing::debug!(zone = %zone, error = %e, "Zone is not a valid DNS name");
            LookupError::NotFound {
                zone: zone.to_string(),
            }
        })?;

        let lookup = self.inner.txt_lookup(name).await.map_err(|e| {
            if e.is_nx_domain() || e.is_no_records_found() {
                LookupError::NotFound {
                    zone: zone.to_string(),
                }
            } else {
                LookupError::Failed {
                    zone: zone.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        Ok(lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|chunk| String::from_utf8_lossy(chunk))
                    .collect::<String>()
            })
            .collect())
    }
}
