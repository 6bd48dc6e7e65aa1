//! Record types and grammar errors.

use std::fmt;
use std::str::FromStr;

use axum::http::StatusCode;
use thiserror::Error;

/// The only supported record protocol version.
pub const PROTOCOL_VERSION: &str = "txtv0";

/// Maximum length of a serialized record.
pub const MAX_RECORD_LEN: usize = 255;

/// Behaviour selected by a record's `type=` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordType {
    #[default]
    Host,
    Path,
    Proxy,
    ContainerRegistry,
    ModuleMetadata,
    ModuleProxy,
    AnonymizedProxy,
}

impl RecordType {
    /// Canonical name as written in records and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Host => "host",
            RecordType::Path => "path",
            RecordType::Proxy => "proxy",
            RecordType::ContainerRegistry => "container-registry",
            RecordType::ModuleMetadata => "module-metadata",
            RecordType::ModuleProxy => "module-proxy",
            RecordType::AnonymizedProxy => "anonymized-proxy",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(RecordType::Host),
            "path" => Ok(RecordType::Path),
            "proxy" => Ok(RecordType::Proxy),
            "container-registry" | "dockerv2" => Ok(RecordType::ContainerRegistry),
            "module-metadata" | "gometa" => Ok(RecordType::ModuleMetadata),
            "module-proxy" | "gomods" => Ok(RecordType::ModuleProxy),
            "anonymized-proxy" | "torproxy" => Ok(RecordType::AnonymizedProxy),
            other => Err(GrammarError::UnsupportedType(other.to_string())),
        }
    }
}

/// A parsed redirect record.
///
/// Records are built per lookup and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub version: String,
    pub to: String,
    pub code: StatusCode,
    pub record_type: RecordType,
    pub vcs: String,
    pub website: String,
    pub from: String,
    pub root: String,
    pub re: String,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            version: String::new(),
            to: String::new(),
            code: StatusCode::FOUND,
            record_type: RecordType::Host,
            vcs: String::new(),
            website: String::new(),
            from: String::new(),
            root: String::new(),
            re: String::new(),
        }
    }
}

impl Record {
    /// A record carrying both `re=` and `from=` only seeds a fallback.
    pub fn is_fallback_only(&self) -> bool {
        !self.re.is_empty() && !self.from.is_empty()
    }
}

/// Malformed record contents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("could not parse status code: {0}")]
    InvalidCode(String),

    #[error("unhandled version '{0}'")]
    UnsupportedVersion(String),

    #[error("missing version, expected v=txtv0")]
    MissingVersion,

    #[error("arbitrary data not allowed")]
    ArbitraryData,

    #[error("{0}= field has no value")]
    EmptyValue(&'static str),

    #[error("TXT record cannot exceed the maximum of 255 characters")]
    TooLong,

    #[error("record type {0} unsupported")]
    UnsupportedType(String),

    #[error("to= field is required in {0} type")]
    MissingTarget(RecordType),
}
