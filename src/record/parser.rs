//! TXT record grammar parser.
//!
//! # Grammar
//! ```text
//! record  = segment *( ";" segment )
//! segment = key "=" value
//! key     = "v" / "to" / "code" / "type" / "vcs" / "website" / "from" / "root" / "re"
//! ```
//!
//! Unknown `key=value` pairs are skipped; anything else is arbitrary data
//! and rejected.

use axum::http::{Request, StatusCode};

use crate::config::Config;
use crate::error::Error;
use crate::record::placeholders::substitute;
use crate::record::types::{GrammarError, Record, RecordType, MAX_RECORD_LEN, PROTOCOL_VERSION};

impl Record {
    /// Parse a raw TXT string into a record.
    ///
    /// `to=` and `from=` values have their placeholders resolved against
    /// `request`. A record whose type is not enabled in `config` fails with
    /// [`Error::Disabled`].
    pub fn parse<B>(raw: &str, request: &Request<B>, config: &Config) -> Result<Record, Error> {
        let mut record = Record::default();
        let mut version = None;
        let mut code = None;
        let mut record_type = None;

        for segment in raw.split(';') {
            let (key, value) = match segment.split_once('=') {
                Some(pair) => pair,
                None => return Err(GrammarError::ArbitraryData.into()),
            };

            match key {
                "code" => {
                    let value = required("code", value)?;
                    let parsed: u16 = value
                        .parse()
                        .map_err(|e| GrammarError::InvalidCode(format!("{value}: {e}")))?;
                    code = Some(parsed);
                }
                "from" => record.from = substitute(required("from", value)?, request)?,
                "re" => record.re = required("re", value)?.to_string(),
                "root" => record.root = required("root", value)?.to_string(),
                "to" => record.to = substitute(required("to", value)?, request)?,
                "type" => record_type = Some(required("type", value)?.parse::<RecordType>()?),
                "v" => {
                    if value != PROTOCOL_VERSION {
                        return Err(GrammarError::UnsupportedVersion(value.to_string()).into());
                    }
                    tracing::warn!("{PROTOCOL_VERSION} is not suitable for production");
                    version = Some(value);
                }
                "vcs" => record.vcs = required("vcs", value)?.to_string(),
                "website" => record.website = required("website", value)?.to_string(),
                _ => {
                    if value.contains('=') {
                        return Err(GrammarError::ArbitraryData.into());
                    }
                    tracing::debug!(key = %key, "Ignoring unknown record key");
                }
            }
        }

        if raw.len() > MAX_RECORD_LEN {
            return Err(GrammarError::TooLong.into());
        }

        record.version = version.ok_or(GrammarError::MissingVersion)?.to_string();

        record.code = match code {
            None | Some(0) => StatusCode::FOUND,
            Some(code) => StatusCode::from_u16(code)
                .map_err(|e| GrammarError::InvalidCode(format!("{code}: {e}")))?,
        };

        record.record_type = record_type.unwrap_or_default();
        if !config.is_type_enabled(record.record_type) {
            return Err(Error::Disabled(record.record_type));
        }

        if record.record_type == RecordType::ContainerRegistry && record.to.is_empty() {
            return Err(GrammarError::MissingTarget(record.record_type).into());
        }

        Ok(record)
    }
}

fn required<'a>(key: &'static str, value: &'a str) -> Result<&'a str, GrammarError> {
    if value.is_empty() {
        Err(GrammarError::EmptyValue(key))
    } else {
        Ok(value)
    }
}
