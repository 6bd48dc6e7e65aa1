//! Redirect record subsystem.
//!
//! # Data Flow
//! ```text
//! raw TXT answer ("v=txtv0;to=https://example.com;code=301")
//!     → parser.rs (split segments, validate keys)
//!     → placeholders.rs (resolve {…} tokens in to= / from=)
//!     → Record (typed, per request, never cached)
//! ```
//!
//! # Design Decisions
//! - `type=` is a closed enum; unknown types are grammar errors
//! - A type missing from the enabled features is a distinct `Disabled`
//!   error so the HTTP layer can pass the request on

pub mod parser;
pub mod placeholders;
pub mod types;

pub use placeholders::{has_placeholders, substitute, PlaceholderError};
pub use types::{GrammarError, Record, RecordType, MAX_RECORD_LEN, PROTOCOL_VERSION};
