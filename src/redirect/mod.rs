//! Redirect dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → dispatcher.rs (favicon short-circuit, root record, type match)
//!     → routing (root lookup, path walk)
//!     → registry / gomod / upstream collaborators
//!     → fallback.rs on recoverable failures
//!     → response.rs (redirect, bare redirect, 404)
//! ```

pub mod dispatcher;
pub mod fallback;
pub mod response;

pub use dispatcher::{base_target, Redirector, FAVICON_PATH};
pub use fallback::FallbackTarget;
pub use response::STATUS_301_CACHE_AGE;
