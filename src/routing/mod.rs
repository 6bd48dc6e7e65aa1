//! Record routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → root.rs (resolve host, one wildcard retry "_.<rest>")
//!     → Record
//!
//! For path records:
//!     walker.rs (zones "seg2.seg1.<host>", "seg1.<host>")
//!     → most specific record that resolves
//!     → or an error the dispatcher turns into a fallback
//! ```
//!
//! # Design Decisions
//! - Exactly one wildcard retry, no caching
//! - Deterministic: the same DNS data always yields the same record

pub mod root;
pub mod walker;

pub use root::{lookup_with_wildcard, resolve_root};
pub use walker::{walk, PathMatch};
