//! Go module support.
//!
//! # Data Flow
//! ```text
//! module-metadata record
//!     → meta.rs (HTML page with go-import / go-source tags)
//!
//! module-proxy record
//!     → proxy.rs (validate protocol path → relay to gomods.upstream)
//! ```

pub mod meta;
pub mod proxy;

pub use meta::render;
pub use proxy::{is_module_path, ModuleProxy};
