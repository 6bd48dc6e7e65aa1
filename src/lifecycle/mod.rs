//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → redirect server stops accepting → in-flight requests drain
//!             → metrics endpoint stops
//! ```
//!
//! # Design Decisions
//! - One broadcast channel for every long-running task
//! - No reload signal: configuration is immutable

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{spawn_signal_listener, wait_for_signal};
