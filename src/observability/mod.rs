//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher and collaborators produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (per-host counters through RedirectMetrics)
//!
//! Consumers:
//!     → Log destination (stdout, stderr, file)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through the trace spans
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{FallbackKind, NoopMetrics, PrometheusMetrics, RedirectMetrics};
