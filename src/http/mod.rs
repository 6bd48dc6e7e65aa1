//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, host extraction)
//!     → redirect middleware (record lookup and dispatch)
//!     → next handler (404) for disabled record types
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{request_host, strip_port, RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
