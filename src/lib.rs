//! DNS TXT record driven redirector library.

pub mod config;
pub mod dns;
pub mod error;
pub mod gomod;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod record;
pub mod redirect;
pub mod registry;
pub mod routing;
pub mod upstream;

pub use config::Config;
pub use error::{Error, Result};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use redirect::Redirector;
