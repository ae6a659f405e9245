//! # clarity-server
//!
//! Runs a [`clarity_http::Handler`], usually the admin router, behind a hyper
//! HTTP/1 server with graceful shutdown, and installs the global `tracing`
//! subscriber described by the logging settings.

pub mod error;
pub mod http;
pub mod logging;
pub mod shutdown;

pub use error::{ServerError, ServerResult};
pub use http::{HttpServer, serve_until_signal};
pub use logging::init_logging;
pub use shutdown::{ShutdownCoordinator, ShutdownListener, shutdown_signal};
