// ABOUTME: Request pipeline and lifecycle controller for the shelfd static-file server.
// ABOUTME: Composes access logging and optional basic auth around a ServeDir terminal service.

pub mod access_log;
pub mod auth;
pub mod config;
pub mod router;
pub mod server;

pub use access_log::{AccessLogLayer, AccessRecord, AccessSink, TracingSink};
pub use auth::{BasicAuthLayer, Credentials};
pub use config::{ConfigError, ServerConfig};
pub use router::build_router;
pub use server::{GRACE_PERIOD, ServerError, run, serve_until_shutdown, shutdown_signal};
