// ABOUTME: Middleware pipeline assembly for shelfd.
// ABOUTME: Nests access logging around optional basic auth around the ServeDir terminal service.

use std::sync::Arc;

use axum::Router;
use tower_http::services::ServeDir;

use crate::access_log::{AccessLogLayer, AccessSink};
use crate::auth::BasicAuthLayer;
use crate::config::ServerConfig;

/// Build the composed request handler.
///
/// Nesting order is fixed: the access log is outermost, so every request is
/// logged exactly once, including 401s produced by the auth middleware.
/// ServeDir is the terminal service; its status codes pass through unchanged.
pub fn build_router(config: &ServerConfig, sink: Arc<dyn AccessSink>) -> Router {
    let mut router = Router::new().fallback_service(ServeDir::new(&config.root_dir));

    if let Some(credentials) = &config.credentials {
        router = router.layer(BasicAuthLayer::new(credentials.clone()));
    }

    // Added last so it wraps the auth layer as well.
    router.layer(AccessLogLayer::new(sink))
}
