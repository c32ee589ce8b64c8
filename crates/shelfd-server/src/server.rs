// ABOUTME: Lifecycle controller for shelfd.
// ABOUTME: Binds the listener, waits for a one-shot shutdown signal, and drains within a grace period.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::access_log::TracingSink;
use crate::config::ServerConfig;
use crate::router::build_router;

/// Bound on how long in-flight requests may run after the shutdown signal.
pub const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Fatal lifecycle failures. Per-request errors never reach this type.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("graceful shutdown did not complete within {0:?}")]
    ShutdownTimeout(Duration),
}

/// Run the server until an operating-system shutdown signal arrives.
///
/// Bind failure is fatal and immediate; nothing is retried. On SIGINT or
/// SIGTERM the listener drains in-flight requests for up to [`GRACE_PERIOD`]
/// before giving up.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let router = build_router(&config, Arc::new(TracingSink));
    let addr = config.addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!(root = %config.root_dir.display(), %addr, "serving directory");

    serve_until_shutdown(listener, router, shutdown_signal(), GRACE_PERIOD).await
}

/// Serve `router` on `listener` until `signal` resolves, then drain.
///
/// The listener runs on a background task; this function suspends on the
/// signal, which is the sole suspension point of the main flow. Once the
/// signal fires, no new connections are accepted and in-flight requests get
/// `grace` to finish. Requests still outstanding after that are abandoned
/// and the call returns [`ServerError::ShutdownTimeout`].
pub async fn serve_until_shutdown(
    listener: TcpListener,
    router: Router,
    signal: impl Future<Output = ()> + Send + 'static,
    grace: Duration,
) -> Result<(), ServerError> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = shutdown_rx.await;
    });
    let mut task = tokio::spawn(server.into_future());

    signal.await;

    tracing::info!("shutting down, draining in-flight requests");
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(grace, &mut task).await {
        Ok(joined) => {
            joined??;
            tracing::info!("server stopped");
            Ok(())
        }
        Err(_) => {
            // In-flight work exceeded the grace period. Abandon it; process
            // exit closes whatever connections remain.
            task.abort();
            Err(ServerError::ShutdownTimeout(grace))
        }
    }
}

/// Resolve once, on the first SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install interrupt handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {}
        _ = terminate => {}
    }
}
