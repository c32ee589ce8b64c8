// ABOUTME: Access logging middleware for shelfd.
// ABOUTME: Records one AccessRecord per request and hands it to an injected sink.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, Response, StatusCode};
use tower::{Layer, Service};

/// One observation per completed request.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub remote_addr: Option<SocketAddr>,
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    pub elapsed: Duration,
}

/// Destination for access records. The lifecycle controller owns the sink
/// and injects it at construction, so tests can substitute an in-memory one.
pub trait AccessSink: Send + Sync {
    fn record(&self, record: &AccessRecord);
}

/// Production sink: one structured tracing line per request.
pub struct TracingSink;

impl AccessSink for TracingSink {
    fn record(&self, record: &AccessRecord) {
        let remote = record
            .remote_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "-".to_string());
        tracing::info!(
            remote = %remote,
            method = %record.method,
            path = %record.path,
            status = record.status.as_u16(),
            elapsed = ?record.elapsed,
            "request"
        );
    }
}

/// A tower Layer that records every request passing through it.
#[derive(Clone)]
pub struct AccessLogLayer {
    sink: Arc<dyn AccessSink>,
}

impl AccessLogLayer {
    pub fn new(sink: Arc<dyn AccessSink>) -> Self {
        Self { sink }
    }
}

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogMiddleware {
            inner,
            sink: Arc::clone(&self.sink),
        }
    }
}

/// The middleware service that times the inner call and emits the record.
#[derive(Clone)]
pub struct AccessLogMiddleware<S> {
    inner: S,
    sink: Arc<dyn AccessSink>,
}

impl<S> Service<Request<Body>> for AccessLogMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let sink = Arc::clone(&self.sink);
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let remote_addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let start = Instant::now();
            let result = inner.call(req).await;
            // The record is emitted whether the inner service succeeded or
            // not; an inner error surfaces as a 500 to the client.
            let status = match &result {
                Ok(resp) => resp.status(),
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            sink.record(&AccessRecord {
                remote_addr,
                method,
                path,
                status,
                elapsed: start.elapsed(),
            });
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::routing::get;
    use http::Request;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// In-memory sink for asserting on emitted records.
    #[derive(Default)]
    struct Collector {
        records: Mutex<Vec<AccessRecord>>,
    }

    impl AccessSink for Collector {
        fn record(&self, record: &AccessRecord) {
            self.records.lock().unwrap().push(record.clone());
        }
    }

    fn logged_router(sink: Arc<Collector>) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .layer(AccessLogLayer::new(sink))
    }

    #[tokio::test]
    async fn records_exactly_one_entry_per_request() {
        let sink = Arc::new(Collector::default());
        let app = logged_router(Arc::clone(&sink));

        let resp = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method, Method::GET);
        assert_eq!(records[0].path, "/");
        assert_eq!(records[0].status, StatusCode::OK);
    }

    #[tokio::test]
    async fn recorded_status_matches_written_status() {
        let sink = Arc::new(Collector::default());
        let app = logged_router(Arc::clone(&sink));

        let resp = app
            .oneshot(Request::get("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status_defaults_to_200_when_handler_only_writes_a_body() {
        let sink = Arc::new(Collector::default());
        let app = logged_router(Arc::clone(&sink));

        app.oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let records = sink.records.lock().unwrap();
        assert_eq!(records[0].status, StatusCode::OK);
    }

    #[tokio::test]
    async fn remote_addr_is_absent_without_connect_info() {
        let sink = Arc::new(Collector::default());
        let app = logged_router(Arc::clone(&sink));

        app.oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let records = sink.records.lock().unwrap();
        assert!(records[0].remote_addr.is_none());
    }
}
