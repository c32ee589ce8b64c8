// ABOUTME: HTTP Basic authentication middleware for shelfd.
// ABOUTME: Checks Authorization headers against configured credentials and challenges with 401.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tower::{Layer, Service};

/// Expected username and password for basic auth.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Validate a presented pair against the expected values.
    ///
    /// Both fields are compared in constant time, and the username result
    /// does not short-circuit the password comparison.
    pub fn check(&self, username: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());
        user_ok & pass_ok
    }
}

/// Constant-time comparison to avoid leaking the mismatch position.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

/// A tower Layer that applies basic authentication to every route.
#[derive(Clone)]
pub struct BasicAuthLayer {
    credentials: Arc<Credentials>,
}

impl BasicAuthLayer {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Arc::new(credentials),
        }
    }
}

impl<S> Layer<S> for BasicAuthLayer {
    type Service = BasicAuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BasicAuthMiddleware {
            inner,
            credentials: Arc::clone(&self.credentials),
        }
    }
}

/// The middleware service that checks basic credentials before delegating.
#[derive(Clone)]
pub struct BasicAuthMiddleware<S> {
    inner: S,
    credentials: Arc<Credentials>,
}

impl<S> Service<Request<Body>> for BasicAuthMiddleware<S>
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
        let authorized = basic_credentials(&req)
            .map(|(user, pass)| self.credentials.check(&user, &pass))
            .unwrap_or(false);

        if authorized {
            let mut inner = self.inner.clone();
            Box::pin(async move { inner.call(req).await })
        } else {
            Box::pin(async move { Ok(unauthorized()) })
        }
    }
}

/// Extract the username/password pair from an `Authorization: Basic` header.
///
/// Missing headers, non-Basic schemes, bad base64, and payloads without a
/// colon all count as absent credentials.
fn basic_credentials(req: &Request<Body>) -> Option<(String, String)> {
    let header = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn unauthorized() -> Response<Body> {
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header(header::WWW_AUTHENTICATE, "Basic realm=\"Restricted\"")
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from("unauthorized"))
        .unwrap()
}
