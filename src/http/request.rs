//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID as early as possible
//! - Buffer the inbound request into a replayable form
//! - Strip hop-by-hop headers before forwarding
//!
//! # Design Decisions
//! - The buffered `ForwardRequest` can be replayed against the
//!   fallback origin without re-reading the client body
//! - Request ID flows to origins via the forwarded headers

use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, request::Parts, HeaderMap, Method, Request};
use bytes::Bytes;
use tower::{Layer, Service};
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Headers that must not be forwarded to an origin.
const HOP_BY_HOP: &[header::HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
];

/// A fully buffered inbound request, replayable across origin attempts.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Drop headers that must not cross the proxy hop.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

impl ForwardRequest {
    /// Build from decomposed request parts, stripping hop-by-hop headers.
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        let mut headers = parts.headers.clone();
        strip_hop_by_hop(&mut headers);

        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(String::from),
            headers,
            body,
        }
    }

    /// Path plus the original query string, for the origin URI.
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}

/// The Origin header value, for CORS decisions.
pub fn request_origin(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Tower layer that guarantees an `x-request-id` on every request.
#[derive(Debug, Clone, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestIdService<S>
where
    S: Service<Request<Body>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        if !request.headers().contains_key(X_REQUEST_ID) {
            let id = Uuid::new_v4().to_string();
            if let Ok(value) = id.parse() {
                request.headers_mut().insert(X_REQUEST_ID, value);
            }
        }
        self.inner.call(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_strips_hop_by_hop_headers() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("http://example.com/widgets?param1=1")
            .header("host", "example.com")
            .header("connection", "keep-alive")
            .header("x-cache-test1", "v")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();

        let fwd = ForwardRequest::from_parts(&parts, Bytes::new());
        assert!(fwd.headers.get("host").is_none());
        assert!(fwd.headers.get("connection").is_none());
        assert_eq!(fwd.headers.get("x-cache-test1").unwrap(), "v");
        assert_eq!(fwd.path_and_query(), "/widgets?param1=1");
    }

    #[test]
    fn path_without_query_is_preserved() {
        let request = Request::builder()
            .uri("http://example.com/widgets")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();

        let fwd = ForwardRequest::from_parts(&parts, Bytes::new());
        assert_eq!(fwd.path_and_query(), "/widgets");
        assert!(fwd.query.is_none());
    }
}
