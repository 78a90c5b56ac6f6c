//! Origin selection with single-hop failover.
//!
//! # Responsibilities
//! - Issue the buffered request to the route's primary origin
//! - On transport error/timeout or a failover-triggering status,
//!   issue the same request once to the fallback origin
//! - Record every attempt's outcome in the health monitor

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use bytes::Bytes;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::time;

use crate::http::request::ForwardRequest;
use crate::observability::metrics;
use crate::origin::{HealthMonitor, Origin, Outcome};
use crate::routing::Route;

/// Largest origin response body the gateway will buffer.
const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// Error after the primary (and the fallback, when configured) failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("origin {origin} timed out after {timeout:?}")]
    Timeout { origin: String, timeout: Duration },

    #[error("origin {origin} transport error: {message}")]
    Transport { origin: String, message: String },
}

/// A fully buffered origin response.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Picks the origin serving each request and performs the failover hop.
pub struct OriginSelector {
    client: Client<HttpConnector, Body>,
    health: Arc<HealthMonitor>,
}

impl OriginSelector {
    pub fn new(health: Arc<HealthMonitor>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, health }
    }

    /// Fetch the request from the route's origin pair.
    ///
    /// The fallback is attempted at most once; its response is returned
    /// as-is even when it also matches the failover-status set.
    pub async fn fetch(
        &self,
        route: &Route,
        request: &ForwardRequest,
    ) -> Result<(OriginResponse, Arc<Origin>), FetchError> {
        let primary = &route.primary;

        match self.attempt(primary, request).await {
            Ok(response) if route.failover_statuses.contains(&response.status) => {
                self.health.record(&primary.name, Outcome::FailoverStatus);

                let Some(fallback) = &route.fallback else {
                    return Ok((response, primary.clone()));
                };

                tracing::warn!(
                    route = %route.name,
                    primary = %primary.name,
                    fallback = %fallback.name,
                    status = %response.status,
                    "Failover-triggering status from primary, trying fallback"
                );
                metrics::record_failover(&route.name, &primary.name);

                self.attempt_fallback(route, fallback, request).await
            }
            Ok(response) => {
                self.health.record(&primary.name, Outcome::Success);
                Ok((response, primary.clone()))
            }
            Err(error) => {
                self.health.record(&primary.name, Outcome::TransportError);

                let Some(fallback) = &route.fallback else {
                    return Err(error);
                };

                tracing::warn!(
                    route = %route.name,
                    primary = %primary.name,
                    fallback = %fallback.name,
                    error = %error,
                    "Primary unreachable, trying fallback"
                );
                metrics::record_failover(&route.name, &primary.name);

                self.attempt_fallback(route, fallback, request).await
            }
        }
    }

    async fn attempt_fallback(
        &self,
        route: &Route,
        fallback: &Arc<Origin>,
        request: &ForwardRequest,
    ) -> Result<(OriginResponse, Arc<Origin>), FetchError> {
        match self.attempt(fallback, request).await {
            Ok(response) => {
                let outcome = if route.failover_statuses.contains(&response.status) {
                    Outcome::FailoverStatus
                } else {
                    Outcome::Success
                };
                self.health.record(&fallback.name, outcome);
                Ok((response, fallback.clone()))
            }
            Err(error) => {
                self.health.record(&fallback.name, Outcome::TransportError);
                Err(error)
            }
        }
    }

    /// One attempt against one origin, bounded by its timeout.
    async fn attempt(
        &self,
        origin: &Origin,
        request: &ForwardRequest,
    ) -> Result<OriginResponse, FetchError> {
        let uri = format!(
            "{}{}",
            origin.base_url.as_str().trim_end_matches('/'),
            request.path_and_query()
        );

        let mut builder = Request::builder().method(request.method.clone()).uri(&uri);
        if let Some(headers) = builder.headers_mut() {
            for (name, value) in request.headers.iter() {
                headers.insert(name.clone(), value.clone());
            }
        }
        let outbound = builder
            .body(Body::from(request.body.clone()))
            .map_err(|e| FetchError::Transport {
                origin: origin.name.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(origin = %origin.name, uri = %uri, "Forwarding to origin");

        let response = match time::timeout(origin.timeout, self.client.request(outbound)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(FetchError::Transport {
                    origin: origin.name.clone(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(FetchError::Timeout {
                    origin: origin.name.clone(),
                    timeout: origin.timeout,
                })
            }
        };

        let (mut parts, body) = response.into_parts();
        crate::http::request::strip_hop_by_hop(&mut parts.headers);
        let body = axum::body::to_bytes(Body::new(body), MAX_RESPONSE_BYTES)
            .await
            .map_err(|e| FetchError::Transport {
                origin: origin.name.clone(),
                message: e.to_string(),
            })?;

        Ok(OriginResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}
