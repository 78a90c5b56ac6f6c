//! Cache decision engine.
//!
//! # Responsibilities
//! - Compose the cache key and serve fresh entries
//! - On miss, fetch through the origin selector, clamp the TTL and
//!   store the response
//! - Negotiate the response encoding and keep it a cache dimension
//!
//! # Design Decisions
//! - Only GET/HEAD consult or populate the store; every other method
//!   goes to the origin on every call
//! - Only 2xx responses are stored; `no-store`/`private` from the
//!   origin bypasses storage
//! - A stored entry that fails to decode is evicted and treated as a
//!   miss, never surfaced to the client

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use bytes::Bytes;

use crate::cache::key;
use crate::cache::policy::Encoding;
use crate::cache::store::{CacheEntry, CacheStore};
use crate::http::request::ForwardRequest;
use crate::observability::metrics;
use crate::origin::{FetchError, OriginSelector};
use crate::routing::Route;

/// Marker header describing whether the store served this response.
pub const X_CACHE: &str = "x-cache";

/// Response handed to the header-policy stage.
#[derive(Debug)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Owns the cache store and drives the miss path through the selector.
pub struct CacheEngine {
    store: Arc<CacheStore>,
    selector: OriginSelector,
}

impl CacheEngine {
    pub fn new(store: Arc<CacheStore>, selector: OriginSelector) -> Self {
        Self { store, selector }
    }

    /// Serve a routed request from the cache or the origin pair.
    pub async fn handle(
        &self,
        route: &Route,
        request: &ForwardRequest,
    ) -> Result<GatewayResponse, FetchError> {
        let policy = &route.cache;
        let cacheable = matches!(request.method, Method::GET | Method::HEAD);

        let accept_encoding = request
            .headers
            .get(header::ACCEPT_ENCODING)
            .and_then(|v| v.to_str().ok());
        let encoding = Encoding::negotiate(policy, accept_encoding);
        let cache_key = key::compose(request, policy, encoding);

        if cacheable {
            if let Some(entry) = self.store.get(&cache_key) {
                match entry.to_parts() {
                    Ok((status, mut headers)) => {
                        tracing::debug!(route = %route.name, key = %cache_key, "Cache hit");
                        metrics::record_cache(&route.name, true);
                        headers.insert(X_CACHE, HeaderValue::from_static("hit"));
                        return Ok(GatewayResponse {
                            status,
                            headers,
                            body: entry.body.clone(),
                        });
                    }
                    Err(e) => {
                        // Forced miss: drop the corrupt entry and refetch.
                        tracing::warn!(key = %cache_key, error = %e, "Evicting undecodable cache entry");
                        self.store.evict(&cache_key);
                    }
                }
            }
            metrics::record_cache(&route.name, false);
        }

        let mut outbound = request.clone();
        match encoding {
            Encoding::Identity => {
                outbound.headers.remove(header::ACCEPT_ENCODING);
            }
            other => {
                outbound.headers.insert(
                    header::ACCEPT_ENCODING,
                    HeaderValue::from_static(other.as_str()),
                );
            }
        }

        let (response, origin) = self.selector.fetch(route, &outbound).await?;

        tracing::debug!(
            route = %route.name,
            origin = %origin.name,
            status = %response.status,
            "Origin fetch complete"
        );

        if cacheable && response.status.is_success() && storable(&response.headers) {
            let ttl = policy.effective_ttl(ttl_hint(&response.headers));
            if !ttl.is_zero() {
                self.store.insert(
                    cache_key,
                    CacheEntry::new(
                        response.status,
                        &response.headers,
                        response.body.clone(),
                        encoding,
                        ttl,
                    ),
                );
            }
        }

        let mut headers = response.headers;
        headers.insert(X_CACHE, HeaderValue::from_static("miss"));
        Ok(GatewayResponse {
            status: response.status,
            headers,
            body: response.body,
        })
    }
}

/// TTL suggested by the origin: `s-maxage` wins over `max-age`.
fn ttl_hint(headers: &HeaderMap) -> Option<Duration> {
    let cache_control = headers.get(header::CACHE_CONTROL)?.to_str().ok()?;

    let mut max_age = None;
    let mut s_maxage = None;
    for directive in cache_control.split(',') {
        let directive = directive.trim();
        if let Some(v) = directive.strip_prefix("s-maxage=") {
            s_maxage = v.parse::<u64>().ok();
        } else if let Some(v) = directive.strip_prefix("max-age=") {
            max_age = v.parse::<u64>().ok();
        }
    }

    s_maxage.or(max_age).map(Duration::from_secs)
}

/// Whether the origin allows this response to enter a shared cache.
fn storable(headers: &HeaderMap) -> bool {
    let Some(cache_control) = headers
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
    else {
        return true;
    };

    !cache_control
        .split(',')
        .map(|d| d.trim())
        .any(|d| d.eq_ignore_ascii_case("no-store") || d.eq_ignore_ascii_case("private"))
}
