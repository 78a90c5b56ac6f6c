//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_cache_events_total` (counter): hits/misses per route
//! - `gateway_failovers_total` (counter): fallback attempts per route
//! - `gateway_origin_health` (gauge): 1=healthy, 0=degraded
//!
//! # Design Decisions
//! - Low-overhead updates (atomic operations in the recorder)
//! - Prometheus exposition on a dedicated listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics exporter"),
    }
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string(),
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a cache hit or miss.
pub fn record_cache(route: &str, hit: bool) {
    metrics::counter!(
        "gateway_cache_events_total",
        "route" => route.to_string(),
        "event" => if hit { "hit" } else { "miss" },
    )
    .increment(1);
}

/// Record a failover hop away from a primary origin.
pub fn record_failover(route: &str, primary: &str) {
    metrics::counter!(
        "gateway_failovers_total",
        "route" => route.to_string(),
        "primary" => primary.to_string(),
    )
    .increment(1);
}

/// Record the current health signal for an origin.
pub fn record_origin_health(origin: &str, healthy: bool) {
    metrics::gauge!(
        "gateway_origin_health",
        "origin" => origin.to_string(),
    )
    .set(if healthy { 1.0 } else { 0.0 });
}
