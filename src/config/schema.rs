//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Backend origin definitions.
    pub origins: Vec<OriginConfig>,

    /// Route definitions mapping requests to origins.
    pub routes: Vec<RouteConfig>,

    /// Gateway-wide cache policy (routes may override).
    pub cache: CachePolicyConfig,

    /// Gateway-wide response header policy (routes may override).
    pub headers: HeaderPolicyConfig,

    /// Health signal settings.
    pub health: HealthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Total request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// A backend origin the gateway forwards requests to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OriginConfig {
    /// Unique origin identifier, referenced by routes.
    pub name: String,

    /// Base URL (e.g., "http://api.internal:3000").
    pub base_url: String,

    /// Per-call timeout in seconds.
    #[serde(default = "default_origin_timeout")]
    pub timeout_secs: u64,
}

fn default_origin_timeout() -> u64 {
    10
}

/// Route configuration binding a path prefix to an origin pair.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Path prefix to match. Longest prefix wins.
    pub path_prefix: String,

    /// Allowed methods (e.g., ["GET", "POST"]). Empty = all methods.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Primary origin name.
    pub primary: String,

    /// Optional fallback origin name, tried once when the primary
    /// errors or answers with a failover-triggering status.
    #[serde(default)]
    pub fallback: Option<String>,

    /// Status codes that trigger the fallback attempt.
    #[serde(default = "default_failover_statuses")]
    pub failover_statuses: Vec<u16>,

    /// Route-scoped cache policy override.
    #[serde(default)]
    pub cache: Option<CachePolicyConfig>,

    /// Route-scoped header policy override.
    #[serde(default)]
    pub headers: Option<HeaderPolicyConfig>,
}

fn default_failover_statuses() -> Vec<u16> {
    vec![500, 502, 503, 504]
}

/// Cache policy: TTL bounds plus the allow-listed request dimensions
/// that participate in the cache key.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CachePolicyConfig {
    /// Lower TTL clamp in seconds.
    pub min_ttl_secs: u64,

    /// TTL applied when the origin supplies no hint, in seconds.
    pub default_ttl_secs: u64,

    /// Upper TTL clamp in seconds.
    pub max_ttl_secs: u64,

    /// Header names included in the cache key.
    pub header_allow_list: Vec<String>,

    /// Query parameter names included in the cache key.
    pub query_allow_list: Vec<String>,

    /// Cookie names included in the cache key.
    pub cookie_allow_list: Vec<String>,

    /// Negotiate gzip-encoded responses.
    pub gzip_enabled: bool,

    /// Negotiate brotli-encoded responses.
    pub brotli_enabled: bool,
}

impl Default for CachePolicyConfig {
    fn default() -> Self {
        Self {
            min_ttl_secs: 0,
            default_ttl_secs: 86_400,
            max_ttl_secs: 31_536_000,
            header_allow_list: Vec::new(),
            query_allow_list: Vec::new(),
            cookie_allow_list: Vec::new(),
            gzip_enabled: true,
            brotli_enabled: true,
        }
    }
}

/// Response header policy: CORS rules, security headers, custom headers.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HeaderPolicyConfig {
    /// CORS behavior. Absent = no CORS handling on this route.
    pub cors: Option<CorsConfig>,

    /// Security headers applied to every response.
    pub security: SecurityHeadersConfig,

    /// Custom headers applied to every response, in order.
    pub custom: Vec<CustomHeaderConfig>,
}

/// CORS ruleset.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. "*" allows any origin.
    pub allow_origins: Vec<String>,

    /// Allowed methods for preflight answers.
    pub allow_methods: Vec<String>,

    /// Allowed request headers for preflight answers.
    pub allow_headers: Vec<String>,

    /// Response headers exposed to the client.
    pub expose_headers: Vec<String>,

    /// Whether credentialed requests are allowed.
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,

    /// When true, the configured allow-origin value replaces whatever
    /// the origin returned; when false it is only added when absent.
    pub origin_override: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: vec!["*".to_string()],
            allow_methods: vec!["*".to_string()],
            allow_headers: vec!["*".to_string()],
            expose_headers: Vec::new(),
            allow_credentials: false,
            max_age_secs: 600,
            origin_override: true,
        }
    }
}

/// A single configured header value with override semantics.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomHeaderConfig {
    /// Header name.
    pub header: String,

    /// Header value.
    pub value: String,

    /// true = replace any existing value; false = only set when absent.
    #[serde(default, rename = "override")]
    pub override_existing: bool,
}

/// Security header ruleset. Each entry follows the same override
/// semantics as custom headers.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecurityHeadersConfig {
    pub strict_transport_security: Option<SecurityHeaderValue>,
    pub content_type_options: Option<SecurityHeaderValue>,
    pub frame_options: Option<SecurityHeaderValue>,
    pub referrer_policy: Option<SecurityHeaderValue>,
    pub content_security_policy: Option<SecurityHeaderValue>,
    pub xss_protection: Option<SecurityHeaderValue>,
}

/// Value + override flag for a security header.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecurityHeaderValue {
    pub value: String,

    #[serde(default, rename = "override")]
    pub override_existing: bool,
}

/// Health signal configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Consecutive failures before an origin is reported Degraded.
    pub degraded_threshold: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            degraded_threshold: 3,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Interval between cache expiry sweeps in seconds.
    pub cache_sweep_interval_secs: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
            cache_sweep_interval_secs: 60,
        }
    }
}
