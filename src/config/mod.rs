//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file
//!     → loader.rs (read + deserialize)
//!     → validation.rs (semantic checks, all errors collected)
//!     → schema.rs types, frozen for the process lifetime
//! ```
//!
//! # Design Decisions
//! - Configuration is read once at startup; no hot reload
//! - Serde defaults keep minimal configs short
//! - Routes reference origins by name; references checked at load

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CachePolicyConfig, CorsConfig, CustomHeaderConfig, GatewayConfig, HeaderPolicyConfig,
    HealthConfig, ListenerConfig, ObservabilityConfig, OriginConfig, RouteConfig,
    SecurityHeaderValue, SecurityHeadersConfig,
};
pub use validation::{validate_config, ValidationError};
