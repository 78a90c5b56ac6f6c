//! Origin subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → selector.rs
//!     → attempt primary (with per-origin timeout)
//!     → on transport error or failover-triggering status:
//!         attempt fallback once, result returned as-is
//!     → every attempt records an outcome in health.rs
//! ```
//!
//! # Design Decisions
//! - Failover is single-level; no backoff, no same-origin retry
//! - Health signal is advisory only, never gates the primary attempt
//! - Origins are opaque HTTP endpoints; no special casing for
//!   function-backed origins

pub mod health;
pub mod selector;

use std::time::Duration;

use url::Url;

pub use health::{Health, HealthMonitor, Outcome};
pub use selector::{FetchError, OriginResponse, OriginSelector};

/// A backend origin, immutable after configuration load.
#[derive(Debug, Clone)]
pub struct Origin {
    /// Identifier referenced by routes and used in logs/metrics.
    pub name: String,

    /// Base URL requests are forwarded to.
    pub base_url: Url,

    /// Per-call timeout.
    pub timeout: Duration,
}
