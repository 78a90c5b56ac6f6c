//! Response header policy subsystem.
//!
//! # Data Flow
//! ```text
//! Preflight probe → cors.rs (answered from config, no origin fetch)
//!
//! Origin/cache response
//!     → policy.rs (security headers, custom headers, override rules)
//!     → cors.rs (allow-origin injection, origin_override semantics)
//!     → Send to client
//! ```

pub mod cors;
pub mod policy;

pub use cors::CorsRules;
pub use policy::HeaderRules;
