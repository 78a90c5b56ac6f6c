//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path)
//!     → table.rs (longest-prefix lookup)
//!     → Return: matched Route, NotFound, or MethodNotAllowed
//!
//! Route compilation (at startup):
//!     RouteConfig[]
//!     → Resolve origin references and policy overrides
//!     → Sort by prefix length
//!     → Freeze as immutable RoutingTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in the hot path (prefix matching only)
//! - Deterministic: same input always matches the same route

pub mod table;

pub use table::{Route, RouteError, RoutingTable};
