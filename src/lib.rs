//! Edge request-delivery gateway.
//!
//! Terminates inbound HTTP requests, picks the serving origin with
//! single-hop failover, serves TTL-bounded cached responses keyed by
//! allow-listed request dimensions, and applies a response header
//! policy (CORS, security headers, custom headers) before replying.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client Request
//!       │
//!       ▼
//!   ┌─────────┐   ┌──────────┐   ┌────────────────────────────┐
//!   │  http   │──▶│ routing  │──▶│           cache            │
//!   │ server  │   │  table   │   │  key → store → engine      │
//!   └─────────┘   └──────────┘   └──────────────┬─────────────┘
//!       ▲                                       │ miss
//!       │                                       ▼
//!   ┌─────────┐                  ┌────────────────────────────┐
//!   │ headers │◀─────────────────│           origin           │
//!   │ policy  │    response      │  selector (failover) +     │
//!   └─────────┘                  │  health signal             │
//!                                └────────────────────────────┘
//!
//!   Cross-cutting: config · observability · lifecycle
//! ```

// Core subsystems
pub mod cache;
pub mod config;
pub mod headers;
pub mod http;
pub mod origin;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
