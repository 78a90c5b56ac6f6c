//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatch)
//!     → request.rs (request ID, buffering, hop-by-hop stripping)
//!     → routing / cache / headers subsystems
//!     → error.rs (failure taxonomy → status codes)
//!     → Send to client
//! ```

pub mod error;
pub mod request;
pub mod server;

pub use error::GatewayError;
pub use request::{ForwardRequest, RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, GatewayServer};
