//! Caching subsystem.
//!
//! # Data Flow
//! ```text
//! Routed request
//!     → policy.rs (negotiate encoding, TTL bounds)
//!     → key.rs (compose deterministic key from allow-listed dimensions)
//!     → store.rs (fresh entry? serve it)
//!     → engine.rs (miss: fetch via origin selector, clamp TTL, store)
//! ```
//!
//! # Design Decisions
//! - The engine is the store's sole mutator
//! - Concurrent misses for one key may each fetch; the last write wins
//! - Freshness is checked on read, the sweep task only bounds memory

pub mod engine;
pub mod key;
pub mod policy;
pub mod store;

pub use engine::{CacheEngine, GatewayResponse, X_CACHE};
pub use policy::{CachePolicy, Encoding};
pub use store::{spawn_sweep_task, CacheEntry, CacheStore, CacheStoreError};
