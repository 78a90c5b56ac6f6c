//! Per-origin health signal.
//!
//! # Responsibilities
//! - Observe request outcomes per origin
//! - Track consecutive failures with thread-safe counters
//! - Expose a Healthy/Degraded signal
//!
//! # Design Decisions
//! - Failover-triggering statuses and transport errors count as failures
//! - A single success resets the failure counter
//! - The signal is observability only: the selector always tries the
//!   primary regardless of recorded health

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::observability::metrics;

/// Outcome of a single origin attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    FailoverStatus,
    TransportError,
}

/// Current health signal for an origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Degraded,
}

#[derive(Debug, Default)]
struct Signal {
    consecutive_failures: AtomicU32,
}

/// Tracks request outcomes per origin.
///
/// Counters are independent per origin and updated with atomics, so
/// concurrent writers never serialize against each other.
#[derive(Debug)]
pub struct HealthMonitor {
    signals: HashMap<String, Signal>,
    degraded_threshold: u32,
}

impl HealthMonitor {
    /// Create a monitor for the given origin names.
    pub fn new(origins: impl IntoIterator<Item = String>, degraded_threshold: u32) -> Self {
        let signals = origins
            .into_iter()
            .map(|name| (name, Signal::default()))
            .collect();
        Self {
            signals,
            degraded_threshold: degraded_threshold.max(1),
        }
    }

    /// Record the outcome of one origin attempt.
    pub fn record(&self, origin: &str, outcome: Outcome) {
        let Some(signal) = self.signals.get(origin) else {
            tracing::debug!(origin = %origin, "Outcome recorded for unknown origin");
            return;
        };

        match outcome {
            Outcome::Success => {
                signal.consecutive_failures.store(0, Ordering::Relaxed);
            }
            Outcome::FailoverStatus | Outcome::TransportError => {
                let failures = signal.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
                if failures == self.degraded_threshold {
                    tracing::warn!(
                        origin = %origin,
                        failures,
                        "Origin degraded"
                    );
                }
            }
        }

        metrics::record_origin_health(origin, self.health_of(origin) == Health::Healthy);
    }

    /// Current health signal for an origin. Unknown origins read Healthy.
    pub fn health_of(&self, origin: &str) -> Health {
        match self.signals.get(origin) {
            Some(signal)
                if signal.consecutive_failures.load(Ordering::Relaxed)
                    >= self.degraded_threshold =>
            {
                Health::Degraded
            }
            _ => Health::Healthy,
        }
    }
}
