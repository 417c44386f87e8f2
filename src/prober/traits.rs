//! Connector trait abstraction and probe data types.
//!
//! The orchestration loop only talks to a [`Connector`], which keeps the
//! attempt/fallback logic testable without touching the network.

use crate::error::{ProbeError, ProbeResult};
use crate::types::{Port, PortList};
use async_trait::async_trait;
use serde::Serialize;
use std::net::SocketAddrV4;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a probe run.
///
/// Built from defaults plus optional overrides and never mutated after the
/// prober is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Candidate ports, tried in order within each attempt.
    pub ports: PortList,
    /// Number of sequential measurement rounds.
    pub attempts: u32,
    /// Per-connection timeout.
    pub timeout: Duration,
    /// Constant pause between consecutive attempts.
    pub delay: Duration,
}

impl ProbeConfig {
    pub const DEFAULT_ATTEMPTS: u32 = 3;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);
    /// Largest accepted attempt count.
    pub const MAX_ATTEMPTS: u32 = 100;

    /// Create a configuration with the default values.
    pub fn new() -> Self {
        Self {
            ports: PortList::default(),
            attempts: Self::DEFAULT_ATTEMPTS,
            timeout: Self::DEFAULT_TIMEOUT,
            delay: Self::DEFAULT_DELAY,
        }
    }

    /// Set the candidate ports.
    pub fn with_ports(mut self, ports: PortList) -> Self {
        self.ports = ports;
        self
    }

    /// Set the attempt count.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Set the per-connection timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the inter-attempt delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Reject configurations that could never produce a measurement.
    pub fn validate(&self) -> ProbeResult<()> {
        if self.attempts == 0 {
            return Err(ProbeError::InvalidConfig(
                "attempt count must be at least 1".to_string(),
            ));
        }
        if self.attempts > Self::MAX_ATTEMPTS {
            return Err(ProbeError::InvalidConfig(format!(
                "attempt count must be at most {}",
                Self::MAX_ATTEMPTS
            )));
        }
        if self.timeout.is_zero() {
            return Err(ProbeError::InvalidConfig(
                "connection timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Upper bound on how long a single probe run can take.
    pub fn worst_case_duration(&self) -> Duration {
        let connects = self.attempts.saturating_mul(self.ports.len() as u32);
        self.timeout.saturating_mul(connects)
            + self.delay.saturating_mul(self.attempts.saturating_sub(1))
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate outcome of a successful probe run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyReport {
    /// Elapsed connect time per successful attempt, in attempt order.
    pub times_ms: Vec<u64>,
    /// Port that accepted the connection, aligned with `times_ms`.
    pub ports_hit: Vec<Port>,
    /// Arithmetic mean of `times_ms`, unrounded.
    pub average_ms: f64,
    /// Port reported to callers as used.
    ///
    /// Always the first configured candidate, even when an attempt only
    /// succeeded on a fallback port. Kept for response compatibility.
    pub reported_port: Port,
}

impl LatencyReport {
    /// Build a report from non-empty successful samples.
    pub(crate) fn from_samples(times_ms: Vec<u64>, ports_hit: Vec<Port>, reported_port: Port) -> Self {
        let sum: u64 = times_ms.iter().sum();
        let average_ms = sum as f64 / times_ms.len() as f64;
        Self {
            times_ms,
            ports_hit,
            average_ms,
            reported_port,
        }
    }

    /// Mean rounded to the nearest millisecond, halves away from zero.
    pub fn rounded_average_ms(&self) -> u64 {
        self.average_ms.round() as u64
    }

    /// Number of attempts that produced a measurement.
    pub fn successes(&self) -> usize {
        self.times_ms.len()
    }
}

/// A single TCP connection probe.
///
/// Implementations open at most one transport handle per call and must
/// release it on every exit path.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `addr` and return the elapsed milliseconds until the
    /// connection was established.
    ///
    /// Fails with [`ProbeError::Connection`] when the transport reports an
    /// error and with [`ProbeError::Timeout`] when nothing happens within
    /// `timeout`.
    async fn connect(&self, addr: SocketAddrV4, timeout: Duration) -> ProbeResult<u64>;
}

/// A shared connector for dynamic dispatch.
pub type SharedConnector = Arc<dyn Connector>;
