//! Latency prober - multi-attempt, multi-port TCP reachability measurement.
//!
//! A probe run performs `attempts` rounds. Each round walks the candidate
//! port list in order and stops at the first port that accepts a
//! connection. Rounds are separated by a constant pause. Failed rounds
//! contribute nothing; the run only fails when every round failed.

pub mod tcp;
pub mod traits;

use crate::error::{ProbeError, ProbeResult};
use crate::types::{Port, ProbeId, ProbeTarget};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

pub use tcp::TcpConnector;
pub use traits::{Connector, LatencyReport, ProbeConfig, SharedConnector};

/// Maximum number of connections a probe run holds open at once.
///
/// Attempts and ports are walked strictly one after another so a single
/// request never turns into a burst of connections toward a caller-chosen
/// host.
pub const MAX_CONCURRENT_CONNECTIONS: usize = 1;

/// Runs probe sessions against validated targets.
///
/// Holds no per-request state: each call to [`measure`](Self::measure)
/// owns its own accumulators, so one prober can serve concurrent requests.
#[derive(Clone)]
pub struct LatencyProber {
    connector: SharedConnector,
    config: ProbeConfig,
}

impl LatencyProber {
    /// Create a prober, rejecting unusable configurations.
    pub fn new(connector: SharedConnector, config: ProbeConfig) -> ProbeResult<Self> {
        config.validate()?;
        Ok(Self { connector, config })
    }

    /// Create a prober that uses real TCP sockets.
    pub fn tcp(config: ProbeConfig) -> ProbeResult<Self> {
        Self::new(Arc::new(TcpConnector::new()), config)
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Measure connect latency to `target`.
    pub async fn measure(&self, target: &ProbeTarget) -> ProbeResult<LatencyReport> {
        let id = ProbeId::new();
        let span = info_span!("probe", id = %id.short(), target = %target);
        self.run(target).instrument(span).await
    }

    async fn run(&self, target: &ProbeTarget) -> ProbeResult<LatencyReport> {
        let config = &self.config;
        let mut times_ms = Vec::new();
        let mut ports_hit = Vec::new();

        for attempt in 1..=config.attempts {
            match self.attempt(target, attempt).await {
                Some((port, elapsed)) => {
                    times_ms.push(elapsed);
                    ports_hit.push(port);
                }
                None => warn!(attempt, ports = %config.ports, "all ports failed for attempt"),
            }

            if attempt < config.attempts {
                tokio::time::sleep(config.delay).await;
            }
        }

        if times_ms.is_empty() {
            return Err(ProbeError::AllAttemptsFailed {
                attempts: config.attempts,
                ports: config.ports.as_slice().to_vec(),
            });
        }

        let report = LatencyReport::from_samples(times_ms, ports_hit, config.ports.first());
        info!(
            successes = report.successes(),
            attempts = config.attempts,
            average_ms = report.average_ms,
            "probe complete"
        );
        Ok(report)
    }

    /// One round: first port to accept wins, each port tried at most once.
    async fn attempt(&self, target: &ProbeTarget, attempt: u32) -> Option<(Port, u64)> {
        for port in self.config.ports.iter() {
            let addr = target.socket_addr(port);
            match self.connector.connect(addr, self.config.timeout).await {
                Ok(elapsed) => {
                    debug!(attempt, %port, elapsed_ms = elapsed, "connected");
                    return Some((port, elapsed));
                }
                Err(e) => debug!(attempt, %port, error = %e, "attempt failed"),
            }
        }
        None
    }
}

/// Scripted connectors for exercising the orchestration without sockets.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::io;
    use std::net::SocketAddrV4;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    /// What the next connection attempt should do.
    #[derive(Debug, Clone, Copy)]
    pub enum Step {
        Connect(u64),
        Refuse,
        Timeout,
    }

    /// Replays a fixed script of outcomes and records every call.
    ///
    /// Once the script runs out every further call is refused.
    #[derive(Default)]
    pub struct ScriptedConnector {
        steps: Mutex<VecDeque<Step>>,
        calls: Mutex<Vec<(u16, Instant)>>,
    }

    impl ScriptedConnector {
        pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into_iter().collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        /// A connector that succeeds instantly with `ms` on every call.
        pub fn always(ms: u64, calls: usize) -> Arc<Self> {
            Self::new(std::iter::repeat(Step::Connect(ms)).take(calls))
        }

        pub fn ports_called(&self) -> Vec<u16> {
            self.calls.lock().unwrap().iter().map(|(p, _)| *p).collect()
        }

        pub fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
        }
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        async fn connect(&self, addr: SocketAddrV4, timeout: Duration) -> ProbeResult<u64> {
            self.calls.lock().unwrap().push((addr.port(), Instant::now()));
            let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Refuse);
            match step {
                Step::Connect(ms) => Ok(ms),
                Step::Refuse => Err(ProbeError::Connection {
                    addr,
                    source: io::Error::from(io::ErrorKind::ConnectionRefused),
                }),
                Step::Timeout => Err(ProbeError::Timeout { addr, timeout }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{ScriptedConnector, Step};
    use super::*;
    use std::time::Duration;
    use tokio::time::Instant;

    fn target() -> ProbeTarget {
        "8.8.8.8".parse().unwrap()
    }

    fn prober(connector: Arc<ScriptedConnector>, config: ProbeConfig) -> LatencyProber {
        LatencyProber::new(connector, config).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_attempts_succeed_on_primary_port() {
        let connector = ScriptedConnector::new([Step::Connect(12), Step::Connect(15), Step::Connect(18)]);
        let report = prober(connector.clone(), ProbeConfig::default())
            .measure(&target())
            .await
            .unwrap();

        assert_eq!(report.times_ms, vec![12, 15, 18]);
        assert_eq!(report.average_ms, 15.0);
        assert_eq!(report.reported_port, Port::HTTPS);
        assert_eq!(connector.ports_called(), vec![443, 443, 443]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_ports_in_order() {
        let connector = ScriptedConnector::new([
            // attempt 1: 443 refused, 80 answers
            Step::Refuse,
            Step::Connect(20),
            // attempt 2: 443 answers
            Step::Connect(10),
            // attempt 3: 443 and 80 time out, 22 answers
            Step::Timeout,
            Step::Timeout,
            Step::Connect(30),
        ]);
        let report = prober(connector.clone(), ProbeConfig::default())
            .measure(&target())
            .await
            .unwrap();

        assert_eq!(connector.ports_called(), vec![443, 80, 443, 443, 80, 22]);
        assert_eq!(report.times_ms, vec![20, 10, 30]);
        assert_eq!(report.ports_hit, vec![Port::HTTP, Port::HTTPS, Port::SSH]);
        // still reports the first candidate
        assert_eq!(report.reported_port, Port::HTTPS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_success_is_not_an_error() {
        let connector = ScriptedConnector::new([
            Step::Refuse,
            Step::Refuse,
            Step::Timeout,
            Step::Connect(42),
            // attempt 3 falls through to the exhausted script and is refused
        ]);
        let report = prober(connector.clone(), ProbeConfig::default())
            .measure(&target())
            .await
            .unwrap();

        assert_eq!(report.times_ms, vec![42]);
        assert_eq!(report.rounded_average_ms(), 42);
        assert_eq!(connector.ports_called(), vec![443, 80, 22, 443, 443, 80, 22]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_failure() {
        let connector = ScriptedConnector::new([]);
        let result = prober(connector.clone(), ProbeConfig::default())
            .measure(&target())
            .await;

        match result {
            Err(ProbeError::AllAttemptsFailed { attempts, ports }) => {
                assert_eq!(attempts, 3);
                assert_eq!(ports, vec![Port::HTTPS, Port::HTTP, Port::SSH]);
            }
            other => panic!("expected total failure, got {:?}", other),
        }
        // each port tried exactly once per attempt
        assert_eq!(connector.ports_called().len(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_attempts_only() {
        let connector = ScriptedConnector::always(5, 3);
        let start = Instant::now();

        prober(connector.clone(), ProbeConfig::default())
            .measure(&target())
            .await
            .unwrap();

        let calls = connector.call_times();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0] - start, Duration::ZERO);
        assert_eq!(calls[1] - calls[0], Duration::from_millis(100));
        assert_eq!(calls[2] - calls[1], Duration::from_millis(100));
        // no pause after the final attempt
        assert_eq!(start.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_config() {
        let config = ProbeConfig::new()
            .with_ports("8080,8443".parse().unwrap())
            .with_attempts(2)
            .with_delay(Duration::from_millis(250));
        let connector = ScriptedConnector::new([Step::Refuse, Step::Connect(7), Step::Connect(9)]);
        let start = Instant::now();

        let report = prober(connector.clone(), config).measure(&target()).await.unwrap();

        assert_eq!(connector.ports_called(), vec![8080, 8443, 8080]);
        assert_eq!(report.times_ms, vec![7, 9]);
        assert_eq!(report.reported_port.as_u16(), 8080);
        assert_eq!(start.elapsed(), Duration::from_millis(250));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = LatencyProber::tcp(ProbeConfig::new().with_attempts(0));
        assert!(matches!(result, Err(ProbeError::InvalidConfig(_))));
    }
}
