//! Operational metrics.
//!
//! Keeps a private Prometheus registry with HTTP route metrics, probe
//! outcome metrics and, on Linux, process metrics. The registry is rendered
//! in the text exposition format for `GET /metrics` and, optionally, pushed
//! to a remote gateway.

mod push;

pub use push::MetricsPusher;

use crate::error::MetricsError;
use crate::prober::LatencyReport;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Prefix applied to every metric name.
pub const NAMESPACE: &str = "tcping_api";

const LATENCY_BUCKETS_MS: &[f64] = &[
    1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2000.0,
];

/// Handle to the service's metrics. Clones share the same registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    http_requests: IntCounterVec,
    http_duration: HistogramVec,
    probe_runs: IntCounterVec,
    probe_failed_attempts: IntCounter,
    probe_latency: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new_custom(Some(NAMESPACE.to_string()), None)?;

        let http_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests by route and status"),
            &["method", "route", "status"],
        )?;
        let http_duration = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request duration"),
            &["method", "route", "status"],
        )?;
        let probe_runs = IntCounterVec::new(
            Opts::new("probe_runs_total", "Probe runs by outcome"),
            &["outcome"],
        )?;
        let probe_failed_attempts = IntCounter::new(
            "probe_failed_attempts_total",
            "Attempts in which no candidate port accepted a connection",
        )?;
        let probe_latency = Histogram::with_opts(
            HistogramOpts::new("probe_latency_ms", "Average connect latency per probe run")
                .buckets(LATENCY_BUCKETS_MS.to_vec()),
        )?;

        registry.register(Box::new(http_requests.clone()))?;
        registry.register(Box::new(http_duration.clone()))?;
        registry.register(Box::new(probe_runs.clone()))?;
        registry.register(Box::new(probe_failed_attempts.clone()))?;
        registry.register(Box::new(probe_latency.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            http_requests,
            http_duration,
            probe_runs,
            probe_failed_attempts,
            probe_latency,
        })
    }

    /// Record one completed HTTP request.
    pub fn observe_request(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        let status = status.to_string();
        self.http_requests
            .with_label_values(&[method, route, &status])
            .inc();
        self.http_duration
            .with_label_values(&[method, route, &status])
            .observe(elapsed.as_secs_f64());
    }

    /// Record a probe run that produced a measurement.
    pub fn observe_probe_success(&self, report: &LatencyReport, attempts: u32) {
        self.probe_runs.with_label_values(&["success"]).inc();
        self.probe_failed_attempts
            .inc_by(u64::from(attempts).saturating_sub(report.successes() as u64));
        self.probe_latency.observe(report.average_ms);
    }

    /// Record a probe run in which every attempt failed.
    pub fn observe_probe_failure(&self, attempts: u32) {
        self.probe_runs.with_label_values(&["failure"]).inc();
        self.probe_failed_attempts.inc_by(u64::from(attempts));
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| MetricsError::Registry(prometheus::Error::Msg(e.to_string())))
    }

    /// Content type of [`render`](Self::render)'s output.
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}
