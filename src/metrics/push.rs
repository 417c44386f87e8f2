//! Periodic push of metrics to a Pushgateway-compatible endpoint.

use super::Metrics;
use crate::config::PushSettings;
use crate::error::MetricsError;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Delay before the first push, giving the server time to come up.
const INITIAL_PUSH_DELAY: Duration = Duration::from_secs(5);

/// Pushes the registry contents to `<url>/metrics/job/<job>`.
pub struct MetricsPusher {
    client: reqwest::Client,
    settings: PushSettings,
    metrics: Metrics,
}

impl MetricsPusher {
    pub fn new(settings: PushSettings, metrics: Metrics) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
            metrics,
        }
    }

    /// Full URL metrics are posted to.
    pub fn endpoint(&self) -> String {
        format!("{}/metrics/job/{}", self.settings.url, self.settings.job_name)
    }

    /// Push the current metrics once, adding to what the gateway holds.
    pub async fn push(&self) -> Result<(), MetricsError> {
        let body = self.metrics.render()?;
        let response = self
            .client
            .post(self.endpoint())
            .basic_auth(&self.settings.username, Some(self.settings.api_key.expose()))
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetricsError::Rejected(status));
        }
        Ok(())
    }

    async fn push_logged(&self) {
        match self.push().await {
            Ok(()) => debug!(endpoint = %self.endpoint(), "pushed metrics"),
            Err(e) => error!(endpoint = %self.endpoint(), error = %e, "error pushing metrics"),
        }
    }

    /// Push after a short warm-up, then on every interval, and once more
    /// when `shutdown` fires.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            endpoint = %self.endpoint(),
            job = %self.settings.job_name,
            interval_ms = self.settings.interval.as_millis() as u64,
            "metrics push configured"
        );

        let warm_up = sleep(INITIAL_PUSH_DELAY);
        tokio::pin!(warm_up);
        let mut warmed_up = false;

        let mut ticker = interval_at(Instant::now() + self.settings.interval, self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut warm_up, if !warmed_up => {
                    warmed_up = true;
                    self.push_logged().await;
                }
                _ = ticker.tick() => self.push_logged().await,
                _ = shutdown.changed() => {
                    self.push_logged().await;
                    break;
                }
            }
        }
    }
}
