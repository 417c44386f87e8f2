//! Process settings read from the environment.
//!
//! Values come from real environment variables, optionally seeded from a
//! `.env` file. Everything is read once at startup and handed out as
//! immutable values; nothing here is a mutable global.

use crate::error::{ConfigError, ConfigResult};
use crate::prober::ProbeConfig;
use crate::types::PortList;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const API_KEY_VAR: &str = "INTERNAL_API_KEY";
pub const PORT_VAR: &str = "PORT";
pub const APP_ENV_VAR: &str = "APP_ENV";
pub const NODE_ENV_VAR: &str = "NODE_ENV";
pub const PROBE_PORTS_VAR: &str = "PROBE_PORTS";
pub const PROBE_ATTEMPTS_VAR: &str = "PROBE_ATTEMPTS";
pub const PROBE_TIMEOUT_VAR: &str = "PROBE_TIMEOUT_MS";
pub const PROBE_DELAY_VAR: &str = "PROBE_DELAY_MS";
pub const PUSH_URL_VAR: &str = "GRAFANA_CLOUD_URL";
pub const PUSH_URL_FALLBACK_VAR: &str = "PROMETHEUS_PUSH_URL";
pub const PUSH_USERNAME_VAR: &str = "GRAFANA_CLOUD_USERNAME";
pub const PUSH_API_KEY_VAR: &str = "GRAFANA_CLOUD_API_KEY";
pub const PUSH_INTERVAL_VAR: &str = "METRICS_PUSH_INTERVAL";
pub const PUSH_JOB_VAR: &str = "METRICS_JOB_NAME";

/// Environment variables that must be set for the server to start.
pub const REQUIRED_VARS: &[&str] = &[API_KEY_VAR];

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ENV: &str = "development";
const DEFAULT_PUSH_INTERVAL: Duration = Duration::from_millis(15_000);
const DEFAULT_JOB_NAME: &str = "tcping-api";

/// The shared signing secret.
///
/// Cheap to clone and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Arc<str>);

impl SecretKey {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// Remote push target for metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSettings {
    pub url: String,
    pub username: String,
    pub api_key: SecretKey,
    pub interval: Duration,
    pub job_name: String,
}

/// Application-wide settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Deployment environment name (`development`, `production`, ...).
    pub env: String,
    /// TCP port the HTTP server listens on.
    pub port: u16,
    /// Secret used to sign and verify bearer tokens.
    pub secret: SecretKey,
    /// Probe defaults plus any overrides.
    pub probe: ProbeConfig,
    /// Metrics push target, when fully configured.
    pub push: Option<PushSettings>,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup function.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = get(API_KEY_VAR)
            .map(SecretKey::new)
            .ok_or(ConfigError::MissingVar(API_KEY_VAR))?;

        let port = match get(PORT_VAR) {
            Some(raw) => parse_number(PORT_VAR, &raw)?,
            None => DEFAULT_PORT,
        };

        let env = environment_from(&get);

        let mut probe = ProbeConfig::new();
        if let Some(raw) = get(PROBE_PORTS_VAR) {
            probe = probe.with_ports(raw.parse::<PortList>()?);
        }
        if let Some(raw) = get(PROBE_ATTEMPTS_VAR) {
            probe = probe.with_attempts(parse_number(PROBE_ATTEMPTS_VAR, &raw)?);
        }
        if let Some(raw) = get(PROBE_TIMEOUT_VAR) {
            probe = probe.with_timeout(Duration::from_millis(parse_number(PROBE_TIMEOUT_VAR, &raw)?));
        }
        if let Some(raw) = get(PROBE_DELAY_VAR) {
            probe = probe.with_delay(Duration::from_millis(parse_number(PROBE_DELAY_VAR, &raw)?));
        }
        probe.validate()?;

        let push = match (
            get(PUSH_URL_VAR).or_else(|| get(PUSH_URL_FALLBACK_VAR)),
            get(PUSH_USERNAME_VAR),
            get(PUSH_API_KEY_VAR),
        ) {
            (Some(url), Some(username), Some(api_key)) => {
                let interval = match get(PUSH_INTERVAL_VAR) {
                    Some(raw) => Duration::from_millis(parse_number(PUSH_INTERVAL_VAR, &raw)?),
                    None => DEFAULT_PUSH_INTERVAL,
                };
                if interval.is_zero() {
                    return Err(ConfigError::InvalidValue {
                        var: PUSH_INTERVAL_VAR,
                        reason: "must be positive".to_string(),
                    });
                }
                Some(PushSettings {
                    url: url.trim_end_matches('/').to_string(),
                    username,
                    api_key: SecretKey::new(api_key),
                    interval,
                    job_name: get(PUSH_JOB_VAR).unwrap_or_else(|| DEFAULT_JOB_NAME.to_string()),
                })
            }
            _ => None,
        };

        Ok(Self {
            env,
            port,
            secret,
            probe,
            push,
        })
    }

    /// Override the listening port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn is_production(&self) -> bool {
        is_production(&self.env)
    }

    /// Default log filter for this environment.
    pub fn default_log_level(&self) -> &'static str {
        log_level_for(&self.env)
    }
}

/// Deployment environment from `APP_ENV`, then `NODE_ENV`.
///
/// Readable before the rest of the settings so logging can be set up
/// even when configuration is incomplete.
pub fn environment() -> String {
    environment_from(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
}

fn environment_from<F>(get: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    get(APP_ENV_VAR)
        .or_else(|| get(NODE_ENV_VAR))
        .unwrap_or_else(|| DEFAULT_ENV.to_string())
}

fn is_production(env: &str) -> bool {
    env.eq_ignore_ascii_case("production")
}

/// `info` in production, `debug` everywhere else.
pub fn log_level_for(env: &str) -> &'static str {
    if is_production(env) {
        "info"
    } else {
        "debug"
    }
}

fn parse_number<T>(var: &'static str, raw: &str) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var,
        reason: format!("'{}': {}", raw, e),
    })
}
