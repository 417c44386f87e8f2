//! Error types for tcping-api.
//!
//! Uses `thiserror` for ergonomic error definitions.

use crate::types::{Port, PortError};
use std::net::SocketAddrV4;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while probing a target.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The transport reported an error (refused, unreachable, reset)
    /// before the timeout elapsed.
    #[error("connection to {addr} failed: {source}")]
    Connection {
        addr: SocketAddrV4,
        #[source]
        source: std::io::Error,
    },

    #[error("TCP ping timeout on {addr} after {}ms", .timeout.as_millis())]
    Timeout { addr: SocketAddrV4, timeout: Duration },

    /// Every attempt failed on every candidate port.
    #[error("All ping attempts failed on all ports")]
    AllAttemptsFailed { attempts: u32, ports: Vec<Port> },

    #[error("Invalid probe configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Bearer token authentication failures.
///
/// All variants surface to clients with the same body; the variant
/// only shows up in logs.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,

    #[error("malformed Authorization header")]
    MalformedHeader,

    #[error("token rejected: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Token issuance failures.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),

    #[error("system clock is before the Unix epoch")]
    Clock,

    #[error("token lifetime is too large")]
    LifetimeOutOfRange,
}

/// Metrics export and push failures.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("metrics registry error: {0}")]
    Registry(#[from] prometheus::Error),

    #[error("metrics push request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("metrics push rejected with status {0}")]
    Rejected(reqwest::StatusCode),
}

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },

    #[error("failed to load .env file: {0}")]
    EnvFile(String),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level error for CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Server(#[from] anyhow::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
