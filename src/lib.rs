//! # tcping-api - Authenticated TCP Latency Probe Service
//!
//! Measures round-trip TCP connect latency to IPv4 hosts and serves the
//! results over a small authenticated JSON API.
//!
//! ## Features
//!
//! - **Port Fallback**: Each attempt tries HTTPS, then HTTP, then SSH until one connects
//! - **Repeated Attempts**: Several sequential attempts with a short pause between them
//! - **Bearer Auth**: HS256 JWTs signed with a shared secret
//! - **Metrics**: Prometheus exposition plus optional periodic push
//! - **Token CLI**: Issue client, service and permanent tokens
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use tcping_api::prober::{LatencyProber, ProbeConfig};
//! use tcping_api::types::ProbeTarget;
//!
//! #[tokio::main]
//! async fn main() {
//!     let prober = LatencyProber::tcp(ProbeConfig::default()).unwrap();
//!     let target: ProbeTarget = "1.1.1.1".parse().unwrap();
//!
//!     let report = prober.measure(&target).await.unwrap();
//!     println!("{} avg {}ms", target, report.rounded_average_ms());
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Validated ports, port lists and probe targets
//! - [`prober`] - Latency measurement and the `Connector` trait
//! - [`server`] - Axum router, auth and handlers
//! - [`token`] - Token issuance and verification
//! - [`metrics`] - Prometheus registry and push
//! - [`config`] - Environment-driven settings
//! - [`error`] - Error types
//! - [`output`] - CLI output helpers

pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod output;
pub mod prober;
pub mod server;
pub mod token;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ProbeError};
pub use prober::{LatencyProber, LatencyReport, ProbeConfig};
pub use types::{Port, PortList, ProbeTarget};
