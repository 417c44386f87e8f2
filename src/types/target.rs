//! Probe target validation.
//!
//! Only literal dotted-quad IPv4 addresses are accepted. Hostnames, IPv6,
//! CIDR ranges and surrounding whitespace are all rejected before any
//! network activity takes place.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::str::FromStr;
use std::sync::OnceLock;

use super::Port;

/// Four groups of one to three digits, each at most 255, joined by dots.
const IPV4_PATTERN: &str =
    r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$";

fn ipv4_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(IPV4_PATTERN).expect("IPv4 pattern is valid"))
}

/// Error type for target validation.
///
/// The display strings are returned verbatim to HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("Missing IP address in request body")]
    Missing,
    #[error("Invalid IP address format")]
    InvalidFormat(String),
}

/// A validated IPv4 probe target.
///
/// Keeps the caller's original text alongside the parsed address so the
/// response can echo exactly what was submitted. Groups with leading zeros
/// (`010.0.0.1`) are accepted and read as decimal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProbeTarget {
    original: String,
    #[serde(skip)]
    ip: Ipv4Addr,
}

impl ProbeTarget {
    /// Validate a raw string as a probe target.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        if s.is_empty() {
            return Err(TargetError::Missing);
        }
        if !ipv4_regex().is_match(s) {
            return Err(TargetError::InvalidFormat(s.to_string()));
        }

        let mut octets = [0u8; 4];
        for (slot, group) in octets.iter_mut().zip(s.split('.')) {
            *slot = group
                .parse()
                .map_err(|_| TargetError::InvalidFormat(s.to_string()))?;
        }

        Ok(Self {
            original: s.to_string(),
            ip: Ipv4Addr::from(octets),
        })
    }

    /// The text the caller submitted.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    /// Socket address for a connection attempt on `port`.
    pub fn socket_addr(&self, port: Port) -> SocketAddrV4 {
        SocketAddrV4::new(self.ip, port.as_u16())
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

impl FromStr for ProbeTarget {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
