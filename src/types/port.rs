//! Port types with validation and parsing.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortList` is the ordered candidate list a probe walks through.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    pub const HTTPS: Port = Port(443);
    pub const HTTP: Port = Port(80);
    pub const SSH: Port = Port(22);

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(value))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(u16),
    #[error("invalid port number: {0}")]
    InvalidFormat(String),
    #[error("empty port list")]
    Empty,
}

/// An ordered, non-empty list of distinct candidate ports.
///
/// Order is significant: a probe attempt tries ports front to back and
/// stops at the first one that accepts a connection. Parsing keeps the
/// first occurrence of a repeated port and never sorts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PortList(Vec<Port>);

impl PortList {
    /// Build a list from ports in priority order.
    pub fn new(ports: impl IntoIterator<Item = Port>) -> Result<Self, PortError> {
        let mut list: Vec<Port> = Vec::new();
        for port in ports {
            if !list.contains(&port) {
                list.push(port);
            }
        }

        if list.is_empty() {
            return Err(PortError::Empty);
        }
        Ok(Self(list))
    }

    /// The port reported back to callers as "used".
    pub fn first(&self) -> Port {
        self.0[0]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a constructed list.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Port> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Port] {
        &self.0
    }
}

impl Default for PortList {
    /// HTTPS, HTTP, then SSH.
    fn default() -> Self {
        Self(vec![Port::HTTPS, Port::HTTP, Port::SSH])
    }
}

impl FromStr for PortList {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PortError::Empty);
        }

        let mut ports = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            let port: u16 = part
                .parse()
                .map_err(|_| PortError::InvalidFormat(part.to_string()))?;
            ports.push(Port::try_from(port)?);
        }

        Self::new(ports)
    }
}

impl fmt::Display for PortList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}
