//! Correlation identifiers for probe runs.
//!
//! Every probe gets a `ProbeId` so its per-attempt log lines can be tied
//! back to the request that triggered it.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// A unique identifier for a single probe run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProbeId(Uuid);

impl ProbeId {
    /// Generate a new random probe ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get a short representation (first 8 characters).
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for ProbeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_id_generation() {
        assert_ne!(ProbeId::new(), ProbeId::new());
    }

    #[test]
    fn test_probe_id_short() {
        let id = ProbeId::new();
        assert_eq!(id.short().len(), 8);
        assert!(id.to_string().starts_with(&id.short()));
    }
}
