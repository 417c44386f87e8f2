//! Core type definitions using newtype patterns for type safety.
//!
//! Targets and ports are validated once at the boundary, so the prober
//! never sees a malformed address or an out-of-range port.

mod port;
mod probe_id;
mod target;

pub use port::{Port, PortError, PortList};
pub use probe_id::ProbeId;
pub use target::{ProbeTarget, TargetError};
