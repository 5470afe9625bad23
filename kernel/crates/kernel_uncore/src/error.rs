//! Uncore PMU errors.

use kernel_abi::{EBUSY, EINVAL, EOPNOTSUPP, Errno};
use thiserror::Error;

/// Result type for uncore operations.
pub type UncoreResult<T> = Result<T, UncoreError>;

/// Errors returned to the perf scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UncoreError {
    /// No free hardware counter on the node.
    #[error("no free hardware counter on node {node}")]
    Busy { node: u32 },

    /// Event id is not implemented by this device revision.
    #[error("invalid event id {0:#x}")]
    InvalidEvent(u64),

    /// The node field does not name a discovered node.
    #[error("invalid numa node {0}")]
    InvalidNode(u32),

    /// Sampling events need an overflow interrupt, which these counters lack.
    #[error("sampling is not supported")]
    SamplingUnsupported,

    /// Counters cannot filter by privilege level or context.
    #[error("exclusion attributes are not supported")]
    InvalidAttributes,

    /// Uncore events must be bound to a CPU.
    #[error("event is not bound to a cpu")]
    CpuRequired,

    /// A unit's register window overlaps another unit or leaves the
    /// address space.
    #[error("unit at {bar:#x} on node {node} has an unusable register window")]
    InvalidUnit { node: u32, bar: usize },

    /// A device was listed with no units.
    #[error("no units discovered")]
    NoUnits,

    /// The hardware revision was already fixed.
    #[error("hardware revision already initialized")]
    AlreadyInitialized,
}

impl UncoreError {
    #[must_use]
    pub fn errno(self) -> Errno {
        match self {
            Self::Busy { .. } => EBUSY,
            Self::CpuRequired => EOPNOTSUPP,
            Self::InvalidEvent(_)
            | Self::InvalidNode(_)
            | Self::SamplingUnsupported
            | Self::InvalidAttributes
            | Self::InvalidUnit { .. }
            | Self::NoUnits
            | Self::AlreadyInitialized => EINVAL,
        }
    }
}

impl From<UncoreError> for Errno {
    fn from(err: UncoreError) -> Self {
        err.errno()
    }
}
