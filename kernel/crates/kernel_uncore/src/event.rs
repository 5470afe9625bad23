//! Monitoring requests and their hardware state.

use core::num::NonZeroU64;
use core::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;

use crate::window::RegisterBases;

/// Mask of the event id inside the configuration word.
pub const EVENT_ID_MASK: u64 = 0xffff;

/// Shift of the node field inside the configuration word.
pub const NODE_SHIFT: u32 = 16;

/// Mask of the node field after shifting (`config:16-17`).
pub const NODE_MASK: u64 = 0x3;

/// Extract the event id from a configuration word.
#[inline]
#[must_use]
pub const fn event_id(config: u64) -> u64 {
    config & EVENT_ID_MASK
}

/// Extract the node id from a configuration word.
#[inline]
#[must_use]
pub const fn node_id(config: u64) -> u32 {
    ((config >> NODE_SHIFT) & NODE_MASK) as u32
}

/// Build a configuration word.
#[inline]
#[must_use]
pub const fn config(node: u32, event: u64) -> u64 {
    (((node as u64) & NODE_MASK) << NODE_SHIFT) | (event & EVENT_ID_MASK)
}

bitflags! {
    /// Flags passed by the scheduler to add/start/stop/del.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventFlags: u32 {
        /// Start counting as part of add.
        const START  = 1 << 0;
        /// Restore the saved value into the hardware on start.
        const RELOAD = 1 << 1;
        /// Fold the hardware value into the total on stop.
        const UPDATE = 1 << 2;
    }
}

bitflags! {
    /// Hardware state of a request.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HwState: u32 {
        /// Counting is disabled in hardware.
        const STOPPED  = 1 << 0;
        /// The running total reflects the hardware value.
        const UPTODATE = 1 << 1;
    }
}

bitflags! {
    /// Privilege/context filters a caller may ask for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ExcludeFlags: u32 {
        const USER   = 1 << 0;
        const KERNEL = 1 << 1;
        const HV     = 1 << 2;
        const IDLE   = 1 << 3;
        const HOST   = 1 << 4;
        const GUEST  = 1 << 5;
    }
}

/// Attributes supplied when a monitoring request is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventAttr {
    pub config: u64,
    /// Non-zero asks for sampling.
    pub sample_period: u64,
    pub exclude: ExcludeFlags,
    /// CPU the event is bound to.
    pub cpu: Option<u32>,
}

impl EventAttr {
    /// A counting event on `node` bound to `cpu`.
    #[must_use]
    pub const fn counting(node: u32, event: u64, cpu: u32) -> Self {
        Self {
            config: config(node, event),
            sample_period: 0,
            exclude: ExcludeFlags::empty(),
            cpu: Some(cpu),
        }
    }
}

/// Identity stored in a node's slot table while a request owns a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(NonZeroU64);

impl EventHandle {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        loop {
            if let Some(raw) = NonZeroU64::new(NEXT.fetch_add(1, Ordering::Relaxed)) {
                return Self(raw);
            }
        }
    }

    pub(crate) fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

/// One logical counter requested by the scheduler.
///
/// The scheduler serializes start/stop/read per request, which is why they
/// take `&mut`. The slot it owns is shared state on the node.
#[derive(Debug)]
pub struct MonitoringRequest {
    handle: EventHandle,
    config: u64,
    pub(crate) idx: Option<usize>,
    pub(crate) bases: RegisterBases,
    pub(crate) state: HwState,
    pub(crate) prev_count: u64,
    pub(crate) count: u64,
}

impl MonitoringRequest {
    pub(crate) fn new(config: u64) -> Self {
        Self {
            handle: EventHandle::next(),
            config,
            idx: None,
            bases: RegisterBases::default(),
            state: HwState::STOPPED | HwState::UPTODATE,
            prev_count: 0,
            count: 0,
        }
    }

    #[must_use]
    pub fn handle(&self) -> EventHandle {
        self.handle
    }

    #[must_use]
    pub fn config(&self) -> u64 {
        self.config
    }

    #[must_use]
    pub fn event_id(&self) -> u64 {
        event_id(self.config)
    }

    #[must_use]
    pub fn node_id(&self) -> u32 {
        node_id(self.config)
    }

    /// Slot index on the node, if assigned.
    #[must_use]
    pub fn slot(&self) -> Option<usize> {
        self.idx
    }

    #[must_use]
    pub fn bases(&self) -> RegisterBases {
        self.bases
    }

    #[must_use]
    pub fn state(&self) -> HwState {
        self.state
    }

    /// Hardware sum observed by the last read.
    #[must_use]
    pub fn prev_count(&self) -> u64 {
        self.prev_count
    }

    /// Running total.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_fields() {
        let cfg = config(1, 0x81);
        assert_eq!(cfg, 0x1_0081);
        assert_eq!(event_id(cfg), 0x81);
        assert_eq!(node_id(cfg), 1);
        // only two node bits
        assert_eq!(node_id(0x7_0000), 3);
    }

    #[test]
    fn handles_are_unique() {
        let a = MonitoringRequest::new(0);
        let b = MonitoringRequest::new(0);
        assert_ne!(a.handle(), b.handle());
        assert_ne!(a.handle().get(), 0);
    }

    #[test]
    fn fresh_request_is_unassigned() {
        let req = MonitoringRequest::new(config(0, 1));
        assert_eq!(req.slot(), None);
        assert!(req.state().contains(HwState::STOPPED));
        assert_eq!(req.count(), 0);
    }
}
