//! Uncore performance counters for Cavium ThunderX.
//!
//! Two device types are supported: the L2 cache TADs ([`L2cTad`]) and the
//! OCX inter-socket link TLKs ([`OcxTlk`]). Each exposes a small set of
//! hardware counters per socket that are shared by every monitoring
//! request on that socket. [`UncorePmu`] multiplexes requests onto those
//! counters and folds the raw register values into running totals.
//!
//! The counters have no overflow interrupt, so only counting mode is
//! offered.

#![no_std]

extern crate alloc;

pub mod device;
mod error;
mod event;
mod mmio;
mod node;
mod pmu;
mod revision;
pub mod window;

#[cfg(test)]
mod testing;

pub use device::{L2cTad, OcxTlk, SlotPolicy, UncoreDevice};
pub use error::{UncoreError, UncoreResult};
pub use event::{
    EVENT_ID_MASK, EventAttr, EventFlags, EventHandle, ExcludeFlags, HwState, MonitoringRequest,
    NODE_MASK, NODE_SHIFT, config, event_id, node_id,
};
pub use mmio::{Mmio, RegisterIo};
pub use node::{Node, Unit};
pub use pmu::{MAX_NODES, UncorePmu, UnitInfo};
pub use revision::{Revision, current as current_revision, init_revision};
pub use window::RegisterBases;
