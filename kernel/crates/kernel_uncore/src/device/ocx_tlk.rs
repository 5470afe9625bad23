//! OCX TLK counters.
//!
//! The three TLKs of a node sit behind a single PCI device, so a node has
//! one unit whose window holds three identical banks at a fixed stride.
//! Counters are hard-wired: counter `n` counts statistic `n`.

use super::{SlotPolicy, UncoreDevice};
use crate::mmio::RegisterIo;
use crate::node::Node;
use crate::revision::Revision;
use crate::window::{self, COUNTER_STRIDE, RegisterBases};

pub const NR_UNITS: usize = 3;
pub const UNIT_OFFSET: usize = 0x2000;
pub const CONTROL_OFFSET: usize = 0x10040;
pub const COUNTER_OFFSET: usize = 0x10400;

pub const STAT_DISABLE: u8 = 0;
pub const STAT_ENABLE: u8 = 1;

pub mod events {
    pub const STAT_IDLE_CNT: u64 = 0x00;
    pub const STAT_ERR_CNT: u64 = 0x04;
    pub const STAT_MAT0_CNT: u64 = 0x08;
    pub const STAT_MAT3_CNT: u64 = 0x0b;
    pub const STAT_VC0_CMD: u64 = 0x10;
    pub const STAT_VC5_CMD: u64 = 0x15;
    pub const STAT_VC0_PKT: u64 = 0x20;
    pub const STAT_VC13_PKT: u64 = 0x2d;
    pub const STAT_VC0_CON: u64 = 0x30;
    pub const STAT_VC13_CON: u64 = 0x3d;

    pub const MAX_COUNTER: u64 = STAT_VC13_CON;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OcxTlk;

impl OcxTlk {
    /// Address of a register in TLK `nr`. All TLKs share the node's first
    /// (and only) unit mapping.
    fn tlk_register(node: &Node, base: usize, nr: usize) -> Option<usize> {
        let unit = node.units().first()?;
        Some(window::address(unit.map + base, UNIT_OFFSET, nr, 0, 0))
    }
}

impl UncoreDevice for OcxTlk {
    const NAME: &'static str = "thunder_ocx_tlk";
    const CONTROL_OFFSET: usize = CONTROL_OFFSET;
    const MAP_SIZE: usize = UNIT_OFFSET * NR_UNITS;
    // one slot per statistic, including the last one
    const NUM_COUNTERS: usize = events::MAX_COUNTER as usize + 1;
    const SLOT_POLICY: SlotPolicy = SlotPolicy::EventId;
    const EVENTS_DISABLED: u8 = STAT_DISABLE;

    fn event_valid(id: u64, _revision: Revision) -> bool {
        use events::*;

        id <= STAT_ERR_CNT
            || (STAT_MAT0_CNT..=STAT_MAT3_CNT).contains(&id)
            || (STAT_VC0_CMD..=STAT_VC5_CMD).contains(&id)
            || (STAT_VC0_PKT..=STAT_VC13_PKT).contains(&id)
            || (STAT_VC0_CON..=STAT_VC13_CON).contains(&id)
    }

    fn register_bases(idx: usize) -> RegisterBases {
        RegisterBases {
            // a single enable byte per TLK
            config_base: 0,
            event_base: COUNTER_OFFSET - CONTROL_OFFSET
                + window::offset(0, 0, COUNTER_STRIDE, idx),
        }
    }

    fn enable_value(_id: u64) -> u8 {
        STAT_ENABLE
    }

    fn read_counter<R: RegisterIo>(node: &Node, io: &R, event_base: usize) -> u64 {
        (0..NR_UNITS)
            .filter_map(|nr| Self::tlk_register(node, event_base, nr))
            .fold(0u64, |sum, addr| sum.wrapping_add(io.read64(addr)))
    }

    // Statistics are free running; nothing to restore.
    fn reload_counter<R: RegisterIo>(_node: &Node, _io: &R, _event_base: usize, _total: u64) {}

    fn write_control<R: RegisterIo>(node: &Node, io: &R, config_base: usize, value: u8) {
        for addr in (0..NR_UNITS).filter_map(|nr| Self::tlk_register(node, config_base, nr)) {
            io.write8(addr, value);
        }
    }
}
