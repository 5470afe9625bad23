//! Uncore device variants.
//!
//! Each variant fixes its register layout, counter count, slot assignment
//! policy and legal event ids. The default register routines treat every
//! unit on a node as one copy of the same counter bank; variants with a
//! different layout override them.

pub mod l2c_tad;
pub mod ocx_tlk;

pub use l2c_tad::L2cTad;
pub use ocx_tlk::OcxTlk;

use crate::mmio::RegisterIo;
use crate::node::Node;
use crate::revision::Revision;
use crate::window::RegisterBases;

/// How a request is mapped onto a counter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPolicy {
    /// Any free counter can count any event.
    FirstFree,
    /// Counter `n` only counts event `n`.
    EventId,
}

pub trait UncoreDevice: 'static {
    const NAME: &'static str;
    /// Offset of the register window inside the device BAR.
    const CONTROL_OFFSET: usize;
    /// Bytes mapped per unit, starting at `CONTROL_OFFSET`. Windows of two
    /// units never overlap.
    const MAP_SIZE: usize;
    /// Slots per node.
    const NUM_COUNTERS: usize;
    const SLOT_POLICY: SlotPolicy;
    /// Control value that stops counting.
    const EVENTS_DISABLED: u8;

    /// Whether `id` is an event this device implements on `revision`.
    fn event_valid(id: u64, revision: Revision) -> bool;

    /// Register offsets for slot `idx`.
    fn register_bases(idx: usize) -> RegisterBases;

    /// Control value that starts counting event `id`.
    fn enable_value(id: u64) -> u8;

    /// Sum of the counter over every unit on the node.
    fn read_counter<R: RegisterIo>(node: &Node, io: &R, event_base: usize) -> u64 {
        node.units()
            .iter()
            .fold(0u64, |sum, unit| sum.wrapping_add(io.read64(unit.map + event_base)))
    }

    /// Spread a saved total back over the units before counting resumes.
    ///
    /// Integer division: the remainder is lost.
    fn reload_counter<R: RegisterIo>(node: &Node, io: &R, event_base: usize, total: u64) {
        let share = total.checked_div(node.nr_units() as u64).unwrap_or(0);
        for unit in node.units() {
            io.write64(unit.map + event_base, share);
        }
    }

    /// Write `value` into the control register of every unit.
    fn write_control<R: RegisterIo>(node: &Node, io: &R, config_base: usize, value: u8) {
        for unit in node.units() {
            io.write8(unit.map + config_base, value);
        }
    }
}
