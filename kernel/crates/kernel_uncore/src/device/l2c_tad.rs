//! L2C TAD counters.
//!
//! Every TAD on a node carries four identical counters. A logical counter
//! is the same counter index programmed on all TADs; its value is the sum
//! over the TADs.

use super::{SlotPolicy, UncoreDevice};
use crate::revision::Revision;
use crate::window::{self, COUNTER_STRIDE, RegisterBases};

pub const NR_COUNTERS: usize = 4;
pub const CONTROL_OFFSET: usize = 0x10000;
pub const COUNTER_OFFSET: usize = 0x100;

/// Event ids that bound the legal ranges.
pub mod events {
    pub const DISABLED: u64 = 0x00;

    pub const L2T_HIT: u64 = 0x01;
    pub const WAIT_VAB: u64 = 0x09;
    pub const RTG_HIT: u64 = 0x41;
    pub const RTG_MISS: u64 = 0x42;
    pub const L2_RTG_VIC: u64 = 0x44;
    pub const L2_OPEN_OCI: u64 = 0x48;

    /// Queue events: `0x80 | qd << 4 | {idx, rdat, bnks, wdat}`.
    pub const QD0_IDX: u64 = 0x80;
    pub const QD7_WDAT: u64 = 0xf3;

    // pass2 additions
    pub const OPEN_CCPI: u64 = 0x0a;
    pub const LOOKUP: u64 = 0x40;
    pub const LOOKUP_ALL: u64 = 0x44;
    pub const TAG_ALC_HIT: u64 = 0x48;
    pub const OCI_RTG_ALC_VIC: u64 = 0x77;

    /// Holes in the pass2 range.
    pub const PASS2_RESERVED: [u64; 3] = [0x4d, 0x66, 0x67];
}

#[derive(Debug, Clone, Copy, Default)]
pub struct L2cTad;

fn valid_any_revision(id: u64) -> bool {
    use events::*;

    (id > DISABLED && id <= WAIT_VAB)
        || id == RTG_HIT
        || id == RTG_MISS
        || id == L2_RTG_VIC
        || id == L2_OPEN_OCI
        || ((id & 0x80) != 0 && (id & 0xf) <= 3)
}

fn valid_pass2(id: u64) -> bool {
    use events::*;

    id == OPEN_CCPI
        || (LOOKUP..=LOOKUP_ALL).contains(&id)
        || ((TAG_ALC_HIT..=OCI_RTG_ALC_VIC).contains(&id) && !PASS2_RESERVED.contains(&id))
}

impl UncoreDevice for L2cTad {
    const NAME: &'static str = "thunder_l2c_tad";
    const CONTROL_OFFSET: usize = CONTROL_OFFSET;
    const MAP_SIZE: usize = COUNTER_OFFSET + NR_COUNTERS * COUNTER_STRIDE;
    const NUM_COUNTERS: usize = NR_COUNTERS;
    const SLOT_POLICY: SlotPolicy = SlotPolicy::FirstFree;
    const EVENTS_DISABLED: u8 = events::DISABLED as u8;

    fn event_valid(id: u64, revision: Revision) -> bool {
        valid_any_revision(id) || (revision >= Revision::Pass2 && valid_pass2(id))
    }

    fn register_bases(idx: usize) -> RegisterBases {
        RegisterBases {
            // one select byte per counter
            config_base: window::offset(0, 0, 1, idx),
            event_base: COUNTER_OFFSET + window::offset(0, 0, COUNTER_STRIDE, idx),
        }
    }

    fn enable_value(id: u64) -> u8 {
        // the select register is one byte wide
        id as u8
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;

    fn pass1_legal() -> Vec<u64> {
        let mut ids: Vec<u64> = (0x01..=0x09).collect();
        ids.extend([0x41, 0x42, 0x44, 0x48]);
        for qd in 0..8u64 {
            ids.extend((0..=3).map(|op| 0x80 | (qd << 4) | op));
        }
        ids
    }

    fn pass2_legal() -> Vec<u64> {
        let mut ids = pass1_legal();
        ids.push(0x0a);
        ids.extend(0x40..=0x44);
        ids.extend((0x48..=0x77).filter(|id| ![0x4d, 0x66, 0x67].contains(id)));
        ids
    }

    #[test]
    fn pass1_exhaustive() {
        let legal = pass1_legal();
        for id in 0..=0xff {
            assert_eq!(
                L2cTad::event_valid(id, Revision::Pass1),
                legal.contains(&id),
                "pass1 id {id:#x}"
            );
        }
    }

    #[test]
    fn pass2_exhaustive() {
        let legal = pass2_legal();
        for id in 0..=0xff {
            assert_eq!(
                L2cTad::event_valid(id, Revision::Pass2),
                legal.contains(&id),
                "pass2 id {id:#x}"
            );
        }
    }

    #[test]
    fn range_edges() {
        let p1 = |id| L2cTad::event_valid(id, Revision::Pass1);
        let p2 = |id| L2cTad::event_valid(id, Revision::Pass2);

        assert!(!p1(0x00) && p1(0x01) && p1(0x09) && !p1(0x0a));
        assert!(p2(0x0a) && !p2(0x0b));
        assert!(!p1(0x40) && p2(0x40) && !p2(0x3f));
        assert!(!p1(0x43) && p2(0x43) && !p2(0x45));
        assert!(!p2(0x47) && p2(0x48) && p2(0x77) && !p2(0x78));
        assert!(p2(0x4c) && !p2(0x4d) && p2(0x4e));
        assert!(p2(0x65) && !p2(0x66) && !p2(0x67) && p2(0x68));
        assert!(!p1(0x7f) && p1(0x80) && p1(0x83) && !p1(0x84) && !p1(0x8f));
        assert!(p1(0xf3) && !p1(0xf4) && !p1(0xff));
    }

    #[test]
    fn queue_rule_applies_to_the_whole_id_field() {
        assert!(L2cTad::event_valid(0x180, Revision::Pass1));
        assert!(!L2cTad::event_valid(0x100, Revision::Pass1));
    }

    #[test]
    fn register_layout() {
        assert_eq!(
            L2cTad::register_bases(0),
            RegisterBases { config_base: 0, event_base: 0x100 }
        );
        assert_eq!(
            L2cTad::register_bases(3),
            RegisterBases { config_base: 3, event_base: 0x118 }
        );
        assert_eq!(L2cTad::MAP_SIZE, 0x120);
    }
}
