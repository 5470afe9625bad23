//! Nodes, units and the per-node counter slot table.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::event::EventHandle;

const EMPTY: u64 = 0;

/// One physical counter bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    /// Mapped base of the unit's register window.
    pub map: usize,
}

/// All units of one device type on one socket.
///
/// The slot table is the only shared mutable state: a slot holds the handle
/// of the request that owns the matching hardware counter, or zero.
#[derive(Debug)]
pub struct Node {
    id: u32,
    units: Vec<Unit>,
    slots: Box<[AtomicU64]>,
}

impl Node {
    #[must_use]
    pub fn new(id: u32, num_counters: usize) -> Self {
        Self {
            id,
            units: Vec::new(),
            slots: (0..num_counters).map(|_| AtomicU64::new(EMPTY)).collect(),
        }
    }

    pub(crate) fn push_unit(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    #[must_use]
    pub fn nr_units(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn num_counters(&self) -> usize {
        self.slots.len()
    }

    /// Handle currently stored in slot `idx`.
    #[must_use]
    pub fn owner(&self, idx: usize) -> Option<EventHandle> {
        EventHandle::from_raw(self.slots.get(idx)?.load(Ordering::Acquire))
    }

    /// Slot already owned by `handle`.
    #[must_use]
    pub fn find(&self, handle: EventHandle) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.load(Ordering::Acquire) == handle.get())
    }

    /// Claim slot `idx` if it is empty.
    pub fn claim(&self, idx: usize, handle: EventHandle) -> bool {
        self.slots.get(idx).is_some_and(|slot| {
            slot.compare_exchange(EMPTY, handle.get(), Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        })
    }

    /// Claim the first empty slot. Losing a race on one slot moves on to
    /// the next.
    pub fn claim_first_free(&self, handle: EventHandle) -> Option<usize> {
        for idx in 0..self.slots.len() {
            if self.claim(idx, handle) {
                return Some(idx);
            }
        }
        None
    }

    /// Empty the slot owned by `handle`.
    pub fn release(&self, handle: EventHandle) -> Option<usize> {
        for (idx, slot) in self.slots.iter().enumerate() {
            if slot
                .compare_exchange(handle.get(), EMPTY, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(idx);
            }
        }
        None
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.load(Ordering::Acquire) != EMPTY)
            .count()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::vec::Vec;

    use super::*;
    use crate::event::MonitoringRequest;

    fn handle() -> EventHandle {
        MonitoringRequest::new(0).handle()
    }

    #[test]
    fn claim_and_release() {
        let node = Node::new(0, 2);
        let a = handle();
        let b = handle();

        assert_eq!(node.claim_first_free(a), Some(0));
        assert_eq!(node.claim_first_free(b), Some(1));
        assert_eq!(node.claim_first_free(handle()), None);
        assert_eq!(node.owner(1), Some(b));
        assert_eq!(node.find(a), Some(0));

        assert_eq!(node.release(a), Some(0));
        assert_eq!(node.owner(0), None);
        assert_eq!(node.release(a), None);
        assert_eq!(node.in_use(), 1);
    }

    #[test]
    fn claim_exact_slot() {
        let node = Node::new(0, 4);
        let a = handle();
        assert!(node.claim(3, a));
        assert!(!node.claim(3, handle()));
        assert!(!node.claim(4, handle()));
        assert_eq!(node.owner(3), Some(a));
    }

    #[test]
    fn concurrent_claims_are_exclusive() {
        for (threads, slots) in [(8, 4), (4, 8), (16, 16), (32, 3), (1, 0)] {
            let node = Arc::new(Node::new(0, slots));
            let barrier = Arc::new(Barrier::new(threads));

            let workers: Vec<_> = (0..threads)
                .map(|_| {
                    let node = Arc::clone(&node);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        let me = handle();
                        barrier.wait();
                        node.claim_first_free(me).map(|idx| (idx, me))
                    })
                })
                .collect();

            let mut won: Vec<(usize, EventHandle)> = workers
                .into_iter()
                .filter_map(|w| w.join().unwrap())
                .collect();

            assert_eq!(won.len(), threads.min(slots));
            won.sort_by_key(|(idx, _)| *idx);
            won.dedup_by_key(|(idx, _)| *idx);
            assert_eq!(won.len(), threads.min(slots), "two winners share a slot");
            for (idx, me) in won {
                assert_eq!(node.owner(idx), Some(me));
            }
        }
    }
}
