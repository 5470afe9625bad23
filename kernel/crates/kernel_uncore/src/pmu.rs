//! Counter allocation and aggregation for one uncore device type.

use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::device::{SlotPolicy, UncoreDevice};
use crate::error::{UncoreError, UncoreResult};
use crate::event::{EventAttr, EventFlags, HwState, MonitoringRequest};
use crate::mmio::RegisterIo;
use crate::node::{Node, Unit};
use crate::revision::{self, Revision};

/// Maximum number of sockets addressed by the node field.
pub const MAX_NODES: usize = 4;

/// A discovered device instance: the socket it sits on and its BAR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitInfo {
    pub node: u32,
    pub bar: usize,
}

/// The PMU for one device type across all nodes.
///
/// `add`/`del` may race freely between requests; slots are claimed and
/// released with single compare-and-exchange operations. Hardware access
/// for a given request is serialized by the caller.
pub struct UncorePmu<D: UncoreDevice, R: RegisterIo> {
    io: R,
    nodes: Vec<Option<Node>>,
    revision: Revision,
    _device: PhantomData<fn() -> D>,
}

impl<D: UncoreDevice, R: RegisterIo> UncorePmu<D, R> {
    /// Build the PMU from discovered units using the configured revision.
    pub fn new(io: R, units: &[UnitInfo]) -> UncoreResult<Self> {
        Self::with_revision(io, units, revision::current())
    }

    pub fn with_revision(io: R, units: &[UnitInfo], revision: Revision) -> UncoreResult<Self> {
        if units.is_empty() {
            return Err(UncoreError::NoUnits);
        }

        let mut nodes: Vec<Option<Node>> = (0..MAX_NODES).map(|_| None).collect();
        for info in units {
            let map = info
                .bar
                .checked_add(D::CONTROL_OFFSET)
                .filter(|map| map.checked_add(D::MAP_SIZE).is_some())
                .ok_or(UncoreError::InvalidUnit {
                    node: info.node,
                    bar: info.bar,
                })?;
            // each unit owns MAP_SIZE bytes of registers
            if nodes
                .iter()
                .flatten()
                .flat_map(Node::units)
                .any(|unit| unit.map.abs_diff(map) < D::MAP_SIZE)
            {
                log::warn!("{}: unit at {:#x} overlaps another unit", D::NAME, info.bar);
                return Err(UncoreError::InvalidUnit {
                    node: info.node,
                    bar: info.bar,
                });
            }

            let slot = nodes
                .get_mut(info.node as usize)
                .ok_or(UncoreError::InvalidNode(info.node))?;
            slot.get_or_insert_with(|| Node::new(info.node, D::NUM_COUNTERS))
                .push_unit(Unit { map });
        }

        for node in nodes.iter().flatten() {
            log::info!(
                "{}: node {} has {} units, {} counters",
                D::NAME,
                node.id(),
                node.nr_units(),
                node.num_counters()
            );
        }

        Ok(Self {
            io,
            nodes,
            revision,
            _device: PhantomData,
        })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        D::NAME
    }

    #[must_use]
    pub fn revision(&self) -> Revision {
        self.revision
    }

    #[must_use]
    pub fn io(&self) -> &R {
        &self.io
    }

    #[must_use]
    pub fn node(&self, id: u32) -> Option<&Node> {
        self.nodes.get(id as usize)?.as_ref()
    }

    /// Validate attributes and create an unassigned request.
    pub fn event_init(&self, attr: &EventAttr) -> UncoreResult<MonitoringRequest> {
        if attr.sample_period != 0 {
            return Err(UncoreError::SamplingUnsupported);
        }
        if !attr.exclude.is_empty() {
            return Err(UncoreError::InvalidAttributes);
        }
        if attr.cpu.is_none() {
            return Err(UncoreError::CpuRequired);
        }

        let request = MonitoringRequest::new(attr.config);
        if !D::event_valid(request.event_id(), self.revision) {
            return Err(UncoreError::InvalidEvent(request.event_id()));
        }
        if self.node(request.node_id()).is_none() {
            log::debug!("{}: invalid numa node {}", D::NAME, request.node_id());
            return Err(UncoreError::InvalidNode(request.node_id()));
        }

        Ok(request)
    }

    fn node_of(&self, request: &MonitoringRequest) -> UncoreResult<&Node> {
        self.node(request.node_id())
            .ok_or(UncoreError::InvalidNode(request.node_id()))
    }

    /// Assign a hardware counter to `request`.
    pub fn add(&self, request: &mut MonitoringRequest, flags: EventFlags) -> UncoreResult<()> {
        let node = self.node_of(request)?;
        let handle = request.handle();

        let assigned = match request.idx {
            Some(idx) if node.owner(idx) == Some(handle) => Some(idx),
            _ => node.find(handle).or_else(|| match D::SLOT_POLICY {
                SlotPolicy::FirstFree => node.claim_first_free(handle),
                SlotPolicy::EventId => {
                    let idx = request.event_id() as usize;
                    node.claim(idx, handle).then_some(idx)
                }
            }),
        };

        let Some(idx) = assigned else {
            request.idx = None;
            log::debug!("{}: no free counter on node {}", D::NAME, node.id());
            return Err(UncoreError::Busy { node: node.id() });
        };

        request.idx = Some(idx);
        request.bases = D::register_bases(idx);
        request.state = HwState::UPTODATE | HwState::STOPPED;
        log::trace!("{}: event {:#x} -> counter {}", D::NAME, request.event_id(), idx);

        if flags.contains(EventFlags::START) {
            self.start(request, EventFlags::RELOAD);
        }
        Ok(())
    }

    /// Stop `request` and give its counter back. A request that owns no
    /// counter is left untouched apart from clearing its slot index.
    pub fn del(&self, request: &mut MonitoringRequest) {
        let Some(node) = self.node(request.node_id()) else {
            request.idx = None;
            return;
        };

        if node.find(request.handle()).is_some() {
            self.stop(request, EventFlags::UPDATE);
            node.release(request.handle());
        }
        request.idx = None;
    }

    pub fn start(&self, request: &mut MonitoringRequest, flags: EventFlags) {
        let Some(node) = self.owned_node(request) else {
            return;
        };

        if flags.contains(EventFlags::RELOAD) {
            D::reload_counter(node, &self.io, request.bases.event_base, request.prev_count);
        }

        request.state = HwState::empty();
        D::write_control(
            node,
            &self.io,
            request.bases.config_base,
            D::enable_value(request.event_id()),
        );
    }

    pub fn stop(&self, request: &mut MonitoringRequest, flags: EventFlags) {
        let Some(node) = self.owned_node(request) else {
            return;
        };

        D::write_control(node, &self.io, request.bases.config_base, D::EVENTS_DISABLED);
        request.state |= HwState::STOPPED;

        if flags.contains(EventFlags::UPDATE) && !request.state.contains(HwState::UPTODATE) {
            self.read(request);
            request.state |= HwState::UPTODATE;
        }
    }

    /// Fold the hardware value into the running total.
    ///
    /// There is no overflow interrupt; callers must poll often enough that
    /// the counter does not wrap twice between reads.
    pub fn read(&self, request: &mut MonitoringRequest) {
        let Some(node) = self.owned_node(request) else {
            return;
        };

        let new = D::read_counter(node, &self.io, request.bases.event_base);
        let prev = core::mem::replace(&mut request.prev_count, new);
        let delta = new.wrapping_sub(prev) as i64;
        request.count = request.count.wrapping_add_signed(delta);
    }

    fn owned_node(&self, request: &MonitoringRequest) -> Option<&Node> {
        if request.idx.is_none() {
            log::warn!("{}: event {:#x} has no counter", D::NAME, request.event_id());
            return None;
        }
        self.node(request.node_id())
    }
}
