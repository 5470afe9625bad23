//! Register window arithmetic.
//!
//! A unit's registers live at fixed offsets from its mapped window base.
//! Devices with several counter banks behind one mapping add a per-unit
//! stride on top.

/// Width of one counter register.
pub const COUNTER_STRIDE: usize = core::mem::size_of::<u64>();

/// Offset of a register inside a window: `unit_offset * unit + counter_offset * counter`.
#[inline]
#[must_use]
pub const fn offset(
    unit_offset: usize,
    unit: usize,
    counter_offset: usize,
    counter: usize,
) -> usize {
    unit_offset * unit + counter_offset * counter
}

/// Absolute address of a register.
#[inline]
#[must_use]
pub const fn address(
    base: usize,
    unit_offset: usize,
    unit: usize,
    counter_offset: usize,
    counter: usize,
) -> usize {
    base + offset(unit_offset, unit, counter_offset, counter)
}

/// Register offsets assigned to a request once it owns a slot.
///
/// Both are relative to a unit's window base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterBases {
    /// Control (event select / enable) register.
    pub config_base: usize,
    /// Counter register.
    pub event_base: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_counter_stride() {
        assert_eq!(offset(0, 0, COUNTER_STRIDE, 3), 24);
        assert_eq!(address(0x1000, 0, 0, COUNTER_STRIDE, 0), 0x1000);
    }

    #[test]
    fn unit_and_counter_stride() {
        assert_eq!(address(0x8000, 0x2000, 2, COUNTER_STRIDE, 5), 0x8000 + 0x4000 + 40);
    }

    #[test]
    fn unit_only_stride() {
        assert_eq!(address(0x100, 0x2000, 1, 0, 7), 0x2100);
    }
}
