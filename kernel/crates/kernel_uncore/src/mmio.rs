//! Register access for uncore counter banks.
//!
//! The PMU never touches device memory directly; it goes through
//! [`RegisterIo`], so the counter logic can run against a real mapping
//! ([`Mmio`]) or an in-memory register file.

use core::ptr::NonNull;

use volatile::VolatilePtr;

/// Byte-addressed access to mapped device registers.
///
/// Addresses are absolute: a unit's window base plus the offsets computed
/// by [`crate::window`].
pub trait RegisterIo: Send + Sync {
    fn read64(&self, addr: usize) -> u64;

    fn write64(&self, addr: usize, value: u64);

    fn write8(&self, addr: usize, value: u8);
}

/// Volatile accesses into already-mapped device memory.
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// # Safety
    /// Every address later passed to this accessor must be non-null,
    /// naturally aligned for the access width and lie inside a register
    /// window that stays mapped for the lifetime of the accessor.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

/// # Safety
/// `addr` must satisfy the contract of [`Mmio::new`].
unsafe fn register<'a, T>(addr: usize) -> VolatilePtr<'a, T> {
    // SAFETY: forwarded from the caller.
    unsafe { VolatilePtr::new(NonNull::new_unchecked(addr as *mut T)) }
}

impl RegisterIo for Mmio {
    fn read64(&self, addr: usize) -> u64 {
        // SAFETY: guaranteed by the contract of `Mmio::new`.
        unsafe { register::<u64>(addr) }.read()
    }

    fn write64(&self, addr: usize, value: u64) {
        // SAFETY: guaranteed by the contract of `Mmio::new`.
        unsafe { register::<u64>(addr) }.write(value);
    }

    fn write8(&self, addr: usize, value: u8) {
        // SAFETY: guaranteed by the contract of `Mmio::new`.
        unsafe { register::<u8>(addr) }.write(value);
    }
}
