//! In-memory register file for exercising the PMU without hardware.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use spin::Mutex;

use crate::mmio::RegisterIo;

/// Sparse register file. Unwritten registers read as zero. Every write
/// made through [`RegisterIo`] is also recorded in order.
#[derive(Default)]
pub struct FakeRegisters {
    regs: Mutex<BTreeMap<usize, u64>>,
    log: Mutex<Vec<(usize, u64)>>,
}

impl FakeRegisters {
    /// Preload a register, as the hardware would while counting.
    pub fn set(&self, addr: usize, value: u64) {
        self.regs.lock().insert(addr, value);
    }

    pub fn get(&self, addr: usize) -> u64 {
        self.regs.lock().get(&addr).copied().unwrap_or(0)
    }

    pub fn byte(&self, addr: usize) -> u8 {
        self.get(addr).to_le_bytes()[0]
    }

    pub fn writes(&self) -> Vec<(usize, u64)> {
        self.log.lock().clone()
    }
}

impl RegisterIo for FakeRegisters {
    fn read64(&self, addr: usize) -> u64 {
        self.get(addr)
    }

    fn write64(&self, addr: usize, value: u64) {
        self.regs.lock().insert(addr, value);
        self.log.lock().push((addr, value));
    }

    fn write8(&self, addr: usize, value: u8) {
        self.regs.lock().insert(addr, u64::from(value));
        self.log.lock().push((addr, u64::from(value)));
    }
}
