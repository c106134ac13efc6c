//! Major interrupt priority tables.
//!
//! Each table holds one 8-bit priority per major identity. An entry exists only
//! if the hardware implements it (static presence) and the routing currently
//! makes the cause visible to the table's level (dynamic presence). Absent
//! entries read as zero and ignore writes.

use crate::common::constants::{MAJOR_IRQ_COUNT, NON_LEVELED_MASK};
use crate::common::irq;
use crate::common::reg::bit;
use crate::core::arch::csr::indirect::PRIOS_PER_REG;

/// Priority table of one level (or one VS bank).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IprioTable {
    prio: [u8; MAJOR_IRQ_COUNT as usize],
    static_mask: u64,
    dynamic_mask: u64,
}

impl IprioTable {
    fn with_static(static_mask: u64) -> Self {
        Self {
            prio: [0; MAJOR_IRQ_COUNT as usize],
            static_mask,
            dynamic_mask: u64::MAX,
        }
    }

    /// Machine-level table: M/S software, timer and the S external cause.
    pub fn machine() -> Self {
        Self::with_static(
            bit(irq::SSI)
                | bit(irq::MSI)
                | bit(irq::STI)
                | bit(irq::MTI)
                | bit(irq::SEI)
                | NON_LEVELED_MASK,
        )
    }

    /// Supervisor-level table: S and VS software/timer, VSEI and SGEI.
    pub fn supervisor() -> Self {
        Self::with_static(
            bit(irq::SSI)
                | bit(irq::VSSI)
                | bit(irq::STI)
                | bit(irq::VSTI)
                | bit(irq::VSEI)
                | bit(irq::SGEI)
                | NON_LEVELED_MASK,
        )
    }

    /// VS bank: indexed by Supervisor-numbered identities.
    pub fn virtual_supervisor() -> Self {
        Self::with_static(bit(irq::SSI) | bit(irq::STI) | NON_LEVELED_MASK)
    }

    /// Returns `true` if `iid` has a storage slot right now.
    pub fn is_present(&self, iid: u32) -> bool {
        assert!(iid < MAJOR_IRQ_COUNT, "major interrupt id {iid} out of range");
        self.static_mask & self.dynamic_mask & bit(iid) != 0
    }

    /// Priority of `iid`, or 0 when absent.
    pub fn get(&self, iid: u32) -> u8 {
        if self.is_present(iid) {
            self.prio[iid as usize]
        } else {
            0
        }
    }

    /// Stores a priority; ignored when `iid` is absent.
    pub fn set(&mut self, iid: u32, value: u8) {
        if self.is_present(iid) {
            self.prio[iid as usize] = value;
        }
    }

    /// Updates the routing-dependent part of the presence mask.
    pub fn set_dynamic_presence(&mut self, mask: u64) {
        self.dynamic_mask = mask;
    }

    /// Reads the packed register whose first identity is `first_iid`.
    ///
    /// # Arguments
    ///
    /// * `first_iid` - Identity stored in byte 0.
    ///
    /// # Returns
    ///
    /// Eight priorities packed little-endian, absent entries as zero.
    pub fn read_reg(&self, first_iid: u32) -> u64 {
        (0..PRIOS_PER_REG).fold(0, |acc, i| acc | u64::from(self.get(first_iid + i)) << (8 * i))
    }

    /// Writes the packed register whose first identity is `first_iid`.
    pub fn write_reg(&mut self, first_iid: u32, value: u64) {
        for i in 0..PRIOS_PER_REG {
            self.set(first_iid + i, (value >> (8 * i)) as u8);
        }
    }

    /// Reads eight arbitrary identities packed into one value.
    pub fn read_mapped(&self, iids: &[u32; 8]) -> u64 {
        iids.iter()
            .enumerate()
            .fold(0, |acc, (i, &iid)| acc | u64::from(self.get(iid)) << (8 * i))
    }

    /// Writes eight arbitrary identities from one packed value.
    pub fn write_mapped(&mut self, iids: &[u32; 8], value: u64) {
        for (i, &iid) in iids.iter().enumerate() {
            self.set(iid, (value >> (8 * i)) as u8);
        }
    }
}
