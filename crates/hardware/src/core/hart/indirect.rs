//! Indirect register windows.
//!
//! `xiselect` picks a register and `xireg` reads or writes it. Only the first
//! window (`xireg`) reaches implemented registers. The selectable space is:
//!
//! ```text
//! 0x30..=0x3E  iprio0..iprio14 (even only, 8 priorities each)
//! 0x70         eidelivery
//! 0x72         eithreshold
//! 0x80..=0xBE  eip0..eip62     (even only, 64 identities each)
//! 0xC0..=0xFE  eie0..eie62     (even only)
//! ```

use tracing::trace;

use crate::common::Trap;
use crate::core::arch::csr::indirect;
use crate::core::arch::mode::IrqLevel;

use super::Hart;

/// Register reachable through `xireg`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndirectReg {
    /// Packed priorities; the field is the identity in byte 0.
    Iprio(u32),
    /// `eidelivery`.
    Delivery,
    /// `eithreshold`.
    Threshold,
    /// `eip` word.
    Eip(usize),
    /// `eie` word.
    Eie(usize),
}

impl IndirectReg {
    /// Decodes a select value.
    ///
    /// # Arguments
    ///
    /// * `select` - Value of `xiselect`.
    /// * `words` - Number of `eip`/`eie` words the interrupt file holds.
    ///
    /// # Returns
    ///
    /// The register, or `None` for reserved and odd (RV32 high half) selects.
    pub fn decode(select: u64, words: usize) -> Option<Self> {
        let word = |base: u64| {
            let offset = select - base;
            let index = (offset / 2) as usize;
            (offset % 2 == 0 && index < words).then_some(index)
        };
        match select {
            indirect::IPRIO0..=indirect::IPRIO15 if select % 2 == 0 => {
                Some(Self::Iprio(((select - indirect::IPRIO0) * 4) as u32))
            }
            indirect::EIDELIVERY => Some(Self::Delivery),
            indirect::EITHRESHOLD => Some(Self::Threshold),
            indirect::EIP0..indirect::EIE0 => word(indirect::EIP0).map(Self::Eip),
            indirect::EIE0..=indirect::IMSIC_LAST => word(indirect::EIE0).map(Self::Eie),
            _ => None,
        }
    }

    /// Returns `true` for registers that belong to the interrupt file.
    pub const fn is_imsic(self) -> bool {
        !matches!(self, Self::Iprio(_))
    }
}

impl Hart {
    /// Decodes `xiselect` of `level` and checks the file gates.
    fn indirect_target(
        &self,
        level: IrqLevel,
        window: u32,
        addr: u32,
    ) -> Result<IndirectReg, Trap> {
        let invalid = || match level {
            IrqLevel::VirtualSupervisor => self.virtual_or_illegal(addr),
            _ => Trap::IllegalInstruction(addr),
        };
        if window != 0 {
            return Err(invalid());
        }
        let select = self.csrs.iselect[level.index()];
        let words = (self.irq.limits().imsic_max_irqs / 64) as usize;
        let reg = IndirectReg::decode(select, words).ok_or_else(invalid)?;
        if reg.is_imsic() {
            match level {
                IrqLevel::Supervisor => self.check_s_injection(addr)?,
                IrqLevel::VirtualSupervisor if !self.irq.guest_connected() => {
                    return Err(invalid());
                }
                _ => {}
            }
        }
        Ok(reg)
    }

    /// Reads through the `xireg` window `window` of `level`.
    pub(crate) fn ireg_read(&self, level: IrqLevel, window: u32, addr: u32) -> Result<u64, Trap> {
        let reg = self.indirect_target(level, window, addr)?;
        let value = match (reg, self.irq.file(level)) {
            (IndirectReg::Iprio(first), _) => self.irq.iprio_table(level).read_reg(first),
            (_, None) => 0,
            (IndirectReg::Delivery, Some(file)) => file.read_delivery(),
            (IndirectReg::Threshold, Some(file)) => u64::from(file.threshold.value()),
            (IndirectReg::Eip(i), Some(file)) => file.read_eip(i),
            (IndirectReg::Eie(i), Some(file)) => file.read_eie(i),
        };
        Ok(value)
    }

    /// Writes through the `xireg` window `window` of `level`.
    pub(crate) fn ireg_write(
        &mut self,
        level: IrqLevel,
        window: u32,
        addr: u32,
        value: u64,
    ) -> Result<(), Trap> {
        let reg = self.indirect_target(level, window, addr)?;
        if self.trace {
            trace!(level = %level, ?reg, value, "indirect register write");
        }
        self.irq.mutate(|s| match reg {
            IndirectReg::Iprio(first) => s.iprio_table_mut(level).write_reg(first, value),
            imsic => {
                if let Some(file) = s.file_mut(level) {
                    match imsic {
                        IndirectReg::Delivery => file.write_delivery(value),
                        IndirectReg::Threshold => {
                            file.threshold.write(u32::try_from(value).unwrap_or(u32::MAX));
                        }
                        IndirectReg::Eip(i) => file.write_eip(i, value),
                        IndirectReg::Eie(i) => file.write_eie(i, value),
                        IndirectReg::Iprio(_) => {}
                    }
                }
            }
        });
        Ok(())
    }
}
