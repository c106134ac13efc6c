//! CSR Access Logic.
//!
//! This module implements the Control and Status Register (CSR) access mechanisms for the hart.
//! It performs the following:
//! 1. **Read Operations:** Retrieves routed and derived CSR values (`sip`, `xtopi`, ...).
//! 2. **Write Operations:** Updates interrupt state through the recompute closure.
//! 3. **Side Effect Management:** Claims through `xtopei`, guest switches and STCE clears.
//! 4. **Trap Accounting:** Counts and logs every exception an access raises.

use tracing::{debug, trace};

use crate::common::{Trap, irq};
use crate::core::arch::csr::{ISELECT_MASK, envcfg, hvictl};
use crate::core::arch::mode::IrqLevel;

use super::Hart;
use super::table::CsrKind;

/// VS-numbered identities packed into `hviprio1`, byte 0 first.
///
/// Identities 0, 4 and 8 have no VS priority and always read zero.
pub const HVIPRIO1_IIDS: [u32; 8] = [0, irq::SSI, 4, irq::STI, 8, 13, 14, 15];

/// VS-numbered identities packed into `hviprio2`, byte 0 first.
pub const HVIPRIO2_IIDS: [u32; 8] = [16, 17, 18, 19, 20, 21, 22, 23];

impl Hart {
    /// Reads a CSR.
    ///
    /// # Arguments
    ///
    /// * `addr` - The 12-bit address of the CSR to read.
    ///
    /// # Returns
    ///
    /// The 64-bit value, or the exception the access raises.
    pub fn csr_read(&mut self, addr: u32) -> Result<u64, Trap> {
        self.csr_access(addr, None)
    }

    /// Writes a CSR without reading it (`csrrw` with `rd = x0`).
    ///
    /// # Arguments
    ///
    /// * `addr` - The 12-bit address of the CSR to write.
    /// * `value` - The 64-bit value to write.
    pub fn csr_write(&mut self, addr: u32, value: u64) -> Result<(), Trap> {
        self.csr_access_inner(addr, false, Some(value)).map(|_| ())
    }

    /// Reads a CSR and writes it in one access (`csrrw` with `rd != x0`).
    ///
    /// # Returns
    ///
    /// The value before the write.
    pub fn csr_swap(&mut self, addr: u32, value: u64) -> Result<u64, Trap> {
        self.csr_access(addr, Some(value))
    }

    fn csr_access(&mut self, addr: u32, write: Option<u64>) -> Result<u64, Trap> {
        self.csr_access_inner(addr, true, write)
    }

    fn csr_access_inner(
        &mut self,
        addr: u32,
        read: bool,
        write: Option<u64>,
    ) -> Result<u64, Trap> {
        let result = self.resolve(addr, write.is_some()).and_then(|kind| {
            let old = if read { self.read_kind(kind, addr)? } else { 0 };
            if let Some(value) = write {
                self.write_kind(kind, addr, value, read)?;
            }
            Ok(old)
        });

        match result {
            Ok(value) => {
                if self.trace {
                    trace!(addr = format_args!("{addr:#05x}"), read, ?write, value, "csr access");
                }
            }
            Err(trap) => self.record_trap(trap),
        }
        result
    }

    fn record_trap(&mut self, trap: Trap) {
        match trap {
            Trap::IllegalInstruction(_) => self.irq.stats.illegal_traps += 1,
            Trap::VirtualInstruction(_) => self.irq.stats.virtual_traps += 1,
        }
        debug!(privilege = %self.privilege, %trap, "csr access trapped");
    }

    fn read_kind(&self, kind: CsrKind, addr: u32) -> Result<u64, Trap> {
        let irq = &self.irq;
        let value = match kind {
            CsrKind::Mip => irq.mip_read(),
            CsrKind::Mie => irq.mie_read(),
            CsrKind::Mideleg => irq.mideleg_read(),
            CsrKind::Mvien => irq.mvien_read(),
            CsrKind::Mvip => irq.mvip_read(),
            CsrKind::Sip => irq.sip_read(),
            CsrKind::Sie => irq.sie_read(),
            CsrKind::Hip => irq.hip_read(),
            CsrKind::Hie => irq.hie_read(),
            CsrKind::Hideleg => irq.hideleg_read(),
            CsrKind::Hvien => irq.hvien_read(),
            CsrKind::Hvip => irq.hvip_read(),
            CsrKind::Hvictl => irq.hvictl,
            CsrKind::Hgeie => irq.hgeie_read(),
            CsrKind::Hgeip => irq.hgeip_read(),
            CsrKind::Hstatus => irq.hstatus_read(),
            CsrKind::Vsip => irq.vsip_read(),
            CsrKind::Vsie => irq.vsie_read(),
            CsrKind::Hviprio(n) => irq
                .iprio_table(IrqLevel::VirtualSupervisor)
                .read_mapped(Self::hviprio_iids(n)),
            CsrKind::Menvcfg => self.csrs.menvcfg,
            CsrKind::Henvcfg => self.csrs.henvcfg,
            CsrKind::Stimecmp => self.csrs.stimecmp,
            CsrKind::Vstimecmp => self.csrs.vstimecmp,
            CsrKind::Tvec(level) => irq.tvec_read(level),
            CsrKind::Topi(level) => irq.topi(level),
            CsrKind::Topei(level) => irq.topei(level),
            CsrKind::Iselect(level) => self.csrs.iselect[level.index()],
            CsrKind::Ireg(level, window) => self.ireg_read(level, window, addr)?,
        };
        Ok(value)
    }

    fn write_kind(&mut self, kind: CsrKind, addr: u32, value: u64, read: bool) -> Result<(), Trap> {
        match kind {
            // Hardware lines only; software writes have no effect.
            CsrKind::Mip | CsrKind::Hip | CsrKind::Hgeip => {}
            CsrKind::Mie => self.irq.mutate(|s| s.mie_write(value)),
            CsrKind::Mideleg => self.irq.mutate(|s| s.mideleg_write(value)),
            CsrKind::Mvien => self.irq.mutate(|s| s.mvien_write(value)),
            CsrKind::Mvip => self.irq.mutate(|s| s.mvip_write(value)),
            CsrKind::Sip => self.irq.mutate(|s| s.sip_write_masked(u64::MAX, value)),
            CsrKind::Sie => self.irq.mutate(|s| s.sie_write_masked(u64::MAX, value)),
            CsrKind::Hie => self.irq.mutate(|s| s.hie_write_masked(u64::MAX, value)),
            CsrKind::Hideleg => self.irq.mutate(|s| s.hideleg_write(value)),
            CsrKind::Hvien => self.irq.mutate(|s| s.hvien_write(value)),
            CsrKind::Hvip => self.irq.mutate(|s| s.hvip_write(value)),
            CsrKind::Hvictl => self.irq.mutate(|s| s.hvictl = value & hvictl::MASK),
            CsrKind::Hgeie => self.irq.mutate(|s| s.hgeie_write(value)),
            CsrKind::Hstatus => self.irq.mutate(|s| s.hstatus_write(value)),
            CsrKind::Vsip => self.irq.mutate(|s| s.vsip_write(value)),
            CsrKind::Vsie => self.irq.mutate(|s| s.vsie_write(value)),
            CsrKind::Hviprio(n) => self.irq.mutate(|s| {
                s.iprio_table_mut(IrqLevel::VirtualSupervisor)
                    .write_mapped(Self::hviprio_iids(n), value);
            }),
            CsrKind::Menvcfg => {
                let old = self.csrs.menvcfg;
                self.csrs.menvcfg = value & envcfg::MASK;
                if Self::stce_cleared(old, self.csrs.menvcfg) {
                    self.irq.clint_hw_irq_route(irq::STI, false);
                }
            }
            CsrKind::Henvcfg => {
                let old = self.csrs.henvcfg;
                self.csrs.henvcfg = value & envcfg::MASK;
                if Self::stce_cleared(old, self.csrs.henvcfg) {
                    self.irq.clint_hw_irq_route(irq::VSTI, false);
                }
            }
            CsrKind::Stimecmp => self.csrs.stimecmp = value,
            CsrKind::Vstimecmp => self.csrs.vstimecmp = value,
            CsrKind::Tvec(level) => self.irq.mutate(|s| s.tvec_write(level, value)),
            // Read-only addresses never get here.
            CsrKind::Topi(_) => {}
            CsrKind::Topei(level) => self.irq.claim_topei(level, value, !read),
            CsrKind::Iselect(level) => self.csrs.iselect[level.index()] = value & ISELECT_MASK,
            CsrKind::Ireg(level, window) => self.ireg_write(level, window, addr, value)?,
        }
        Ok(())
    }

    const fn hviprio_iids(index: usize) -> &'static [u32; 8] {
        match index {
            0 => &HVIPRIO1_IIDS,
            _ => &HVIPRIO2_IIDS,
        }
    }

    const fn stce_cleared(old: u64, new: u64) -> bool {
        old & envcfg::STCE != 0 && new & envcfg::STCE == 0
    }
}
