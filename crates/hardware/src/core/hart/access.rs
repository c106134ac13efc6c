//! CSR Access Checks.
//!
//! This module decides whether a CSR access may proceed and which register it
//! reaches. It performs the following:
//! 1. **Privilege Check:** The level encoded in address bits [9:8] against the current mode.
//! 2. **Read-Only Check:** Writes to addresses with bits [11:10] == 3.
//! 3. **Virtualization:** S-level addresses accessed from VS/VU reach their VS counterparts.
//! 4. **Register Gates:** `hvictl.VTI`, `xenvcfg.STCE`, S external injection and guest connection.

use crate::common::Trap;
use crate::common::irq;
use crate::core::arch::csr::{self, envcfg, hvictl};
use crate::core::arch::mode::{IrqLevel, PrivilegeMode};

use super::Hart;
use super::table::CsrKind;

impl Hart {
    /// Exception raised for an access that would be legal from HS mode.
    pub(crate) const fn virtual_or_illegal(&self, addr: u32) -> Trap {
        if self.privilege.is_virtual() {
            Trap::VirtualInstruction(addr)
        } else {
            Trap::IllegalInstruction(addr)
        }
    }

    fn check_privilege(&self, addr: u32) -> Result<(), Trap> {
        use PrivilegeMode::{Machine, Supervisor, VirtualSupervisor, VirtualUser};
        match (csr::addr_level(addr), self.privilege) {
            (0, _)
            | (3, Machine)
            | (1, Machine | Supervisor | VirtualSupervisor)
            | (2, Machine | Supervisor) => Ok(()),
            (1 | 2, VirtualUser) | (2, VirtualSupervisor) => Err(Trap::VirtualInstruction(addr)),
            _ => Err(Trap::IllegalInstruction(addr)),
        }
    }

    /// Address an access from the current mode actually reaches.
    ///
    /// From VS and VU every S-level address selects its VS counterpart.
    pub fn virtualized_addr(&self, addr: u32) -> u32 {
        if self.privilege.is_virtual() && csr::addr_level(addr) == 1 {
            csr::s_to_vs_addr(addr)
        } else {
            addr
        }
    }

    /// Checks an access and resolves the register it reaches.
    ///
    /// # Arguments
    ///
    /// * `addr` - CSR address as encoded in the instruction.
    /// * `write` - The access writes the register.
    ///
    /// # Returns
    ///
    /// The selected register, or the exception the access raises. Exceptions
    /// carry the address as encoded, not the virtualized one.
    pub(crate) fn resolve(&self, addr: u32, write: bool) -> Result<CsrKind, Trap> {
        self.check_privilege(addr)?;
        if write && csr::addr_read_only(addr) {
            return Err(Trap::IllegalInstruction(addr));
        }
        let kind = self
            .table
            .lookup(self.virtualized_addr(addr))
            .ok_or(Trap::IllegalInstruction(addr))?;
        self.check_gates(kind, addr)?;
        Ok(kind)
    }

    fn check_gates(&self, kind: CsrKind, addr: u32) -> Result<(), Trap> {
        let in_vs = self.privilege == PrivilegeMode::VirtualSupervisor;
        let vti = hvictl::vti(self.irq.hvictl);
        match kind {
            CsrKind::Vsip | CsrKind::Vsie if vti && in_vs => Err(Trap::VirtualInstruction(addr)),
            CsrKind::Stimecmp => self.check_stce(addr),
            CsrKind::Vstimecmp => {
                self.check_stce(addr)?;
                if self.privilege.is_virtual() && self.csrs.henvcfg & envcfg::STCE == 0 {
                    return Err(Trap::VirtualInstruction(addr));
                }
                if vti && in_vs {
                    return Err(Trap::VirtualInstruction(addr));
                }
                Ok(())
            }
            CsrKind::Topei(IrqLevel::Supervisor) => self.check_s_injection(addr),
            CsrKind::Topei(IrqLevel::VirtualSupervisor) if !self.irq.guest_connected() => {
                Err(self.virtual_or_illegal(addr))
            }
            _ => Ok(()),
        }
    }

    fn check_stce(&self, addr: u32) -> Result<(), Trap> {
        if self.privilege != PrivilegeMode::Machine && self.csrs.menvcfg & envcfg::STCE == 0 {
            Err(Trap::IllegalInstruction(addr))
        } else {
            Ok(())
        }
    }

    /// The Supervisor interrupt file is off limits to S mode while SEI is injected.
    pub(crate) fn check_s_injection(&self, addr: u32) -> Result<(), Trap> {
        if self.privilege == PrivilegeMode::Supervisor
            && self.irq.is_injected(IrqLevel::Supervisor, irq::SEI)
        {
            Err(Trap::IllegalInstruction(addr))
        } else {
            Ok(())
        }
    }
}
