//! Hart Front-End Definition and Initialization.
//!
//! This module defines the `Hart` structure, which wraps the interrupt state of
//! one simulated hart and exposes it to the rest of the simulator. It coordinates
//! the following:
//! 1. **CSR Access:** Privilege-checked reads and writes through an address table.
//! 2. **Hardware Lines:** Timer, software, external and local interrupt sources.
//! 3. **Message Delivery:** MSI writes routed into the interrupt files.
//! 4. **Trap Entry:** Target selection, vector addressing and the deferred table fetch.

/// Access checks and address virtualization.
pub mod access;

/// CSR read/write dispatch.
pub mod csr;

/// Indirect register windows (`xiselect`/`xireg`).
pub mod indirect;

/// CSR address table.
pub mod table;

/// Interrupt entry helpers.
pub mod trap;

use tracing::trace;

use crate::common::constants::NON_LEVELED_MASK;
use crate::common::reg::bit;
use crate::common::{IrqError, irq};
use crate::config::{Config, ExternalDelivery};
use crate::core::arch::mode::{IrqLevel, PrivilegeMode};
use crate::core::irq::IrqState;
use crate::stats::IrqStats;

use self::table::CsrTable;
use self::trap::PendingIvt;

/// Global interrupt enables held in status registers the hart does not own.
///
/// The collaborator that owns `mstatus`/`vsstatus` keeps these in sync through
/// `Hart::set_global_enables`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlobalEnables {
    /// `mstatus.MIE`.
    pub mstatus_mie: bool,
    /// `mstatus.SIE`.
    pub mstatus_sie: bool,
    /// `vsstatus.SIE`.
    pub vsstatus_sie: bool,
}

/// Registers stored by the front-end rather than by `IrqState`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HartCsrs {
    /// `menvcfg`.
    pub menvcfg: u64,
    /// `henvcfg`.
    pub henvcfg: u64,
    /// `stimecmp`.
    pub stimecmp: u64,
    /// `vstimecmp`.
    pub vstimecmp: u64,
    /// `miselect`, `siselect`, `vsiselect` by level index.
    pub iselect: [u64; 3],
}

/// Interrupt front-end of one simulated hart.
#[derive(Debug)]
pub struct Hart {
    /// Current privilege mode.
    pub privilege: PrivilegeMode,
    /// Global enables mirrored from the status registers.
    pub enables: GlobalEnables,
    /// Interrupt registers, files and routing.
    pub irq: IrqState,
    /// Front-end registers.
    pub csrs: HartCsrs,
    table: CsrTable,
    pending_ivt: Option<PendingIvt>,
    trace: bool,
}

impl Hart {
    /// Creates a hart in Machine mode with all interrupt state at reset.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            privilege: PrivilegeMode::Machine,
            enables: GlobalEnables::default(),
            irq: IrqState::new(&config.aia),
            csrs: HartCsrs::default(),
            table: CsrTable::new(),
            pending_ivt: None,
            trace: config.trace(),
        }
    }

    /// Switches the privilege mode CSR accesses are checked against.
    pub fn set_privilege(&mut self, mode: PrivilegeMode) {
        if self.trace {
            trace!(from = %self.privilege, to = %mode, "privilege change");
        }
        self.privilege = mode;
    }

    /// Updates the global enables after the collaborator wrote a status register.
    pub const fn set_global_enables(&mut self, enables: GlobalEnables) {
        self.enables = enables;
    }

    /// Drives the timer line of `level` (MTIP, STIP or VSTIP).
    pub fn trigger_timer_interrupt(&mut self, level: IrqLevel, status: bool) {
        let iid = match level {
            IrqLevel::Machine => irq::MTI,
            IrqLevel::Supervisor => irq::STI,
            IrqLevel::VirtualSupervisor => irq::VSTI,
        };
        self.irq.clint_hw_irq_route(iid, status);
    }

    /// Drives the software line of `level` (MSIP or SSIP).
    ///
    /// # Errors
    ///
    /// `UnsupportedLevel` for VS; VSSIP is only raised through `hvip`.
    pub fn trigger_software_interrupt(
        &mut self,
        level: IrqLevel,
        status: bool,
    ) -> Result<(), IrqError> {
        let iid = match level {
            IrqLevel::Machine => irq::MSI,
            IrqLevel::Supervisor => irq::SSI,
            IrqLevel::VirtualSupervisor => {
                return Err(IrqError::UnsupportedLevel {
                    source_kind: "software",
                    level,
                });
            }
        };
        self.irq.clint_hw_irq_route(iid, status);
        Ok(())
    }

    /// Raises the wire external line of `level` (legacy gateway path).
    ///
    /// # Errors
    ///
    /// `WireDeliveryDisabled` while the interrupt files own MEIP/SEIP,
    /// `UnsupportedLevel` for VS.
    pub fn trigger_external_interrupt(&mut self, level: IrqLevel) -> Result<(), IrqError> {
        self.drive_external_wire(level, true)
    }

    /// Lowers the wire external line of `level`.
    ///
    /// # Errors
    ///
    /// Same as `trigger_external_interrupt`.
    pub fn clear_external_interrupt(&mut self, level: IrqLevel) -> Result<(), IrqError> {
        self.drive_external_wire(level, false)
    }

    fn drive_external_wire(&mut self, level: IrqLevel, status: bool) -> Result<(), IrqError> {
        if self.irq.limits().delivery == ExternalDelivery::Msi {
            return Err(IrqError::WireDeliveryDisabled);
        }
        if level == IrqLevel::VirtualSupervisor {
            return Err(IrqError::UnsupportedLevel {
                source_kind: "external",
                level,
            });
        }
        self.irq.clint_hw_irq_route(level.external_irq(), status);
        Ok(())
    }

    /// Drives one of the edge-triggered local causes (counter overflow, RAS, ...).
    ///
    /// # Errors
    ///
    /// `NotLocalInterrupt` for any identity outside the local set.
    pub fn raise_local_interrupt(&mut self, iid: u32, status: bool) -> Result<(), IrqError> {
        if iid >= 64 || NON_LEVELED_MASK & bit(iid) == 0 {
            return Err(IrqError::NotLocalInterrupt(iid));
        }
        self.irq.clint_hw_irq_route(iid, status);
        Ok(())
    }

    /// Delivers a message-signaled interrupt to an interrupt file.
    ///
    /// # Errors
    ///
    /// See `IrqState::route_imsic_write`.
    pub fn route_imsic_write(
        &mut self,
        level: IrqLevel,
        guest: usize,
        minor: u32,
    ) -> Result<(), IrqError> {
        self.irq.route_imsic_write(level, guest, minor)
    }

    /// Returns `true` if any level has an enabled pending cause, ignoring
    /// global enables. Used by the execution loop to leave `wfi`.
    pub fn has_any_locally_pending_enabled_interrupt(&self) -> bool {
        let pending = self.irq.compute_pending();
        IrqLevel::ALL
            .into_iter()
            .any(|level| pending.get(level) != 0)
    }

    /// Current `xtopi` value of `level`.
    pub fn topi(&self, level: IrqLevel) -> u64 {
        self.irq.topi(level)
    }

    /// Current `xtopei` value of `level`.
    pub fn topei(&self, level: IrqLevel) -> u64 {
        self.irq.topei(level)
    }

    /// Event counters.
    pub const fn stats(&self) -> &IrqStats {
        &self.irq.stats
    }

    /// Returns `true` when per-access tracing is enabled.
    pub const fn trace_enabled(&self) -> bool {
        self.trace
    }
}
