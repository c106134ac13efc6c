//! Interrupt Entry Logic.
//!
//! This module implements the parts of trap entry that depend on interrupt state.
//! It performs the following:
//! 1. **Target Selection:** Picks the level an interrupt is taken to from the pending
//!    sets, the current mode and the global enables.
//! 2. **Vector Addressing:** Direct, vectored and nested-vectored handler addresses.
//! 3. **Threshold Protocol:** Claims the top identity and pushes the threshold on entry.
//! 4. **Deferred Fetch:** The nested-vectored table entry is loaded on the next step so
//!    a fault raised by the load itself can be taken first.

use tracing::debug;

use crate::core::arch::mode::{IrqLevel, PrivilegeMode};
use crate::core::arch::trap::{TrapVectorMode, VECTOR_ENTRY_SIZE, interrupt_cause, tvec_base};
use crate::core::irq::pending::vs_to_s;

use super::Hart;

/// Memory the nested-vectored dispatcher loads table entries from.
///
/// Implemented by the simulator's bus; the error type is whatever a failed
/// instruction-side load produces there.
#[cfg_attr(test, mockall::automock(type Error = String;))]
pub trait VectorTableMemory {
    /// Failure of a table load.
    type Error;

    /// Loads one 32-bit table entry.
    fn load_word(&mut self, addr: u64) -> Result<u32, Self::Error>;
}

/// Where execution continues after trap entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapTarget {
    /// Jump straight to this address.
    Direct(u64),
    /// Load the handler address from this table entry first.
    Indirect(u64),
}

/// A table fetch recorded at trap entry and performed on the next step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingIvt {
    /// Level whose table is read.
    pub level: IrqLevel,
    /// Address of the table entry.
    pub entry: u64,
}

/// An interrupt selected for entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingInterrupt {
    /// Level the interrupt is taken to.
    pub level: IrqLevel,
    /// Major identity as reported in `xcause` (VS causes Supervisor-numbered).
    pub iid: u32,
}

/// Result of taking an interrupt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterruptEntry {
    /// Level the interrupt was taken to.
    pub level: IrqLevel,
    /// Value for `xcause`.
    pub cause: u64,
    /// Handler address or table entry.
    pub target: TrapTarget,
}

impl Hart {
    fn globally_enabled(&self, level: IrqLevel) -> bool {
        use PrivilegeMode::{Machine, Supervisor, VirtualSupervisor, VirtualUser};
        match level {
            IrqLevel::Machine => self.privilege != Machine || self.enables.mstatus_mie,
            IrqLevel::Supervisor => match self.privilege {
                Machine => false,
                Supervisor => self.enables.mstatus_sie,
                _ => true,
            },
            IrqLevel::VirtualSupervisor => match self.privilege {
                VirtualUser => true,
                VirtualSupervisor => self.enables.vsstatus_sie,
                _ => false,
            },
        }
    }

    /// Selects the interrupt the hart takes next, if any.
    ///
    /// Levels are tried from Machine down; a level is eligible when it has a
    /// pending cause and interrupts to it are globally enabled in the current mode.
    pub fn pending_interrupt(&self) -> Option<PendingInterrupt> {
        let pending = self.irq.effective_pending();
        IrqLevel::ALL
            .into_iter()
            .filter(|&level| self.globally_enabled(level))
            .find_map(|level| {
                self.irq.level_top(level, &pending).map(|top| PendingInterrupt {
                    level,
                    iid: match level {
                        IrqLevel::VirtualSupervisor => vs_to_s(top.iid),
                        _ => top.iid,
                    },
                })
            })
    }

    /// Takes the top interrupt of `level`.
    ///
    /// Switches to the level's privilege mode, computes the handler address
    /// and, in nested-vectored mode, records the table fetch and runs the
    /// claim/threshold protocol.
    ///
    /// # Returns
    ///
    /// The entry, or `None` if `level` has nothing pending.
    pub fn take_interrupt(&mut self, level: IrqLevel) -> Option<InterruptEntry> {
        let pending = self.irq.effective_pending();
        let top = self.irq.level_top(level, &pending)?;
        let code = match level {
            IrqLevel::VirtualSupervisor => vs_to_s(top.iid),
            _ => top.iid,
        };
        let tvec = self.irq.tvec_read(level);
        let base = tvec_base(tvec);

        let target = match TrapVectorMode::from_tvec(tvec) {
            TrapVectorMode::Direct => TrapTarget::Direct(base),
            TrapVectorMode::Vectored => {
                TrapTarget::Direct(base + VECTOR_ENTRY_SIZE * u64::from(code))
            }
            TrapVectorMode::NestedVectored => {
                let line = self.irq.nv_line(level);
                let entry = base + VECTOR_ENTRY_SIZE * u64::from(line);
                self.pending_ivt = Some(PendingIvt { level, entry });
                self.irq.stats.nv_dispatches += 1;
                debug!(level = %level, line, entry = format_args!("{entry:#x}"), "nested-vectored dispatch");
                TrapTarget::Indirect(entry)
            }
        };

        self.irq.notify_irq_taken(level);
        self.irq.stats.record_taken(level);
        self.set_privilege(level.mode());

        Some(InterruptEntry {
            level,
            cause: interrupt_cause(code),
            target,
        })
    }

    /// Handler target of a synchronous exception taken to `level`.
    ///
    /// Nested-vectored levels fetch the handler from table line 0.
    pub fn exception_target(&mut self, level: IrqLevel) -> TrapTarget {
        let tvec = self.irq.tvec_read(level);
        let base = tvec_base(tvec);
        match TrapVectorMode::from_tvec(tvec) {
            TrapVectorMode::NestedVectored => {
                self.pending_ivt = Some(PendingIvt { level, entry: base });
                TrapTarget::Indirect(base)
            }
            _ => TrapTarget::Direct(base),
        }
    }

    /// The table fetch waiting for the next step, if any.
    pub const fn pending_ivt(&self) -> Option<PendingIvt> {
        self.pending_ivt
    }

    /// Performs the deferred table fetch.
    ///
    /// # Returns
    ///
    /// The handler address, or `None` when no fetch is pending. The fetch is
    /// consumed even when the load fails.
    ///
    /// # Errors
    ///
    /// Whatever the memory returns for a failed load.
    pub fn process_pending_ivt<M: VectorTableMemory>(
        &mut self,
        mem: &mut M,
    ) -> Result<Option<u64>, M::Error> {
        let Some(PendingIvt { level, entry }) = self.pending_ivt.take() else {
            return Ok(None);
        };
        let handler = u64::from(mem.load_word(entry)?);
        debug!(level = %level, entry = format_args!("{entry:#x}"), handler = format_args!("{handler:#x}"), "vector table fetch");
        Ok(Some(handler))
    }
}
