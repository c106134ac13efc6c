//! Per-level pending sets.
//!
//! Pending for a level is enabled-and-pending restricted to the causes that
//! level owns: a cause delegated further down disappears from the level above.
//! All sets are Machine-numbered.

use crate::common::irq;
use crate::common::reg::bit;
use crate::core::arch::csr::hvictl;
use crate::core::arch::mode::IrqLevel;

use super::IrqState;

/// Pending causes of each level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PendingSet {
    /// Causes taken in Machine mode.
    pub m: u64,
    /// Causes taken in Supervisor (HS) mode.
    pub s_hs: u64,
    /// Causes taken in VS mode, Machine-numbered.
    pub vs: u64,
}

impl PendingSet {
    /// Pending set of `level`.
    pub const fn get(&self, level: IrqLevel) -> u64 {
        match level {
            IrqLevel::Machine => self.m,
            IrqLevel::Supervisor => self.s_hs,
            IrqLevel::VirtualSupervisor => self.vs,
        }
    }

    /// Highest level holding `iid` as pending.
    pub fn owner(&self, iid: u32) -> Option<IrqLevel> {
        IrqLevel::ALL
            .into_iter()
            .find(|&level| self.get(level) & bit(iid) != 0)
    }
}

/// Supervisor-numbered identity of a VS cause; other identities pass through.
pub const fn vs_to_s(iid: u32) -> u32 {
    match iid {
        irq::VSSI => irq::SSI,
        irq::VSTI => irq::STI,
        irq::VSEI => irq::SEI,
        other => other,
    }
}

/// Machine-numbered identity of a Supervisor-numbered VS cause.
///
/// Only the standard causes and local causes above 12 have a VS form.
pub const fn s_to_vs(iid: u32) -> Option<u32> {
    match iid {
        irq::SSI => Some(irq::VSSI),
        irq::STI => Some(irq::VSTI),
        irq::SEI => Some(irq::VSEI),
        13..=63 => Some(iid),
        _ => None,
    }
}

impl IrqState {
    /// Returns `true` when `hvictl` injects a local VS cause.
    pub const fn hvictl_local_injected(&self) -> bool {
        hvictl::vti(self.hvictl) && hvictl::iid(self.hvictl) != irq::SEI
    }

    /// Returns `true` when `hvictl` injects the VS external cause.
    pub const fn hvictl_external_injected(&self) -> bool {
        hvictl::iid(self.hvictl) == irq::SEI && hvictl::iprio(self.hvictl) != 0
    }

    /// Pending sets before the nested-vectored filter.
    ///
    /// The cascade compares these; local causes still show up here even when
    /// the trap path ignores them.
    pub fn compute_pending(&self) -> PendingSet {
        let m = self.mie & self.mip & !self.mideleg_read();
        let s_hs = ((self.sip_read() & self.sie_read()) | (self.hip_read() & self.hie_read()))
            & !self.hideleg_read();
        let mut vs = self.vsip_read_m() & self.vsie_read_m();

        if self.hvictl_local_injected() {
            vs &= bit(irq::VSEI);
            if let Some(iid) = s_to_vs(hvictl::iid(self.hvictl)) {
                vs |= bit(iid);
            }
        }

        PendingSet { m, s_hs, vs }
    }

    /// Restricts nested-vectored levels to their own external cause.
    pub fn nv_filtered(&self, mut pending: PendingSet) -> PendingSet {
        if self.nested(IrqLevel::Machine) {
            pending.m &= bit(irq::MEI);
        }
        if self.nested(IrqLevel::Supervisor) {
            pending.s_hs &= bit(irq::SEI);
        }
        if self.nested(IrqLevel::VirtualSupervisor) {
            pending.vs &= bit(irq::VSEI);
        }
        pending
    }

    /// Pending sets the trap path and `xtopi` see.
    pub fn effective_pending(&self) -> PendingSet {
        self.nv_filtered(self.compute_pending())
    }
}
