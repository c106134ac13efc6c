//! Delegation and injection routing.
//!
//! A cause visible to a lower level reaches it one of two ways:
//! 1. **Delegated:** the lower level's register aliases the bit of the level above.
//! 2. **Injected:** the bit is not delegated but the shadow-enable register
//!    (`mvien`/`hvien`) routes it to a separate pending/enable pair.
//!
//! This module computes both masks and composes the routed `sip`/`sie` and
//! `vsip`/`vsie` views from the underlying registers. Writes here are raw: they
//! do not recompute pending state. Callers wrap them in `IrqState::mutate`.

use crate::common::constants::{
    HS_LEVEL_MASK, LEVELED_MASK, M_LEVEL_MASK, NON_LEVELED_MASK, S_LEVEL_MASK, VS_LEVEL_MASK,
    VS_TO_S_SHIFT,
};
use crate::common::reg::{bit, write_masked};
use crate::core::arch::mode::IrqLevel;

use super::IrqState;

/// Writable bits of `mideleg`; VS and guest causes are hardwired to 1.
pub const MIDELEG_WRITE_MASK: u64 = S_LEVEL_MASK;
/// Readable bits of `mideleg`.
pub const MIDELEG_READ_MASK: u64 = S_LEVEL_MASK | HS_LEVEL_MASK;
/// Bits `hideleg` may hold.
pub const HIDELEG_MASK: u64 = VS_LEVEL_MASK;
/// Bits held by `mie`.
pub const MIE_MASK: u64 = M_LEVEL_MASK | NON_LEVELED_MASK;
/// Bits reported by `mip`.
pub const MIP_READ_MASK: u64 = M_LEVEL_MASK | NON_LEVELED_MASK;
/// Bits visible through `sie`/`sip`.
pub const SIE_MASK: u64 = S_LEVEL_MASK | NON_LEVELED_MASK;
/// Bits visible through `hie`/`hip`.
pub const HIE_MASK: u64 = HS_LEVEL_MASK;
/// Bits visible through `vsie`/`vsip`, Machine-numbered.
pub const VSIE_MASK: u64 = VS_LEVEL_MASK | NON_LEVELED_MASK;
/// Injected pending bits software may write through `sip`/`vsip`.
pub const INJECTED_PENDING_WRITE_MASK: u64 = NON_LEVELED_MASK;
/// Bits held by `mvien` and `mvip`.
pub const MVIEN_MASK: u64 = NON_LEVELED_MASK | S_LEVEL_MASK;
/// Bits held by `hvien`.
pub const HVIEN_MASK: u64 = NON_LEVELED_MASK;
/// Bits held by `hvip`.
pub const HVIP_MASK: u64 = NON_LEVELED_MASK | VS_LEVEL_MASK;

/// How a cause reaches a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Aliased from the level above.
    Delegated,
    /// Served by the shadow pending/enable registers.
    Injected,
}

/// Delegated and injected sets of one level, Machine-numbered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RouteMasks {
    /// Causes aliased from the level above.
    pub delegated: u64,
    /// Causes served by shadow registers.
    pub injected: u64,
}

impl RouteMasks {
    fn new(delegated: u64, injected: u64) -> Self {
        assert_eq!(
            delegated & injected,
            0,
            "cause both delegated and injected: {delegated:#x} / {injected:#x}"
        );
        Self {
            delegated,
            injected,
        }
    }

    /// Route of `iid`, or `None` when the level cannot see it.
    pub fn route(&self, iid: u32) -> Option<Route> {
        assert!(iid < 64, "major interrupt id {iid} out of range");
        if self.delegated & bit(iid) != 0 {
            Some(Route::Delegated)
        } else if self.injected & bit(iid) != 0 {
            Some(Route::Injected)
        } else {
            None
        }
    }

    /// Every cause the level can see.
    pub const fn present(&self) -> u64 {
        self.delegated | self.injected
    }
}

/// Moves VS causes from their Machine slots to their Supervisor slots.
pub const fn m_to_vs(bits: u64) -> u64 {
    ((bits & VS_LEVEL_MASK) >> VS_TO_S_SHIFT) | (bits & !LEVELED_MASK)
}

/// Moves VS causes from their Supervisor slots back to their Machine slots.
pub const fn vs_to_m(bits: u64) -> u64 {
    ((bits & S_LEVEL_MASK) << VS_TO_S_SHIFT) | (bits & !LEVELED_MASK)
}

impl IrqState {
    /// Routing of causes into the Supervisor level.
    pub fn s_route_masks(&self) -> RouteMasks {
        let delegated = self.mideleg_read();
        RouteMasks::new(delegated, !delegated & self.mvien)
    }

    /// Routing of causes into the VS level.
    pub fn vs_route_masks(&self) -> RouteMasks {
        let delegated = self.hideleg_read();
        RouteMasks::new(delegated, !delegated & self.hvien)
    }

    /// Route of `iid` into `level`. Nothing routes into Machine level.
    pub fn route(&self, level: IrqLevel, iid: u32) -> Option<Route> {
        match level {
            IrqLevel::Machine => None,
            IrqLevel::Supervisor => self.s_route_masks().route(iid),
            IrqLevel::VirtualSupervisor => self.vs_route_masks().route(iid),
        }
    }

    /// Returns `true` if `iid` reaches `level` through injection.
    pub fn is_injected(&self, level: IrqLevel, iid: u32) -> bool {
        self.route(level, iid) == Some(Route::Injected)
    }

    /// Causes with a Supervisor priority slot right now.
    pub fn s_irqs_present(&self) -> u64 {
        self.s_route_masks().present()
    }

    /// Causes with a VS priority slot right now, Supervisor-numbered.
    pub fn vs_irqs_present(&self) -> u64 {
        m_to_vs(self.vs_route_masks().present())
    }

    /// Re-derives which priority slots exist from the current routing.
    pub fn refresh_iprio_presence(&mut self) {
        let s = self.s_irqs_present();
        let vs = self.vs_irqs_present();
        self.iprio_s.set_dynamic_presence(s);
        for bank in &mut self.iprio_vs {
            bank.set_dynamic_presence(vs);
        }
    }

    /// Reads `mideleg`.
    pub const fn mideleg_read(&self) -> u64 {
        self.mideleg & MIDELEG_READ_MASK
    }

    /// Writes `mideleg`.
    pub fn mideleg_write(&mut self, value: u64) {
        write_masked(&mut self.mideleg, MIDELEG_WRITE_MASK, value);
    }

    /// Reads `hideleg`. A bit reads 0 while the cause is invisible to S.
    pub fn hideleg_read(&self) -> u64 {
        self.hideleg & HIDELEG_MASK & self.s_irqs_present()
    }

    /// Writes `hideleg`.
    pub fn hideleg_write(&mut self, value: u64) {
        let mask = HIDELEG_MASK & self.s_irqs_present();
        write_masked(&mut self.hideleg, mask, value);
    }

    /// Reads `mip`: hardware lines plus the VS bits software raised in `hvip`.
    pub const fn mip_read(&self) -> u64 {
        (self.mip | (self.hvip & VS_LEVEL_MASK)) & MIP_READ_MASK
    }

    /// Reads `mie`.
    pub const fn mie_read(&self) -> u64 {
        self.mie & MIE_MASK
    }

    /// Writes `mie`.
    pub fn mie_write(&mut self, value: u64) {
        write_masked(&mut self.mie, MIE_MASK, value);
    }

    /// Reads the routed `sip`.
    pub fn sip_read(&self) -> u64 {
        let RouteMasks {
            delegated,
            injected,
        } = self.s_route_masks();
        ((delegated & self.mip_read()) | (injected & self.mvip)) & SIE_MASK
    }

    /// Writes the routed `sip`, limited to `write_mask`.
    ///
    /// Delegated bits alias hardware lines and are read-only; injected
    /// edge-triggered causes land in `mvip`.
    pub fn sip_write_masked(&mut self, write_mask: u64, value: u64) {
        let injected = self.s_route_masks().injected;
        write_masked(
            &mut self.mvip,
            write_mask & INJECTED_PENDING_WRITE_MASK & injected,
            value,
        );
    }

    /// Reads the routed `sie`.
    pub fn sie_read(&self) -> u64 {
        let RouteMasks {
            delegated,
            injected,
        } = self.s_route_masks();
        ((delegated & self.mie) | (injected & self.s_shadow_ie)) & SIE_MASK
    }

    /// Writes the routed `sie`, limited to `write_mask`.
    pub fn sie_write_masked(&mut self, write_mask: u64, value: u64) {
        let RouteMasks {
            delegated,
            injected,
        } = self.s_route_masks();
        write_masked(&mut self.mie, write_mask & SIE_MASK & delegated, value);
        write_masked(
            &mut self.s_shadow_ie,
            write_mask & SIE_MASK & injected,
            value,
        );
    }

    /// Reads `hip`.
    pub const fn hip_read(&self) -> u64 {
        self.mip_read() & HIE_MASK
    }

    /// Reads `hie`.
    pub const fn hie_read(&self) -> u64 {
        self.mie & HIE_MASK
    }

    /// Writes `hie`, limited to `write_mask`.
    pub fn hie_write_masked(&mut self, write_mask: u64, value: u64) {
        write_masked(&mut self.mie, write_mask & HIE_MASK, value);
    }

    /// Reads the routed `vsip`, Machine-numbered.
    pub fn vsip_read_m(&self) -> u64 {
        let RouteMasks {
            delegated,
            injected,
        } = self.vs_route_masks();
        let aliased = (self.sip_read() & !LEVELED_MASK) | (self.hip_read() & LEVELED_MASK);
        ((delegated & aliased) | (injected & self.hvip)) & VSIE_MASK
    }

    /// Reads `vsip` as software sees it.
    pub fn vsip_read(&self) -> u64 {
        m_to_vs(self.vsip_read_m())
    }

    /// Writes `vsip` (value in VS numbering).
    pub fn vsip_write(&mut self, value: u64) {
        let value = vs_to_m(value);
        let injected = self.vs_route_masks().injected;
        write_masked(
            &mut self.hvip,
            INJECTED_PENDING_WRITE_MASK & injected,
            value,
        );
    }

    /// Reads the routed `vsie`, Machine-numbered.
    pub fn vsie_read_m(&self) -> u64 {
        let RouteMasks {
            delegated,
            injected,
        } = self.vs_route_masks();
        let aliased = (self.sie_read() & !LEVELED_MASK) | (self.hie_read() & LEVELED_MASK);
        ((delegated & aliased) | (injected & self.vs_shadow_ie)) & VSIE_MASK
    }

    /// Reads `vsie` as software sees it.
    pub fn vsie_read(&self) -> u64 {
        m_to_vs(self.vsie_read_m())
    }

    /// Writes `vsie` (value in VS numbering).
    pub fn vsie_write(&mut self, value: u64) {
        let value = vs_to_m(value);
        let RouteMasks {
            delegated,
            injected,
        } = self.vs_route_masks();
        let delegated_mask = VSIE_MASK & delegated;
        self.sie_write_masked(delegated_mask, value);
        self.hie_write_masked(delegated_mask, value);
        write_masked(&mut self.vs_shadow_ie, VSIE_MASK & injected, value);
    }

    /// Reads `mvien`.
    pub const fn mvien_read(&self) -> u64 {
        self.mvien
    }

    /// Writes `mvien`.
    pub fn mvien_write(&mut self, value: u64) {
        write_masked(&mut self.mvien, MVIEN_MASK, value);
    }

    /// Reads `mvip`.
    pub const fn mvip_read(&self) -> u64 {
        self.mvip
    }

    /// Writes `mvip`.
    pub fn mvip_write(&mut self, value: u64) {
        write_masked(&mut self.mvip, MVIEN_MASK, value);
    }

    /// Reads `hvien`.
    pub const fn hvien_read(&self) -> u64 {
        self.hvien
    }

    /// Writes `hvien`.
    pub fn hvien_write(&mut self, value: u64) {
        write_masked(&mut self.hvien, HVIEN_MASK, value);
    }

    /// Reads `hvip`.
    pub const fn hvip_read(&self) -> u64 {
        self.hvip
    }

    /// Writes `hvip`.
    pub fn hvip_write(&mut self, value: u64) {
        write_masked(&mut self.hvip, HVIP_MASK, value);
    }

    /// Drives hardware line `iid` of `mip`.
    ///
    /// Edges are found later by `settle`, which diffs whole pending sets.
    pub fn set_hw_pending(&mut self, iid: u32, set: bool) {
        assert!(iid < 64, "major interrupt id {iid} out of range");
        write_masked(&mut self.mip, MIP_READ_MASK & bit(iid), u64::from(set) << iid);
    }
}
