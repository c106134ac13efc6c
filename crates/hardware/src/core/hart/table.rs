//! CSR address table.
//!
//! Maps every CSR address the front-end implements to the register it selects.
//! The table is built once per hart; addresses missing from it raise an
//! illegal instruction exception.

use std::collections::HashMap;

use crate::core::arch::csr;
use crate::core::arch::mode::IrqLevel;

/// Register selected by a CSR address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CsrKind {
    /// `mip`.
    Mip,
    /// `mie`.
    Mie,
    /// `mideleg`.
    Mideleg,
    /// `mvien`.
    Mvien,
    /// `mvip`.
    Mvip,
    /// `sip`.
    Sip,
    /// `sie`.
    Sie,
    /// `hip`.
    Hip,
    /// `hie`.
    Hie,
    /// `hideleg`.
    Hideleg,
    /// `hvien`.
    Hvien,
    /// `hvip`.
    Hvip,
    /// `hvictl`.
    Hvictl,
    /// `hgeie`.
    Hgeie,
    /// `hgeip`.
    Hgeip,
    /// `hstatus`.
    Hstatus,
    /// `vsip`.
    Vsip,
    /// `vsie`.
    Vsie,
    /// `hviprio1` (0) or `hviprio2` (1).
    Hviprio(usize),
    /// `menvcfg`.
    Menvcfg,
    /// `henvcfg`.
    Henvcfg,
    /// `stimecmp`.
    Stimecmp,
    /// `vstimecmp`.
    Vstimecmp,
    /// `mtvec`, `stvec` or `vstvec`.
    Tvec(IrqLevel),
    /// `mtopi`, `stopi` or `vstopi`.
    Topi(IrqLevel),
    /// `mtopei`, `stopei` or `vstopei`.
    Topei(IrqLevel),
    /// `miselect`, `siselect` or `vsiselect`.
    Iselect(IrqLevel),
    /// `xireg` window; the second field is the offset added to `xiselect`.
    Ireg(IrqLevel, u32),
}

/// Address-to-register lookup built at construction.
#[derive(Clone, Debug)]
pub struct CsrTable {
    map: HashMap<u32, CsrKind>,
}

impl CsrTable {
    /// Builds the table.
    pub fn new() -> Self {
        let mut map = HashMap::new();
        let fixed = [
            (csr::MIP, CsrKind::Mip),
            (csr::MIE, CsrKind::Mie),
            (csr::MIDELEG, CsrKind::Mideleg),
            (csr::MVIEN, CsrKind::Mvien),
            (csr::MVIP, CsrKind::Mvip),
            (csr::SIP, CsrKind::Sip),
            (csr::SIE, CsrKind::Sie),
            (csr::HIP, CsrKind::Hip),
            (csr::HIE, CsrKind::Hie),
            (csr::HIDELEG, CsrKind::Hideleg),
            (csr::HVIEN, CsrKind::Hvien),
            (csr::HVIP, CsrKind::Hvip),
            (csr::HVICTL, CsrKind::Hvictl),
            (csr::HGEIE, CsrKind::Hgeie),
            (csr::HGEIP, CsrKind::Hgeip),
            (csr::HSTATUS, CsrKind::Hstatus),
            (csr::VSIP, CsrKind::Vsip),
            (csr::VSIE, CsrKind::Vsie),
            (csr::HVIPRIO1, CsrKind::Hviprio(0)),
            (csr::HVIPRIO2, CsrKind::Hviprio(1)),
            (csr::MENVCFG, CsrKind::Menvcfg),
            (csr::HENVCFG, CsrKind::Henvcfg),
            (csr::STIMECMP, CsrKind::Stimecmp),
            (csr::VSTIMECMP, CsrKind::Vstimecmp),
        ];
        map.extend(fixed);

        let per_level = [
            (IrqLevel::Machine, csr::MTVEC, csr::MTOPI, csr::MTOPEI, csr::MISELECT, csr::MIREG),
            (IrqLevel::Supervisor, csr::STVEC, csr::STOPI, csr::STOPEI, csr::SISELECT, csr::SIREG),
            (
                IrqLevel::VirtualSupervisor,
                csr::VSTVEC,
                csr::VSTOPI,
                csr::VSTOPEI,
                csr::VSISELECT,
                csr::VSIREG,
            ),
        ];
        for (level, tvec, topi, topei, iselect, ireg) in per_level {
            let _ = map.insert(tvec, CsrKind::Tvec(level));
            let _ = map.insert(topi, CsrKind::Topi(level));
            let _ = map.insert(topei, CsrKind::Topei(level));
            let _ = map.insert(iselect, CsrKind::Iselect(level));
            for (window, offset) in csr::IREG_WINDOWS.into_iter().enumerate() {
                let _ = map.insert(ireg + offset, CsrKind::Ireg(level, window as u32));
            }
        }
        Self { map }
    }

    /// Register selected by `addr`, if implemented.
    pub fn lookup(&self, addr: u32) -> Option<CsrKind> {
        self.map.get(&addr).copied()
    }

    /// Number of implemented addresses.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for CsrTable {
    fn default() -> Self {
        Self::new()
    }
}
