//! Privileged interrupt state of one hart.
//!
//! This module owns every register the interrupt subsystem reads or writes and
//! implements the logic over them as plain functions of that single state. It
//! includes the following modules:
//! 1. **Routing:** Delegation/injection masks and the routed `xip`/`xie` views.
//! 2. **Pending:** Per-level pending sets and the nested-vectored filter.
//! 3. **Priority:** Arbitration between pending causes and the `xtopi` values.
//! 4. **Interrupt Files:** IMSIC files, priority tables and the threshold stack.
//! 5. **Guests:** `hstatus`, guest selection and the guest external line.
//! 6. **Cascade:** Mirroring major interrupt edges into the interrupt files.

/// Delivery cascade and the recompute closure.
pub mod cascade;

/// Guest file selection and aggregation.
pub mod guest;

/// IMSIC interrupt file.
pub mod imsic;

/// Major interrupt priority tables.
pub mod iprio;

/// Per-level pending sets.
pub mod pending;

/// Priority arbitration.
pub mod priority;

/// Delegation and injection routing.
pub mod route;

/// `eithreshold` register and stack.
pub mod threshold;

use crate::common::IrqError;
use crate::common::constants::HS_LEVEL_MASK;
use crate::config::{AiaConfig, ExternalDelivery};
use crate::core::arch::csr::hstatus;
use crate::core::arch::mode::IrqLevel;
use crate::core::arch::trap::TrapVectorMode;
use crate::stats::IrqStats;

use self::imsic::ImsicFile;
use self::iprio::IprioTable;

/// Sizes fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IrqLimits {
    /// Number of guest interrupt files.
    pub max_guest: usize,
    /// Minor identities per file.
    pub imsic_max_irqs: u32,
    /// Highest nested-vectored table line.
    pub nv_max_vector: u32,
    /// Source of MEIP/SEIP.
    pub delivery: ExternalDelivery,
}

/// Interrupt registers and files of one hart.
///
/// All pending and enable masks are stored Machine-numbered: VS causes live in
/// bits 2, 6 and 10 and are shifted down only when read through `vsip`/`vsie`.
#[derive(Clone, Debug)]
pub struct IrqState {
    pub(crate) limits: IrqLimits,

    /// Hardware pending bits, including lines driven by the interrupt files.
    pub(crate) mip: u64,
    pub(crate) mie: u64,
    pub(crate) mideleg: u64,
    pub(crate) hideleg: u64,

    pub(crate) mvien: u64,
    pub(crate) mvip: u64,
    /// `sie` bits of injected causes.
    pub(crate) s_shadow_ie: u64,

    pub(crate) hvien: u64,
    pub(crate) hvip: u64,
    /// `vsie` bits of injected causes.
    pub(crate) vs_shadow_ie: u64,

    pub(crate) hvictl: u64,
    pub(crate) hgeie: u64,
    pub(crate) hgeip: u64,
    pub(crate) hstatus: u64,

    /// `mtvec`, `stvec`, `vstvec` by level index.
    pub(crate) tvec: [u64; 3],

    pub(crate) imsic_m: ImsicFile,
    pub(crate) imsic_s: ImsicFile,
    pub(crate) imsic_vs: Vec<ImsicFile>,

    pub(crate) iprio_m: IprioTable,
    pub(crate) iprio_s: IprioTable,
    /// One bank per `vgein` value, bank 0 serving the disconnected state.
    pub(crate) iprio_vs: Vec<IprioTable>,

    /// Event counters.
    pub stats: IrqStats,
}

impl IrqState {
    /// Creates the reset state for `config`.
    ///
    /// The configuration is assumed validated; see `Config::validate`.
    pub fn new(config: &AiaConfig) -> Self {
        let limits = IrqLimits {
            max_guest: config.max_guest,
            imsic_max_irqs: config.imsic_max_irqs,
            nv_max_vector: config.nv_max_vector,
            delivery: config.external_delivery,
        };
        let file = || ImsicFile::new(limits.imsic_max_irqs, limits.nv_max_vector);

        let mut state = Self {
            limits,
            mip: 0,
            mie: 0,
            mideleg: HS_LEVEL_MASK,
            hideleg: 0,
            mvien: 0,
            mvip: 0,
            s_shadow_ie: 0,
            hvien: 0,
            hvip: 0,
            vs_shadow_ie: 0,
            hvictl: 0,
            hgeie: 0,
            hgeip: 0,
            hstatus: 0,
            tvec: [0; 3],
            imsic_m: file(),
            imsic_s: file(),
            imsic_vs: (0..limits.max_guest).map(|_| file()).collect(),
            iprio_m: IprioTable::machine(),
            iprio_s: IprioTable::supervisor(),
            iprio_vs: (0..=limits.max_guest)
                .map(|_| IprioTable::virtual_supervisor())
                .collect(),
            stats: IrqStats::default(),
        };
        state.refresh_iprio_presence();
        state
    }

    /// Sizes this state was built with.
    pub const fn limits(&self) -> &IrqLimits {
        &self.limits
    }

    /// `hstatus.VGEIN`: 0 when no guest file is connected.
    pub const fn vgein(&self) -> usize {
        hstatus::vgein(self.hstatus)
    }

    /// Returns `true` while a guest interrupt file is selected.
    pub const fn guest_connected(&self) -> bool {
        self.vgein() != 0
    }

    /// 0-based index of the selected guest file.
    pub const fn current_guest(&self) -> Option<usize> {
        match self.vgein() {
            0 => None,
            v => Some(v - 1),
        }
    }

    /// Dispatch mode of `level`'s trap vector.
    pub const fn vector_mode(&self, level: IrqLevel) -> TrapVectorMode {
        TrapVectorMode::from_tvec(self.tvec[level.index()])
    }

    /// Returns `true` when `level` dispatches in nested-vectored mode.
    pub fn nested(&self, level: IrqLevel) -> bool {
        self.vector_mode(level) == TrapVectorMode::NestedVectored
    }

    /// Interrupt file serving `level`; `None` for VS with no guest selected.
    pub fn file(&self, level: IrqLevel) -> Option<&ImsicFile> {
        match level {
            IrqLevel::Machine => Some(&self.imsic_m),
            IrqLevel::Supervisor => Some(&self.imsic_s),
            IrqLevel::VirtualSupervisor => self.current_guest().map(|g| &self.imsic_vs[g]),
        }
    }

    /// Mutable access to the interrupt file serving `level`.
    pub fn file_mut(&mut self, level: IrqLevel) -> Option<&mut ImsicFile> {
        match level {
            IrqLevel::Machine => Some(&mut self.imsic_m),
            IrqLevel::Supervisor => Some(&mut self.imsic_s),
            IrqLevel::VirtualSupervisor => match self.current_guest() {
                Some(g) => Some(&mut self.imsic_vs[g]),
                None => None,
            },
        }
    }

    /// Guest interrupt file `index` (0-based), selected or not.
    pub fn guest_file(&self, index: usize) -> Result<&ImsicFile, IrqError> {
        self.imsic_vs.get(index).ok_or(IrqError::GuestOutOfRange {
            index,
            count: self.limits.max_guest,
        })
    }

    /// Priority table of `level`; VS uses the bank selected by `vgein`.
    pub fn iprio_table(&self, level: IrqLevel) -> &IprioTable {
        match level {
            IrqLevel::Machine => &self.iprio_m,
            IrqLevel::Supervisor => &self.iprio_s,
            IrqLevel::VirtualSupervisor => &self.iprio_vs[self.vgein()],
        }
    }

    /// Mutable access to the priority table of `level`.
    pub fn iprio_table_mut(&mut self, level: IrqLevel) -> &mut IprioTable {
        let vgein = self.vgein();
        match level {
            IrqLevel::Machine => &mut self.iprio_m,
            IrqLevel::Supervisor => &mut self.iprio_s,
            IrqLevel::VirtualSupervisor => &mut self.iprio_vs[vgein],
        }
    }
}
