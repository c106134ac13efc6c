//! RISC-V Privilege Modes and Interrupt Levels.
//!
//! This module defines the privilege levels seen by the interrupt subsystem.
//! It implements the following:
//! 1. **Mode Classification:** U, S(HS), M plus the virtualized VU and VS modes.
//! 2. **Interrupt Levels:** The three levels that own interrupt state (M, S/HS, VS).
//! 3. **Observability:** Human-readable naming and display formatting.

use serde::{Deserialize, Serialize};

/// RISC-V privilege mode of the running hart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum PrivilegeMode {
    /// User mode (U-mode).
    User = 0,

    /// Supervisor mode (S-mode, HS-mode when the hypervisor extension is active).
    Supervisor = 1,

    /// Machine mode (M-mode).
    ///
    /// Highest privilege level for firmware and low-level system control.
    Machine = 3,

    /// Virtual user mode (VU-mode).
    VirtualUser = 4,

    /// Virtual supervisor mode (VS-mode).
    ///
    /// Guest kernels run here; accesses to S-level CSRs are redirected to the
    /// VS copies.
    VirtualSupervisor = 5,
}

impl PrivilegeMode {
    /// Converts a `u8` value to a privilege mode.
    ///
    /// # Arguments
    ///
    /// * `val` - The numeric mode value (0, 1, 3, 4 or 5).
    ///
    /// # Returns
    ///
    /// The corresponding `PrivilegeMode`, defaulting to `Machine` for invalid values.
    pub const fn from_u8(val: u8) -> Self {
        match val {
            0 => Self::User,
            1 => Self::Supervisor,
            4 => Self::VirtualUser,
            5 => Self::VirtualSupervisor,
            _ => Self::Machine,
        }
    }

    /// Converts a privilege mode to its `u8` representation.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` for VU and VS (V = 1).
    pub const fn is_virtual(self) -> bool {
        matches!(self, Self::VirtualUser | Self::VirtualSupervisor)
    }

    /// Returns the human-readable name of the privilege mode.
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Supervisor => "Supervisor",
            Self::Machine => "Machine",
            Self::VirtualUser => "VirtualUser",
            Self::VirtualSupervisor => "VirtualSupervisor",
        }
    }
}

impl std::fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A level that owns interrupt state: pending sets, a trap vector and an
/// interrupt file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum IrqLevel {
    /// Machine level.
    Machine,
    /// Supervisor level (HS when virtualization is in use).
    Supervisor,
    /// Virtual supervisor level of the current guest.
    VirtualSupervisor,
}

impl IrqLevel {
    /// All levels, highest first.
    pub const ALL: [Self; 3] = [Self::Machine, Self::Supervisor, Self::VirtualSupervisor];

    /// Returns the dense index used for per-level arrays (M = 0, S = 1, VS = 2).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the major identity of this level's external interrupt.
    pub const fn external_irq(self) -> u32 {
        use crate::common::irq;
        match self {
            Self::Machine => irq::MEI,
            Self::Supervisor => irq::SEI,
            Self::VirtualSupervisor => irq::VSEI,
        }
    }

    /// Returns the privilege mode a trap to this level runs in.
    pub const fn mode(self) -> PrivilegeMode {
        match self {
            Self::Machine => PrivilegeMode::Machine,
            Self::Supervisor => PrivilegeMode::Supervisor,
            Self::VirtualSupervisor => PrivilegeMode::VirtualSupervisor,
        }
    }

    /// Returns the human-readable name of the level.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Machine => "M",
            Self::Supervisor => "S",
            Self::VirtualSupervisor => "VS",
        }
    }
}

impl std::fmt::Display for IrqLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
