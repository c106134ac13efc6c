//! Trap and error definitions.
//!
//! This module defines how failures leave the interrupt subsystem. It provides:
//! 1. **Trap Representation:** The two guest-visible exceptions raised by CSR accesses.
//! 2. **API Errors:** Misuse of the hardware-line entry points by a collaborator.
//! 3. **Configuration Errors:** Loading and validation failures for `Config`.
//!
//! Internal invariant violations are not represented here; they abort through
//! `assert!` because the simulated state is no longer meaningful.

use thiserror::Error;

use crate::core::arch::mode::IrqLevel;

/// Guest-visible exception raised by a CSR access.
///
/// Each variant carries the CSR address that was accessed so the trap path can
/// fill `xtval` if it wants to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Trap {
    /// Illegal instruction exception.
    ///
    /// Raised for insufficient privilege, unimplemented or out-of-range
    /// registers, writes to read-only CSRs, and gated accesses from HS/M.
    #[error("illegal instruction (csr {0:#05x})")]
    IllegalInstruction(u32),

    /// Virtual instruction exception.
    ///
    /// Raised instead of an illegal instruction when the access comes from
    /// VS or VU mode and would have been legal in HS mode.
    #[error("virtual instruction (csr {0:#05x})")]
    VirtualInstruction(u32),
}

impl Trap {
    /// Returns the exception code written to `xcause`.
    pub const fn cause_code(self) -> u64 {
        match self {
            Self::IllegalInstruction(_) => 2,
            Self::VirtualInstruction(_) => 22,
        }
    }

    /// Returns the CSR address whose access raised the trap.
    pub const fn csr(self) -> u32 {
        match self {
            Self::IllegalInstruction(addr) | Self::VirtualInstruction(addr) => addr,
        }
    }
}

/// Errors returned by the hardware-line and message entry points of a hart.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IrqError {
    /// The interrupt source has no line at the requested level.
    #[error("{source_kind} interrupts cannot target {level}")]
    UnsupportedLevel {
        /// Kind of source (timer, software, external).
        source_kind: &'static str,
        /// Requested level.
        level: IrqLevel,
    },

    /// Wire external interrupts were raised while MSI delivery owns MEIP/SEIP.
    #[error("wire external interrupts are disabled while MSI delivery is active")]
    WireDeliveryDisabled,

    /// A guest interrupt file index beyond the configured count.
    #[error("guest index {index} out of range ({count} guest files)")]
    GuestOutOfRange {
        /// Requested 0-based guest index.
        index: usize,
        /// Number of guest files.
        count: usize,
    },

    /// A minor identity beyond the size of the interrupt file.
    #[error("minor interrupt id {id} out of range (file holds {limit})")]
    MinorIdOutOfRange {
        /// Requested identity.
        id: u32,
        /// Number of identities in the file.
        limit: u32,
    },

    /// The major identity is not one of the edge-triggered local causes.
    #[error("major interrupt id {0} is not a local edge-triggered cause")]
    NotLocalInterrupt(u32),
}

/// Errors produced while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the configuration file failed.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid JSON for `Config`.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// `max_guest` is outside `1..=63`.
    #[error("max_guest must be in 1..=63, got {0}")]
    InvalidGuestCount(usize),

    /// `imsic_max_irqs` is not a multiple of 64 in `64..=2048`.
    #[error("imsic_max_irqs must be a multiple of 64 in 64..=2048, got {0}")]
    InvalidMaxIrqs(u32),

    /// `nv_max_vector` is zero, above 255, or not below `imsic_max_irqs`.
    #[error("nv_max_vector must be in 1..=255 and below imsic_max_irqs, got {0}")]
    InvalidVectorCount(u32),

    /// `imsic_base` is not aligned to an interrupt-file page.
    #[error("imsic_base must be 4 KiB aligned, got {0:#x}")]
    MisalignedBase(u64),
}
