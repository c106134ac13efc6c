//! RISC-V privileged-interrupt subsystem library.
//!
//! This crate implements the Advanced Interrupt Architecture (AIA) side of a RISC-V
//! instruction-set simulator with the following:
//! 1. **Routing:** Delegation and injection between Machine, Supervisor and VS levels.
//! 2. **Arbitration:** Per-level pending sets, priority tables and `xtopi`.
//! 3. **Interrupt Files:** IMSIC emulation for M, S and every guest, with the
//!    nested-vectored threshold stack.
//! 4. **Front-End:** Privilege-checked CSR access, hardware lines and trap entry.
//! 5. **Simulation:** MMIO pages, JSON scenarios and statistics.

/// Common types and constants (interrupt numbers, register helpers, traps).
pub mod common;
/// Interrupt subsystem configuration (defaults, enums, JSON loading).
pub mod config;
/// Interrupt core (arch definitions, interrupt state, hart front-end).
pub mod core;
/// Scenario replay against a hart.
pub mod sim;
/// System-on-chip (device trait, IMSIC MMIO pages).
pub mod soc;
/// Interrupt statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or load it from JSON.
pub use crate::config::Config;
/// Hart front-end; owns the interrupt state and checks CSR access.
pub use crate::core::Hart;
/// Interrupt registers and files of one hart.
pub use crate::core::IrqState;
