//! RISC-V architecture-specific components.
//!
//! This module contains the architectural definitions the interrupt subsystem
//! is built on. It includes the following modules:
//! 1. **CSRs:** Interrupt-related CSR addresses, indirect register numbers and field layouts.
//! 2. **Modes:** Privilege modes (including virtualized ones) and interrupt levels.
//! 3. **Traps:** Trap-vector modes and interrupt cause encoding.

/// Interrupt CSR addresses and bit-field layouts.
pub mod csr;

/// Privilege mode and interrupt level definitions.
pub mod mode;

/// Trap-vector modes and cause encoding.
pub mod trap;
