//! Common utilities and types used throughout the interrupt subsystem.
//!
//! This module provides the building blocks shared by the router, the IMSIC
//! emulator and the hart front-end. It includes:
//! 1. **Constants:** Major interrupt numbers and the level masks derived from them.
//! 2. **Error Handling:** Guest-visible traps plus configuration and API errors.
//! 3. **Register Helpers:** Masked writes and bit-field accessors over plain integers.

/// Major interrupt identities and level masks.
pub mod constants;

/// Error types and trap definitions.
pub mod error;

/// Bit-field helpers for CSR storage.
pub mod reg;

pub use constants::irq;
pub use error::{ConfigError, IrqError, Trap};
