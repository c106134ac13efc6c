//! Core interrupt implementation.
//!
//! This module contains the architectural definitions, the interrupt state
//! machine of one hart, and the hart front-end that gates CSR access to it.

/// Architecture-specific components (CSR addresses, privilege modes, trap vectors).
pub mod arch;

/// Hart front-end: CSR dispatch, hardware lines and trap entry.
pub mod hart;

/// Interrupt routing, arbitration, interrupt files and the delivery cascade.
pub mod irq;

pub use self::hart::Hart;
pub use self::irq::IrqState;
