//! System-on-Chip (SoC) Components.
//!
//! This module holds the memory-mapped side of the interrupt subsystem: the
//! device trait and the interrupt-file pages that turn bus writes into
//! message-signaled interrupts.

/// Memory-mapped I/O device implementations.
pub mod devices;

/// Device trait definitions for MMIO access.
pub mod traits;
