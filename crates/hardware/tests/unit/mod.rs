//! # Unit Components
//!
//! This module organizes the tests by the part of the interrupt subsystem they
//! exercise. Every test drives a hart through its public interfaces: CSR
//! accesses, hardware lines, messages and trap entry.



/// Trap entry: target selection, vectoring and the nested-vectored protocol.
pub mod dispatch;

/// Guest interrupt files, `hgeip` and the guest external cause.
pub mod guests;





/// JSON scenario replay.
pub mod scenario;

/// Event counters.
pub mod stats;
