//! Simulation utilities.
//!
//! Provides scenario replay: a JSON description of a configuration and a
//! sequence of CSR accesses, hardware line changes and messages, applied to
//! a fresh hart.

/// Scenario loading and replay.
pub mod scenario;
