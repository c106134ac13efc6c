//! Trap-vector modes and interrupt cause encoding.
//!
//! This module interprets the mode field of `mtvec`/`stvec`/`vstvec` and encodes
//! interrupt causes. It performs the following:
//! 1. **Mode Decoding:** Direct, vectored and nested-vectored dispatch, with WARL legalization.
//! 2. **Vector Addressing:** Handler and table-entry addresses for each mode.
//! 3. **Cause Encoding:** `xcause` values for interrupts.

use crate::common::constants::CAUSE_INTERRUPT_BIT;

/// Width of one entry in a vectored or nested-vectored table.
pub const VECTOR_ENTRY_SIZE: u64 = 4;

/// Dispatch mode selected by the low two bits of `xtvec`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapVectorMode {
    /// All traps jump to `BASE`.
    Direct = 0,
    /// Interrupts jump to `BASE + 4 * cause`.
    Vectored = 1,
    /// Traps fetch their handler address from an indirect vector table at `BASE`.
    NestedVectored = 3,
}

impl TrapVectorMode {
    /// Decodes the mode field of an `xtvec` value.
    pub const fn from_tvec(tvec: u64) -> Self {
        match tvec & 3 {
            0 => Self::Direct,
            1 => Self::Vectored,
            _ => Self::NestedVectored,
        }
    }

    /// Legalizes a value written to `xtvec`: the reserved mode 2 becomes
    /// nested-vectored.
    pub const fn legalize(value: u64) -> u64 {
        (value & !3) | Self::from_tvec(value) as u64
    }
}

/// Returns the `BASE` field of an `xtvec` value.
pub const fn tvec_base(tvec: u64) -> u64 {
    tvec & !3
}

/// Encodes an interrupt cause for `xcause`.
pub const fn interrupt_cause(iid: u32) -> u64 {
    CAUSE_INTERRUPT_BIT | iid as u64
}
