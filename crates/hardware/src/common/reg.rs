//! Register bit helpers.
//!
//! CSR storage in this crate is plain `u64` values. This module provides the
//! small set of operations every register accessor builds on:
//! 1. **Bits:** `bit` and `genmask` for building masks at compile time.
//! 2. **Masked Writes:** Replacing only the writable bits of a register.
//! 3. **Fields:** Extracting and inserting fixed-width fields.
//! 4. **Edges:** Detecting 0 -> 1 transitions between two snapshots.

/// Returns a mask with only bit `n` set.
#[inline(always)]
pub const fn bit(n: u32) -> u64 {
    1u64 << n
}

/// Returns a mask with bits `lo..=hi` set.
#[inline(always)]
pub const fn genmask(hi: u32, lo: u32) -> u64 {
    (u64::MAX >> (63 - hi)) & (u64::MAX << lo)
}

/// Writes `value` into `reg`, touching only the bits selected by `mask`.
///
/// # Arguments
///
/// * `reg` - Register storage to update.
/// * `mask` - Writable bits.
/// * `value` - New value; bits outside `mask` are ignored.
#[inline(always)]
pub fn write_masked(reg: &mut u64, mask: u64, value: u64) {
    *reg = (*reg & !mask) | (value & mask);
}

/// Extracts a `width`-bit field starting at `shift`.
#[inline(always)]
pub const fn field(reg: u64, shift: u32, width: u32) -> u64 {
    (reg >> shift) & genmask(width - 1, 0)
}

/// Returns `reg` with the `width`-bit field at `shift` replaced by `value`.
#[inline(always)]
pub const fn with_field(reg: u64, shift: u32, width: u32, value: u64) -> u64 {
    let mask = genmask(width - 1, 0) << shift;
    (reg & !mask) | ((value << shift) & mask)
}

/// Returns `true` when bit `n` goes from clear in `old` to set in `new`.
#[inline(always)]
pub const fn rising_edge(old: u64, new: u64, n: u32) -> bool {
    old & bit(n) == 0 && new & bit(n) != 0
}
