//! Device trait for memory-mapped I/O.
//!
//! This module defines the `Device` trait implemented by bus-attached components. It provides:
//! 1. **Identification:** `name` and `address_range` for bus routing.
//! 2. **Access:** Word and doubleword read/write at device-relative offsets.
//!
//! Narrower accesses are not modeled; the interrupt-file pages only accept
//! naturally aligned 32-bit writes.

/// Trait for memory-mapped I/O devices attached to the system bus.
pub trait Device {
    /// Returns a short name for this device (e.g., `"IMSIC"`).
    fn name(&self) -> &str;
    /// Returns (base_address, size_in_bytes) for this device's MMIO region.
    fn address_range(&self) -> (u64, u64);
    /// Reads four bytes (little-endian) at the given offset.
    fn read_u32(&mut self, offset: u64) -> u32;
    /// Reads eight bytes (little-endian) at the given offset.
    fn read_u64(&mut self, offset: u64) -> u64;
    /// Writes four bytes (little-endian) at the given offset.
    fn write_u32(&mut self, offset: u64, val: u32);
    /// Writes eight bytes (little-endian) at the given offset.
    fn write_u64(&mut self, offset: u64, val: u64);

    /// Returns `true` if `paddr` falls inside this device's region.
    fn contains(&self, paddr: u64) -> bool {
        let (start, size) = self.address_range();
        paddr >= start && paddr - start < size
    }
}
