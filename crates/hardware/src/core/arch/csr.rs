//! Interrupt Control and Status Register definitions.
//!
//! This module defines the CSR space the interrupt subsystem owns or gates. It provides:
//! 1. **Address Definitions:** Constants for the M, S, HS and VS interrupt CSRs.
//! 2. **Indirect Registers:** Register numbers reachable through the `xiselect`/`xireg` windows.
//! 3. **Field Layouts:** Accessors for `hvictl`, `hstatus`, `xtopi`, `xtopei` and `xenvcfg`.
//! 4. **Address Classification:** Privilege level and read-only bits encoded in an address.

use crate::common::reg::{bit, field, genmask, with_field};

/// Supervisor interrupt enable register CSR address.
pub const SIE: u32 = 0x104;

/// Supervisor trap vector base address register CSR address.
pub const STVEC: u32 = 0x105;

/// Supervisor interrupt pending register CSR address.
pub const SIP: u32 = 0x144;

/// Supervisor timer compare register CSR address.
pub const STIMECMP: u32 = 0x14D;

/// Supervisor indirect register select CSR address.
pub const SISELECT: u32 = 0x150;

/// Supervisor indirect register alias CSR address.
pub const SIREG: u32 = 0x151;

/// Supervisor top external interrupt CSR address.
pub const STOPEI: u32 = 0x15C;

/// Virtual supervisor interrupt enable register CSR address.
pub const VSIE: u32 = 0x204;

/// Virtual supervisor trap vector base address register CSR address.
pub const VSTVEC: u32 = 0x205;

/// Virtual supervisor interrupt pending register CSR address.
pub const VSIP: u32 = 0x244;

/// Virtual supervisor timer compare register CSR address.
pub const VSTIMECMP: u32 = 0x24D;

/// Virtual supervisor indirect register select CSR address.
pub const VSISELECT: u32 = 0x250;

/// Virtual supervisor indirect register alias CSR address.
pub const VSIREG: u32 = 0x251;

/// Virtual supervisor top external interrupt CSR address.
pub const VSTOPEI: u32 = 0x25C;

/// Machine interrupt delegation register CSR address.
pub const MIDELEG: u32 = 0x303;

/// Machine interrupt enable register CSR address.
pub const MIE: u32 = 0x304;

/// Machine trap vector base address register CSR address.
pub const MTVEC: u32 = 0x305;

/// Machine virtual interrupt enable register CSR address.
pub const MVIEN: u32 = 0x308;

/// Machine virtual interrupt pending register CSR address.
pub const MVIP: u32 = 0x309;

/// Machine environment configuration register CSR address.
pub const MENVCFG: u32 = 0x30A;

/// Machine interrupt pending register CSR address.
pub const MIP: u32 = 0x344;

/// Machine indirect register select CSR address.
pub const MISELECT: u32 = 0x350;

/// Machine indirect register alias CSR address.
pub const MIREG: u32 = 0x351;

/// Machine top external interrupt CSR address.
pub const MTOPEI: u32 = 0x35C;

/// Hypervisor status register CSR address.
pub const HSTATUS: u32 = 0x600;

/// Hypervisor interrupt delegation register CSR address.
pub const HIDELEG: u32 = 0x603;

/// Hypervisor interrupt enable register CSR address.
pub const HIE: u32 = 0x604;

/// Hypervisor guest external interrupt enable register CSR address.
pub const HGEIE: u32 = 0x607;

/// Hypervisor virtual interrupt enable register CSR address.
pub const HVIEN: u32 = 0x608;

/// Hypervisor virtual interrupt control register CSR address.
pub const HVICTL: u32 = 0x609;

/// Hypervisor environment configuration register CSR address.
pub const HENVCFG: u32 = 0x60A;

/// Hypervisor interrupt pending register CSR address.
pub const HIP: u32 = 0x644;

/// Hypervisor virtual interrupt pending register CSR address.
pub const HVIP: u32 = 0x645;

/// Hypervisor VS priority register 1 CSR address.
pub const HVIPRIO1: u32 = 0x646;

/// Hypervisor VS priority register 2 CSR address.
pub const HVIPRIO2: u32 = 0x647;

/// Supervisor top interrupt CSR address.
pub const STOPI: u32 = 0xDB0;

/// Hypervisor guest external interrupt pending register CSR address.
pub const HGEIP: u32 = 0xE12;

/// Virtual supervisor top interrupt CSR address.
pub const VSTOPI: u32 = 0xEB0;

/// Machine top interrupt CSR address.
pub const MTOPI: u32 = 0xFB0;

/// Offsets of the `xireg`, `xireg2`..`xireg6` windows from `xireg`.
///
/// `xireg4` starts past the address RV32 uses for the `xiph` high half.
pub const IREG_WINDOWS: [u32; 6] = [0, 1, 2, 4, 5, 6];

/// Mask applied to values written to `xiselect`.
pub const ISELECT_MASK: u64 = 0xFFF;

/// Bits [9:8] of a CSR address: the lowest privilege level allowed to access it.
pub const ADDR_LEVEL_SHIFT: u32 = 8;

/// Returns the privilege field (bits [9:8]) of a CSR address.
///
/// 0 = user, 1 = supervisor, 2 = hypervisor/VS, 3 = machine.
pub const fn addr_level(addr: u32) -> u32 {
    (addr >> ADDR_LEVEL_SHIFT) & 3
}

/// Returns `true` for read-only CSR addresses (bits [11:10] == 3).
pub const fn addr_read_only(addr: u32) -> bool {
    (addr >> 10) & 3 == 3
}

/// Redirects an S-level address to its VS counterpart (`0x1xx` -> `0x2xx`).
pub const fn s_to_vs_addr(addr: u32) -> u32 {
    (addr & !(3 << ADDR_LEVEL_SHIFT)) | (2 << ADDR_LEVEL_SHIFT)
}

/// Indirect register numbers reachable through `xiselect`.
pub mod indirect {
    /// First major-interrupt priority register (`iprio0`).
    pub const IPRIO0: u64 = 0x30;
    /// Last major-interrupt priority register (`iprio15`, odd ones absent on RV64).
    pub const IPRIO15: u64 = 0x3F;
    /// Number of priorities packed into one RV64 `iprio` register.
    pub const PRIOS_PER_REG: u32 = 8;
    /// Interrupt delivery enable.
    pub const EIDELIVERY: u64 = 0x70;
    /// Interrupt enable threshold.
    pub const EITHRESHOLD: u64 = 0x72;
    /// First external interrupt-pending register.
    pub const EIP0: u64 = 0x80;
    /// First external interrupt-enable register.
    pub const EIE0: u64 = 0xC0;
    /// Last indirect register that belongs to the interrupt file.
    pub const IMSIC_LAST: u64 = 0xFF;
}

/// `hvictl` field layout.
pub mod hvictl {
    use super::{bit, field, genmask};

    /// Bits that hold state.
    pub const MASK: u64 = genmask(7, 0) | bit(8) | bit(9) | genmask(23, 16) | bit(30);

    /// Priority of the injected interrupt.
    pub const fn iprio(reg: u64) -> u8 {
        field(reg, 0, 8) as u8
    }

    /// Priority mode: 1 reports `IPRIO` in `vstopi`, 0 reports 1.
    pub const fn ipriom(reg: u64) -> bool {
        reg & bit(8) != 0
    }

    /// Default priority rank: 0 ranks the injected cause above `SEI`, 1 below.
    pub const fn dpr(reg: u64) -> bool {
        reg & bit(9) != 0
    }

    /// Supervisor-numbered identity of the injected cause.
    pub const fn iid(reg: u64) -> u32 {
        field(reg, 16, 12) as u32
    }

    /// Virtual trap interrupt control.
    pub const fn vti(reg: u64) -> bool {
        reg & bit(30) != 0
    }
}

/// `hstatus` field layout.
pub mod hstatus {
    use super::{field, genmask, with_field};

    /// Writable bits (VSBE..VTSR, with VGEIN at 17:12).
    pub const MASK: u64 = genmask(9, 5) | genmask(17, 12) | genmask(22, 20);

    /// VSXL field reported on reads (64-bit VS mode).
    pub const VSXL_64: u64 = 2 << 32;

    /// Shift of the VGEIN field.
    pub const VGEIN_SHIFT: u32 = 12;

    /// Width of the VGEIN field.
    pub const VGEIN_WIDTH: u32 = 6;

    /// Selected guest interrupt file (0 = none).
    pub const fn vgein(reg: u64) -> usize {
        field(reg, VGEIN_SHIFT, VGEIN_WIDTH) as usize
    }

    /// Returns `reg` with VGEIN replaced.
    pub const fn with_vgein(reg: u64, vgein: usize) -> u64 {
        with_field(reg, VGEIN_SHIFT, VGEIN_WIDTH, vgein as u64)
    }
}

/// `mtopi`/`stopi`/`vstopi` layout.
pub mod topi {
    use super::field;

    /// Encodes a top-interrupt register value.
    pub const fn encode(iid: u32, iprio: u8) -> u64 {
        ((iid as u64) << 16) | iprio as u64
    }

    /// Major identity field.
    pub const fn iid(reg: u64) -> u32 {
        field(reg, 16, 12) as u32
    }

    /// Priority field.
    pub const fn iprio(reg: u64) -> u8 {
        field(reg, 0, 8) as u8
    }
}

/// `mtopei`/`stopei`/`vstopei` layout.
pub mod topei {
    use super::field;

    /// Encodes a top-external register value; priority equals identity.
    pub const fn encode(eiid: u32) -> u64 {
        ((eiid as u64) << 16) | eiid as u64
    }

    /// Minor identity field.
    pub const fn iid(reg: u64) -> u32 {
        field(reg, 16, 11) as u32
    }
}

/// `menvcfg`/`henvcfg` layout.
pub mod envcfg {
    use super::bit;

    /// Sstc enable.
    pub const STCE: u64 = bit(63);

    /// Svpbmt enable.
    pub const PBMTE: u64 = bit(62);

    /// Writable bits: FIOM, CBIE, CBCFE, CBZE, PBMTE and STCE.
    pub const MASK: u64 = 0b11_1111_0001 | PBMTE | STCE;
}
