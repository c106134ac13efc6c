//! Interrupt subsystem constants.
//!
//! This module defines the fixed numbering of the major interrupt space and the
//! masks that partition it between privilege levels. It provides:
//! 1. **Identities:** The standard major interrupt numbers (software, timer, external, local).
//! 2. **Level Masks:** Which bits belong to Machine, Supervisor, Hypervisor and VS levels.
//! 3. **Limits:** Sizes of the major and minor identity spaces.

use super::reg::bit;

/// Major interrupt identity numbers.
pub mod irq {
    /// Supervisor software interrupt.
    pub const SSI: u32 = 1;
    /// Virtual supervisor software interrupt.
    pub const VSSI: u32 = 2;
    /// Machine software interrupt.
    pub const MSI: u32 = 3;
    /// Supervisor timer interrupt.
    pub const STI: u32 = 5;
    /// Virtual supervisor timer interrupt.
    pub const VSTI: u32 = 6;
    /// Machine timer interrupt.
    pub const MTI: u32 = 7;
    /// Supervisor external interrupt.
    pub const SEI: u32 = 9;
    /// Virtual supervisor external interrupt.
    pub const VSEI: u32 = 10;
    /// Machine external interrupt.
    pub const MEI: u32 = 11;
    /// Supervisor guest external interrupt.
    pub const SGEI: u32 = 12;
    /// Local counter-overflow interrupt.
    pub const LCOF: u32 = 13;
    /// Debug/trace interrupt.
    pub const DEBUG_TRACE: u32 = 17;
    /// Low-priority RAS event.
    pub const LOW_PRIO_RAS: u32 = 35;
    /// Platform watchdog.
    pub const WDT: u32 = 40;
    /// High-priority RAS event.
    pub const HIGH_PRIO_RAS: u32 = 43;
}

/// Number of major interrupt identities.
pub const MAJOR_IRQ_COUNT: u32 = 64;

/// Upper bound of the minor (external) identity space.
pub const MINOR_IRQ_LIMIT: u32 = 2048;

/// Mask applied to a message-signaled write to extract its minor identity.
pub const MSI_VALUE_MASK: u32 = MINOR_IRQ_LIMIT - 1;

/// Size of one interrupt-file page in the MMIO region.
pub const IMSIC_PAGE_SIZE: u64 = 4096;

/// Interrupt bit of the `xcause` registers.
pub const CAUSE_INTERRUPT_BIT: u64 = 1 << 63;

/// Standard supervisor-level causes (SSI, STI, SEI).
pub const S_LEVEL_MASK: u64 = bit(irq::SSI) | bit(irq::STI) | bit(irq::SEI);

/// Standard VS-level causes (VSSI, VSTI, VSEI) in their Machine-numbered slots.
pub const VS_LEVEL_MASK: u64 = bit(irq::VSSI) | bit(irq::VSTI) | bit(irq::VSEI);

/// Causes visible through `hip`/`hie`.
pub const HS_LEVEL_MASK: u64 = VS_LEVEL_MASK | bit(irq::SGEI);

/// Every standard cause `mie`/`mip` implements.
pub const M_LEVEL_MASK: u64 =
    bit(irq::MSI) | bit(irq::MTI) | bit(irq::MEI) | S_LEVEL_MASK | HS_LEVEL_MASK;

/// The first twelve causes, which are level-triggered.
pub const LEVELED_MASK: u64 = (1 << 12) - 1;

/// Edge-triggered local causes that live above the standard twelve.
pub const NON_LEVELED_MASK: u64 = bit(irq::LCOF)
    | bit(irq::DEBUG_TRACE)
    | bit(irq::LOW_PRIO_RAS)
    | bit(irq::HIGH_PRIO_RAS)
    | bit(irq::WDT);

/// Distance between a VS cause and its Supervisor-numbered alias.
pub const VS_TO_S_SHIFT: u32 = 1;
