//! Interrupt subsystem statistics collection and reporting.
//!
//! This module counts the events that flow through a hart's interrupt logic. It provides:
//! 1. **Dispatch:** Interrupts taken per level and nested-vectored table fetches.
//! 2. **Messages:** MSIs delivered through MMIO pages and synthesized by the cascade.
//! 3. **Thresholds:** Pops of the nested-vectored threshold stack.
//! 4. **Traps:** Illegal and virtual instruction exceptions raised by CSR accesses.

use serde::Serialize;

use crate::core::arch::mode::IrqLevel;

/// Interrupt statistics of one hart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IrqStats {
    /// Interrupts taken, indexed by `IrqLevel::index()`.
    pub interrupts_taken: [u64; 3],
    /// Trap entries that fetched their handler from an indirect vector table.
    pub nv_dispatches: u64,
    /// Minor identities delivered through the MMIO pages.
    pub msi_mmio: u64,
    /// Minor identities synthesized from major interrupt edges.
    pub msi_cascade: u64,
    /// Threshold stack pops (claims through `xtopei` in nested-vectored mode).
    pub threshold_pops: u64,
    /// Illegal instruction exceptions raised by CSR accesses.
    pub illegal_traps: u64,
    /// Virtual instruction exceptions raised by CSR accesses.
    pub virtual_traps: u64,
    /// Writes to `hstatus` that changed the selected guest file.
    pub guest_switches: u64,
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"dispatch"`, `"messages"`, `"traps"`.
pub const STATS_SECTIONS: &[&str] = &["dispatch", "messages", "traps"];

impl IrqStats {
    /// Records an interrupt taken at `level`.
    pub fn record_taken(&mut self, level: IrqLevel) {
        self.interrupts_taken[level.index()] += 1;
    }

    /// Total interrupts taken across all levels.
    pub fn total_taken(&self) -> u64 {
        self.interrupts_taken.iter().sum()
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// # Arguments
    ///
    /// * `sections` - Slice of section names to print, or empty for all.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let total = self.total_taken().max(1);

        println!("\n==========================================================");
        println!("RISC-V INTERRUPT SUBSYSTEM STATISTICS");
        println!("==========================================================");
        if want("dispatch") {
            println!("DISPATCH");
            for level in IrqLevel::ALL {
                let taken = self.interrupts_taken[level.index()];
                println!(
                    "  irq.taken.{:<12} {} ({:.2}%)",
                    level.name(),
                    taken,
                    (taken as f64 / total as f64) * 100.0
                );
            }
            println!("  irq.nv_dispatch        {}", self.nv_dispatches);
            println!("  irq.threshold_pops     {}", self.threshold_pops);
            println!("  hart.guest_switches    {}", self.guest_switches);
            println!("----------------------------------------------------------");
        }
        if want("messages") {
            println!("MESSAGES");
            println!("  msi.mmio               {}", self.msi_mmio);
            println!("  msi.cascade            {}", self.msi_cascade);
            println!("----------------------------------------------------------");
        }
        if want("traps") {
            println!("CSR TRAPS");
            println!("  trap.illegal           {}", self.illegal_traps);
            println!("  trap.virtual           {}", self.virtual_traps);
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
