//! Guest interrupt file selection and aggregation.
//!
//! `hstatus.VGEIN` connects one guest file to the VS level. Every guest file,
//! connected or not, reports into `hgeip`; the Supervisor guest external cause
//! (SGEI) is pending whenever an enabled guest file asserts.

use tracing::debug;

use crate::common::irq;
use crate::common::reg::{bit, genmask, write_masked};
use crate::config::ExternalDelivery;
use crate::core::arch::csr::hstatus;
use crate::core::arch::mode::IrqLevel;
use crate::core::arch::trap::TrapVectorMode;

use super::IrqState;

impl IrqState {
    /// Bits of `hgeie`/`hgeip` backed by a guest file (1-based, like VGEIN).
    pub fn guest_mask(&self) -> u64 {
        genmask(self.limits.max_guest as u32, 1)
    }

    /// Reads `hstatus`.
    pub const fn hstatus_read(&self) -> u64 {
        self.hstatus | hstatus::VSXL_64
    }

    /// Writes `hstatus` and runs the guest switch hook.
    ///
    /// VGEIN values above the number of guest files are clamped to the last
    /// file. The hook runs on every write so a rewrite of the same value
    /// resynchronizes the VS file state.
    pub fn hstatus_write(&mut self, value: u64) {
        let old_vgein = self.vgein();
        write_masked(&mut self.hstatus, hstatus::MASK, value);
        let vgein = self.vgein().min(self.limits.max_guest);
        self.hstatus = hstatus::with_vgein(self.hstatus, vgein);

        if vgein != old_vgein {
            self.stats.guest_switches += 1;
            debug!(from = old_vgein, to = vgein, "guest interrupt file switch");
        }
        self.update_interrupt_mode(IrqLevel::VirtualSupervisor);
        self.refresh_guests();
    }

    /// Reads `hgeie`.
    pub const fn hgeie_read(&self) -> u64 {
        self.hgeie
    }

    /// Writes `hgeie`; SGEI follows on the next refresh.
    pub fn hgeie_write(&mut self, value: u64) {
        let mask = self.guest_mask();
        write_masked(&mut self.hgeie, mask, value);
        self.refresh_guests();
    }

    /// Reads `hgeip`.
    pub const fn hgeip_read(&self) -> u64 {
        self.hgeip
    }

    /// Reads `xtvec` of `level`.
    pub const fn tvec_read(&self, level: IrqLevel) -> u64 {
        self.tvec[level.index()]
    }

    /// Writes `xtvec` of `level`; mode 2 is legalized to nested-vectored.
    pub fn tvec_write(&mut self, level: IrqLevel, value: u64) {
        self.tvec[level.index()] = TrapVectorMode::legalize(value);
        self.update_interrupt_mode(level);
    }

    /// Propagates `level`'s vector mode into its threshold register.
    ///
    /// For VS only the connected guest file follows; the others keep the
    /// mode they had when last connected.
    pub fn update_interrupt_mode(&mut self, level: IrqLevel) {
        let nested = self.nested(level);
        if let Some(file) = self.file_mut(level) {
            file.threshold.set_nested(nested);
        }
    }

    /// Re-evaluates every guest file: `hgeip`, SGEI, and VSEI plus `vstopei`
    /// for the connected one.
    pub fn refresh_guests(&mut self) {
        self.hgeip = self
            .imsic_vs
            .iter()
            .enumerate()
            .filter(|(_, file)| file.status().asserted)
            .fold(0, |acc, (i, _)| acc | bit(i as u32 + 1));

        let sgei = self.hgeip & self.hgeie != 0;
        self.set_hw_pending(irq::SGEI, sgei);

        let vsei = self
            .file(IrqLevel::VirtualSupervisor)
            .is_some_and(|file| file.status().asserted);
        self.set_hw_pending(irq::VSEI, vsei);
    }

    /// Re-evaluates the interrupt file of `level` and drives its line.
    ///
    /// Under wire delivery the Machine and Supervisor files keep their
    /// state but no longer own MEIP/SEIP.
    pub fn refresh_imsic(&mut self, level: IrqLevel) {
        match level {
            IrqLevel::VirtualSupervisor => self.refresh_guests(),
            _ if self.limits.delivery == ExternalDelivery::Wire => {}
            _ => {
                let asserted = self.file(level).is_some_and(|f| f.status().asserted);
                self.set_hw_pending(level.external_irq(), asserted);
            }
        }
    }

    /// Re-evaluates every interrupt file.
    pub fn refresh_all_imsics(&mut self) {
        for level in IrqLevel::ALL {
            self.refresh_imsic(level);
        }
    }
}
