//! Delivery cascade and the recompute closure.
//!
//! In nested-vectored mode a level's local causes never reach the trap path
//! directly. Each 0 -> 1 edge of a major cause is turned into a message for the
//! interrupt file of the level that owns it, using the cause's priority as the
//! minor identity. Delivering that message may raise the file's external line,
//! which is itself a major cause one level up:
//!
//! ```text
//! VS local -> VS file -> VSEI (owned by S) -> S file -> SEI (owned by M) -> M file -> MEI
//!                        SGEI (owned by S) -/
//! ```
//!
//! `settle` repeats edge detection until the pending sets stop changing, so
//! every link in the chain is followed regardless of how many there are.

use tracing::{debug, trace};

use crate::common::IrqError;
use crate::common::constants::MAJOR_IRQ_COUNT;
use crate::common::reg::rising_edge;
use crate::core::arch::mode::IrqLevel;

use super::IrqState;
use super::pending::PendingSet;

/// Upper bound on recompute passes; the longest chain above needs five.
const MAX_SETTLE_PASSES: usize = 8;

impl IrqState {
    /// Applies `f` and then runs the full recompute chain.
    ///
    /// Every public mutation goes through here so no caller can observe state
    /// between a raw register change and its consequences.
    pub fn mutate<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let before = self.compute_pending();
        let result = f(self);
        self.settle(before);
        result
    }

    /// Recomputes routing-dependent state and cascades edges until stable.
    ///
    /// # Arguments
    ///
    /// * `before` - Pending sets captured before the mutation.
    ///
    /// # Panics
    ///
    /// Panics if the pending sets keep changing; delivery can only move a
    /// cause up one level per pass, so this indicates corrupted state.
    pub fn settle(&mut self, before: PendingSet) {
        let mut prev = before;
        for _ in 0..MAX_SETTLE_PASSES {
            self.refresh_iprio_presence();
            self.refresh_all_imsics();
            let now = self.compute_pending();
            if now == prev {
                return;
            }
            for iid in 0..MAJOR_IRQ_COUNT {
                self.deliver_pending_to_imsic(&prev, &now, iid);
            }
            prev = now;
        }
        panic!("interrupt cascade did not settle after {MAX_SETTLE_PASSES} passes");
    }

    /// Forwards an edge of `iid` to the interrupt file of its owning level.
    fn deliver_pending_to_imsic(&mut self, prev: &PendingSet, now: &PendingSet, iid: u32) {
        let Some(owner) = now.owner(iid) else {
            return;
        };
        if !rising_edge(prev.get(owner), now.get(owner), iid) {
            return;
        }
        if iid == owner.external_irq() || !self.nested(owner) {
            return;
        }
        let Some(guest) = (match owner {
            IrqLevel::VirtualSupervisor => self.current_guest(),
            _ => Some(0),
        }) else {
            return;
        };

        let minor = u32::from(self.get_iprio(owner, iid));
        debug!(iid, level = %owner, minor, "cascade major interrupt into interrupt file");
        if minor != 0 {
            self.stats.msi_cascade += 1;
            self.write_minor(owner, guest, minor);
        }
    }

    /// Sets `minor` pending in a file without recomputing anything else.
    fn write_minor(&mut self, level: IrqLevel, guest: usize, minor: u32) {
        let file = match level {
            IrqLevel::Machine => &mut self.imsic_m,
            IrqLevel::Supervisor => &mut self.imsic_s,
            IrqLevel::VirtualSupervisor => &mut self.imsic_vs[guest],
        };
        file.set_pending(minor, true);
        self.refresh_imsic(level);
    }

    /// Delivers a message-signaled interrupt to an interrupt file.
    ///
    /// # Arguments
    ///
    /// * `level` - Target file level.
    /// * `guest` - 0-based guest file index, used only for VS.
    /// * `minor` - Minor identity; 0 is ignored.
    ///
    /// # Errors
    ///
    /// `MinorIdOutOfRange` for identities beyond the file, `GuestOutOfRange`
    /// for a VS guest index beyond the configured files.
    pub fn route_imsic_write(
        &mut self,
        level: IrqLevel,
        guest: usize,
        minor: u32,
    ) -> Result<(), IrqError> {
        if minor >= self.limits.imsic_max_irqs {
            return Err(IrqError::MinorIdOutOfRange {
                id: minor,
                limit: self.limits.imsic_max_irqs,
            });
        }
        if level == IrqLevel::VirtualSupervisor && guest >= self.limits.max_guest {
            return Err(IrqError::GuestOutOfRange {
                index: guest,
                count: self.limits.max_guest,
            });
        }
        trace!(level = %level, guest, minor, "msi write");
        if minor != 0 {
            self.mutate(|s| s.write_minor(level, guest, minor));
        }
        Ok(())
    }

    /// Drives hardware line `iid` and recomputes.
    pub fn clint_hw_irq_route(&mut self, iid: u32, set: bool) {
        trace!(iid, set, "hardware pending line");
        self.mutate(|s| s.set_hw_pending(iid, set));
    }

    /// Handles a write to `xtopei`.
    ///
    /// A write-only access of 0 in nested-vectored mode pops the threshold
    /// stack; anything else clears the current top identity.
    pub fn claim_topei(&mut self, level: IrqLevel, value: u64, write_only: bool) {
        let pop = self.nested(level) && value == 0 && write_only;
        self.mutate(|s| {
            let top = s.file_top(level);
            if let Some(file) = s.file_mut(level) {
                file.claim(pop);
            }
            if pop {
                s.stats.threshold_pops += 1;
            }
            trace!(level = %level, top, pop, "claim through topei");
        });
    }

    /// Pushes the threshold and claims the top identity when an interrupt is
    /// taken at a nested-vectored level.
    pub fn notify_irq_taken(&mut self, level: IrqLevel) {
        if !self.nested(level) {
            return;
        }
        if level == IrqLevel::Supervisor && self.is_injected(level, level.external_irq()) {
            return;
        }
        self.mutate(|s| {
            if let Some(file) = s.file_mut(level) {
                let top = file.status().top;
                file.threshold.update_with_new_irq(top);
                file.claim(false);
            }
        });
    }

    /// Vector table line of an interrupt taken at nested-vectored `level`.
    ///
    /// The line is the top minor identity, capped to the table length. An
    /// injected external cause (no file behind it) uses the last line.
    pub fn nv_line(&self, level: IrqLevel) -> u32 {
        let injected =
            level == IrqLevel::Supervisor && self.is_injected(level, level.external_irq());
        let top = if injected { 0 } else { self.file_top(level) };
        match top {
            0 => self.limits.nv_max_vector,
            top => top.min(self.limits.nv_max_vector),
        }
    }
}
