//! IMSIC interrupt file.
//!
//! This module emulates one message-signaled interrupt file. It provides:
//! 1. **Storage:** `eip`/`eie` bit vectors over the minor identity space, the
//!    `eidelivery` gate and the `eithreshold` register.
//! 2. **Evaluation:** Whether the file asserts its level's external line and
//!    which minor identity is on top.
//! 3. **Claims:** Clearing the top identity or popping the threshold stack.
//!
//! Identity 0 does not exist: it never reads back as pending or enabled and
//! writes to it are dropped.

use super::threshold::EiThreshold;
use crate::common::reg::bit;

/// Result of evaluating a file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImsicStatus {
    /// The file drives its level's external interrupt line.
    pub asserted: bool,
    /// Minor identity reported through `xtopei` (0 = none).
    pub top: u32,
}

/// One interrupt file (Machine, Supervisor or one guest).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImsicFile {
    delivery: bool,
    /// Threshold register, plain or stacked.
    pub threshold: EiThreshold,
    eip: Vec<u64>,
    eie: Vec<u64>,
    limit: u32,
}

impl ImsicFile {
    /// Creates an empty file with delivery disabled.
    ///
    /// # Arguments
    ///
    /// * `limit` - Number of minor identities (multiple of 64).
    /// * `nv_max` - Highest nested-vectored table line.
    pub fn new(limit: u32, nv_max: u32) -> Self {
        let words = (limit / 64) as usize;
        Self {
            delivery: false,
            threshold: EiThreshold::new(limit, nv_max),
            eip: vec![0; words],
            eie: vec![0; words],
            limit,
        }
    }

    /// Number of minor identities the file holds.
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of 64-bit `eip`/`eie` words.
    pub fn words(&self) -> usize {
        self.eip.len()
    }

    /// Returns `true` when the delivery gate is open.
    pub const fn delivery(&self) -> bool {
        self.delivery
    }

    /// Reads `eidelivery`.
    pub const fn read_delivery(&self) -> u64 {
        self.delivery as u64
    }

    /// Writes `eidelivery`; only bit 0 is implemented.
    pub fn write_delivery(&mut self, value: u64) {
        self.delivery = value & 1 != 0;
    }

    /// Sets or clears the pending bit of `minor`.
    ///
    /// Identity 0 is silently ignored. Identities beyond the file size are an
    /// internal error.
    pub fn set_pending(&mut self, minor: u32, set: bool) {
        assert!(
            minor < self.limit,
            "minor interrupt id {minor} outside file of {}",
            self.limit
        );
        if minor == 0 {
            return;
        }
        let word = &mut self.eip[(minor / 64) as usize];
        if set {
            *word |= bit(minor % 64);
        } else {
            *word &= !bit(minor % 64);
        }
    }

    /// Returns `true` if `minor` is pending.
    pub fn is_pending(&self, minor: u32) -> bool {
        minor < self.limit && self.eip[(minor / 64) as usize] & bit(minor % 64) != 0
    }

    /// Returns `true` if `minor` is enabled.
    pub fn is_enabled(&self, minor: u32) -> bool {
        minor < self.limit && self.eie[(minor / 64) as usize] & bit(minor % 64) != 0
    }

    /// Reads `eip` word `index`.
    pub fn read_eip(&self, index: usize) -> u64 {
        self.eip[index]
    }

    /// Writes `eip` word `index`.
    pub fn write_eip(&mut self, index: usize, value: u64) {
        self.eip[index] = Self::drop_reserved(index, value);
    }

    /// Reads `eie` word `index`.
    pub fn read_eie(&self, index: usize) -> u64 {
        self.eie[index]
    }

    /// Writes `eie` word `index`.
    pub fn write_eie(&mut self, index: usize, value: u64) {
        self.eie[index] = Self::drop_reserved(index, value);
    }

    const fn drop_reserved(index: usize, value: u64) -> u64 {
        if index == 0 { value & !1 } else { value }
    }

    /// Evaluates the file.
    ///
    /// The candidate is the lowest identity both pending and enabled. It
    /// asserts the line when below the threshold (0 = no threshold). In
    /// nested-vectored mode the candidate is reported as top even when the
    /// threshold blocks it, so the dispatcher can still locate its vector.
    pub fn status(&self) -> ImsicStatus {
        if !self.delivery {
            return ImsicStatus::default();
        }
        let threshold = match self.threshold.value() {
            0 => self.limit,
            t => t,
        };
        let candidate = self
            .eip
            .iter()
            .zip(&self.eie)
            .enumerate()
            .find_map(|(i, (p, e))| {
                let active = p & e;
                (active != 0).then(|| i as u32 * 64 + active.trailing_zeros())
            });
        match candidate {
            Some(top) if top < threshold => ImsicStatus { asserted: true, top },
            Some(top) if self.threshold.is_nested() => ImsicStatus {
                asserted: false,
                top,
            },
            _ => ImsicStatus::default(),
        }
    }

    /// Claims the current top identity.
    ///
    /// # Arguments
    ///
    /// * `pop_threshold` - Pop the threshold stack instead of clearing the pending bit.
    pub fn claim(&mut self, pop_threshold: bool) {
        if pop_threshold {
            self.threshold.mark_handled();
        } else {
            let top = self.status().top;
            self.set_pending(top, false);
        }
    }
}
