//! External interrupt threshold register.
//!
//! In plain mode `eithreshold` is an ordinary register. In nested-vectored
//! mode it becomes the head of a stack of minor identities: every interrupt
//! taken pushes the priority it preempted, and a handler's claim pops it back.
//!
//! The stack is kept as an ordered set because a pop always reveals the lowest
//! stacked identity, not the most recently pushed one. Values above the vector
//! table length are never stacked; the latest one is kept apart as the tail
//! and becomes visible once the stack is empty.

use std::collections::BTreeSet;

/// `eithreshold` of one interrupt file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EiThreshold {
    reg: u32,
    tail: u32,
    stack: BTreeSet<u32>,
    nested: bool,
    limit: u32,
    nv_max: u32,
}

impl EiThreshold {
    /// Creates a threshold register in plain mode.
    ///
    /// # Arguments
    ///
    /// * `limit` - Number of minor identities in the file; writes at or above it are ignored.
    /// * `nv_max` - Highest vector table line; larger values are "over the line".
    pub fn new(limit: u32, nv_max: u32) -> Self {
        Self {
            reg: 0,
            tail: 0,
            stack: BTreeSet::new(),
            nested: false,
            limit,
            nv_max,
        }
    }

    /// Current threshold. 0 lets every identity through.
    pub const fn value(&self) -> u32 {
        self.reg
    }

    /// Value revealed once the stack runs empty.
    pub const fn tail(&self) -> u32 {
        self.tail
    }

    /// Number of stacked thresholds below the current head.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns `true` while the owning level dispatches in nested-vectored mode.
    pub const fn is_nested(&self) -> bool {
        self.nested
    }

    /// Switches between plain and stack behavior.
    ///
    /// Stacked entries survive a mode change so that a handler toggling the
    /// mode does not lose the context it was entered with.
    pub fn set_nested(&mut self, nested: bool) {
        self.nested = nested;
    }

    /// Handles a guest write to `eithreshold`.
    ///
    /// Values at or above the file size are ignored. In nested-vectored mode
    /// 0 pops, an over-the-line value replaces the tail and anything else is
    /// inserted.
    pub fn write(&mut self, value: u32) {
        if value >= self.limit {
            return;
        }
        if !self.nested {
            self.reg = value;
        } else if value == 0 {
            self.pop();
        } else if self.is_tail(value) {
            self.put_tail(value);
        } else {
            self.insert(value);
        }
    }

    /// Raises the threshold to block `minor` and everything below it while
    /// its handler runs. Only acts in nested-vectored mode.
    pub fn update_with_new_irq(&mut self, minor: u32) {
        if !self.nested || minor == 0 {
            return;
        }
        self.insert(minor.min(self.nv_max));
    }

    /// Restores the threshold that was active before the last taken interrupt.
    pub fn mark_handled(&mut self) {
        self.pop();
    }

    const fn is_tail(&self, value: u32) -> bool {
        value > self.nv_max
    }

    const fn is_unstackable(&self) -> bool {
        self.reg == 0 || self.is_tail(self.reg)
    }

    fn insert(&mut self, minor: u32) {
        assert!(
            minor != 0 && minor <= self.nv_max,
            "threshold stack entry {minor} outside 1..={}",
            self.nv_max
        );
        if self.is_unstackable() {
            self.reg = minor;
        } else {
            let _ = self.stack.insert(self.reg);
            self.reg = self.reg.min(minor);
        }
    }

    fn put_tail(&mut self, value: u32) {
        self.tail = value;
        if self.is_unstackable() {
            self.reg = value;
        }
    }

    fn pop(&mut self) {
        self.reg = self.stack.pop_first().unwrap_or(self.tail);
    }
}
