//! IMSIC interrupt-file pages.
//!
//! Each interrupt file of a hart owns one 4 KiB page. A 32-bit write to the
//! start of a page (`seteipnum_le`) delivers the written minor identity to that
//! file. Everything else in the region reads as zero and ignores writes.
//!
//! # Memory Map
//!
//! * `0x0000`: Machine file
//! * `0x1000`: Supervisor file
//! * `0x2000 + 0x1000 * g`: Guest file `g`
//!
//! Writes are queued on the device and handed to the hart with
//! `deliver_into`, so the device never holds a reference to the hart.

use std::collections::VecDeque;

use tracing::{trace, warn};

use crate::common::constants::{IMSIC_PAGE_SIZE, MSI_VALUE_MASK};
use crate::config::AiaConfig;
use crate::core::Hart;
use crate::core::arch::mode::IrqLevel;
use crate::soc::devices::Device;

/// A message decoded from a page write, not yet delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MsiWrite {
    /// Target file level.
    pub level: IrqLevel,
    /// Guest index for VS, 0 otherwise.
    pub guest: usize,
    /// Minor identity.
    pub minor: u32,
}

/// MMIO front-end of one hart's interrupt files.
#[derive(Debug)]
pub struct ImsicMmio {
    base_addr: u64,
    pages: u64,
    limit: u32,
    queue: VecDeque<MsiWrite>,
}

impl ImsicMmio {
    /// Creates the page region for a hart built from `config`.
    pub fn new(config: &AiaConfig) -> Self {
        Self {
            base_addr: config.imsic_base,
            pages: 2 + config.max_guest as u64,
            limit: config.imsic_max_irqs,
            queue: VecDeque::new(),
        }
    }

    fn page_target(&self, page: u64) -> (IrqLevel, usize) {
        match page {
            0 => (IrqLevel::Machine, 0),
            1 => (IrqLevel::Supervisor, 0),
            g => (IrqLevel::VirtualSupervisor, (g - 2) as usize),
        }
    }

    /// Messages waiting for delivery.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Delivers every queued message to `hart`.
    ///
    /// # Returns
    ///
    /// Number of messages the hart accepted.
    pub fn deliver_into(&mut self, hart: &mut Hart) -> usize {
        let mut delivered = 0;
        while let Some(msg) = self.queue.pop_front() {
            match hart.route_imsic_write(msg.level, msg.guest, msg.minor) {
                Ok(()) => {
                    hart.irq.stats.msi_mmio += 1;
                    delivered += 1;
                }
                Err(err) => warn!(?msg, %err, "imsic write dropped"),
            }
        }
        delivered
    }
}

impl Device for ImsicMmio {
    fn name(&self) -> &str {
        "IMSIC"
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, IMSIC_PAGE_SIZE * self.pages)
    }

    /// `seteipnum` reads as zero, as does the rest of every page.
    fn read_u32(&mut self, _offset: u64) -> u32 {
        0
    }

    fn read_u64(&mut self, _offset: u64) -> u64 {
        0
    }

    fn write_u32(&mut self, offset: u64, val: u32) {
        let page = offset / IMSIC_PAGE_SIZE;
        if offset % IMSIC_PAGE_SIZE != 0 || page >= self.pages {
            warn!(offset = format_args!("{offset:#x}"), "imsic write ignored");
            return;
        }
        let minor = val & MSI_VALUE_MASK;
        if minor >= self.limit {
            warn!(minor, limit = self.limit, "imsic write beyond file size ignored");
            return;
        }
        let (level, guest) = self.page_target(page);
        trace!(level = %level, guest, minor, "imsic page write");
        self.queue.push_back(MsiWrite {
            level,
            guest,
            minor,
        });
    }

    /// Only the low word reaches `seteipnum_le`.
    fn write_u64(&mut self, offset: u64, val: u64) {
        self.write_u32(offset, val as u32);
    }
}
