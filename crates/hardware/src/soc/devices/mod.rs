//! Memory-Mapped IO Devices.
//!
//! This module contains the devices that feed the interrupt subsystem from
//! the bus, currently the IMSIC interrupt-file pages.

/// IMSIC interrupt-file pages.
pub mod imsic;

pub use imsic::{ImsicMmio, MsiWrite};

pub use crate::soc::traits::Device;
