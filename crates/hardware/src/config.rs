//! Configuration system for the interrupt subsystem.
//!
//! This module defines the structures used to parameterize a hart's interrupt
//! state. It provides:
//! 1. **Defaults:** Baseline sizes for the guest files, minor identity space and vector table.
//! 2. **Structures:** General (tracing) and AIA (files, delivery) configuration.
//! 3. **Enums:** The external interrupt delivery path.
//! 4. **Loading:** JSON parsing from strings or files, followed by validation.
//!
//! Every field is optional in JSON; missing fields take the values in `defaults`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::ConfigError;
use crate::common::constants::{IMSIC_PAGE_SIZE, MINOR_IRQ_LIMIT};

/// Default configuration constants.
mod defaults {
    /// Number of guest interrupt files (selectable through `hstatus.VGEIN`).
    pub const MAX_GUEST: usize = 8;

    /// Number of minor identities per interrupt file, including reserved 0.
    pub const IMSIC_MAX_IRQS: u32 = 2048;

    /// Number of lines in a nested-vectored indirect vector table minus one.
    ///
    /// Thresholds above this value are "over the line" and become the
    /// threshold-stack tail.
    pub const NV_MAX_VECTOR: u32 = 255;

    /// Physical base of the interrupt-file MMIO pages.
    pub const IMSIC_BASE: u64 = 0x2800_0000;
}

/// How MEIP and SEIP are driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum ExternalDelivery {
    /// Message-signaled delivery through the Machine and Supervisor interrupt files.
    #[default]
    #[serde(alias = "MSI")]
    Msi,
    /// Legacy wire gateway; the interrupt files no longer drive MEIP/SEIP.
    Wire,
}

/// Root configuration.
///
/// # Example
///
/// ```
/// use rvsim_aia::config::{Config, ExternalDelivery};
///
/// let json = r#"{
///     "general": { "trace_csr_access": true },
///     "aia": { "max_guest": 4, "external_delivery": "Msi" }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.aia.max_guest, 4);
/// assert_eq!(config.aia.imsic_max_irqs, 2048);
/// assert_eq!(config.aia.external_delivery, ExternalDelivery::Msi);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Interrupt file and delivery settings
    #[serde(default)]
    pub aia: AiaConfig,
}

impl Config {
    /// Parses and validates a configuration from a JSON string.
    ///
    /// # Arguments
    ///
    /// * `json` - JSON text; missing fields take their defaults.
    ///
    /// # Returns
    ///
    /// The validated configuration, or the parse/validation error.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks that every size lies in its supported range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.aia.validate()
    }

    /// Returns `true` when per-access CSR tracing is enabled.
    pub const fn trace(&self) -> bool {
        self.general.trace_csr_access || cfg!(feature = "always-trace")
    }
}

/// General settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Log every CSR access and MSI delivery at `trace` level
    #[serde(default)]
    pub trace_csr_access: bool,
}

/// Interrupt file and delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AiaConfig {
    /// Number of guest interrupt files
    #[serde(default = "AiaConfig::default_max_guest")]
    pub max_guest: usize,

    /// Minor identities per interrupt file (multiple of 64)
    #[serde(default = "AiaConfig::default_imsic_max_irqs")]
    pub imsic_max_irqs: u32,

    /// Highest nested-vectored table line; larger thresholds become the stack tail
    #[serde(default = "AiaConfig::default_nv_max_vector")]
    pub nv_max_vector: u32,

    /// Source of MEIP/SEIP
    #[serde(default)]
    pub external_delivery: ExternalDelivery,

    /// Physical base of the MMIO pages (M, S, then one per guest)
    #[serde(default = "AiaConfig::default_imsic_base")]
    pub imsic_base: u64,
}

impl AiaConfig {
    fn default_max_guest() -> usize {
        defaults::MAX_GUEST
    }

    fn default_imsic_max_irqs() -> u32 {
        defaults::IMSIC_MAX_IRQS
    }

    fn default_nv_max_vector() -> u32 {
        defaults::NV_MAX_VECTOR
    }

    fn default_imsic_base() -> u64 {
        defaults::IMSIC_BASE
    }

    /// Number of 64-bit `eip`/`eie` words per interrupt file.
    pub const fn eip_words(&self) -> usize {
        (self.imsic_max_irqs / 64) as usize
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=63).contains(&self.max_guest) {
            return Err(ConfigError::InvalidGuestCount(self.max_guest));
        }
        if self.imsic_max_irqs < 64
            || self.imsic_max_irqs > MINOR_IRQ_LIMIT
            || self.imsic_max_irqs % 64 != 0
        {
            return Err(ConfigError::InvalidMaxIrqs(self.imsic_max_irqs));
        }
        if self.imsic_base % IMSIC_PAGE_SIZE != 0 {
            return Err(ConfigError::MisalignedBase(self.imsic_base));
        }
        if self.nv_max_vector == 0
            || self.nv_max_vector > 255
            || self.nv_max_vector >= self.imsic_max_irqs
        {
            return Err(ConfigError::InvalidVectorCount(self.nv_max_vector));
        }
        Ok(())
    }
}

impl Default for AiaConfig {
    fn default() -> Self {
        Self {
            max_guest: defaults::MAX_GUEST,
            imsic_max_irqs: defaults::IMSIC_MAX_IRQS,
            nv_max_vector: defaults::NV_MAX_VECTOR,
            external_delivery: ExternalDelivery::default(),
            imsic_base: defaults::IMSIC_BASE,
        }
    }
}
