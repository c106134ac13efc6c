//! Scenario Loading and Replay.
//!
//! This module replays a JSON scenario against a fresh hart. It performs:
//! 1. **Loading:** Parses the configuration, an optional vector-table image and
//!    an ordered list of steps.
//! 2. **Replay:** Applies each step (CSR access, hardware line, message, trap entry)
//!    and records its outcome; traps and API errors are outcomes, not failures.
//! 3. **Reporting:** Collects the final `xtopi`/`xtopei` values and the counters.
//!
//! # Example
//!
//! ```
//! use rvsim_aia::sim::scenario::Scenario;
//!
//! let json = r#"{
//!     "steps": [
//!         { "op": "csr_write", "addr": 772, "value": 128 },
//!         { "op": "timer", "level": "Machine", "status": true },
//!         { "op": "csr_read", "addr": 4016, "expect": 458752 }
//!     ]
//! }"#;
//!
//! let report = Scenario::from_json_str(json).unwrap().run().unwrap();
//! assert_eq!(report.failures, 0);
//! assert_eq!(report.final_state.mtopi, 7 << 16);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::common::{ConfigError, Trap};
use crate::config::Config;
use crate::core::Hart;
use crate::core::arch::mode::{IrqLevel, PrivilegeMode};
use crate::core::hart::GlobalEnables;
use crate::core::hart::trap::{TrapTarget, VectorTableMemory};
use crate::soc::devices::{Device, ImsicMmio};
use crate::stats::IrqStats;

/// Errors raised while loading or starting a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Reading the scenario file failed.
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    /// The scenario is not valid JSON for `Scenario`.
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),

    /// The embedded configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One replay step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Switch privilege mode.
    SetPrivilege {
        /// New mode.
        mode: PrivilegeMode,
    },
    /// Update `mstatus.MIE`/`mstatus.SIE`/`vsstatus.SIE`.
    SetEnables {
        /// `mstatus.MIE`
        #[serde(default)]
        mstatus_mie: bool,
        /// `mstatus.SIE`
        #[serde(default)]
        mstatus_sie: bool,
        /// `vsstatus.SIE`
        #[serde(default)]
        vsstatus_sie: bool,
    },
    /// `csrrw x0, addr, value`.
    CsrWrite {
        /// CSR address.
        addr: u32,
        /// Value written.
        value: u64,
    },
    /// `csrrs rd, addr, x0`, optionally checked.
    CsrRead {
        /// CSR address.
        addr: u32,
        /// Value the read must return.
        #[serde(default)]
        expect: Option<u64>,
    },
    /// `csrrw rd, addr, value`.
    CsrSwap {
        /// CSR address.
        addr: u32,
        /// Value written.
        value: u64,
    },
    /// Message delivered directly to a file.
    MsiWrite {
        /// Target level.
        level: IrqLevel,
        /// Guest index (VS only).
        #[serde(default)]
        guest: usize,
        /// Minor identity.
        minor: u32,
    },
    /// 32-bit write into the MMIO pages, relative to their base.
    MmioWrite {
        /// Offset from the region base.
        offset: u64,
        /// Written word.
        value: u32,
    },
    /// Timer line.
    Timer {
        /// Level of the line.
        level: IrqLevel,
        /// New line state.
        status: bool,
    },
    /// Software line.
    Software {
        /// Level of the line.
        level: IrqLevel,
        /// New line state.
        status: bool,
    },
    /// Wire external line.
    External {
        /// Level of the line.
        level: IrqLevel,
        /// New line state.
        status: bool,
    },
    /// Edge-triggered local cause.
    Local {
        /// Major identity.
        iid: u32,
        /// New line state.
        status: bool,
    },
    /// Take the next interrupt (or the top of `level` when given).
    TakeInterrupt {
        /// Force the target level.
        #[serde(default)]
        level: Option<IrqLevel>,
    },
}

/// A scenario: configuration, vector-table image and steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Scenario {
    /// Hart configuration
    #[serde(default)]
    pub config: Config,
    /// 32-bit words readable by the nested-vectored fetch, keyed by address
    #[serde(default)]
    pub memory: BTreeMap<u64, u32>,
    /// Steps in replay order
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step completed with nothing to report.
    Done,
    /// A CSR read returned `value`.
    Value {
        /// Value read.
        value: u64,
    },
    /// A checked read returned something else.
    Mismatch {
        /// Expected value.
        expected: u64,
        /// Value read.
        actual: u64,
    },
    /// The access raised an exception.
    Trap {
        /// Exception description.
        trap: String,
        /// `xcause` exception code.
        cause: u64,
    },
    /// An API call was rejected.
    Rejected {
        /// Error description.
        error: String,
    },
    /// An interrupt was taken.
    Interrupt {
        /// Level it was taken to.
        level: IrqLevel,
        /// `xcause` value.
        cause: u64,
        /// Address execution continues at.
        handler: Option<u64>,
    },
    /// Nothing was pending.
    NoInterrupt,
}

/// Outcome of one step, with its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Index in the step list.
    pub index: usize,
    /// The step.
    pub step: Step,
    /// What happened.
    pub outcome: StepOutcome,
}

/// Top-interrupt registers after the last step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TopState {
    /// `mtopi`.
    pub mtopi: u64,
    /// `stopi`.
    pub stopi: u64,
    /// `vstopi`.
    pub vstopi: u64,
    /// `mtopei`.
    pub mtopei: u64,
    /// `stopei`.
    pub stopei: u64,
    /// `vstopei`.
    pub vstopei: u64,
}

impl TopState {
    fn capture(hart: &Hart) -> Self {
        Self {
            mtopi: hart.topi(IrqLevel::Machine),
            stopi: hart.topi(IrqLevel::Supervisor),
            vstopi: hart.topi(IrqLevel::VirtualSupervisor),
            mtopei: hart.topei(IrqLevel::Machine),
            stopei: hart.topei(IrqLevel::Supervisor),
            vstopei: hart.topei(IrqLevel::VirtualSupervisor),
        }
    }
}

/// Result of a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    /// Per-step outcomes.
    pub steps: Vec<StepReport>,
    /// Number of checked reads that mismatched.
    pub failures: usize,
    /// Top-interrupt registers after the last step.
    pub final_state: TopState,
    /// Counters after the last step.
    pub stats: IrqStats,
}

/// Vector-table image backed by the scenario's `memory` map.
struct ScenarioMemory<'a>(&'a BTreeMap<u64, u32>);

impl VectorTableMemory for ScenarioMemory<'_> {
    type Error = String;

    fn load_word(&mut self, addr: u64) -> Result<u32, Self::Error> {
        self.0
            .get(&addr)
            .copied()
            .ok_or_else(|| format!("no vector table entry at {addr:#x}"))
    }
}

impl Scenario {
    /// Parses a scenario from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a scenario file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Replays every step against a fresh hart.
    ///
    /// # Errors
    ///
    /// Only an invalid configuration stops a replay; step failures are
    /// recorded in the report.
    pub fn run(&self) -> Result<ScenarioReport, ScenarioError> {
        self.config.validate()?;
        let mut hart = Hart::new(&self.config);
        let mut mmio = ImsicMmio::new(&self.config.aia);
        info!(steps = self.steps.len(), "replaying scenario");

        let mut steps = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            let outcome = self.apply(&mut hart, &mut mmio, step);
            debug!(index, ?step, ?outcome, "scenario step");
            steps.push(StepReport {
                index,
                step: step.clone(),
                outcome,
            });
        }

        let failures = steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Mismatch { .. }))
            .count();
        Ok(ScenarioReport {
            steps,
            failures,
            final_state: TopState::capture(&hart),
            stats: hart.stats().clone(),
        })
    }

    fn apply(&self, hart: &mut Hart, mmio: &mut ImsicMmio, step: &Step) -> StepOutcome {
        let trap = |t: Trap| StepOutcome::Trap {
            trap: t.to_string(),
            cause: t.cause_code(),
        };
        let api = |r: Result<(), crate::common::IrqError>| match r {
            Ok(()) => StepOutcome::Done,
            Err(e) => StepOutcome::Rejected {
                error: e.to_string(),
            },
        };

        match *step {
            Step::SetPrivilege { mode } => {
                hart.set_privilege(mode);
                StepOutcome::Done
            }
            Step::SetEnables {
                mstatus_mie,
                mstatus_sie,
                vsstatus_sie,
            } => {
                hart.set_global_enables(GlobalEnables {
                    mstatus_mie,
                    mstatus_sie,
                    vsstatus_sie,
                });
                StepOutcome::Done
            }
            Step::CsrWrite { addr, value } => {
                hart.csr_write(addr, value).map_or_else(trap, |()| StepOutcome::Done)
            }
            Step::CsrRead { addr, expect } => match hart.csr_read(addr) {
                Err(t) => trap(t),
                Ok(actual) => match expect {
                    Some(expected) if expected != actual => {
                        StepOutcome::Mismatch { expected, actual }
                    }
                    _ => StepOutcome::Value { value: actual },
                },
            },
            Step::CsrSwap { addr, value } => hart
                .csr_swap(addr, value)
                .map_or_else(trap, |value| StepOutcome::Value { value }),
            Step::MsiWrite {
                level,
                guest,
                minor,
            } => api(hart.route_imsic_write(level, guest, minor)),
            Step::MmioWrite { offset, value } => {
                mmio.write_u32(offset, value);
                let _ = mmio.deliver_into(hart);
                StepOutcome::Done
            }
            Step::Timer { level, status } => {
                hart.trigger_timer_interrupt(level, status);
                StepOutcome::Done
            }
            Step::Software { level, status } => api(hart.trigger_software_interrupt(level, status)),
            Step::External { level, status } => api(if status {
                hart.trigger_external_interrupt(level)
            } else {
                hart.clear_external_interrupt(level)
            }),
            Step::Local { iid, status } => api(hart.raise_local_interrupt(iid, status)),
            Step::TakeInterrupt { level } => self.take_interrupt(hart, level),
        }
    }

    fn take_interrupt(&self, hart: &mut Hart, level: Option<IrqLevel>) -> StepOutcome {
        let Some(level) = level.or_else(|| hart.pending_interrupt().map(|p| p.level)) else {
            return StepOutcome::NoInterrupt;
        };
        let Some(entry) = hart.take_interrupt(level) else {
            return StepOutcome::NoInterrupt;
        };
        let handler = match entry.target {
            TrapTarget::Direct(pc) => Some(pc),
            TrapTarget::Indirect(_) => match hart.process_pending_ivt(&mut ScenarioMemory(&self.memory)) {
                Ok(pc) => pc,
                Err(error) => return StepOutcome::Rejected { error },
            },
        };
        StepOutcome::Interrupt {
            level: entry.level,
            cause: entry.cause,
            handler,
        }
    }
}
