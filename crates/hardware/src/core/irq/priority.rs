//! Priority arbitration.
//!
//! Every pending cause gets a key `(priority, rank)`; the smallest key wins.
//! Local causes take their priority from the level's `iprio` table, external
//! causes from the top identity of their interrupt file (or `hvictl` when the
//! VS external cause is injected). Ties fall back to the default order.

use crate::common::irq;
use crate::common::reg::bit;
use crate::core::arch::csr::{hvictl, topei, topi};
use crate::core::arch::mode::IrqLevel;

use super::IrqState;
use super::pending::{PendingSet, s_to_vs, vs_to_s};

/// Priority of an external cause with no interrupt file behind it.
pub const EXTERNAL_PRIO_LOWEST: u16 = 256;

/// Default order of the standard causes, highest first.
const DEFAULT_ORDER: [u32; 11] = [
    irq::MEI,
    irq::MSI,
    irq::MTI,
    irq::SEI,
    irq::SSI,
    irq::STI,
    irq::SGEI,
    irq::VSEI,
    irq::VSSI,
    irq::VSTI,
    irq::LCOF,
];

/// Rank given to an `hvictl`-injected cause with `DPR` clear.
const RANK_INJECTED_HIGH: u8 = 0;

/// Rank given to an `hvictl`-injected cause with `DPR` set.
const RANK_INJECTED_LOW: u8 = u8::MAX;

/// Arbitration key; smaller is more urgent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cprio {
    /// Numeric priority (0..=256).
    pub prio: u16,
    /// Default-order tiebreak.
    pub rank: u8,
}

impl Cprio {
    /// Priority as reported in the `IPRIO` field of `xtopi`.
    pub fn iprio(self) -> u8 {
        self.prio.min(u16::from(u8::MAX)) as u8
    }
}

/// Tiebreak rank of `iid` in the default order.
///
/// Listed causes rank 1..=11; every other identity follows in ascending order.
pub fn default_rank(iid: u32) -> u8 {
    match DEFAULT_ORDER.iter().position(|&i| i == iid) {
        Some(pos) => pos as u8 + 1,
        None => (DEFAULT_ORDER.len() as u32 + 1 + iid) as u8,
    }
}

/// Winner of arbitration at one level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TopInterrupt {
    /// Machine-numbered identity of the winner.
    pub iid: u32,
    /// Winning key.
    pub cprio: Cprio,
}

impl IrqState {
    /// Priority of `iid` in `level`'s table (VS identities looked up in their
    /// Supervisor slot).
    pub fn get_iprio(&self, level: IrqLevel, iid: u32) -> u8 {
        match level {
            IrqLevel::VirtualSupervisor => self.iprio_table(level).get(vs_to_s(iid)),
            _ => self.iprio_table(level).get(iid),
        }
    }

    fn external_cprio(&self, level: IrqLevel) -> Cprio {
        let rank = default_rank(level.external_irq());
        let lowest = Cprio {
            prio: EXTERNAL_PRIO_LOWEST,
            rank,
        };
        let from_file = |top: u32| match top {
            0 => lowest,
            top => Cprio {
                prio: top as u16,
                rank,
            },
        };

        match level {
            IrqLevel::Supervisor if self.is_injected(level, irq::SEI) => lowest,
            IrqLevel::VirtualSupervisor => {
                if self.guest_connected() {
                    from_file(self.file_top(level))
                } else if self.hvictl_external_injected() {
                    Cprio {
                        prio: u16::from(hvictl::iprio(self.hvictl)),
                        rank,
                    }
                } else {
                    lowest
                }
            }
            _ => from_file(self.file_top(level)),
        }
    }

    fn local_cprio(&self, level: IrqLevel, iid: u32) -> Cprio {
        if level == IrqLevel::VirtualSupervisor
            && self.hvictl_local_injected()
            && vs_to_s(iid) == hvictl::iid(self.hvictl)
        {
            return Cprio {
                prio: u16::from(hvictl::iprio(self.hvictl)),
                rank: if hvictl::dpr(self.hvictl) {
                    RANK_INJECTED_LOW
                } else {
                    RANK_INJECTED_HIGH
                },
            };
        }
        Cprio {
            prio: u16::from(self.get_iprio(level, iid)),
            rank: default_rank(iid),
        }
    }

    /// Arbitration key of pending cause `iid` at `level`.
    pub fn cprio(&self, level: IrqLevel, iid: u32) -> Cprio {
        assert!(iid < 64, "major interrupt id {iid} out of range");
        if iid == level.external_irq() {
            self.external_cprio(level)
        } else {
            self.local_cprio(level, iid)
        }
    }

    /// Picks the winner among `pending` causes of `level`.
    pub fn top_interrupt(&self, level: IrqLevel, pending: u64) -> Option<TopInterrupt> {
        (0..64u32)
            .filter(|&iid| pending & bit(iid) != 0)
            .map(|iid| TopInterrupt {
                iid,
                cprio: self.cprio(level, iid),
            })
            .min_by_key(|top| (top.cprio, top.iid))
    }

    /// Winner of `level` among the causes the trap path sees.
    pub fn level_top(&self, level: IrqLevel, pending: &PendingSet) -> Option<TopInterrupt> {
        self.top_interrupt(level, pending.get(level))
    }

    /// Current `mtopi`/`stopi`/`vstopi` value.
    ///
    /// `vstopi` reports its identity Supervisor-numbered and, unless
    /// `hvictl.IPRIOM` is set, a priority of 1.
    pub fn topi(&self, level: IrqLevel) -> u64 {
        let pending = self.effective_pending();
        let Some(top) = self.level_top(level, &pending) else {
            return 0;
        };
        match level {
            IrqLevel::VirtualSupervisor => {
                let iprio = if hvictl::ipriom(self.hvictl) {
                    top.cprio.iprio()
                } else {
                    1
                };
                topi::encode(vs_to_s(top.iid), iprio)
            }
            _ => topi::encode(top.iid, top.cprio.iprio()),
        }
    }

    /// Top minor identity of `level`'s interrupt file (0 when none or disconnected).
    pub fn file_top(&self, level: IrqLevel) -> u32 {
        self.file(level).map_or(0, |f| f.status().top)
    }

    /// Current `mtopei`/`stopei`/`vstopei` value.
    pub fn topei(&self, level: IrqLevel) -> u64 {
        topei::encode(self.file_top(level))
    }

    /// Returns `true` if `iid` can be named by `hvictl.IID` as a VS cause.
    pub const fn hvictl_iid_transformable(iid: u32) -> bool {
        s_to_vs(iid).is_some()
    }
}
