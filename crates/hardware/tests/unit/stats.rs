//! # Statistics Tests
//!
//! Verifies that the counters follow the events they name and serialize
//! under stable keys.

use pretty_assertions::assert_eq;

use rvsim_aia::common::irq;
use rvsim_aia::common::reg::bit;
use rvsim_aia::config::Config;
use rvsim_aia::core::arch::csr::{self, indirect};
use rvsim_aia::core::arch::mode::{IrqLevel, PrivilegeMode};
use rvsim_aia::soc::devices::{Device, ImsicMmio};
use rvsim_aia::stats::{IrqStats, STATS_SECTIONS};

use crate::common::TestContext;

/// Taken interrupts are counted per level.
#[test]
fn taken_per_level() {
    let mut ctx = TestContext::new();
    ctx.m_write(csr::MIDELEG, bit(irq::STI));
    ctx.m_write(csr::MIE, bit(irq::MTI) | bit(irq::STI));
    ctx.hart.trigger_timer_interrupt(IrqLevel::Machine, true);
    ctx.hart.trigger_timer_interrupt(IrqLevel::Supervisor, true);

    assert!(ctx.hart.take_interrupt(IrqLevel::Machine).is_some());
    assert!(ctx.hart.take_interrupt(IrqLevel::Supervisor).is_some());
    assert!(ctx.hart.take_interrupt(IrqLevel::Supervisor).is_some());
    assert!(ctx.hart.take_interrupt(IrqLevel::VirtualSupervisor).is_none());

    let stats = ctx.hart.stats();
    assert_eq!(stats.interrupts_taken, [1, 2, 0]);
    assert_eq!(stats.total_taken(), 3);
}

/// Both exception kinds raised by CSR accesses are counted.
#[test]
fn csr_traps() {
    let mut ctx = TestContext::new();
    ctx.hart.set_privilege(PrivilegeMode::Supervisor);
    assert!(ctx.hart.csr_read(csr::MIE).is_err());
    assert!(ctx.hart.csr_write(csr::MTOPI, 0).is_err());

    ctx.hart.set_privilege(PrivilegeMode::VirtualSupervisor);
    assert!(ctx.hart.csr_read(csr::HIE).is_err());

    let stats = ctx.hart.stats();
    assert_eq!(stats.illegal_traps, 2);
    assert_eq!(stats.virtual_traps, 1);
}

/// Message counters distinguish page writes from cascaded major edges.
#[test]
fn message_counters() {
    let mut ctx = TestContext::new();
    ctx.msi(IrqLevel::Machine, 0, 3);
    assert_eq!(ctx.hart.stats().msi_mmio, 0);

    let mut pages = ImsicMmio::new(&Config::default().aia);
    pages.write_u32(0, 4);
    assert_eq!(pages.deliver_into(&mut ctx.hart), 1);
    assert_eq!(ctx.hart.stats().msi_mmio, 1);

    // Machine timer at priority 5 cascades into the nested-vectored file.
    ctx.m_write(csr::MTVEC, 0x1003);
    ctx.ireg_write(IrqLevel::Machine, indirect::IPRIO0, 5 << (8 * irq::MTI));
    ctx.m_write(csr::MIE, bit(irq::MTI));
    ctx.hart.trigger_timer_interrupt(IrqLevel::Machine, true);
    assert_eq!(ctx.hart.stats().msi_cascade, 1);
    assert_eq!(ctx.hart.stats().msi_mmio, 1);
}

/// Keys are the field names; sections are the documented three.
#[test]
fn serialized_keys() {
    let stats = IrqStats {
        nv_dispatches: 4,
        ..IrqStats::default()
    };
    let value = serde_json::to_value(&stats).unwrap();
    assert_eq!(value["nv_dispatches"], 4);
    assert_eq!(value["interrupts_taken"], serde_json::json!([0, 0, 0]));
    for key in [
        "msi_mmio",
        "msi_cascade",
        "threshold_pops",
        "illegal_traps",
        "virtual_traps",
        "guest_switches",
    ] {
        assert_eq!(value[key], 0, "{key}");
    }
    assert_eq!(STATS_SECTIONS, &["dispatch", "messages", "traps"]);
}

/// Recording goes through the level index.
#[test]
fn record_taken() {
    let mut stats = IrqStats::default();
    stats.record_taken(IrqLevel::VirtualSupervisor);
    stats.record_taken(IrqLevel::VirtualSupervisor);
    assert_eq!(stats.interrupts_taken[IrqLevel::VirtualSupervisor.index()], 2);
    assert_eq!(stats.total_taken(), 2);
}
