//! # Guest Interrupt File Tests
//!
//! Verifies guest file selection through `hstatus.VGEIN`, the VS external
//! line driven by the connected file, and the `hgeip`/`hgeie`/SGEI path that
//! reports every other guest file to the hypervisor.

use pretty_assertions::assert_eq;

use rvsim_aia::common::reg::bit;
use rvsim_aia::common::{IrqError, Trap, irq};
use rvsim_aia::config::Config;
use rvsim_aia::core::arch::csr::{self, hstatus, topei, topi};
use rvsim_aia::core::arch::mode::IrqLevel;

use crate::common::TestContext;

/// Guest `vgein` with minor `minor` enabled, VSEI delegated and enabled.
fn guest_with_minor(vgein: usize, minor: u32) -> TestContext {
    let mut ctx = TestContext::new();
    ctx.select_guest(vgein);
    ctx.open_file(IrqLevel::VirtualSupervisor, &[minor]);
    ctx.m_write(csr::HIDELEG, bit(irq::VSEI));
    ctx.m_write(csr::HIE, bit(irq::VSEI));
    ctx
}

/// The connected guest file drives VSEI and reports through `vstopei`.
#[test]
fn connected_guest_drives_vsei() {
    let mut ctx = guest_with_minor(1, 7);
    ctx.msi(IrqLevel::VirtualSupervisor, 0, 7);

    assert_eq!(ctx.m_read(csr::HGEIP), bit(1));
    assert_eq!(ctx.m_read(csr::HIP) & bit(irq::VSEI), bit(irq::VSEI));
    assert_eq!(ctx.m_read(csr::VSTOPEI), topei::encode(7));
    assert_eq!(ctx.m_read(csr::VSTOPI), topi::encode(irq::SEI, 1));

    // Claiming through vstopei lowers the line again.
    ctx.m_write(csr::VSTOPEI, 0);
    assert_eq!(ctx.m_read(csr::HGEIP), 0);
    assert_eq!(ctx.m_read(csr::HIP) & bit(irq::VSEI), 0);
}

/// A file that is not connected reaches the hypervisor as SGEI, and only
/// while its `hgeie` bit is set.
#[test]
fn unselected_guest_raises_sgei() {
    let mut ctx = guest_with_minor(3, 4);
    ctx.select_guest(1);
    ctx.m_write(csr::HIE, bit(irq::SGEI) | bit(irq::VSEI));

    ctx.msi(IrqLevel::VirtualSupervisor, 2, 4);
    assert_eq!(ctx.m_read(csr::HGEIP), bit(3));
    assert_eq!(ctx.m_read(csr::HIP) & bit(irq::SGEI), 0);
    assert_eq!(ctx.m_read(csr::VSTOPEI), 0);

    ctx.m_write(csr::HGEIE, bit(3));
    assert_eq!(ctx.m_read(csr::HIP) & bit(irq::SGEI), bit(irq::SGEI));
    assert_eq!(ctx.m_read(csr::STOPI), topi::encode(irq::SGEI, 0));

    ctx.m_write(csr::HGEIE, bit(2));
    assert_eq!(ctx.m_read(csr::HIP) & bit(irq::SGEI), 0);
}

/// Switching guests moves VSEI with the connection; `hgeip` keeps reporting
/// the asserted file.
#[test]
fn switching_guests_moves_vsei() {
    let mut ctx = guest_with_minor(1, 7);
    ctx.msi(IrqLevel::VirtualSupervisor, 0, 7);

    ctx.select_guest(2);
    assert_eq!(ctx.m_read(csr::HIP) & bit(irq::VSEI), 0);
    assert_eq!(ctx.m_read(csr::HGEIP), bit(1));
    assert_eq!(ctx.m_read(csr::VSTOPEI), 0);

    ctx.select_guest(1);
    assert_eq!(ctx.m_read(csr::HIP) & bit(irq::VSEI), bit(irq::VSEI));
    assert_eq!(ctx.m_read(csr::VSTOPEI), topei::encode(7));
    assert_eq!(ctx.hart.stats().guest_switches, 3);
}

/// VGEIN beyond the configured files selects the last one; rewriting the
/// same value is not a switch.
#[test]
fn vgein_clamps_to_last_guest() {
    let mut ctx = TestContext::new();
    ctx.select_guest(40);
    assert_eq!(hstatus::vgein(ctx.m_read(csr::HSTATUS)), 8);
    assert_eq!(ctx.hart.irq.current_guest(), Some(7));

    ctx.select_guest(8);
    assert_eq!(ctx.hart.stats().guest_switches, 1);

    ctx.select_guest(0);
    assert!(!ctx.hart.irq.guest_connected());
    assert_eq!(ctx.hart.stats().guest_switches, 2);
    assert_eq!(
        ctx.hart.csr_read(csr::VSTOPEI),
        Err(Trap::IllegalInstruction(csr::VSTOPEI))
    );
}

/// `hstatus` reports VSXL and drops unimplemented bits.
#[test]
fn hstatus_fixed_fields() {
    let mut ctx = TestContext::new();
    ctx.m_write(csr::HSTATUS, u64::MAX);
    let value = ctx.m_read(csr::HSTATUS);
    assert_eq!(value & hstatus::VSXL_64, hstatus::VSXL_64);
    assert_eq!(value & !(hstatus::MASK | hstatus::VSXL_64), 0);
}

/// The guest count bounds `hgeie` and message delivery.
#[test]
fn guest_count_bounds_files() {
    let mut config = Config::default();
    config.aia.max_guest = 2;
    let mut ctx = TestContext::with_config(&config);

    ctx.m_write(csr::HGEIE, u64::MAX);
    assert_eq!(ctx.m_read(csr::HGEIE), 0b110);
    assert_eq!(
        ctx.hart.route_imsic_write(IrqLevel::VirtualSupervisor, 2, 4),
        Err(IrqError::GuestOutOfRange { index: 2, count: 2 })
    );
    assert_eq!(ctx.hart.irq.guest_file(1).map(|f| f.limit()), Ok(2048));
}

/// Messages to a file with the delivery gate closed are latched but do not
/// assert anything.
#[test]
fn closed_guest_file_latches_silently() {
    let mut ctx = TestContext::new();
    ctx.select_guest(1);
    ctx.msi(IrqLevel::VirtualSupervisor, 0, 9);
    assert_eq!(ctx.m_read(csr::HGEIP), 0);

    let file = ctx.hart.irq.guest_file(0).map(|f| f.is_pending(9));
    assert_eq!(file, Ok(true));

    ctx.open_file(IrqLevel::VirtualSupervisor, &[9]);
    assert_eq!(ctx.m_read(csr::HGEIP), bit(1));
}
