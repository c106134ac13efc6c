//! # Interrupt Dispatch Tests
//!
//! End-to-end tests of trap entry. Each test configures a hart through CSR
//! writes, raises a source, and checks the level the interrupt is taken to,
//! its cause, the handler address and the state left behind:
//!
//! - Direct/vectored dispatch of a delegated Supervisor external interrupt.
//! - Nested-vectored masking of local causes and the major-to-minor cascade.
//! - The nested-vectored threshold stack across preemption and claims.

use pretty_assertions::assert_eq;
use rstest::rstest;

use rvsim_aia::common::Trap;
use rvsim_aia::common::irq;
use rvsim_aia::common::reg::bit;
use rvsim_aia::core::arch::csr::{self, indirect, topei, topi};
use rvsim_aia::core::arch::mode::{IrqLevel, PrivilegeMode};
use rvsim_aia::core::arch::trap::interrupt_cause;
use rvsim_aia::core::hart::GlobalEnables;
use rvsim_aia::core::hart::trap::{InterruptEntry, PendingInterrupt, PendingIvt, TrapTarget};

use crate::common::TestContext;
use crate::common::mocks::{MockVectorTable, table_with_entry};

const TABLE: u64 = 0x1000;

/// A Supervisor external interrupt delegated by `mideleg` is reported in
/// `stopi`/`stopei`, taken in S mode and claimed through `stopei`.
#[test]
fn delegated_supervisor_external_interrupt() {
    let mut ctx = TestContext::new();
    ctx.m_write(csr::MIDELEG, bit(irq::SEI));
    ctx.m_write(csr::MIE, bit(irq::SEI));
    ctx.open_file(IrqLevel::Supervisor, &[5]);
    ctx.msi(IrqLevel::Supervisor, 0, 5);

    assert_eq!(ctx.m_read(csr::STOPEI), topei::encode(5));
    assert_eq!(ctx.m_read(csr::STOPI), topi::encode(irq::SEI, 5));
    assert_eq!(ctx.m_read(csr::MTOPI), 0);

    ctx.hart.set_privilege(PrivilegeMode::Supervisor);
    ctx.hart.set_global_enables(GlobalEnables {
        mstatus_sie: true,
        ..GlobalEnables::default()
    });
    assert_eq!(
        ctx.hart.pending_interrupt(),
        Some(PendingInterrupt {
            level: IrqLevel::Supervisor,
            iid: irq::SEI
        })
    );
    assert_eq!(
        ctx.hart.take_interrupt(IrqLevel::Supervisor),
        Some(InterruptEntry {
            level: IrqLevel::Supervisor,
            cause: interrupt_cause(irq::SEI),
            target: TrapTarget::Direct(0),
        })
    );

    assert_eq!(ctx.hart.csr_swap(csr::STOPEI, 0), Ok(topei::encode(5)));
    assert_eq!(ctx.hart.csr_read(csr::STOPEI), Ok(0));
    assert_eq!(ctx.hart.pending_interrupt(), None);
    assert_eq!(ctx.hart.stats().interrupts_taken, [0, 1, 0]);
}

/// Without delegation the same message is an M-level interrupt, and S mode
/// cannot mask it.
#[test]
fn undelegated_external_goes_to_machine() {
    let mut ctx = TestContext::new();
    ctx.m_write(csr::MIE, bit(irq::SEI));
    ctx.open_file(IrqLevel::Supervisor, &[5]);
    ctx.msi(IrqLevel::Supervisor, 0, 5);

    ctx.hart.set_privilege(PrivilegeMode::Supervisor);
    assert_eq!(
        ctx.hart.pending_interrupt(),
        Some(PendingInterrupt {
            level: IrqLevel::Machine,
            iid: irq::SEI
        })
    );
    // Arbitrated at M as a local cause, so its priority comes from `iprio`.
    assert_eq!(ctx.m_read(csr::MTOPI), topi::encode(irq::SEI, 0));
}

/// Vectored mode jumps to `base + 4 * cause` and switches to the target mode.
#[test]
fn vectored_dispatch_uses_cause_offset() {
    let mut ctx = TestContext::new();
    ctx.m_write(csr::MIE, bit(irq::MSI));
    ctx.m_write(csr::MTVEC, 0x8000_0000 | 1);
    assert_eq!(ctx.hart.trigger_software_interrupt(IrqLevel::Machine, true), Ok(()));

    ctx.hart.set_privilege(PrivilegeMode::User);
    let entry = ctx.hart.take_interrupt(IrqLevel::Machine);
    assert_eq!(
        entry.map(|e| e.target),
        Some(TrapTarget::Direct(0x8000_0000 + 4 * u64::from(irq::MSI)))
    );
    assert_eq!(ctx.hart.privilege, PrivilegeMode::Machine);
}

/// Machine mode with `mstatus.MIE` clear holds every M interrupt, but a
/// `wfi` still wakes up.
#[test]
fn machine_mode_requires_mie() {
    let mut ctx = TestContext::new();
    ctx.m_write(csr::MIE, bit(irq::MTI));
    ctx.hart.trigger_timer_interrupt(IrqLevel::Machine, true);

    assert_eq!(ctx.hart.pending_interrupt(), None);
    assert!(ctx.hart.has_any_locally_pending_enabled_interrupt());

    ctx.enable_all();
    assert_eq!(
        ctx.hart.pending_interrupt().map(|p| p.iid),
        Some(irq::MTI)
    );
}

/// In nested-vectored mode a local cause with priority 0 has no minor
/// identity: it is pending in `mip` but never reaches the trap path.
#[test]
fn nested_vectored_masks_local_causes() {
    let mut ctx = TestContext::new();
    ctx.m_write(csr::MTVEC, TABLE | 3);
    ctx.m_write(csr::MIE, bit(irq::MTI) | bit(irq::MEI));
    ctx.open_file(IrqLevel::Machine, &[1, 2, 3, 4, 5]);
    ctx.enable_all();

    ctx.hart.trigger_timer_interrupt(IrqLevel::Machine, true);

    assert_eq!(ctx.m_read(csr::MIP) & bit(irq::MTI), bit(irq::MTI));
    assert_eq!(ctx.m_read(csr::MTOPI), 0);
    assert_eq!(ctx.m_read(csr::MTOPEI), 0);
    assert_eq!(ctx.hart.pending_interrupt(), None);
    assert_eq!(ctx.hart.stats().msi_cascade, 0);
    assert!(ctx.hart.has_any_locally_pending_enabled_interrupt());
}

/// With the Machine file's delivery gate closed, a nested-vectored timer
/// never reaches the trap path. Without a priority it has no minor identity
/// and nothing is delivered; with one, the message is latched in `eip` but
/// the closed file does not raise MEI until the gate opens.
#[rstest]
#[case::no_priority(0, 0)]
#[case::with_priority(5, 1)]
fn nested_vectored_timer_with_closed_file(#[case] prio: u64, #[case] cascades: u64) {
    let mut ctx = TestContext::new();
    ctx.m_write(csr::MTVEC, TABLE | 3);
    ctx.m_write(csr::MIE, bit(irq::MTI) | bit(irq::MEI));
    ctx.ireg_write(IrqLevel::Machine, indirect::IPRIO0, prio << (8 * irq::MTI));
    ctx.enable_all();

    ctx.hart.trigger_timer_interrupt(IrqLevel::Machine, true);

    assert_eq!(ctx.m_read(csr::MIP) & bit(irq::MTI), bit(irq::MTI));
    assert_eq!(ctx.m_read(csr::MIP) & bit(irq::MEI), 0);
    assert_eq!(ctx.m_read(csr::MTOPI), 0);
    assert_eq!(ctx.m_read(csr::MTOPEI), 0);
    assert_eq!(ctx.hart.pending_interrupt(), None);
    assert_eq!(ctx.hart.take_interrupt(IrqLevel::Machine), None);
    assert_eq!(ctx.hart.stats().msi_cascade, cascades);

    let latched = if cascades == 0 { 0 } else { bit(prio as u32) };
    assert_eq!(ctx.ireg_read(IrqLevel::Machine, indirect::EIP0), latched);

    // Opening the gate exposes whatever was latched.
    ctx.open_file(IrqLevel::Machine, &[5]);
    if cascades == 0 {
        assert_eq!(ctx.hart.pending_interrupt(), None);
    } else {
        assert_eq!(ctx.m_read(csr::MTOPEI), topei::encode(5));
        assert_eq!(
            ctx.hart.pending_interrupt(),
            Some(PendingInterrupt {
                level: IrqLevel::Machine,
                iid: irq::MEI
            })
        );
    }
}

/// With a priority assigned, the timer edge becomes a message to the M file
/// and is taken as MEI through the table line of that priority.
#[test]
fn cascade_turns_local_edge_into_message() {
    let mut ctx = TestContext::new();
    ctx.m_write(csr::MTVEC, TABLE | 3);
    ctx.m_write(csr::MIE, bit(irq::MTI) | bit(irq::MEI));
    ctx.ireg_write(IrqLevel::Machine, indirect::IPRIO0, 5 << (8 * irq::MTI));
    ctx.open_file(IrqLevel::Machine, &[5]);
    ctx.enable_all();

    ctx.hart.trigger_timer_interrupt(IrqLevel::Machine, true);

    assert_eq!(ctx.hart.stats().msi_cascade, 1);
    assert_eq!(ctx.m_read(csr::MTOPEI), topei::encode(5));
    assert_eq!(ctx.m_read(csr::MTOPI), topi::encode(irq::MEI, 5));

    let entry = ctx.hart.take_interrupt(IrqLevel::Machine);
    assert_eq!(entry.map(|e| e.target), Some(TrapTarget::Indirect(TABLE + 4 * 5)));

    // Level stays high but there is no new edge.
    ctx.hart.trigger_timer_interrupt(IrqLevel::Machine, true);
    assert_eq!(ctx.hart.stats().msi_cascade, 1);
}

/// Nested-vectored dispatch: the table line is the top minor identity, the
/// threshold is pushed on entry and popped by a write-only `mtopei` claim.
#[test]
fn nested_vectored_threshold_stack() {
    let mut ctx = TestContext::new();
    ctx.m_write(csr::MTVEC, TABLE | 3);
    ctx.m_write(csr::MIE, bit(irq::MEI));
    ctx.open_file(IrqLevel::Machine, &[3, 5, 7]);
    ctx.enable_all();

    ctx.msi(IrqLevel::Machine, 0, 5);
    assert_eq!(
        ctx.hart.take_interrupt(IrqLevel::Machine),
        Some(InterruptEntry {
            level: IrqLevel::Machine,
            cause: interrupt_cause(irq::MEI),
            target: TrapTarget::Indirect(TABLE + 4 * 5),
        })
    );
    assert_eq!(
        ctx.hart.pending_ivt(),
        Some(PendingIvt {
            level: IrqLevel::Machine,
            entry: TABLE + 4 * 5
        })
    );
    let mut mem = table_with_entry(TABLE + 4 * 5, 0x8000_0400);
    assert_eq!(ctx.hart.process_pending_ivt(&mut mem), Ok(Some(0x8000_0400)));
    assert_eq!(ctx.ireg_read(IrqLevel::Machine, indirect::EITHRESHOLD), 5);
    assert_eq!(ctx.m_read(csr::MTOPEI), 0);

    // Blocked by the threshold, but still reported so its vector is known.
    ctx.msi(IrqLevel::Machine, 0, 7);
    assert_eq!(ctx.m_read(csr::MTOPEI), topei::encode(7));
    assert_eq!(ctx.hart.pending_interrupt(), None);

    // 3 preempts the handler of 5.
    ctx.msi(IrqLevel::Machine, 0, 3);
    assert_eq!(
        ctx.hart.take_interrupt(IrqLevel::Machine).map(|e| e.target),
        Some(TrapTarget::Indirect(TABLE + 4 * 3))
    );
    assert_eq!(ctx.ireg_read(IrqLevel::Machine, indirect::EITHRESHOLD), 3);

    // Returning from 3 restores 5; returning from 5 releases 7.
    assert_eq!(ctx.hart.csr_write(csr::MTOPEI, 0), Ok(()));
    assert_eq!(ctx.ireg_read(IrqLevel::Machine, indirect::EITHRESHOLD), 5);
    assert_eq!(ctx.hart.pending_interrupt(), None);

    assert_eq!(ctx.hart.csr_write(csr::MTOPEI, 0), Ok(()));
    assert_eq!(ctx.ireg_read(IrqLevel::Machine, indirect::EITHRESHOLD), 0);
    assert_eq!(
        ctx.hart.pending_interrupt(),
        Some(PendingInterrupt {
            level: IrqLevel::Machine,
            iid: irq::MEI
        })
    );

    let stats = ctx.hart.stats();
    assert_eq!(stats.nv_dispatches, 2);
    assert_eq!(stats.threshold_pops, 2);
}

/// A read-modify-write of `mtopei` claims the identity instead of popping.
#[test]
fn swap_on_topei_claims_identity() {
    let mut ctx = TestContext::new();
    ctx.m_write(csr::MTVEC, TABLE | 3);
    ctx.open_file(IrqLevel::Machine, &[9]);
    ctx.msi(IrqLevel::Machine, 0, 9);

    assert_eq!(ctx.hart.csr_swap(csr::MTOPEI, 0), Ok(topei::encode(9)));
    assert_eq!(ctx.m_read(csr::MTOPEI), 0);
    assert_eq!(ctx.hart.stats().threshold_pops, 0);
}

/// Without a top identity the last table line is used.
#[test]
fn empty_file_dispatches_to_last_line() {
    let mut ctx = TestContext::wired();
    ctx.m_write(csr::MTVEC, TABLE | 3);
    ctx.m_write(csr::MIE, bit(irq::MEI));
    assert_eq!(ctx.hart.trigger_external_interrupt(IrqLevel::Machine), Ok(()));

    ctx.hart.set_privilege(PrivilegeMode::Supervisor);
    assert_eq!(
        ctx.hart.take_interrupt(IrqLevel::Machine).map(|e| e.target),
        Some(TrapTarget::Indirect(TABLE + 4 * 255))
    );
}

/// Exceptions at a nested-vectored level fetch their handler from line 0.
#[test]
fn exceptions_use_line_zero() {
    let mut ctx = TestContext::new();
    ctx.m_write(csr::STVEC, 0x4000 | 3);
    assert_eq!(
        ctx.hart.exception_target(IrqLevel::Supervisor),
        TrapTarget::Indirect(0x4000)
    );

    let mut mem = MockVectorTable::new();
    let _ = mem
        .expect_load_word()
        .times(1)
        .returning(|addr| Err(format!("fetch fault at {addr:#x}")));
    assert_eq!(
        ctx.hart.process_pending_ivt(&mut mem),
        Err("fetch fault at 0x4000".to_string())
    );
    assert_eq!(ctx.hart.pending_ivt(), None);
}

/// A VS level with `vsstatus.SIE` clear holds its interrupts in VS mode but
/// not in VU mode.
#[test]
fn vs_enable_depends_on_mode() {
    let mut ctx = TestContext::new();
    ctx.m_write(csr::HIDELEG, bit(irq::VSTI));
    ctx.m_write(csr::HIE, bit(irq::VSTI));
    ctx.hart.trigger_timer_interrupt(IrqLevel::VirtualSupervisor, true);

    ctx.hart.set_privilege(PrivilegeMode::VirtualSupervisor);
    assert_eq!(ctx.hart.pending_interrupt(), None);

    ctx.hart.set_privilege(PrivilegeMode::VirtualUser);
    assert_eq!(
        ctx.hart.pending_interrupt(),
        Some(PendingInterrupt {
            level: IrqLevel::VirtualSupervisor,
            iid: irq::STI
        })
    );
    let entry = ctx.hart.take_interrupt(IrqLevel::VirtualSupervisor);
    assert_eq!(entry.map(|e| e.cause), Some(interrupt_cause(irq::STI)));
    assert_eq!(ctx.hart.privilege, PrivilegeMode::VirtualSupervisor);
}

/// Reading a CSR that traps leaves the interrupt state untouched.
#[test]
fn trapped_access_has_no_side_effects() {
    let mut ctx = TestContext::new();
    ctx.open_file(IrqLevel::Machine, &[4]);
    ctx.msi(IrqLevel::Machine, 0, 4);

    ctx.hart.set_privilege(PrivilegeMode::Supervisor);
    assert_eq!(
        ctx.hart.csr_swap(csr::MTOPEI, 0),
        Err(Trap::IllegalInstruction(csr::MTOPEI))
    );
    assert_eq!(ctx.m_read(csr::MTOPEI), topei::encode(4));
}
