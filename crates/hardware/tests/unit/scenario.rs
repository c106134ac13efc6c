//! # Scenario Replay Tests
//!
//! Verifies JSON scenario loading and replay: step outcomes, mismatch
//! counting, nested-vectored entry through the scenario's memory image, and
//! the error paths of loading.

use std::io::Write;
use std::path::Path;

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use rvsim_aia::Config;
use rvsim_aia::common::irq;
use rvsim_aia::core::arch::csr::{self, indirect, topei, topi};
use rvsim_aia::core::arch::mode::{IrqLevel, PrivilegeMode};
use rvsim_aia::core::arch::trap::interrupt_cause;
use rvsim_aia::sim::scenario::{Scenario, ScenarioError, Step, StepOutcome};

fn parse(value: &serde_json::Value) -> Scenario {
    Scenario::from_json_str(&value.to_string()).unwrap()
}

/// Steps deserialize from their tagged form with defaults filled in.
#[test]
fn steps_parse() {
    let scenario = parse(&json!({
        "steps": [
            { "op": "set_privilege", "mode": "VirtualSupervisor" },
            { "op": "set_enables", "mstatus_mie": true },
            { "op": "msi_write", "level": "Supervisor", "minor": 4 },
            { "op": "csr_read", "addr": csr::MIE },
            { "op": "take_interrupt" }
        ]
    }));
    assert_eq!(
        scenario.steps,
        vec![
            Step::SetPrivilege {
                mode: PrivilegeMode::VirtualSupervisor
            },
            Step::SetEnables {
                mstatus_mie: true,
                mstatus_sie: false,
                vsstatus_sie: false
            },
            Step::MsiWrite {
                level: IrqLevel::Supervisor,
                guest: 0,
                minor: 4
            },
            Step::CsrRead {
                addr: csr::MIE,
                expect: None
            },
            Step::TakeInterrupt { level: None },
        ]
    );
    assert_eq!(scenario.config, Config::default());
}

/// Reads are checked against `expect`; traps and rejected calls are
/// outcomes, only mismatches count as failures.
#[test]
fn outcomes_and_failures() {
    let scenario = parse(&json!({
        "steps": [
            { "op": "csr_write", "addr": csr::MIE, "value": 1u64 << irq::MTI },
            { "op": "timer", "level": "Machine", "status": true },
            { "op": "csr_read", "addr": csr::MTOPI, "expect": topi::encode(irq::MTI, 0) },
            { "op": "csr_read", "addr": csr::MIE, "expect": 0 },
            { "op": "set_privilege", "mode": "Supervisor" },
            { "op": "csr_read", "addr": csr::MIE },
            { "op": "external", "level": "Machine", "status": true }
        ]
    }));
    let report = scenario.run().unwrap();
    let outcomes: Vec<_> = report.steps.iter().map(|s| s.outcome.clone()).collect();

    assert_eq!(outcomes[0], StepOutcome::Done);
    assert_eq!(
        outcomes[2],
        StepOutcome::Value {
            value: topi::encode(irq::MTI, 0)
        }
    );
    assert_eq!(
        outcomes[3],
        StepOutcome::Mismatch {
            expected: 0,
            actual: 1 << irq::MTI
        }
    );
    assert!(matches!(outcomes[5], StepOutcome::Trap { cause: 2, .. }));
    assert!(matches!(outcomes[6], StepOutcome::Rejected { .. }));
    assert_eq!(report.failures, 1);
    assert_eq!(report.final_state.mtopi, topi::encode(irq::MTI, 0));
    assert_eq!(report.stats.illegal_traps, 1);
}

/// A nested-vectored Machine entry fetches its handler from the memory
/// image, and the claim leaves `mtopei` empty.
#[test]
fn nested_vectored_entry_uses_memory_image() {
    let scenario = parse(&json!({
        "memory": { "4116": 0x8000 },
        "steps": [
            { "op": "csr_write", "addr": csr::MTVEC, "value": 0x1003 },
            { "op": "csr_write", "addr": csr::MIE, "value": 1u64 << irq::MEI },
            { "op": "csr_write", "addr": csr::MISELECT, "value": indirect::EIDELIVERY },
            { "op": "csr_write", "addr": csr::MIREG, "value": 1 },
            { "op": "csr_write", "addr": csr::MISELECT, "value": indirect::EIE0 },
            { "op": "csr_write", "addr": csr::MIREG, "value": 1u64 << 5 },
            { "op": "mmio_write", "offset": 0, "value": 5 },
            { "op": "csr_read", "addr": csr::MTOPEI, "expect": topei::encode(5) },
            { "op": "set_enables", "mstatus_mie": true },
            { "op": "take_interrupt" },
            { "op": "take_interrupt" }
        ]
    }));
    let report = scenario.run().unwrap();

    assert_eq!(report.failures, 0);
    assert_eq!(
        report.steps[9].outcome,
        StepOutcome::Interrupt {
            level: IrqLevel::Machine,
            cause: interrupt_cause(irq::MEI),
            handler: Some(0x8000)
        }
    );
    assert_eq!(report.steps[10].outcome, StepOutcome::NoInterrupt);
    assert_eq!(report.final_state.mtopei, 0);
    assert_eq!(report.stats.nv_dispatches, 1);
    assert_eq!(report.stats.msi_mmio, 1);
}

/// A table line missing from the image is reported, not fatal.
#[test]
fn missing_table_entry_is_rejected() {
    let scenario = parse(&json!({
        "steps": [
            { "op": "csr_write", "addr": csr::MTVEC, "value": 0x1003 },
            { "op": "csr_write", "addr": csr::MIE, "value": 1u64 << irq::MEI },
            { "op": "csr_write", "addr": csr::MISELECT, "value": indirect::EIDELIVERY },
            { "op": "csr_write", "addr": csr::MIREG, "value": 1 },
            { "op": "csr_write", "addr": csr::MISELECT, "value": indirect::EIE0 },
            { "op": "csr_write", "addr": csr::MIREG, "value": 1u64 << 5 },
            { "op": "msi_write", "level": "Machine", "minor": 5 },
            { "op": "take_interrupt", "level": "Machine" }
        ]
    }));
    let report = scenario.run().unwrap();
    assert_eq!(
        report.steps[7].outcome,
        StepOutcome::Rejected {
            error: "no vector table entry at 0x1014".to_string()
        }
    );
    assert_eq!(report.stats.interrupts_taken, [1, 0, 0]);
}

/// The report serializes with tagged outcomes.
#[test]
fn report_serializes() {
    let scenario = parse(&json!({
        "steps": [ { "op": "csr_read", "addr": csr::MIP, "expect": 1 } ]
    }));
    let report = scenario.run().unwrap();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["failures"], 1);
    assert_eq!(value["steps"][0]["outcome"]["result"], "mismatch");
    assert_eq!(value["steps"][0]["step"]["op"], "csr_read");
}

/// Loading errors are classified.
#[test]
fn load_errors() {
    assert!(matches!(
        Scenario::from_json_str(r#"{ "steps": [ { "op": "fly" } ] }"#),
        Err(ScenarioError::Parse(_))
    ));

    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Scenario::from_json_file(dir.path().join("absent.json")),
        Err(ScenarioError::Io(_))
    ));

    let bad = parse(&json!({ "config": { "aia": { "max_guest": 0 } } }));
    assert!(matches!(bad.run(), Err(ScenarioError::Config(_))));
}

/// Scenario files replay the same as strings.
#[test]
fn runs_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let text = json!({
        "config": { "aia": { "external_delivery": "Wire" } },
        "steps": [
            { "op": "csr_write", "addr": csr::MIE, "value": 1u64 << irq::MEI },
            { "op": "external", "level": "Machine", "status": true },
            { "op": "csr_read", "addr": csr::MTOPI, "expect": topi::encode(irq::MEI, 255) }
        ]
    });
    write!(file, "{text}").unwrap();

    let report = Scenario::from_json_file(file.path()).unwrap().run().unwrap();
    assert_eq!(report.failures, 0);
}

/// The bundled demo scenarios replay without mismatches.
#[rstest]
#[case("s_external.json")]
#[case("nv_dispatch.json")]
fn bundled_scenarios(#[case] name: &str) {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../scenarios")
        .join(name);
    let report = Scenario::from_json_file(path).unwrap().run().unwrap();
    assert_eq!(report.failures, 0, "{:#?}", report.steps);
    assert!(
        report
            .steps
            .iter()
            .any(|s| matches!(s.outcome, StepOutcome::Interrupt { .. }))
    );
}
