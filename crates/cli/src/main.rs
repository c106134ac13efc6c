//! RISC-V AIA interrupt subsystem CLI.
//!
//! This binary replays interrupt scenarios against a simulated hart. It performs:
//! 1. **Scenario run:** Load a JSON scenario, replay every step and print a report.
//! 2. **Config check:** Validate a configuration file and print the resolved values.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use rvsim_aia::config::Config;
use rvsim_aia::sim::scenario::{Scenario, ScenarioReport, StepOutcome};
use rvsim_aia::stats::STATS_SECTIONS;

#[derive(Parser, Debug)]
#[command(
    name = "aia-sim",
    author,
    version,
    about = "RISC-V AIA interrupt subsystem simulator",
    long_about = "Replay JSON interrupt scenarios against a simulated hart.\n\nExamples:\n  aia-sim run scenarios/s_external.json\n  aia-sim run scenarios/nv_dispatch.json --json\n  aia-sim config scenarios/aia.json"
)]
struct Cli {
    /// Log every CSR access and state change.
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a scenario file.
    Run {
        /// Scenario to replay.
        path: PathBuf,

        /// Print the report as JSON instead of text.
        #[arg(long)]
        json: bool,

        /// Statistics sections to print (dispatch, messages, traps).
        #[arg(long, value_delimiter = ',')]
        stats: Vec<String>,
    },

    /// Validate a configuration file.
    Config {
        /// Configuration to check.
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.trace);

    let code = match cli.command {
        Commands::Run { path, json, stats } => cmd_run(&path, json, &stats, cli.trace),
        Commands::Config { path } => cmd_config(&path),
    };
    process::exit(code);
}

/// Installs the fmt subscriber; `RUST_LOG` overrides the default level.
fn init_tracing(trace: bool) {
    let default = if trace { "trace" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Replays the scenario at `path` and prints its report.
///
/// Returns 0 when every checked read matched, 1 on mismatches, 2 when the
/// scenario could not be loaded.
fn cmd_run(path: &Path, json: bool, sections: &[String], trace: bool) -> i32 {
    if let Some(bad) = sections.iter().find(|s| !STATS_SECTIONS.contains(&s.as_str())) {
        error!(section = %bad, "unknown stats section");
        return 2;
    }

    let mut scenario = match Scenario::from_json_file(path) {
        Ok(s) => s,
        Err(e) => {
            error!(path = %path.display(), "{e}");
            return 2;
        }
    };
    if trace {
        scenario.config.general.trace_csr_access = true;
    }

    let report = match scenario.run() {
        Ok(r) => r,
        Err(e) => {
            error!(path = %path.display(), "{e}");
            return 2;
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                error!("failed to serialize report: {e}");
                return 2;
            }
        }
    } else {
        print_report(&report);
        report.stats.print_sections(sections);
    }

    if report.failures == 0 { 0 } else { 1 }
}

fn print_report(report: &ScenarioReport) {
    for step in &report.steps {
        let outcome = match &step.outcome {
            StepOutcome::Done => "ok".to_string(),
            StepOutcome::Value { value } => format!("= {value:#x}"),
            StepOutcome::Mismatch { expected, actual } => {
                format!("MISMATCH expected {expected:#x} got {actual:#x}")
            }
            StepOutcome::Trap { trap, cause } => format!("trap {cause}: {trap}"),
            StepOutcome::Rejected { error } => format!("rejected: {error}"),
            StepOutcome::Interrupt {
                level,
                cause,
                handler,
            } => match handler {
                Some(pc) => format!("interrupt to {level} cause {cause:#x} handler {pc:#x}"),
                None => format!("interrupt to {level} cause {cause:#x}"),
            },
            StepOutcome::NoInterrupt => "no interrupt pending".to_string(),
        };
        println!("[{:>3}] {:<60} {outcome}", step.index, format!("{:?}", step.step));
    }

    let top = &report.final_state;
    println!();
    println!(
        "mtopi={:#x} stopi={:#x} vstopi={:#x}",
        top.mtopi, top.stopi, top.vstopi
    );
    println!(
        "mtopei={:#x} stopei={:#x} vstopei={:#x}",
        top.mtopei, top.stopei, top.vstopei
    );
    println!("failures: {}", report.failures);
}

/// Loads and validates the configuration at `path`, then prints it as JSON.
fn cmd_config(path: &Path) -> i32 {
    let config = match Config::from_json_file(path) {
        Ok(c) => c,
        Err(e) => {
            error!(path = %path.display(), "{e}");
            return 2;
        }
    };
    match serde_json::to_string_pretty(&config) {
        Ok(text) => {
            println!("{text}");
            0
        }
        Err(e) => {
            error!("failed to serialize config: {e}");
            2
        }
    }
}
