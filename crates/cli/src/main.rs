//! mpgate CLI - Report whether this host can run multi-process work
//!
//! Probes named-semaphore support and prints the verdict or the selected
//! execution backend.

mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::json;
use std::process::ExitCode;
use tracing::info;

use mpgate_core::application::{
    BackendSelector, CapabilityProber, ExecutionBackend, ExhaustionPolicy,
};
use mpgate_core::domain::{ProbeError, ProbeReport, Verdict};
use mpgate_core::{ProbeConfig, VERSION};
use mpgate_infra_system::default_provider;

/// Exit code when every candidate semaphore name collided
const EXIT_EXHAUSTED: u8 = 2;

#[derive(Parser)]
#[command(name = "mpgate")]
#[command(about = "Multiprocessing capability gate", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the semaphore name collision budget
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the named-semaphore probe and print the verdict
    Probe,

    /// Choose the execution backend from the probe verdict
    Select {
        /// What to do if no semaphore name could be found ("abort" or "serial")
        #[arg(long, default_value = "abort")]
        on_exhausted: ExhaustionPolicy,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose) {
        eprintln!("warning: {:#}", e);
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    info!("mpgate v{} starting...", VERSION);

    // 1. Load configuration
    let mut config = ProbeConfig::from_env().context("Failed to load probe configuration")?;
    if let Some(max_attempts) = cli.max_attempts {
        config = config
            .with_max_attempts(max_attempts)
            .context("Invalid --max-attempts")?;
    }

    // 2. Setup dependencies (DI wiring)
    let prober = CapabilityProber::new(config, default_provider());

    // 3. Run
    match cli.command {
        Commands::Probe => match prober.probe_report() {
            Ok(report) => {
                print_report(&report, cli.json)?;
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => Ok(report_exhausted(&e, cli.json)),
        },

        Commands::Select { on_exhausted } => {
            let selector = BackendSelector::new(prober, on_exhausted);
            match selector.select() {
                Ok(backend) => {
                    print_backend(backend, cli.json)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => Ok(report_exhausted(&e, cli.json)),
            }
        }
    }
}

fn print_report(report: &ProbeReport, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    match report.verdict {
        Verdict::Parallel => {
            println!("{}", "✓ Named semaphores work".green().bold());
            println!("  {} {}", "Verdict:".bold(), report.verdict.to_string().green());
        }
        Verdict::Serial => {
            println!("{}", "✗ Falling back to serial execution".yellow().bold());
            println!("  {} {}", "Verdict:".bold(), report.verdict.to_string().yellow());
            if let Some(reason) = report.reason {
                println!("  {} {}", "Reason:".bold(), reason);
            }
        }
    }
    println!("  {} {}", "Attempts:".bold(), report.attempts);
    Ok(())
}

fn print_backend(backend: ExecutionBackend, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string(&json!({ "backend": backend }))?);
        return Ok(());
    }

    let label = match backend {
        ExecutionBackend::MultiProcess => backend.to_string().green(),
        ExecutionBackend::Serial => backend.to_string().yellow(),
    };
    println!("  {} {}", "Backend:".bold(), label);
    Ok(())
}

fn report_exhausted(err: &ProbeError, as_json: bool) -> ExitCode {
    if as_json {
        println!("{}", json!({ "error": "exhausted", "message": err.to_string() }));
    } else {
        eprintln!("{} {}", "error:".red().bold(), err);
    }
    ExitCode::from(EXIT_EXHAUSTED)
}
