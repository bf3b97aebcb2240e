//! Cadence CLI
//!
//! Run a configured simulation from a JSON file.

use cadence::prelude::*;
use cadence::setup;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cadence", version)]
#[command(about = "Run a multi-rate wave-propagation simulation", long_about = None)]
struct Args {
    /// Run configuration (JSON)
    config: PathBuf,

    /// Worker threads per process (overrides the config)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Simulated processes (overrides the config)
    #[arg(short, long)]
    processes: Option<usize>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,

    /// Verbose output (debug level); RUST_LOG takes precedence
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), RunError> {
    let mut config = RunConfig::load(&args.config)?;
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(processes) = args.processes {
        config.processes = processes;
    }
    config.validate()?;

    if args.check {
        info!(path = %args.config.display(), "configuration is valid");
        return Ok(());
    }

    for outcome in setup::run(&config, &TracingReporter)? {
        let report = &outcome.report;
        info!(
            rank = outcome.rank,
            dt_global = outcome.negotiated.dt_global,
            sync_points = report.sync_points,
            total_updates = report.total_updates,
            compute_secs = report.compute_time.as_secs_f64(),
            "rank finished"
        );
        for (cluster, updates) in &report.update_counts {
            info!(rank = outcome.rank, %cluster, updates, "cluster updates");
        }
    }
    Ok(())
}
