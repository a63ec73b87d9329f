//! `qtest`: run queue command scripts against the reference engine.
//!
//! # Exit Codes
//!
//! - `0`: every command passed and teardown released all blocks
//! - `1`: a command failed, a fault occurred or blocks leaked

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use qtest_rs::{Config, Console, Reporter, SimRng};

#[derive(Debug, Parser)]
#[command(name = "qtest", version, about = "Queue verification console")]
struct Args {
    /// Read commands from this file instead of stdin.
    #[arg(short = 'f', value_name = "IFILE")]
    file: Option<PathBuf>,

    /// Verbosity level.
    #[arg(short = 'v', value_name = "VLEVEL", default_value_t = 4,
          value_parser = clap::value_parser!(u8).range(0..=5))]
    verbosity: u8,

    /// Copy all output to this file.
    #[arg(short = 'l', value_name = "LFILE")]
    log: Option<PathBuf>,

    /// Fix the RNG seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Write a JSON crash dump here if the run ends on a fatal fault.
    #[arg(long, value_name = "PATH")]
    dump: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(args: Args) -> Result<bool> {
    let seed = args.seed.unwrap_or_else(SimRng::seed_from_clock);
    tracing::debug!(seed, "starting");

    let mut reporter = Reporter::stdout(args.verbosity);
    if let Some(path) = &args.log {
        reporter
            .set_log(path)
            .with_context(|| format!("failed opening log file {}", path.display()))?;
    }

    let mut console = Console::reference(Config::with_verbosity(args.verbosity), seed, reporter);
    match &args.file {
        Some(path) => console
            .push_file(path)
            .with_context(|| format!("failed opening command file {}", path.display()))?,
        None => console.push_input("stdin", Box::new(io::stdin().lock())),
    }

    console.run();
    let outcome = console.finish();

    if let (Some(path), Some(dump)) = (&args.dump, console.crash_dump()) {
        dump.write_to(path)
            .with_context(|| format!("failed writing crash dump {}", path.display()))?;
        tracing::info!(path = %path.display(), "crash dump written");
    }
    tracing::debug!(?outcome, "finished");
    Ok(outcome.ok)
}

fn main() -> ExitCode {
    init_tracing();
    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("qtest: {err:#}");
            ExitCode::FAILURE
        }
    }
}
