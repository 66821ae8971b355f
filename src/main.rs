//! fstally - Parallel Filesystem Accounting
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use fstally::config::{CliArgs, WalkConfig};
use fstally::report;
use fstally::units;
use fstally::userdb::UserTable;
use fstally::walker::Walker;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments; clap exits with code 2 on a parse error
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    let config = WalkConfig::from_args(args).context("invalid configuration")?;

    // An interrupt discards partial results immediately; there is nothing
    // useful to print from a half-finished walk.
    ctrlc::set_handler(|| {
        eprintln!("# interrupted");
        std::process::exit(1);
    })
    .context("failed to set signal handler")?;

    // Snapshot the user database before any worker thread exists.
    let users = UserTable::snapshot();

    let walker = Walker::new(config.clone());
    let mut result = walker.run().context("walk failed")?;

    let rows = report::aggregate(&mut result.store, &config);
    report::print_report(&rows, &config, &users);

    // Status consumers already watch stderr; give them a closing line.
    if config.status_interval.is_some() {
        let stats = result.stats;
        eprintln!(
            "# walked {} directories ({} errors), {} files, {} in {:.1}s",
            stats.dirs,
            stats.errors,
            stats.files,
            units::to_human(stats.bytes),
            stats.duration.as_secs_f64(),
        );
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("fstally=debug,warn")
    } else {
        EnvFilter::new("fstally=warn")
    };

    // stdout carries the report; diagnostics belong on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
