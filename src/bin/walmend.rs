//! walmend binary
//!
//! CLI entry point: argument parsing, log setup (console + event log +
//! error-only log), exit-code policy. Per-file problems are expected and
//! reported; a nonzero exit is reserved for run-level failures the tool
//! cannot reason about (unreadable directory, corrupt journal, state dir
//! not writable).

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use walmend::journal::RunStatus;
use walmend::{rollback, Config, RenameEngine};

/// Repair WAL segment files whose names no longer match their contents
#[derive(Parser, Debug)]
#[command(name = "walmend")]
#[command(about = "Rename mis-named WAL segment files to their canonical names")]
#[command(version)]
struct Args {
    /// Directory containing candidate WAL segment files
    wal_dir: PathBuf,

    /// WAL segment size in bytes (power of two, 1 MiB..=1 GiB)
    #[arg(short, long, default_value_t = walmend::config::DEFAULT_SEGMENT_SIZE)]
    segment_size: u64,

    /// Preview: journal and report everything, rename nothing
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Undo the renames recorded in the journal, newest first
    #[arg(long)]
    rollback: bool,

    /// Treat an out-of-range WAL format version as a warning, not an error
    #[arg(long)]
    allow_unsupported_version: bool,
}

fn main() {
    let args = Args::parse();

    // The state directory hosts the journal, reports and both log files;
    // being unable to create it is a run-level failure.
    let state_dir = args.wal_dir.join(walmend::journal::STATE_DIR);
    if let Err(e) = fs::create_dir_all(&state_dir) {
        eprintln!("cannot create state directory {}: {}", state_dir.display(), e);
        std::process::exit(1);
    }

    if let Err(e) = init_logging(&state_dir) {
        eprintln!("cannot open log files under {}: {}", state_dir.display(), e);
        std::process::exit(1);
    }

    tracing::info!("walmend v{}", walmend::VERSION);

    let config = match Config::builder()
        .wal_dir(&args.wal_dir)
        .segment_size(args.segment_size)
        .dry_run(args.dry_run)
        .allow_unsupported_version(args.allow_unsupported_version)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if args.rollback {
        run_rollback(&config);
        return;
    }

    let engine = match RenameEngine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("cannot start run: {}", e);
            std::process::exit(1);
        }
    };

    match engine.run() {
        Ok(report) => {
            println!("{}", report.summary());
        }
        Err(e) => {
            tracing::error!("run failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_rollback(config: &Config) {
    match rollback(config) {
        Ok(RunStatus::RolledBack) => {
            println!("rollback complete");
        }
        Ok(RunStatus::RolledBackWithWarnings) => {
            println!("rollback complete with warnings (see error log)");
        }
        Ok(status) => {
            tracing::error!("rollback left journal in unexpected state: {:?}", status);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("rollback failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Console layer (env-filtered), append-only event log, and a separate
/// error-only log, all under the state directory.
fn init_logging(state_dir: &std::path::Path) -> std::io::Result<()> {
    let event_log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(state_dir.join("walmend.log"))?;
    let error_log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(state_dir.join("walmend_error.log"))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,walmend=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(Arc::new(event_log)))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(error_log))
                .with_filter(LevelFilter::ERROR),
        )
        .init();

    Ok(())
}
