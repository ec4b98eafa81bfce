//! DupeLink - Hard-Link Based File Deduplicator
//!
//! A cross-platform Rust CLI application that merges byte-identical files
//! within one directory tree into OS hard links (shared on-disk storage,
//! independent directory entries), and can reverse the merge by inflating
//! a hard-link group back into independent copies.
//!
//! Two engines do the work, both exposed as lazy, pull-driven iterators
//! of per-file events:
//!
//! - [`dedup`]: two-tier SHA-256 fingerprinting, duplicate grouping,
//!   and hard-link creation
//! - [`inflate`]: file-identity resolution, link-group detection, and
//!   link breaking

pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod inflate;
pub mod logging;
pub mod output;
pub mod report;
pub mod scanner;
pub mod signal;

use anyhow::Result;

use crate::cli::{Cli, Commands, DedupArgs, InflateArgs};
use crate::config::Config;
use crate::dedup::{deduplicate, DedupAction, DedupOptions};
use crate::error::ExitCode;
use crate::inflate::{inflate, InflateAction, InflateOptions};
use crate::output::EventLog;
use crate::report::{DedupReport, InflateReport};
use crate::scanner::WalkerConfig;
use crate::signal::ShutdownHandler;

/// Run the application with parsed CLI arguments.
///
/// Initializes logging and signal handling, loads the persisted
/// configuration, and dispatches to the requested engine, consuming
/// its event stream until it ends or Ctrl+C stops the pull.
///
/// # Errors
///
/// Returns an error for failures outside the engines (for example an
/// unwritable event-log path). Engine-level failures are events, not
/// errors, and are reflected in the exit code instead.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load();
    let shutdown = signal::install_handler();

    match cli.command {
        Commands::Dedup(args) => run_dedup(args, &config, &shutdown),
        Commands::Inflate(args) => run_inflate(args, &config, &shutdown),
    }
}

/// Combine standing config patterns with per-run CLI patterns.
fn walker_config(config: &Config, cli_patterns: &[String]) -> WalkerConfig {
    let mut patterns = config.ignore_patterns.clone();
    patterns.extend(cli_patterns.iter().cloned());
    WalkerConfig::with_ignore_patterns(patterns)
}

fn run_dedup(args: DedupArgs, config: &Config, shutdown: &ShutdownHandler) -> Result<ExitCode> {
    let mut options = DedupOptions::default()
        .with_walker(walker_config(config, &args.ignore_patterns))
        .with_do_not_mark_read_only(args.no_read_only || !config.mark_read_only);
    options = if args.yes {
        options.with_confirm_all(true)
    } else {
        options.with_confirm(cli::prompt_confirm("Replace with hard link"))
    };

    let mut event_log = args
        .log
        .clone()
        .or_else(|| config.log_path.clone())
        .map(|path| EventLog::create(&path))
        .transpose()?;

    let mut report = DedupReport::default();
    let mut interrupted = false;
    for event in deduplicate(&args.path, options) {
        if shutdown.is_shutdown_requested() {
            interrupted = true;
            break;
        }
        report.record(&event);
        if event.action == DedupAction::Error {
            if let Some(message) = event.error.as_deref() {
                report::print_error(&event.path, message);
            }
        }
        if let Some(log) = event_log.as_mut() {
            log.record_dedup(&event)?;
        }
    }
    if let Some(log) = event_log.as_mut() {
        log.flush()?;
    }

    if !cli_quiet() {
        report.print_summary();
    }

    Ok(exit_code(
        interrupted,
        report.is_fatal(),
        report.errors,
        report.linked + report.skipped,
    ))
}

fn run_inflate(args: InflateArgs, config: &Config, shutdown: &ShutdownHandler) -> Result<ExitCode> {
    let mut options =
        InflateOptions::default().with_walker(walker_config(config, &args.ignore_patterns));
    options = if args.yes {
        options.with_confirm_all(true)
    } else {
        options.with_confirm(cli::prompt_confirm("Restore independent copy of"))
    };

    let mut event_log = args
        .log
        .clone()
        .or_else(|| config.log_path.clone())
        .map(|path| EventLog::create(&path))
        .transpose()?;

    let mut report = InflateReport::default();
    let mut interrupted = false;
    for event in inflate(&args.path, options) {
        if shutdown.is_shutdown_requested() {
            interrupted = true;
            break;
        }
        report.record(&event);
        if event.action == InflateAction::Error {
            if let Some(message) = event.error.as_deref() {
                report::print_error(&event.path, message);
            }
        }
        if let Some(log) = event_log.as_mut() {
            log.record_inflate(&event)?;
        }
    }
    if let Some(log) = event_log.as_mut() {
        log.flush()?;
    }

    if !cli_quiet() {
        report.print_summary();
    }

    Ok(exit_code(
        interrupted,
        report.is_fatal(),
        report.errors,
        report.inflated + report.skipped,
    ))
}

/// Whether error-only output was requested.
fn cli_quiet() -> bool {
    log::max_level() <= log::LevelFilter::Error
}

/// Map a finished run to its exit code.
fn exit_code(interrupted: bool, fatal: bool, errors: usize, work: usize) -> ExitCode {
    if interrupted {
        ExitCode::Interrupted
    } else if fatal {
        ExitCode::GeneralError
    } else if errors > 0 {
        ExitCode::PartialSuccess
    } else if work == 0 {
        ExitCode::NothingToDo
    } else {
        ExitCode::Success
    }
}
