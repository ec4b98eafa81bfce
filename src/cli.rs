//! Command-line interface definitions for DupeLink.
//!
//! This module defines all CLI arguments, subcommands, and options using the
//! clap derive API, plus the interactive stdin confirmation policy used when
//! `--yes` is not given.
//!
//! # Example
//!
//! ```bash
//! # Merge duplicates under ~/Downloads into hard links, asking per file
//! dupelink dedup ~/Downloads
//!
//! # Same, but confirm everything up front and write a CSV event log
//! dupelink dedup ~/Downloads --yes --log dedup.csv
//!
//! # Break all hard-link groups back into independent copies
//! dupelink inflate ~/Downloads --yes
//!
//! # Verbose mode for debugging
//! dupelink -v dedup ~/Downloads
//! ```

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::dedup::ConfirmFn;

/// Hard-link based file deduplicator with inflate support.
///
/// DupeLink finds byte-identical files using two-tier SHA-256
/// fingerprinting and merges them into hard links sharing one on-disk
/// allocation. The inflate subcommand reverses the merge, restoring
/// independent copies.
#[derive(Debug, Parser)]
#[command(name = "dupelink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for DupeLink.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge byte-identical files into hard links
    Dedup(DedupArgs),
    /// Break hard-link groups back into independent copies
    Inflate(InflateArgs),
}

/// Arguments for the dedup subcommand.
#[derive(Debug, Args)]
pub struct DedupArgs {
    /// Directory tree to deduplicate
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Link every duplicate without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Leave new links writable instead of marking them read-only
    ///
    /// Read-only links protect the shared allocation: an in-place edit
    /// through any one entry would otherwise change the master and all
    /// of its siblings.
    #[arg(long)]
    pub no_read_only: bool,

    /// Write every event to a CSV log at this path
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Glob patterns to ignore (can be specified multiple times)
    ///
    /// These patterns are added to any .gitignore patterns found.
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,
}

/// Arguments for the inflate subcommand.
#[derive(Debug, Args)]
pub struct InflateArgs {
    /// Directory tree to inflate
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Inflate every link-group member without prompting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Write every event to a CSV log at this path
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Glob patterns to ignore (can be specified multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,
}

/// Build an interactive stdin confirmation policy.
///
/// Prompts once per candidate with `[y/N/a]`; answering `a` memoizes
/// an apply-to-all and the callback allows every later candidate
/// without prompting again. An unreadable stdin denies.
#[must_use]
pub fn prompt_confirm(prompt: &'static str) -> ConfirmFn {
    let mut apply_to_all = false;
    Box::new(move |path: &Path| {
        if apply_to_all {
            return true;
        }
        loop {
            print!("{} {}? [y/N/a] ", prompt, path.display());
            let _ = io::stdout().flush();

            let mut line = String::new();
            if io::stdin().read_line(&mut line).is_err() {
                return false;
            }
            match line.trim().to_lowercase().as_str() {
                "y" | "yes" => return true,
                "a" | "all" => {
                    apply_to_all = true;
                    return true;
                }
                "" | "n" | "no" => return false,
                _ => println!("Please answer y, n, or a."),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_dedup() {
        let cli = Cli::parse_from(["dupelink", "dedup", "/data", "--yes", "--no-read-only"]);
        match cli.command {
            Commands::Dedup(args) => {
                assert_eq!(args.path, PathBuf::from("/data"));
                assert!(args.yes);
                assert!(args.no_read_only);
                assert!(args.log.is_none());
            }
            Commands::Inflate(_) => panic!("expected dedup"),
        }
    }

    #[test]
    fn test_parse_inflate_with_log_and_ignores() {
        let cli = Cli::parse_from([
            "dupelink", "inflate", "/data", "--log", "events.csv", "-i", "*.tmp", "-i", "*.log",
        ]);
        match cli.command {
            Commands::Inflate(args) => {
                assert_eq!(args.log, Some(PathBuf::from("events.csv")));
                assert_eq!(args.ignore_patterns, vec!["*.tmp", "*.log"]);
            }
            Commands::Dedup(_) => panic!("expected inflate"),
        }
    }

    #[test]
    fn test_verbose_is_global_and_counted() {
        let cli = Cli::parse_from(["dupelink", "dedup", "/data", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }
}
