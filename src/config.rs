//! Configuration types for fstally
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation (compiled filter patterns,
//!   parsed limits, de-duplicated roots)

use crate::error::ConfigError;
use crate::units;
use clap::{ArgAction, Parser};
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

/// Default worker count; raise with --workers for high-latency filesystems
const DEFAULT_WORKERS: usize = 8;

/// Parallel filesystem accounting
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fstally",
    version,
    about = "Count files and bytes per directory, in parallel",
    long_about = "Walks one or more directory trees with a pool of worker threads and \
                  reports, per directory, the cumulative number of regular files and \
                  bytes they contain, optionally split by owning user.\n\n\
                  Sizes come from lstat, so symlinks are counted as themselves and \
                  never followed. Hard links are credited once per worker.",
    after_help = "EXAMPLES:\n    \
        fstally /srv/data\n    \
        fstally -d 2 -h /srv/data /srv/archive\n    \
        fstally -u -k 10G --exclude '.*\\.snapshot.*' /srv/data\n    \
        fstally -w 32 -s 5 /mnt/nfs/huge",
    disable_help_flag = true
)]
pub struct CliArgs {
    /// Root directories to walk (default: current directory)
    #[arg(value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Maximum depth of reported directories (0 = roots only)
    #[arg(short = 'd', long, value_name = "DEPTH")]
    pub max_depth: Option<u64>,

    /// Minimum file count for a row to be reported (accepts K/M/G/... suffix)
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub file_limit: Option<String>,

    /// Minimum byte count for a row to be reported (accepts K/M/G/... suffix)
    #[arg(short = 'k', long, value_name = "BYTES")]
    pub size_limit: Option<String>,

    /// Skip paths matching this regex (anchored at end of path)
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Option<String>,

    /// Only credit paths matching this regex (anchored at end of path);
    /// non-matching directories are still traversed
    #[arg(long, value_name = "PATTERN")]
    pub include: Option<String>,

    /// Report direct counts per directory only, no subtree roll-up
    #[arg(long)]
    pub exclude_subdirs: bool,

    /// Suppress the column header
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Split output rows by owning user
    #[arg(short = 'u', long)]
    pub user: bool,

    /// Render sizes with unit suffixes
    #[arg(short = 'h', long)]
    pub human_readable: bool,

    /// Write a progress line to stderr every SECS seconds
    #[arg(short = 's', long, value_name = "SECS")]
    pub status: Option<f64>,

    /// Number of worker threads
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS, value_name = "NUM")]
    pub workers: usize,

    /// Verbose logging (show per-directory diagnostics)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Print help (-h is taken by --human-readable)
    #[arg(long, action = ArgAction::HelpLong)]
    help: Option<bool>,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Root directories, de-duplicated by path prefix
    pub roots: Vec<PathBuf>,

    /// Inclusive depth cap on output rows
    pub max_depth: u64,

    /// Minimum file count to emit a row
    pub file_limit: u64,

    /// Minimum byte count to emit a row
    pub size_limit: u64,

    /// Compiled exclude pattern
    pub exclude: Option<Regex>,

    /// Compiled include pattern
    pub include: Option<Regex>,

    /// Direct counts only, no roll-up
    pub exclude_subdirs: bool,

    /// Suppress column header
    pub quiet: bool,

    /// Split tallies by owning UID
    pub per_user: bool,

    /// Human-readable sizes in output
    pub human_readable: bool,

    /// Progress report interval, None = disabled
    pub status_interval: Option<Duration>,

    /// Number of worker threads
    pub worker_count: usize,
}

impl WalkConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let exclude = args
            .exclude
            .as_deref()
            .map(|p| {
                anchored(p).map_err(|e| ConfigError::InvalidExcludePattern {
                    pattern: p.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let include = args
            .include
            .as_deref()
            .map(|p| {
                anchored(p).map_err(|e| ConfigError::InvalidIncludePattern {
                    pattern: p.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let file_limit = parse_limit(args.file_limit.as_deref())?;
        let size_limit = parse_limit(args.size_limit.as_deref())?;

        let status_interval = match args.status {
            None => None,
            Some(s) if s.is_finite() && s >= 0.0 => Some(Duration::from_secs_f64(s)),
            Some(s) => return Err(ConfigError::InvalidStatusInterval { seconds: s }),
        };

        let roots = if args.roots.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            dedup_roots(args.roots)
        };

        Ok(Self {
            roots,
            max_depth: args.max_depth.unwrap_or(u64::MAX),
            file_limit,
            size_limit,
            exclude,
            include,
            exclude_subdirs: args.exclude_subdirs,
            quiet: args.quiet,
            per_user: args.user,
            human_readable: args.human_readable,
            status_interval,
            worker_count: args.workers.max(1),
        })
    }

    /// Check if a path matches the exclude pattern
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude.as_ref().is_some_and(|re| re.is_match(path))
    }

    /// Check if a path passes the include pattern (no pattern = everything)
    pub fn matches_include(&self, path: &str) -> bool {
        self.include.as_ref().map_or(true, |re| re.is_match(path))
    }
}

/// Compile a filter pattern, implicitly anchored at end of path.
///
/// Path-prefix semantics belong in the pattern itself; only the tail is
/// pinned so `.*\.tmp` matches `/data/a.tmp` but not `/data/a.tmp.bak`.
pub fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?:{pattern})$"))
}

fn parse_limit(value: Option<&str>) -> Result<u64, ConfigError> {
    match value {
        None => Ok(0),
        Some(v) => units::from_human(v).map_err(|e| ConfigError::InvalidLimit {
            value: v.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Drop roots that are nested inside (or duplicates of) another root.
fn dedup_roots(roots: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut kept: Vec<PathBuf> = Vec::new();
    for (i, root) in roots.iter().enumerate() {
        let dominated = roots.iter().enumerate().any(|(j, other)| {
            j != i
                && root.starts_with(other)
                && (other.as_os_str().len() < root.as_os_str().len() || j < i)
        });
        if !dominated {
            kept.push(root.clone());
        }
    }
    kept
}
