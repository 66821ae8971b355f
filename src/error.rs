//! Error types for fstally
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include the path and the underlying errno
//! - Per-entry errors are absorbed where they occur; per-directory errors
//!   become ErrResults; only startup and root errors abort the run

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the fstally application
#[derive(Error, Debug)]
pub enum TallyError {
    /// Configuration errors (bad patterns, bad limits)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    /// A root directory could not be read
    #[error("cannot access root '{path}': {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O errors outside the traversal itself
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel closed unexpectedly
    #[error("channel closed unexpectedly")]
    ChannelClosed,
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid exclude pattern
    #[error("invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },

    /// Invalid include pattern
    #[error("invalid include pattern '{pattern}': {reason}")]
    InvalidIncludePattern { pattern: String, reason: String },

    /// Invalid file or size limit
    #[error("invalid limit '{value}': {reason}")]
    InvalidLimit { value: String, reason: String },

    /// Invalid status interval
    #[error("invalid status interval {seconds}: must be a finite number of seconds >= 0")]
    InvalidStatusInterval { seconds: f64 },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("worker {id} panicked")]
    Panicked { id: usize },

    /// Worker thread could not be started
    #[error("failed to start worker {id}: {source}")]
    SpawnFailed {
        id: usize,
        #[source]
        source: std::io::Error,
    },

    /// A directory failed with an errno the worker does not absorb
    #[error("worker {id} failed on '{path}': {source}")]
    DirFailed {
        id: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for TallyError
pub type Result<T> = std::result::Result<T, TallyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let cfg_err = ConfigError::InvalidLimit {
            value: "12Q".into(),
            reason: "unknown unit".into(),
        };
        let top: TallyError = cfg_err.into();
        assert!(matches!(top, TallyError::Config(_)));
    }

    #[test]
    fn test_root_error_display() {
        let err = TallyError::Root {
            path: PathBuf::from("/no/such"),
            source: std::io::Error::from_raw_os_error(2),
        };
        let msg = err.to_string();
        assert!(msg.contains("/no/such"));
        assert!(msg.contains("os error 2"));
    }
}
