//! Streaming directory enumeration
//!
//! Yields `(name, kind-hint)` pairs one at a time so directories with
//! millions of entries never materialize in memory. The kind hint is the
//! filesystem's d_type when the kernel provides one; `None` means the
//! caller must stat to classify the entry. `.` and `..` are never yielded.
//!
//! The directory handle is released when the reader drops, on every exit
//! path including errors raised mid-iteration.

use std::ffi::OsString;
use std::fs::{self, FileType};
use std::io;
use std::path::Path;

/// Lazy reader over one directory
#[derive(Debug)]
pub struct DirReader {
    inner: fs::ReadDir,
}

impl DirReader {
    /// Open a directory for streaming enumeration.
    ///
    /// Open failures (EACCES, ENOENT, ...) surface here; they are a
    /// directory-level error for the caller to classify.
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            inner: fs::read_dir(path)?,
        })
    }
}

impl Iterator for DirReader {
    type Item = io::Result<(OsString, Option<FileType>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.inner.next()?;
        Some(entry.map(|e| {
            // file_type() is the d_type hint; when the filesystem reports
            // DT_UNKNOWN the error maps to None and the stat pass decides.
            let hint = e.file_type().ok();
            (e.file_name(), hint)
        }))
    }
}
