//! Per-directory accounting
//!
//! One call accounts exactly one directory:
//! 1. Enumerate entries, apply the exclude filter, partition into
//!    subdirectories and everything else using the d_type hint
//! 2. Stat the non-directories, rescuing entries whose hint was missing,
//!    apply the include filter and the hard-link rule, tally per UID
//! 3. Announce the child count to the coordinator, then stat the
//!    subdirectory list, credit each matching directory inode and submit
//!    its work item
//! 4. Emit the DirResult
//!
//! The announce-before-enqueue ordering in step 3 is what keeps the
//! termination protocol sound: a child's completion can never reach the
//! coordinator before its submission has been counted.
//!
//! Workers are threads sharing one process, so nothing here touches the
//! process working directory; every syscall takes an absolute path built
//! from the work item.

use crate::config::WalkConfig;
use crate::walker::parallel_stat::stat_each;
use crate::walker::queue::{
    DirResult, ErrResult, ResultMsg, StateMsg, UidMap, Work, WorkItem, WorkerChannels,
};
use crate::walker::reader::DirReader;
use std::collections::HashSet;
use std::ffi::OsString;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use tracing::debug;

/// Entries between progress ticks to the coordinator
const PROGRESS_TICK: u64 = 10_000;

/// Outcome of accounting one directory
#[derive(Debug)]
pub enum DirOutcome {
    /// Accounted; a DirResult was emitted
    Completed { entries: usize, subdirs: usize },

    /// Could not be opened for a tolerated reason; an ErrResult was emitted
    Skipped,

    /// Failed with an errno the worker does not absorb; protocol messages
    /// were still emitted so the walk terminates
    Failed(io::Error),
}

/// Running tally for the directory being accounted
#[derive(Default)]
struct Tally {
    files_by_uid: UidMap,
    size_by_uid: UidMap,
    // Deltas since the last progress tick
    count_delta: u64,
    size_delta: u64,
}

impl Tally {
    fn credit_file(&mut self, uid: u32, size: Option<u64>) {
        *self.files_by_uid.entry(uid).or_insert(0) += 1;
        self.count_delta += 1;
        if let Some(size) = size {
            *self.size_by_uid.entry(uid).or_insert(0) += size;
            self.size_delta += size;
        }
    }

    fn credit_dir_inode(&mut self, uid: u32, size: u64) {
        *self.size_by_uid.entry(uid).or_insert(0) += size;
        self.size_delta += size;
    }

    fn flush_progress(&mut self, dir: &Path, channels: &WorkerChannels) {
        if self.count_delta == 0 && self.size_delta == 0 {
            return;
        }
        let _ = channels.state.send(StateMsg::Progress {
            dir: dir.to_path_buf(),
            count: self.count_delta,
            size: self.size_delta,
        });
        self.count_delta = 0;
        self.size_delta = 0;
    }
}

/// Account a single directory, emitting all protocol messages.
pub fn account_directory(
    worker_id: usize,
    item: &WorkItem,
    config: &WalkConfig,
    channels: &WorkerChannels,
    hardlinks: &mut HashSet<u64>,
) -> DirOutcome {
    let path = item.path();

    let reader = match DirReader::open(&path) {
        Ok(reader) => reader,
        Err(e) => {
            report_dir_error(&path, &e);
            let _ = channels.results.send(ResultMsg::Err(ErrResult { path: path.clone() }));
            let _ = channels.state.send(StateMsg::DirDone { worker_id, submitted: 0 });
            return if is_tolerated(&e) {
                DirOutcome::Skipped
            } else {
                DirOutcome::Failed(e)
            };
        }
    };

    // Phase 1: enumerate and partition
    let mut dirs: Vec<OsString> = Vec::new();
    let mut files_maybe: Vec<OsString> = Vec::new();
    let mut enumeration_error: Option<io::Error> = None;

    for entry in reader {
        match entry {
            Ok((name, hint)) => {
                let abs = path.join(&name);
                if config.is_excluded(&abs.to_string_lossy()) {
                    continue;
                }
                if hint.is_some_and(|t| t.is_dir()) {
                    dirs.push(name);
                } else {
                    files_maybe.push(name);
                }
            }
            Err(e) => {
                // The sequence ends here; account what we saw.
                report_dir_error(&path, &e);
                enumeration_error = Some(e);
                break;
            }
        }
    }

    let mut tally = Tally::default();
    let mut entries = 0usize;

    // Phase 2: stat the non-directories
    stat_each(&path, files_maybe, |name, record| {
        let md = match record {
            Ok(md) => md,
            Err(e) => {
                report_entry_error(&path.join(&name), &e);
                return;
            }
        };
        if md.is_dir() {
            // d_type was unavailable; this entry is really a subdirectory.
            dirs.push(name);
            return;
        }
        entries += 1;
        if !config.matches_include(&path.join(&name).to_string_lossy()) {
            return;
        }
        let credit_size =
            md.nlink() == 1 || !hardlinks.contains(&md.ino());
        if md.nlink() > 1 {
            hardlinks.insert(md.ino());
        }
        tally.credit_file(md.uid(), credit_size.then(|| md.len()));
        if tally.count_delta >= PROGRESS_TICK {
            tally.flush_progress(&path, channels);
        }
    });

    // Phase 3: announce, then stat and submit the children
    let _ = channels.state.send(StateMsg::DirDone {
        worker_id,
        submitted: dirs.len() as u64,
    });

    let mut subdirs = 0usize;
    stat_each(&path, dirs, |name, record| {
        let child_path = path.join(&name);
        let md = match record {
            Ok(md) => md,
            Err(e) => {
                // The announce above already counted this child, so it is
                // retired here the same way an unreadable directory is.
                report_entry_error(&child_path, &e);
                let _ = channels
                    .results
                    .send(ResultMsg::Err(ErrResult { path: child_path }));
                let _ = channels.state.send(StateMsg::DirDone { worker_id, submitted: 0 });
                return;
            }
        };
        subdirs += 1;
        if config.matches_include(&child_path.to_string_lossy()) {
            tally.credit_dir_inode(md.uid(), md.len());
        }
        let _ = channels.work_tx.send(Work::Dir(WorkItem {
            parent_path: path.clone(),
            name,
            parent_inode: item.inode,
            inode: md.ino(),
        }));
    });

    // Phase 4: final tick and the result record
    tally.flush_progress(&path, channels);
    let _ = channels.results.send(ResultMsg::Dir(DirResult {
        name: item.name.to_string_lossy().into_owned(),
        parent_inode: item.parent_inode,
        inode: item.inode,
        files_by_uid: tally.files_by_uid,
        size_by_uid: tally.size_by_uid,
    }));

    debug!(worker = worker_id, path = %path.display(), entries, subdirs, "directory accounted");

    match enumeration_error {
        Some(e) if !is_tolerated(&e) => DirOutcome::Failed(e),
        _ => DirOutcome::Completed { entries, subdirs },
    }
}

/// EACCES and ENOENT are expected on live filesystems and absorbed.
fn is_tolerated(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound
    )
}

fn report_dir_error(path: &Path, e: &io::Error) {
    if e.kind() == io::ErrorKind::PermissionDenied {
        eprintln!("# access denied to directory {}", path.display());
    } else {
        eprintln!("# could not access dir,file or file in dir {}", path.display());
    }
}

fn report_entry_error(path: &Path, _e: &io::Error) {
    eprintln!("# could not access dir,file or file in dir {}", path.display());
}
