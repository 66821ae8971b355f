//! Worker thread logic for the parallel walk
//!
//! Each worker:
//! - Pulls directory work items from the shared work queue
//! - Runs the accountant on each, emitting results and state messages
//! - Keeps a worker-local set of hard-linked inodes it has credited
//! - Exits on a shutdown message
//!
//! The hard-link set being worker-local means dedup is exact within one
//! worker and approximate across workers; that is the accepted
//! accuracy-for-throughput tradeoff of this design.

use crate::config::WalkConfig;
use crate::error::WorkerError;
use crate::walker::accountant::{account_directory, DirOutcome};
use crate::walker::queue::{Work, WorkerChannels};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace};

/// A worker thread processing directory work items
pub struct Worker {
    id: usize,
    handle: Option<JoinHandle<Result<(), WorkerError>>>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(
        id: usize,
        config: Arc<WalkConfig>,
        channels: WorkerChannels,
    ) -> Result<Self, WorkerError> {
        let handle = thread::Builder::new()
            .name(format!("tally-{id}"))
            .spawn(move || worker_loop(id, &config, &channels))
            .map_err(|source| WorkerError::SpawnFailed { id, source })?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }

    /// Worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| WorkerError::Panicked { id: self.id })?,
            None => Ok(()),
        }
    }
}

/// Main worker loop
fn worker_loop(
    id: usize,
    config: &WalkConfig,
    channels: &WorkerChannels,
) -> Result<(), WorkerError> {
    debug!(worker = id, "worker starting");

    let mut hardlinks: HashSet<u64> = HashSet::new();
    let mut fatal: Option<WorkerError> = None;

    while let Ok(work) = channels.work_rx.recv() {
        let item = match work {
            Work::Dir(item) => item,
            Work::Shutdown => break,
        };

        match account_directory(id, &item, config, channels, &mut hardlinks) {
            DirOutcome::Completed { entries, subdirs } => {
                trace!(worker = id, path = %item.path().display(), entries, subdirs, "done");
            }
            DirOutcome::Skipped => {}
            DirOutcome::Failed(e) => {
                // The directory's protocol messages are already out, so the
                // walk still terminates; remember the first failure and keep
                // draining the queue.
                error!(worker = id, path = %item.path().display(), error = %e, "unrecoverable directory error");
                if fatal.is_none() {
                    fatal = Some(WorkerError::DirFailed {
                        id,
                        path: item.path(),
                        source: e,
                    });
                }
            }
        }
    }

    debug!(
        worker = id,
        hardlinked_inodes = hardlinks.len(),
        "worker shutting down"
    );

    match fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::queue::{ResultMsg, WalkQueues, WorkItem};
    use std::fs;
    use std::os::unix::fs::MetadataExt;
    use std::path::Path;

    fn test_config(root: &Path) -> WalkConfig {
        WalkConfig {
            roots: vec![root.to_path_buf()],
            max_depth: u64::MAX,
            file_limit: 0,
            size_limit: 0,
            exclude: None,
            include: None,
            exclude_subdirs: false,
            quiet: true,
            per_user: false,
            human_readable: false,
            status_interval: None,
            worker_count: 1,
        }
    }

    #[test]
    fn test_worker_processes_until_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("f"), b"abc").unwrap();

        let queues = WalkQueues::new();
        let config = Arc::new(test_config(dir.path()));
        let inode = fs::symlink_metadata(dir.path()).unwrap().ino();

        queues
            .work_tx
            .send(Work::Dir(WorkItem::root(dir.path(), inode)))
            .unwrap();
        queues.work_tx.send(Work::Shutdown).unwrap();

        let worker = Worker::spawn(0, config, queues.worker_channels()).unwrap();
        worker.join().unwrap();

        match queues.result_rx.recv().unwrap() {
            ResultMsg::Dir(result) => {
                assert_eq!(result.inode, inode);
                assert_eq!(result.size_by_uid.values().sum::<u64>(), 3);
            }
            ResultMsg::Err(e) => panic!("unexpected error result: {e:?}"),
        }
    }
}
