//! Parallel traversal and accounting engine
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!                 │          main flow           │
//!                 │  seed roots, collect results │
//!                 └───────┬──────────────▲───────┘
//!                         │ work         │ results
//!       ┌─────────────────┼──────────────┼─────────────────┐
//!       │                 ▼              │                 │
//! ┌─────┴─────┐     ┌───────────┐    ┌───┴───────┐   ┌─────┴─────┐
//! │  Worker 0 │     │  Worker 1 │    │ Worker .. │   │  Worker W │
//! │ enumerate │     │ enumerate │    │ enumerate │   │ enumerate │
//! │ stat+tally│     │ stat+tally│    │ stat+tally│   │ stat+tally│
//! └─────┬─────┘     └─────┬─────┘    └─────┬─────┘   └─────┬─────┘
//!       │ state           │                │               │
//!       └─────────────────┴───────┬────────┴───────────────┘
//!                                 ▼
//!                        ┌────────────────┐
//!                        │  Coordinator   │
//!                        │ submitted/done │
//!                        │  quiescence    │
//!                        └────────────────┘
//! ```
//!
//! Workers pull directories from the shared work queue, account them, and
//! push discovered children back. The coordinator balances announced
//! submissions against completions; when the sums meet it fans out one
//! shutdown message per worker and tells the main flow how many results
//! to collect.

pub mod accountant;
pub mod coordinator;
pub mod parallel_stat;
pub mod queue;
pub mod reader;
pub mod worker;

use crate::config::WalkConfig;
use crate::error::{Result, TallyError};
use crate::report::ResultStore;
use crate::walker::coordinator::Coordinator;
use crate::walker::queue::{ManagerDone, ResultMsg, StateMsg, WalkQueues, Work, WorkItem};
use crate::walker::worker::Worker;
use crossbeam_channel::select;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Result of a completed walk
#[derive(Debug)]
pub struct WalkReport {
    /// Per-directory results, keyed for aggregation
    pub store: ResultStore,

    /// Aggregate statistics
    pub stats: WalkStats,
}

/// Aggregate statistics for one walk
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkStats {
    /// Directories successfully accounted
    pub dirs: u64,

    /// Directories that produced an error result
    pub errors: u64,

    /// Files observed via progress ticks
    pub files: u64,

    /// Bytes observed via progress ticks
    pub bytes: u64,

    /// Wall-clock time of the walk
    pub duration: Duration,
}

/// The parallel walk engine
pub struct Walker {
    config: Arc<WalkConfig>,
}

impl Walker {
    /// Create a walker for the given configuration
    pub fn new(config: WalkConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Run the walk to completion and collect every per-directory result.
    pub fn run(&self) -> Result<WalkReport> {
        let start = Instant::now();
        let roots = self.root_items()?;
        let queues = WalkQueues::new();

        info!(
            roots = roots.len(),
            workers = self.config.worker_count,
            "starting walk"
        );

        // Bootstrap the termination counters: the injection itself plus one
        // submission per root, paired with the one extra `done` that
        // total_work subtracts back out.
        queues
            .state_tx
            .send(StateMsg::DirDone {
                worker_id: 0,
                submitted: 1 + roots.len() as u64,
            })
            .map_err(|_| TallyError::ChannelClosed)?;

        for item in roots {
            queues
                .work_tx
                .send(Work::Dir(item))
                .map_err(|_| TallyError::ChannelClosed)?;
        }

        let coordinator = Coordinator::spawn(
            self.config.worker_count,
            self.config.status_interval,
            queues.state_rx.clone(),
            queues.work_tx.clone(),
            queues.manager_tx.clone(),
        )?;

        let mut workers = Vec::with_capacity(self.config.worker_count);
        for id in 0..self.config.worker_count {
            workers.push(Worker::spawn(
                id,
                Arc::clone(&self.config),
                queues.worker_channels(),
            )?);
        }

        let (store, received, errors, manager) = collect_results(&queues)?;

        let mut failure: Option<TallyError> = None;
        for worker in workers {
            if let Err(e) = worker.join() {
                warn!(error = %e, "worker finished with error");
                failure.get_or_insert(e.into());
            }
        }
        coordinator.join();

        if let Some(e) = failure {
            return Err(e);
        }

        let stats = WalkStats {
            dirs: received - errors,
            errors,
            files: manager.files,
            bytes: manager.bytes,
            duration: start.elapsed(),
        };

        info!(
            dirs = stats.dirs,
            errors = stats.errors,
            secs = stats.duration.as_secs(),
            "walk complete"
        );

        Ok(WalkReport { store, stats })
    }

    /// Stat the roots and build their work items. Any unreadable root is
    /// fatal before the walk begins.
    fn root_items(&self) -> Result<Vec<WorkItem>> {
        let mut items = Vec::with_capacity(self.config.roots.len());
        for root in &self.config.roots {
            let md = fs::symlink_metadata(root).map_err(|source| TallyError::Root {
                path: root.clone(),
                source,
            })?;
            if !md.is_dir() {
                return Err(TallyError::Root {
                    path: root.clone(),
                    source: std::io::Error::other("not a directory"),
                });
            }
            items.push(WorkItem::root(root, md.ino()));
        }
        Ok(items)
    }
}

/// Consume the result queue until the coordinator's announced total has
/// arrived. Returns the filled store, counts, and the manager record.
fn collect_results(queues: &WalkQueues) -> Result<(ResultStore, u64, u64, ManagerDone)> {
    let mut store = ResultStore::default();
    let mut received = 0u64;
    let mut errors = 0u64;

    let absorb = |msg: ResultMsg, store: &mut ResultStore, errors: &mut u64| {
        if let ResultMsg::Dir(result) = msg {
            store.insert(result);
        } else {
            *errors += 1;
        }
    };

    // Phase 1: results stream in while the walk runs.
    let manager = loop {
        select! {
            recv(queues.result_rx) -> msg => {
                let msg = msg.map_err(|_| TallyError::ChannelClosed)?;
                absorb(msg, &mut store, &mut errors);
                received += 1;
            }
            recv(queues.manager_rx) -> manager => {
                break manager.map_err(|_| TallyError::ChannelClosed)?;
            }
        }
    };

    // Phase 2: drain the stragglers already in flight.
    while received < manager.total_work {
        let msg = queues
            .result_rx
            .recv()
            .map_err(|_| TallyError::ChannelClosed)?;
        absorb(msg, &mut store, &mut errors);
        received += 1;
    }

    Ok((store, received, errors, manager))
}
