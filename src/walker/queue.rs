//! Work items, result records and the channels that carry them
//!
//! Three unbounded FIFO channels connect the moving parts:
//! - work queue: main/workers -> workers (directories to account)
//! - result queue: workers -> main (one DirResult or ErrResult per directory)
//! - state queue: workers/main -> coordinator (completion counts, progress)
//!
//! A fourth, the manager channel, carries the single quiescence
//! notification from the coordinator back to the main flow.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;

/// Per-UID tally map (count of files, or byte totals)
pub type UidMap = HashMap<u32, u64>;

/// A directory pending accounting
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// Absolute path of the parent directory; empty for roots
    pub parent_path: PathBuf,

    /// Entry name within the parent; for roots, the root path as typed
    pub name: OsString,

    /// Inode of the parent directory; 0 for roots
    pub parent_inode: u64,

    /// Inode of this directory
    pub inode: u64,
}

impl WorkItem {
    /// Create a root work item from a user-supplied path
    pub fn root(path: &std::path::Path, inode: u64) -> Self {
        Self {
            parent_path: PathBuf::new(),
            name: path.as_os_str().to_os_string(),
            parent_inode: 0,
            inode,
        }
    }

    /// Absolute path of the directory itself
    pub fn path(&self) -> PathBuf {
        self.parent_path.join(&self.name)
    }
}

/// Message on the work queue
#[derive(Debug)]
pub enum Work {
    /// A directory to account
    Dir(WorkItem),

    /// Stop the receiving worker
    Shutdown,
}

/// Direct tally for one completed directory
#[derive(Debug, Clone)]
pub struct DirResult {
    /// Entry name, joined under the parent's path in the final report
    pub name: String,

    /// Inode of the parent directory (0 for roots)
    pub parent_inode: u64,

    /// Inode of this directory
    pub inode: u64,

    /// Direct file counts per owning UID
    pub files_by_uid: UidMap,

    /// Direct byte totals per owning UID
    pub size_by_uid: UidMap,
}

/// A directory that could not be accounted; counts toward termination only
#[derive(Debug, Clone)]
pub struct ErrResult {
    /// Path that failed
    pub path: PathBuf,
}

/// Message on the result queue
#[derive(Debug)]
pub enum ResultMsg {
    Dir(DirResult),
    Err(ErrResult),
}

/// Message on the state queue
#[derive(Debug)]
pub enum StateMsg {
    /// A directory finished; `submitted` children were announced
    DirDone { worker_id: usize, submitted: u64 },

    /// Periodic tally tick from inside a large directory
    Progress { dir: PathBuf, count: u64, size: u64 },
}

/// Quiescence notification from the coordinator
#[derive(Debug, Clone, Copy)]
pub struct ManagerDone {
    /// Number of result messages the main flow must collect
    pub total_work: u64,

    /// Cumulative file count observed via progress ticks
    pub files: u64,

    /// Cumulative byte count observed via progress ticks
    pub bytes: u64,
}

/// The channel ends a single worker needs
#[derive(Clone)]
pub struct WorkerChannels {
    pub work_tx: Sender<Work>,
    pub work_rx: Receiver<Work>,
    pub results: Sender<ResultMsg>,
    pub state: Sender<StateMsg>,
}

/// All channels for one walk
pub struct WalkQueues {
    pub work_tx: Sender<Work>,
    pub work_rx: Receiver<Work>,
    pub result_tx: Sender<ResultMsg>,
    pub result_rx: Receiver<ResultMsg>,
    pub state_tx: Sender<StateMsg>,
    pub state_rx: Receiver<StateMsg>,
    pub manager_tx: Sender<ManagerDone>,
    pub manager_rx: Receiver<ManagerDone>,
}

impl WalkQueues {
    pub fn new() -> Self {
        let (work_tx, work_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        let (state_tx, state_rx) = unbounded();
        let (manager_tx, manager_rx) = unbounded();
        Self {
            work_tx,
            work_rx,
            result_tx,
            result_rx,
            state_tx,
            state_rx,
            manager_tx,
            manager_rx,
        }
    }

    /// Channel ends handed to each worker
    pub fn worker_channels(&self) -> WorkerChannels {
        WorkerChannels {
            work_tx: self.work_tx.clone(),
            work_rx: self.work_rx.clone(),
            results: self.result_tx.clone(),
            state: self.state_tx.clone(),
        }
    }
}

impl Default for WalkQueues {
    fn default() -> Self {
        Self::new()
    }
}
