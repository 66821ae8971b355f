//! Termination detection and progress reporting
//!
//! The coordinator owns a per-worker pair of counters: how many child
//! directories each worker has announced (`submitted`) and how many
//! directories it has finished (`done`). Every dequeue of a work item is
//! paired with exactly one DirDone message, and every enqueue is announced
//! before the item can be consumed, so whenever the two sums balance the
//! walk has quiesced for any interleaving of workers.
//!
//! The main flow bootstraps the counters by sending one DirDone carrying
//! `1 + R` submissions (the injection itself plus the R roots) before any
//! worker starts; the bootstrap's own `done` increment is the one that
//! `total_work = sum(done) - 1` subtracts back out.

use crate::units;
use crate::walker::queue::{ManagerDone, StateMsg, Work};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::io;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// The coordinator thread
pub struct Coordinator {
    handle: Option<JoinHandle<()>>,
}

impl Coordinator {
    /// Spawn the coordinator.
    ///
    /// `status_interval` enables the periodic stderr progress line.
    pub fn spawn(
        worker_count: usize,
        status_interval: Option<Duration>,
        state_rx: Receiver<StateMsg>,
        work_tx: Sender<Work>,
        manager_tx: Sender<ManagerDone>,
    ) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name("coordinator".to_string())
            .spawn(move || {
                coordinator_loop(worker_count, status_interval, &state_rx, &work_tx, &manager_tx);
            })?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Wait for the coordinator to finish
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn coordinator_loop(
    worker_count: usize,
    status_interval: Option<Duration>,
    state_rx: &Receiver<StateMsg>,
    work_tx: &Sender<Work>,
    manager_tx: &Sender<ManagerDone>,
) {
    let mut submitted = vec![0u64; worker_count];
    let mut done = vec![0u64; worker_count];

    let mut cum_count = 0u64;
    let mut cum_size = 0u64;
    let mut current_dir = PathBuf::new();

    let mut last_report = Instant::now();
    let mut last_count = 0u64;

    loop {
        let msg = match status_interval {
            None => match state_rx.recv() {
                Ok(msg) => Some(msg),
                Err(_) => break,
            },
            Some(interval) => {
                let wait = interval.saturating_sub(last_report.elapsed());
                match state_rx.recv_timeout(wait) {
                    Ok(msg) => Some(msg),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        };

        match msg {
            Some(StateMsg::DirDone { worker_id, submitted: n }) => {
                let slot = worker_id.min(worker_count - 1);
                submitted[slot] += n;
                done[slot] += 1;

                let total_submitted: u64 = submitted.iter().sum();
                let total_done: u64 = done.iter().sum();
                if total_submitted == total_done {
                    debug!(dirs = total_done - 1, "walk quiesced");
                    for _ in 0..worker_count {
                        let _ = work_tx.send(Work::Shutdown);
                    }
                    let _ = manager_tx.send(ManagerDone {
                        total_work: total_done - 1,
                        files: cum_count,
                        bytes: cum_size,
                    });
                    break;
                }
            }
            Some(StateMsg::Progress { dir, count, size }) => {
                cum_count += count;
                cum_size += size;
                current_dir = dir;
            }
            None => {}
        }

        if let Some(interval) = status_interval {
            let elapsed = last_report.elapsed();
            if elapsed >= interval {
                let rate = if elapsed.as_secs_f64() > 0.0 {
                    ((cum_count - last_count) as f64 / elapsed.as_secs_f64()) as u64
                } else {
                    0
                };
                eprintln!(
                    "# {:>5} files/s {:>6} {:>4} {}",
                    rate,
                    cum_count,
                    units::to_human(cum_size),
                    current_dir.display()
                );
                last_report = Instant::now();
                last_count = cum_count;
            }
        }
    }
}
