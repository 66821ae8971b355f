//! Sharded lstat for large batches of names
//!
//! 1. Small batches are stat'd on the caller's thread
//! 2. Large batches are split across a fixed number of auxiliary threads
//! 3. Records flow back over a bounded channel the caller drains
//!
//! Exactly one record per input name is delivered, in unspecified order;
//! individual failures arrive as the Err side so the caller decides how to
//! absorb them. Stat is `symlink_metadata` (lstat): symlinks are reported
//! as themselves, which also keeps cyclic link structures from recursing.

use crossbeam_channel::bounded;
use std::ffi::OsString;
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
use std::thread;

/// Batches above this size are sharded onto auxiliary threads
pub const SHARD_THRESHOLD: usize = 1000;

/// Number of auxiliary stat threads for a sharded batch
const SHARD_COUNT: usize = 2;

/// Capacity of the delivery queue between shards and the caller
const DELIVERY_CAPACITY: usize = 1024;

/// Stat every name in `dir`, invoking `deliver` once per name.
pub fn stat_each<F>(dir: &Path, names: Vec<OsString>, mut deliver: F)
where
    F: FnMut(OsString, io::Result<Metadata>),
{
    if names.len() <= SHARD_THRESHOLD {
        for name in names {
            let record = fs::symlink_metadata(dir.join(&name));
            deliver(name, record);
        }
        return;
    }

    let mut first = names;
    let second = first.split_off(first.len() / SHARD_COUNT);
    let (tx, rx) = bounded(DELIVERY_CAPACITY);

    thread::scope(|scope| {
        for shard in [first, second] {
            let tx = tx.clone();
            scope.spawn(move || {
                for name in shard {
                    let record = fs::symlink_metadata(dir.join(&name));
                    if tx.send((name, record)).is_err() {
                        return;
                    }
                }
            });
        }
        drop(tx);

        // Drain while the shards run; the bounded queue throttles them.
        for (name, record) in rx {
            deliver(name, record);
        }
    });
}
