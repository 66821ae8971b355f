//! fstally - Parallel Filesystem Accounting
//!
//! A tool for measuring very large directory trees: it walks one or more
//! roots with a pool of worker threads and reports, per directory, the
//! cumulative number of regular files and bytes, optionally split by
//! owning user. Designed for trees where serialized stat calls stall and
//! directory listings do not fit in memory.
//!
//! # Features
//!
//! - **Parallel traversal**: W independent workers pull directories from
//!   a shared queue and push discovered children back onto it.
//!
//! - **Streaming enumeration**: directories are read entry by entry, so a
//!   directory with millions of entries never materializes in memory.
//!
//! - **Sharded stat**: large directories split their stat work across
//!   auxiliary threads feeding a bounded queue.
//!
//! - **Exact termination**: a counter-balancing protocol between workers
//!   and the coordinator detects quiescence without polling or timeouts.
//!
//! - **Hard-link aware**: each worker remembers multi-link inodes it has
//!   credited, so linked files count their bytes once per worker.
//!
//! # Architecture
//!
//! ```text
//!   roots ──► work queue ──► workers (enumerate / stat / tally)
//!                ▲               │            │
//!                └── children ───┘            │ results
//!                                             ▼
//!   coordinator ◄── state messages      result store
//!   (submitted == done ⇒ shutdown)            │
//!                                             ▼
//!                                   roll-up + filtered report
//! ```
//!
//! # Example
//!
//! ```bash
//! # Per-user accounting, two levels deep, human-readable sizes
//! fstally -u -d 2 -h /srv/data
//!
//! # Only large directories, with progress on stderr
//! fstally -n 100K -k 10G -s 5 /mnt/archive
//! ```

pub mod config;
pub mod error;
pub mod report;
pub mod units;
pub mod userdb;
pub mod walker;

pub use config::{CliArgs, WalkConfig};
pub use error::{Result, TallyError};
pub use report::{aggregate, print_report, ResultStore, Row};
pub use userdb::UserTable;
pub use walker::{WalkReport, WalkStats, Walker};
