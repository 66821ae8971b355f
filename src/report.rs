//! Result store, subtree roll-up and report output
//!
//! Results arrive in completion order from the workers and are keyed two
//! ways: `ALL` maps a directory inode to its direct tallies, `TREE` maps a
//! parent inode to its children in arrival order. Roots hang off the
//! synthetic parent inode 0.
//!
//! Aggregation is depth-first per root with an explicit stack, so a
//! million-directory tree cannot overflow the call stack. Consuming a
//! pre-order vector back-to-front yields every child before its parent,
//! which is exactly the order subtree roll-up needs.

use crate::config::WalkConfig;
use crate::units;
use crate::userdb::UserTable;
use crate::walker::queue::{DirResult, UidMap};
use std::collections::{HashMap, HashSet};

/// One accounted directory, ready for roll-up
#[derive(Debug)]
struct Node {
    name: String,
    files_by_uid: UidMap,
    size_by_uid: UidMap,
    /// Set once when the node's tallies are folded into its parent; guards
    /// against double counting if a node is ever reachable twice
    counted: bool,
}

/// Collected per-directory results
#[derive(Debug, Default)]
pub struct ResultStore {
    all: HashMap<u64, Node>,
    tree: HashMap<u64, Vec<u64>>,
}

impl ResultStore {
    /// Store one directory result
    pub fn insert(&mut self, result: DirResult) {
        self.tree
            .entry(result.parent_inode)
            .or_default()
            .push(result.inode);
        self.all.insert(
            result.inode,
            Node {
                name: result.name,
                files_by_uid: result.files_by_uid,
                size_by_uid: result.size_by_uid,
                counted: false,
            },
        );
    }

    /// Number of stored directories
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// True when nothing was collected
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

/// One output row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Owning UID in per-user mode
    pub uid: Option<u32>,

    /// File count (subtree or direct, per configuration)
    pub files: u64,

    /// Byte total
    pub size: u64,

    /// Path joined from root to node
    pub path: String,
}

/// Roll up the stored results and produce the filtered report rows.
///
/// Rows come out descendants-first: a directory's subtree must be final
/// before the directory itself can be reported.
pub fn aggregate(store: &mut ResultStore, config: &WalkConfig) -> Vec<Row> {
    let mut rows = Vec::new();
    let roots: Vec<u64> = store.tree.get(&0).cloned().unwrap_or_default();

    for root in roots {
        // A root missing from ALL errored before it was accounted.
        if !store.all.contains_key(&root) {
            continue;
        }

        // Pre-order traversal; children always land after their parent.
        // The seen set keeps inode collisions across devices from cycling.
        let mut order: Vec<(u64, u64, String)> = Vec::new();
        let mut seen: HashSet<u64> = HashSet::new();
        seen.insert(root);
        let mut stack = vec![(root, 0u64, store.all[&root].name.clone())];
        while let Some((inode, depth, path)) = stack.pop() {
            if let Some(children) = store.tree.get(&inode) {
                for &child in children {
                    // Children of errored branches are silently trimmed.
                    if let Some(node) = store.all.get(&child) {
                        if seen.insert(child) {
                            stack.push((child, depth + 1, format!("{}/{}", path, node.name)));
                        }
                    }
                }
            }
            order.push((inode, depth, path));
        }

        // Back-to-front consumption = post-order roll-up.
        while let Some((inode, depth, path)) = order.pop() {
            if !config.exclude_subdirs {
                let children = store.tree.get(&inode).cloned().unwrap_or_default();
                for child in children {
                    let Some(child_node) = store.all.get_mut(&child) else {
                        continue;
                    };
                    if child_node.counted {
                        continue;
                    }
                    child_node.counted = true;
                    let files = std::mem::take(&mut child_node.files_by_uid);
                    let sizes = std::mem::take(&mut child_node.size_by_uid);

                    let node = store.all.get_mut(&inode).expect("parent node in store");
                    for (uid, n) in files {
                        *node.files_by_uid.entry(uid).or_insert(0) += n;
                    }
                    for (uid, n) in sizes {
                        *node.size_by_uid.entry(uid).or_insert(0) += n;
                    }
                }
            }

            let node = &store.all[&inode];
            let sum_files: u64 = node.files_by_uid.values().sum();
            let sum_size: u64 = node.size_by_uid.values().sum();

            // An all-zero node is usually a filtered branch; re-check the
            // filters against its full path to avoid empty output lines.
            if sum_files == 0 && sum_size == 0 {
                if config.is_excluded(&path) || !config.matches_include(&path) {
                    continue;
                }
            }

            if depth > config.max_depth {
                continue;
            }

            if config.per_user {
                let mut uids: Vec<u32> = node
                    .files_by_uid
                    .keys()
                    .chain(node.size_by_uid.keys())
                    .copied()
                    .collect();
                uids.sort_unstable();
                uids.dedup();
                for uid in uids {
                    let files = node.files_by_uid.get(&uid).copied().unwrap_or(0);
                    let size = node.size_by_uid.get(&uid).copied().unwrap_or(0);
                    if files > config.file_limit || size > config.size_limit {
                        rows.push(Row {
                            uid: Some(uid),
                            files,
                            size,
                            path: path.clone(),
                        });
                    }
                }
            } else if sum_files >= config.file_limit && sum_size >= config.size_limit {
                rows.push(Row {
                    uid: None,
                    files: sum_files,
                    size: sum_size,
                    path,
                });
            }
        }
    }

    rows
}

/// Print the report to stdout in space-padded columns.
pub fn print_report(rows: &[Row], config: &WalkConfig, users: &UserTable) {
    if !config.quiet {
        if config.per_user {
            println!("{:>15} {:>15} {:>15} {}", "User", "Files", "Size", "Path");
        } else {
            println!("{:>15} {:>15} {}", "Files", "Size", "Path");
        }
    }

    for row in rows {
        let size = if config.human_readable {
            units::to_human(row.size)
        } else {
            row.size.to_string()
        };
        match row.uid {
            Some(uid) => {
                println!("{:>15} {:>15} {:>15} {}", users.name(uid), row.files, size, row.path)
            }
            None => println!("{:>15} {:>15} {}", row.files, size, row.path),
        }
    }
}
