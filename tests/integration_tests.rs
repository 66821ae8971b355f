//! End-to-end tests for fstally
//!
//! Every test builds a fixture tree in a tempdir, runs the walk through
//! the library API and asserts on the aggregated rows. Ownership comes
//! from whatever user runs the tests, so expectations read UIDs back from
//! the fixtures instead of hard-coding them.

use fstally::config::{anchored, WalkConfig};
use fstally::report::{aggregate, Row};
use fstally::walker::Walker;
use std::fs::{self, File};
use std::io::Write;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

fn config_for(root: &Path) -> WalkConfig {
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
        worker_count: 4,
    }
}

fn run(config: &WalkConfig) -> Vec<Row> {
    let walker = Walker::new(config.clone());
    let mut result = walker.run().expect("walk failed");
    aggregate(&mut result.store, config)
}

fn write_file(path: &Path, bytes: usize) {
    let mut f = File::create(path).unwrap();
    f.write_all(&vec![b'x'; bytes]).unwrap();
}

fn row_for<'a>(rows: &'a [Row], path: &Path) -> &'a Row {
    let wanted = path.to_string_lossy();
    rows.iter()
        .find(|r| r.path == wanted)
        .unwrap_or_else(|| panic!("no row for {wanted}: {rows:?}"))
}

#[test]
fn empty_tree_reports_one_zero_row() {
    let dir = tempfile::tempdir().unwrap();
    let rows = run(&config_for(dir.path()));

    assert_eq!(rows.len(), 1);
    let root = row_for(&rows, dir.path());
    assert_eq!((root.files, root.size), (0, 0));
}

#[test]
fn flat_files_tally_count_and_bytes() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("a"), 1);
    write_file(&dir.path().join("b"), 2);

    let rows = run(&config_for(dir.path()));
    let root = row_for(&rows, dir.path());
    assert_eq!((root.files, root.size), (2, 3));
}

#[test]
fn flat_files_split_by_user() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("a"), 1);
    write_file(&dir.path().join("b"), 2);
    let uid = fs::symlink_metadata(dir.path().join("a")).unwrap().uid();

    let mut config = config_for(dir.path());
    config.per_user = true;
    let rows = run(&config);

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].uid, Some(uid));
    assert_eq!((rows[0].files, rows[0].size), (2, 3));
}

#[test]
fn subtree_rolls_up_with_directory_inode_size() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    write_file(&sub.join("c"), 10);
    write_file(&sub.join("d"), 20);
    let sub_inode_size = fs::symlink_metadata(&sub).unwrap().len();

    let mut config = config_for(dir.path());
    config.max_depth = 1;
    let rows = run(&config);

    assert_eq!(rows.len(), 2);
    let sub_row = row_for(&rows, &sub);
    assert_eq!((sub_row.files, sub_row.size), (2, 30));

    // The parent adds the subtree plus the subdirectory's own inode size;
    // the subdirectory entry contributes no file count.
    let root = row_for(&rows, dir.path());
    assert_eq!(root.files, 2);
    assert_eq!(root.size, 30 + sub_inode_size);
}

#[test]
fn max_depth_zero_reports_roots_only() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    write_file(&sub.join("c"), 10);

    let mut config = config_for(dir.path());
    config.max_depth = 0;
    let rows = run(&config);

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].path, dir.path().to_string_lossy());
    // Depth only caps output; the roll-up still covers the whole tree.
    assert_eq!(rows[0].files, 1);
}

#[test]
fn hard_links_count_twice_but_size_once() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("x"), 100);
    fs::hard_link(dir.path().join("x"), dir.path().join("y")).unwrap();

    // One worker makes the per-worker dedup set authoritative.
    let mut config = config_for(dir.path());
    config.worker_count = 1;
    let rows = run(&config);

    let root = row_for(&rows, dir.path());
    assert_eq!((root.files, root.size), (2, 100));
}

#[test]
fn exclude_pattern_drops_matches_entirely() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("keep"), 5);
    write_file(&dir.path().join("drop.tmp"), 500);

    let mut config = config_for(dir.path());
    config.exclude = Some(anchored(r".*\.tmp").unwrap());
    let rows = run(&config);

    let root = row_for(&rows, dir.path());
    assert_eq!((root.files, root.size), (1, 5));
}

#[test]
fn excluded_subtree_is_not_traversed() {
    let dir = tempfile::tempdir().unwrap();
    let noise = dir.path().join("noise");
    fs::create_dir(&noise).unwrap();
    write_file(&noise.join("big"), 4096);
    write_file(&dir.path().join("keep"), 7);

    let mut config = config_for(dir.path());
    config.exclude = Some(anchored(r".*/noise").unwrap());
    let rows = run(&config);

    assert_eq!(rows.len(), 1);
    let root = row_for(&rows, dir.path());
    assert_eq!((root.files, root.size), (1, 7));
}

#[test]
fn include_credits_files_but_still_descends_directories() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    write_file(&sub.join("one_log"), 3);
    write_file(&sub.join("other"), 4);

    let mut config = config_for(dir.path());
    config.include = Some(anchored(r".*_log").unwrap());
    let rows = run(&config);

    // The non-matching subdirectory was traversed but credited nothing,
    // so the root sees exactly the matching file.
    let sub_row = row_for(&rows, &sub);
    assert_eq!((sub_row.files, sub_row.size), (1, 3));
}

#[test]
fn large_directory_shards_and_counts_every_entry_once() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..2000 {
        write_file(&dir.path().join(format!("f{i:04}")), 1);
    }

    let rows = run(&config_for(dir.path()));
    let root = row_for(&rows, dir.path());
    assert_eq!((root.files, root.size), (2000, 2000));
}

#[test]
fn multiple_roots_walk_independently() {
    let one = tempfile::tempdir().unwrap();
    let two = tempfile::tempdir().unwrap();
    write_file(&one.path().join("a"), 1);
    write_file(&two.path().join("b"), 2);
    write_file(&two.path().join("c"), 3);

    let mut config = config_for(one.path());
    config.roots = vec![one.path().to_path_buf(), two.path().to_path_buf()];
    let rows = run(&config);

    assert_eq!(rows.len(), 2);
    assert_eq!(row_for(&rows, one.path()).files, 1);
    let second = row_for(&rows, two.path());
    assert_eq!((second.files, second.size), (2, 5));
}

#[test]
fn file_limit_suppresses_small_directories() {
    let dir = tempfile::tempdir().unwrap();
    let big = dir.path().join("big");
    let small = dir.path().join("small");
    fs::create_dir(&big).unwrap();
    fs::create_dir(&small).unwrap();
    for i in 0..5 {
        write_file(&big.join(format!("f{i}")), 1);
    }
    write_file(&small.join("lonely"), 1);

    let mut config = config_for(dir.path());
    config.file_limit = 3;
    let rows = run(&config);

    let paths: Vec<_> = rows.iter().map(|r| r.path.clone()).collect();
    assert!(paths.contains(&big.to_string_lossy().into_owned()));
    assert!(!paths.contains(&small.to_string_lossy().into_owned()));
}

#[test]
fn exclude_subdirs_reports_direct_tallies() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    write_file(&sub.join("c"), 10);
    write_file(&dir.path().join("top"), 1);
    let sub_inode_size = fs::symlink_metadata(&sub).unwrap().len();

    let mut config = config_for(dir.path());
    config.exclude_subdirs = true;
    let rows = run(&config);

    let root = row_for(&rows, dir.path());
    assert_eq!(root.files, 1);
    assert_eq!(root.size, 1 + sub_inode_size);
    let sub_row = row_for(&rows, &sub);
    assert_eq!((sub_row.files, sub_row.size), (1, 10));
}

#[test]
fn symlinks_are_counted_not_followed() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("target");
    fs::create_dir(&target).unwrap();
    write_file(&target.join("inner"), 50);
    std::os::unix::fs::symlink(&target, dir.path().join("link")).unwrap();

    let rows = run(&config_for(dir.path()));

    // The symlink tallies as a file of its own lstat size; the target's
    // contents appear exactly once, under the real directory.
    let link_size = fs::symlink_metadata(dir.path().join("link")).unwrap().len();
    let target_inode_size = fs::symlink_metadata(&target).unwrap().len();
    let root = row_for(&rows, dir.path());
    assert_eq!(root.files, 2);
    assert_eq!(root.size, 50 + link_size + target_inode_size);
}

#[test]
fn unreadable_root_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&dir.path().join("does-not-exist"));
    let err = Walker::new(config).run().unwrap_err();
    assert!(err.to_string().contains("does-not-exist"));
}

#[test]
fn deep_tree_rolls_up_through_every_level() {
    let dir = tempfile::tempdir().unwrap();
    let mut level = dir.path().to_path_buf();
    for i in 0..12 {
        level = level.join(format!("d{i}"));
        fs::create_dir(&level).unwrap();
        write_file(&level.join("leaf"), 1);
    }

    let mut config = config_for(dir.path());
    config.max_depth = 0;
    let rows = run(&config);

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].files, 12);
}
