//! Benchmarks for fstally
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

fn benchmark_queue_operations(c: &mut Criterion) {
    use fstally::walker::queue::{WalkQueues, Work, WorkItem};

    c.bench_function("work_queue_send_recv", |b| {
        let queues = WalkQueues::new();

        b.iter(|| {
            let item = WorkItem {
                parent_path: "/test/path".into(),
                name: "subdir".into(),
                parent_inode: 1,
                inode: 5,
            };
            queues.work_tx.send(Work::Dir(item)).unwrap();
            let received = queues.work_rx.try_recv().unwrap();
            black_box(received);
        });
    });
}

fn benchmark_rollup(c: &mut Criterion) {
    use fstally::config::WalkConfig;
    use fstally::report::{aggregate, ResultStore};
    use fstally::walker::queue::{DirResult, UidMap};

    // A root with 100 children of 10 directories each.
    let build_store = || {
        let mut store = ResultStore::default();
        let mut tallies = UidMap::new();
        tallies.insert(1000, 42);
        store.insert(DirResult {
            name: "root".into(),
            parent_inode: 0,
            inode: 1,
            files_by_uid: tallies.clone(),
            size_by_uid: tallies.clone(),
        });
        for parent in 0..100u64 {
            let parent_inode = 2 + parent;
            store.insert(DirResult {
                name: format!("d{parent}"),
                parent_inode: 1,
                inode: parent_inode,
                files_by_uid: tallies.clone(),
                size_by_uid: tallies.clone(),
            });
            for child in 0..10u64 {
                store.insert(DirResult {
                    name: format!("c{child}"),
                    parent_inode,
                    inode: 1000 + parent * 10 + child,
                    files_by_uid: tallies.clone(),
                    size_by_uid: tallies.clone(),
                });
            }
        }
        store
    };

    let config = WalkConfig {
        roots: vec!["root".into()],
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
    };

    c.bench_function("rollup_1100_dirs", |b| {
        b.iter_batched(
            build_store,
            |mut store| black_box(aggregate(&mut store, &config)),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, benchmark_queue_operations, benchmark_rollup);
criterion_main!(benches);
