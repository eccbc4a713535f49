use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fs;
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use twinsync_common::{
    EntryKind, FileEntry, NullFilter, Side, SyncConfig, SyncVariant,
};
use twinsync_core::{
    redetermine_sync_directions, CompareSettings, ComparisonEngine, FolderComparison, FolderScanner,
    SyncStatistics,
};

// Helper to create test directory structure
fn create_test_tree(root: &Path, depth: usize, files_per_dir: usize, file_size: usize) {
    if depth == 0 {
        return;
    }

    for i in 0..files_per_dir {
        let file_path = root.join(format!("file_{}.txt", i));
        let mut file = fs::File::create(&file_path).unwrap();
        file.write_all(&vec![b'x'; file_size]).unwrap();
    }

    if depth > 1 {
        for i in 0..3 {
            let dir_path = root.join(format!("subdir_{}", i));
            fs::create_dir(&dir_path).unwrap();
            create_test_tree(&dir_path, depth - 1, files_per_dir, file_size);
        }
    }
}

// Flat entries spread over `folders` folders
fn create_file_entries(count: usize, folders: usize, modified: i64) -> Vec<FileEntry> {
    let mut entries: Vec<FileEntry> = (0..folders)
        .map(|f| FileEntry {
            path: PathBuf::from(format!("dir_{}", f)),
            kind: EntryKind::Folder,
            size: 0,
            modified: 0,
            fingerprint: 0,
            is_followed_symlink: false,
        })
        .collect();
    entries.extend((0..count).map(|i| FileEntry {
        path: PathBuf::from(format!("dir_{}/file_{}.txt", i % folders, i)),
        kind: EntryKind::File,
        size: 1024,
        modified,
        fingerprint: 0,
        is_followed_symlink: false,
    }));
    entries
}

fn bench_scanner(c: &mut Criterion) {
    c.bench_function("scanner_medium_tree_40_files", |b| {
        let temp = TempDir::new().unwrap();
        create_test_tree(temp.path(), 2, 10, 1024);
        let scanner = FolderScanner::new(Arc::new(NullFilter), false);

        b.iter(|| {
            let entries = scanner.scan(black_box(temp.path())).unwrap();
            black_box(entries);
        });
    });
}

fn bench_comparison(c: &mut Criterion) {
    let engine = ComparisonEngine::new(CompareSettings::default());
    let mut group = c.benchmark_group("comparison_time_size");

    for size in [100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let left = create_file_entries(size, 10, 1_000);
            let right = create_file_entries(size, 10, 5_000);

            b.iter(|| {
                let mut tree = FolderComparison::new();
                let base = engine
                    .compare(&mut tree, Path::new("/left"), Path::new("/right"), black_box(&left), black_box(&right))
                    .unwrap();
                black_box((tree, base));
            });
        });
    }

    group.finish();
}

fn bench_sync_resolution(c: &mut Criterion) {
    let engine = ComparisonEngine::new(CompareSettings::default());
    let mut group = c.benchmark_group("sync_resolution");

    for size in [1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let left = create_file_entries(size, 50, 1_000);
            let mut tree = FolderComparison::new();
            let base = engine
                .compare(&mut tree, Path::new("/left"), Path::new("/right"), &left, &[])
                .unwrap();
            let config = SyncConfig::new(SyncVariant::Mirror);

            b.iter(|| {
                // invalidates every folder buffer, then resolves all of them again
                redetermine_sync_directions(&mut tree, base, &config);
                black_box(SyncStatistics::from_root(&tree, base));
            });
        });
    }

    group.finish();
}

fn bench_remove_and_prune(c: &mut Criterion) {
    let engine = ComparisonEngine::new(CompareSettings::default());
    let left = create_file_entries(5_000, 50, 1_000);

    c.bench_function("remove_and_prune_5000_files", |b| {
        b.iter(|| {
            let mut tree = FolderComparison::new();
            let base = engine
                .compare(&mut tree, Path::new("/left"), Path::new("/right"), &left, &[])
                .unwrap();
            let folders = tree.container(base).unwrap().folders().to_vec();
            for folder in folders {
                tree.remove_object(folder, Side::Left);
            }
            black_box(tree.prune_empty(base));
        });
    });
}

criterion_group!(scanner_benches, bench_scanner);

criterion_group!(
    tree_benches,
    bench_comparison,
    bench_sync_resolution,
    bench_remove_and_prune
);

criterion_main!(scanner_benches, tree_benches);
