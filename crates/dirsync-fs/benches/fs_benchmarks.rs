use criterion::{Criterion, black_box, criterion_group, criterion_main};
use dirsync_fs::io::{self, RobustnessConfig};
use dirsync_fs::NormalizedPath;
use std::fs;
use tempfile::tempdir;

fn write_atomic_benchmark(c: &mut Criterion) {
    c.bench_function("io::write_atomic", |b| {
        let dir = tempdir().unwrap();
        let path = dir.path().join("last_sync.json");
        let content = br#"{"library": "2024-05-01T10:00:00Z"}"#;
        let config = RobustnessConfig::default();

        b.iter(|| {
            io::write_atomic(black_box(&path), black_box(content), config).unwrap();
        })
    });
}

fn copy_file_benchmark(c: &mut Criterion) {
    c.bench_function("io::copy_file (64 KiB)", |b| {
        let dir = tempdir().unwrap();
        let source = dir.path().join("book.epub");
        let target = dir.path().join("copy.epub");
        fs::write(&source, vec![7u8; 64 * 1024]).unwrap();
        let config = RobustnessConfig::default();

        b.iter(|| {
            io::copy_file(black_box(&source), black_box(&target), config).unwrap();
        })
    });
}

fn path_rendering_benchmark(c: &mut Criterion) {
    c.bench_function("NormalizedPath::new", |b| {
        let relative = std::path::Path::new("Some Author").join("A Long Book Title (1234)");

        b.iter(|| NormalizedPath::new(black_box(&relative)))
    });
}

criterion_group!(
    benches,
    write_atomic_benchmark,
    copy_file_benchmark,
    path_rendering_benchmark
);
criterion_main!(benches);
