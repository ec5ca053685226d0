use criterion::{criterion_group, criterion_main, Criterion};
use engine::{Config, Engine};
use std::time::Duration;

/// A config that keeps the compaction worker out of the measurements.
fn bench_config(db_path: &std::path::Path) -> Config {
    Config::new(db_path)
        .log_file_size_threshold(4 * 1024 * 1024)
        .compaction_interval(Duration::from_secs(3_600))
}

fn bench_writes(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(bench_config(&dir.path().join("bench-db"))).unwrap();
    let value = vec![b'v'; 100];

    let mut i = 0u64;
    c.bench_function("write_100b_value", |b| {
        b.iter(|| {
            i += 1;
            let key = format!("key{}", i % 10_000);
            engine.write(key.as_bytes(), &value).unwrap();
        })
    });
}

fn bench_reads(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::open(bench_config(&dir.path().join("bench-db"))).unwrap();
    let value = vec![b'v'; 100];
    for i in 0..10_000u64 {
        engine.write(format!("key{}", i).as_bytes(), &value).unwrap();
    }

    let mut i = 0u64;
    c.bench_function("read_100b_value", |b| {
        b.iter(|| {
            i = (i + 7) % 10_000;
            let key = format!("key{}", i);
            engine.read(key.as_bytes()).unwrap();
        })
    });
}

criterion_group!(benches, bench_writes, bench_reads);
criterion_main!(benches);
