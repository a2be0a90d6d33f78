//! Point lookups and full scans on writable and read-only databases.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use filekv::{Config, Database, OpenOptions};

fn fill(db: &Database, n: u32) {
    for i in 0..n {
        let value: Vec<u8> = (0..16).map(|j| (i as u8).wrapping_add(j)).collect();
        db.put(&i.to_le_bytes(), &value).unwrap();
    }
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");
    let dir = tempfile::tempdir().unwrap();

    for size in [1_000u32, 10_000, 100_000].iter() {
        let mem = Database::memory(Config::default());
        fill(&mem, *size);

        let path = dir.path().join(format!("bench-{size}.db"));
        mem.export(&path).unwrap();
        let frozen = Database::open(&path, OpenOptions::read_only(), Config::default()).unwrap();

        group.bench_with_input(BenchmarkId::new("memtable", size), size, |b, &n| {
            b.iter(|| {
                let mut hits = 0usize;
                for i in 0..n {
                    if mem.get(&i.to_le_bytes()).unwrap().is_some() {
                        hits += 1;
                    }
                }
                black_box(hits)
            });
        });

        group.bench_with_input(BenchmarkId::new("frozen", size), size, |b, &n| {
            b.iter(|| {
                let mut hits = 0usize;
                for i in 0..n {
                    if frozen.get(&i.to_le_bytes()).unwrap().is_some() {
                        hits += 1;
                    }
                }
                black_box(hits)
            });
        });
    }

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    let dir = tempfile::tempdir().unwrap();

    for size in [10_000u32, 100_000].iter() {
        let mem = Database::memory(Config::default());
        fill(&mem, *size);
        let path = dir.path().join(format!("scan-{size}.db"));
        mem.export(&path).unwrap();
        let frozen = Database::open(&path, OpenOptions::read_only(), Config::default()).unwrap();

        group.bench_with_input(BenchmarkId::new("frozen", size), size, |b, _| {
            b.iter(|| black_box(frozen.keys().unwrap().len()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_get, bench_scan);
criterion_main!(benches);
