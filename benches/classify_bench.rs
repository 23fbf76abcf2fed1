use criterion::{Criterion, criterion_group, criterion_main};
use savecheck::classify::Classifier;
use savecheck::fingerprint::FileFingerprint;
use savecheck::storage::{MemoryStore, persist};
use savecheck::utils::hash::hash_bytes;
use std::hint::black_box;

fn populated_store(count: usize) -> (MemoryStore, Vec<FileFingerprint>) {
    let mut store = MemoryStore::new();
    let mut fresh = Vec::with_capacity(count);

    for i in 0..count {
        let path = format!("dir{}/file{i}.txt", i % 32);
        let stored = FileFingerprint::new(path.clone(), hash_bytes(path.as_bytes()), 1_000);
        persist(&mut store, &stored).unwrap();

        // One in ten files changed since the baseline
        if i % 10 == 0 {
            fresh.push(FileFingerprint::new(path, hash_bytes(b"edited"), 2_000));
        } else {
            fresh.push(stored);
        }
    }

    (store, fresh)
}

fn bench_classify(c: &mut Criterion) {
    let (store, fresh) = populated_store(10_000);

    c.bench_function("classify_10k", |b| {
        b.iter(|| {
            let result = Classifier::new(&store).classify(black_box(fresh.clone()));
            black_box(result.total())
        });
    });
}

fn bench_hash(c: &mut Criterion) {
    let data = vec![0xABu8; 1024 * 1024];

    c.bench_function("sha256_1mb", |b| {
        b.iter(|| hash_bytes(black_box(&data)));
    });
}

criterion_group!(benches, bench_classify, bench_hash);
criterion_main!(benches);
