use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::collections::BTreeMap;
use treap_map::TreapMap;

const N: usize = 10_000;
const SEED: u64 = 0xDEAD_BEEF;

// ─── Helper functions to generate key sequences ─────────────────────────────

fn ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).collect()
}

fn random_keys(n: usize) -> Vec<i64> {
    // Simple 64-bit LCG for a deterministic pseudo-random sequence.
    let mut keys = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push((x >> 33) as i64);
    }
    keys
}

fn filled_treap(keys: &[i64]) -> TreapMap<i64, i64> {
    let mut map = TreapMap::with_seed(SEED);
    for &k in keys {
        map.upsert(k, k);
    }
    map
}

fn filled_btreemap(keys: &[i64]) -> BTreeMap<i64, i64> {
    keys.iter().map(|&k| (k, k)).collect()
}

// ─── Insertion ──────────────────────────────────────────────────────────────

fn bench_upsert_ordered(c: &mut Criterion) {
    let mut group = c.benchmark_group("upsert_ordered");
    let keys = ordered_keys(N);

    group.bench_function(BenchmarkId::new("TreapMap", N), |b| {
        b.iter(|| filled_treap(&keys));
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| filled_btreemap(&keys));
    });

    group.finish();
}

fn bench_upsert_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("upsert_random");
    let keys = random_keys(N);

    group.bench_function(BenchmarkId::new("TreapMap", N), |b| {
        b.iter(|| filled_treap(&keys));
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| filled_btreemap(&keys));
    });

    group.finish();
}

// ─── Lookup ─────────────────────────────────────────────────────────────────

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");
    let keys = random_keys(N);
    let treap = filled_treap(&keys);
    let btree = filled_btreemap(&keys);

    group.bench_function(BenchmarkId::new("TreapMap", N), |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for k in &keys {
                hits += usize::from(treap.get(k).is_some());
            }
            hits
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for k in &keys {
                hits += usize::from(btree.get(k).is_some());
            }
            hits
        });
    });

    group.finish();
}

fn bench_closest_leq(c: &mut Criterion) {
    let mut group = c.benchmark_group("closest_leq");
    let keys = random_keys(N);
    let treap = filled_treap(&keys);
    let btree = filled_btreemap(&keys);

    group.bench_function(BenchmarkId::new("TreapMap", N), |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for k in &keys {
                hits += usize::from(treap.closest_leq(&(k + 1)).is_some());
            }
            hits
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap_range", N), |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for k in &keys {
                hits += usize::from(btree.range(..=k + 1).next_back().is_some());
            }
            hits
        });
    });

    group.finish();
}

// ─── Removal ────────────────────────────────────────────────────────────────

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove");
    let keys = random_keys(N);

    group.bench_function(BenchmarkId::new("TreapMap", N), |b| {
        b.iter_batched(
            || filled_treap(&keys),
            |mut map| {
                for k in &keys {
                    map.remove(k);
                }
                map
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter_batched(
            || filled_btreemap(&keys),
            |mut map| {
                for k in &keys {
                    map.remove(k);
                }
                map
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ─── Iteration ──────────────────────────────────────────────────────────────

fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");
    let keys = random_keys(N);
    let treap = filled_treap(&keys);
    let btree = filled_btreemap(&keys);

    group.bench_function(BenchmarkId::new("TreapMap", N), |b| {
        b.iter(|| treap.iter().map(|(_, v)| *v).sum::<i64>());
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| btree.iter().map(|(_, v)| *v).sum::<i64>());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_upsert_ordered,
    bench_upsert_random,
    bench_get,
    bench_closest_leq,
    bench_remove,
    bench_iterate
);
criterion_main!(benches);
