//! Criterion benchmarks for the per-frame classification path.
//!
//! Every sampled frame classifies each detected face against the full
//! enrolled set and folds the label into the running counts, so this is the
//! hot path of a detection run.
//!
//! Run with:
//! ```bash
//! cargo bench --package faceauth-core --bench summary_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use faceauth_core::{FaceEncoding, KnownIdentitySet, LabelCounts};

// ── Fixture builders ──────────────────────────────────────────────────────────

/// An enrolled set of `n` identities with 128-dimensional encodings.
fn build_identity_set(n: usize) -> KnownIdentitySet {
    let mut set = KnownIdentitySet::new();
    for i in 0..n {
        let encoding = (0..128).map(|j| ((i * 31 + j) % 97) as f32 / 97.0).collect();
        set.push(format!("person-{i}"), FaceEncoding(encoding));
    }
    set
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    for n in [1usize, 10, 100] {
        let set = build_identity_set(n);
        let query = FaceEncoding(vec![0.5; 128]);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let distances = set.distances_to(black_box(&query));
                set.classify(black_box(&distances), 0.6)
            })
        });
    }
    group.finish();
}

fn bench_label_counts(c: &mut Criterion) {
    let labels: Vec<String> = (0..8).map(|i| format!("person-{i}")).collect();
    c.bench_function("label_counts_increment_1000", |b| {
        b.iter(|| {
            let mut counts = LabelCounts::new();
            for i in 0..1000 {
                counts.increment(black_box(&labels[i % labels.len()]));
            }
            counts
        })
    });
}

criterion_group!(benches, bench_classify, bench_label_counts);
criterion_main!(benches);
