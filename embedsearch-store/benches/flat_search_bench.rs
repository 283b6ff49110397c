use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use embedsearch_store::FlatL2Index;

fn synthetic_vectors(count: usize, dimension: usize) -> Vec<Vec<f32>> {
    (0..count)
        .map(|i| {
            (0..dimension)
                .map(|d| ((i * 7919 + d * 104_729) % 1000) as f32 / 1000.0)
                .collect()
        })
        .collect()
}

fn bench_flat_search(c: &mut Criterion) {
    let dimension = 384;
    let mut group = c.benchmark_group("flat_l2_search");

    for &count in &[1_000usize, 10_000] {
        let mut index = FlatL2Index::new(dimension).unwrap();
        index.add(&synthetic_vectors(count, dimension)).unwrap();
        let query = synthetic_vectors(1, dimension).remove(0);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| index.search(black_box(&query), black_box(10)).unwrap())
        });
    }

    group.finish();
}

fn bench_flat_add(c: &mut Criterion) {
    let vectors = synthetic_vectors(1_000, 384);
    c.bench_function("flat_l2_add_1000", |b| {
        b.iter(|| {
            let mut index = FlatL2Index::new(384).unwrap();
            index.add(black_box(&vectors)).unwrap();
            index
        })
    });
}

criterion_group!(benches, bench_flat_search, bench_flat_add);
criterion_main!(benches);
