//! Bassily-Smith sketch construction and estimation.

use criterion::{criterion_group, BenchmarkId, Criterion};
use ldp::mechanisms::bassily::{encode_bassily, FrequencyAggregator};
use ldp::{Aggregator, Beta, Epsilon, GeneratorSeeded, ProjectionMatrix};

fn sketch_build(c: &mut Criterion) {
    let epsilon = Epsilon::new(2.0).unwrap();
    let beta = Beta::new(0.05).unwrap();
    let mut group = c.benchmark_group("bassily_build");
    for n in [1_000usize, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, n| {
            let mut rng = GeneratorSeeded::new(2);
            b.iter(|| ProjectionMatrix::build(20, epsilon, beta, *n, &mut rng).unwrap())
        });
    }
    group.finish();
}

fn sketch_estimate(c: &mut Criterion) {
    let epsilon = Epsilon::new(2.0).unwrap();
    let beta = Beta::new(0.05).unwrap();
    let n = 10_000;
    let mut rng = GeneratorSeeded::new(3);
    let matrix = ProjectionMatrix::build(20, epsilon, beta, n, &mut rng).unwrap();
    let mut aggregator = FrequencyAggregator::new(&matrix);
    for i in 0..n {
        let report = encode_bassily(i % 20 + 1, epsilon, &matrix, &mut rng).unwrap();
        aggregator.absorb(&report).unwrap();
    }
    c.bench_function("bassily_estimate", |b| b.iter(|| aggregator.estimate().unwrap()));
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = sketch_build, sketch_estimate
}
