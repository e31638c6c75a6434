//! Duchi encoding cost as the dimension grows, for both candidate samplers.

use criterion::{criterion_group, BenchmarkId, Criterion};
use ldp::{CandidateSampling, DuchiMechanism, DuchiVariant, Epsilon, GeneratorSeeded};

fn duchi_dimension(c: &mut Criterion) {
    let epsilon = Epsilon::new(1.0).unwrap();
    let mut group = c.benchmark_group("duchi_encode");
    for d in [2usize, 6, 10, 14].iter() {
        let tp: Vec<f64> = (0..*d).map(|j| (j as f64 / *d as f64) - 0.5).collect();
        for sampling in [CandidateSampling::Exhaustive, CandidateSampling::Rejection].iter() {
            let mechanism =
                DuchiMechanism::with_sampling(*d, epsilon, DuchiVariant::Corrected, *sampling)
                    .unwrap();
            let mut rng = GeneratorSeeded::new(1);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", sampling), d),
                &tp,
                |b, tp| b.iter(|| mechanism.encode(tp, &mut rng).unwrap()),
            );
        }
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = duchi_dimension
}
