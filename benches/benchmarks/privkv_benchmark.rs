//! PrivKV per-user encoding and aggregation.

use criterion::{criterion_group, Criterion};
use ldp::mechanisms::privkv::{encode_privkv, KeyValueRecord, KvAggregator};
use ldp::{Aggregator, Epsilon, GeneratorSeeded, KeyValueBudget};

fn privkv_round(c: &mut Criterion) {
    let d = 100;
    let budget = KeyValueBudget::split(Epsilon::new(2.0).unwrap(), 0.5).unwrap();
    let record = KeyValueRecord::new((1..=d).step_by(3).map(|k| (k, 0.5)), d).unwrap();
    let mut rng = GeneratorSeeded::new(4);

    c.bench_function("privkv_encode", |b| {
        b.iter(|| encode_privkv(&record, d, budget, &mut rng).unwrap())
    });

    let reports: Vec<_> = (0..10_000)
        .map(|_| encode_privkv(&record, d, budget, &mut rng).unwrap())
        .collect();
    c.bench_function("privkv_aggregate", |b| {
        b.iter(|| {
            let mut aggregator = KvAggregator::new(d, budget);
            for r in &reports {
                aggregator.absorb(r).unwrap();
            }
            aggregator.estimate().unwrap()
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = privkv_round
}
