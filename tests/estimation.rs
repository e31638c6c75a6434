//! End-to-end estimation runs: simulated users encode, one aggregator
//! estimates.

use ldp::mechanisms::bassily::{encode_bassily, error_bound, FrequencyAggregator};
use ldp::mechanisms::duchi::encode_duchi;
use ldp::mechanisms::privkv::{encode_privkv, KeyValueRecord, KvAggregator};
use ldp::mechanisms::proposed::{encode_proposed, proposed_aggregator};
use ldp::utilities::batch::{aggregate_batch, encode_batch};
use ldp::{
    adjust, build_projection_matrix, random_response, Aggregator, DuchiMechanism, DuchiVariant,
    EstimationConfig, GeneratorSeeded, LdpError,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn randomized_response_count_is_unbiased() {
    init_logging();
    let config = EstimationConfig::from_json(r#"{"epsilon": 1.0986122886681098, "seed": 100}"#)
        .unwrap();
    let epsilon = config.epsilon().unwrap();
    let mut rng = config.generator();
    let n = 100_000;
    let ones: u64 = (0..n)
        .map(|_| random_response(1, epsilon, &mut rng).unwrap() as u64)
        .sum();
    let estimate = adjust(ones as f64, n, epsilon);
    // sd = sqrt(n p (1 - p)) / (2p - 1) with p = 3/4
    let sd = (n as f64 * 0.75 * 0.25).sqrt() / 0.5;
    assert!((estimate - n as f64).abs() < 5.0 * sd, "estimate {}", estimate);
}

#[test]
fn bassily_concentrated_population() {
    init_logging();
    let config = EstimationConfig::from_json(
        r#"{"epsilon": 4.0, "beta": 0.05, "alphabet_size": 100, "seed": 2}"#,
    )
    .unwrap();
    let (epsilon, beta, k) = (
        config.epsilon().unwrap(),
        config.beta().unwrap(),
        config.alphabet_size().unwrap(),
    );
    let n = 50_000;
    let mut rng = config.generator();
    let (m, matrix) = build_projection_matrix(k, epsilon, beta, n, &mut rng).unwrap();
    assert!(m > 0);

    let values = vec![1usize; n];
    let reports = encode_batch(&values, 3, |v, rng| encode_bassily(*v, epsilon, &matrix, rng));
    let reports: Vec<_> = reports.into_iter().map(|r| r.unwrap()).collect();
    let estimate = aggregate_batch(FrequencyAggregator::new(&matrix), &reports)
        .unwrap()
        .estimate()
        .unwrap();

    assert_eq!(estimate.len(), k);
    assert!(estimate.iter().all(|f| *f >= 0.0));
    assert!(estimate[1..].iter().all(|f| *f < estimate[0]));
    // Every report adds +-c to the estimate of the held value, so its sd is
    // sqrt(c^2 - 1) / sqrt(n) ~ 0.0012 against a bound of ~ 0.0031.
    let bound = error_bound(k, beta, epsilon, n);
    let c = epsilon.debias_scale();
    assert!((c * c - 1.0).sqrt() / (n as f64).sqrt() < bound / 2.0);
    assert!(
        (estimate[0] - 1.0).abs() < bound,
        "estimate {} bound {}",
        estimate[0],
        bound
    );
}

#[test]
fn duchi_dimension_one_tracks_the_mean() {
    let config = EstimationConfig::from_json(r#"{"epsilon": 1.0, "dimension": 1, "seed": 5}"#)
        .unwrap();
    let epsilon = config.epsilon().unwrap();
    let records: Vec<Vec<f64>> = (0..80_000)
        .map(|i| vec![if i % 4 == 0 { -1.0 } else { 0.6 }])
        .collect();
    let truth = records.iter().map(|r| r[0]).sum::<f64>() / records.len() as f64;

    let reports: Vec<_> = encode_batch(&records, 5, |r, rng| encode_duchi(r, epsilon, rng))
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    let mechanism = DuchiMechanism::new(1, epsilon, DuchiVariant::Original).unwrap();
    let estimate = aggregate_batch(mechanism.aggregator(), &reports)
        .unwrap()
        .estimate()
        .unwrap();
    // per-report sd is at most B = (e + 1) / (e - 1) ~ 2.16
    assert!((estimate[0] - truth).abs() < 0.04, "{} vs {}", estimate[0], truth);
}

#[test]
fn proposed_mechanism_many_dimensions() {
    let config = EstimationConfig::from_json(r#"{"epsilon": 3.0, "dimension": 8}"#).unwrap();
    let (epsilon, d) = (config.epsilon().unwrap(), config.dimension().unwrap());
    let record: Vec<f64> = (0..d).map(|j| j as f64 / d as f64 - 0.5).collect();
    let records = vec![record.clone(); 100_000];
    let reports: Vec<_> = encode_batch(&records, 17, |r, rng| encode_proposed(r, epsilon, rng))
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    let estimate = aggregate_batch(proposed_aggregator(d), &reports)
        .unwrap()
        .estimate()
        .unwrap();
    // per-coordinate sd ~ sqrt(d) (e^3 + 1) / (e^3 - 1) / sqrt(n) ~ 0.01
    for (e, t) in estimate.iter().zip(record.iter()) {
        assert!((e - t).abs() < 0.06, "{:?}", estimate);
    }
}

#[test]
fn privkv_single_key() {
    init_logging();
    let config = EstimationConfig::from_json(
        r#"{"epsilon": 4.0, "epsilon_k": 2.0, "epsilon_v": 2.0, "dimension": 1, "seed": 8}"#,
    )
    .unwrap();
    let budget = config.key_value_budget().unwrap();
    let d = config.dimension().unwrap();
    let n = 40_000;
    let record = KeyValueRecord::new(vec![(1, 1.0)], d).unwrap();
    let records = vec![record; n];
    let reports: Vec<_> = encode_batch(&records, 8, |r, rng| encode_privkv(r, d, budget, rng))
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    let estimate = aggregate_batch(KvAggregator::new(d, budget), &reports)
        .unwrap()
        .estimate()
        .unwrap();
    let tolerance = 5.0 / (n as f64).sqrt();
    assert!((estimate.frequencies[0] - 1.0).abs() < tolerance, "{:?}", estimate);
    assert!((estimate.means[0] - 1.0).abs() < tolerance, "{:?}", estimate);
}

#[test]
fn privkv_missing_keys_do_not_count_as_present() {
    let config = EstimationConfig::from_json(
        r#"{"epsilon": 6.0, "epsilon_k": 3.0, "epsilon_v": 3.0, "dimension": 1, "seed": 1}"#,
    )
    .unwrap();
    let budget = config.key_value_budget().unwrap();
    let n = 40_000;
    // a quarter of users hold the key
    let records: Vec<KeyValueRecord> = (0..n)
        .map(|i| {
            if i % 4 == 0 {
                KeyValueRecord::new(vec![(1, -0.5)], 1).unwrap()
            } else {
                KeyValueRecord::default()
            }
        })
        .collect();
    let reports: Vec<_> = encode_batch(&records, 2, |r, rng| encode_privkv(r, 1, budget, rng))
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    let estimate = aggregate_batch(KvAggregator::new(1, budget), &reports)
        .unwrap()
        .estimate()
        .unwrap();
    assert!((estimate.frequencies[0] - 0.25).abs() < 0.03, "{:?}", estimate);
}

#[test]
fn seeded_runs_reproduce() {
    let epsilon = EstimationConfig::new(1.0).epsilon().unwrap();
    let records = vec![vec![0.25, -0.75]; 100];
    let run = |seed| -> Vec<Vec<f64>> {
        encode_batch(&records, seed, |r, rng| encode_duchi(r, epsilon, rng))
            .into_iter()
            .map(|r| r.unwrap())
            .collect()
    };
    assert_eq!(run(9), run(9));
    assert_ne!(run(9), run(10));
}

#[test]
fn invalid_inputs_fail_fast() {
    let epsilon = EstimationConfig::new(1.0).epsilon().unwrap();
    let mut rng = GeneratorSeeded::new(0);
    assert!(matches!(
        random_response(3, epsilon, &mut rng),
        Err(LdpError::Domain { .. })
    ));
    assert!(matches!(
        EstimationConfig::from_json(r#"{"epsilon": 0}"#),
        Err(LdpError::Configuration { .. })
    ));
    assert!(matches!(
        DuchiMechanism::new(25, epsilon, DuchiVariant::Corrected),
        Err(LdpError::IntractableEnumeration { .. })
    ));
}
