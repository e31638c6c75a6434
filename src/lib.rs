//! # Local Differential Privacy Crate
//! Implements local differential privacy (LDP) mechanisms: every user perturbs
//! their own data before it leaves their hands, and an untrusted aggregator
//! reconstructs population statistics from the perturbed reports with a
//! bias-corrected estimator.
//!
//! **Status:** reference implementation for research and simulation.
//! ## Mechanisms
//! * [randomized response](mechanisms/randomized_response/index.html) and its
//!   count correction, plus a one-hot [histogram](mechanisms/histogram/index.html)
//! * [discretization](mechanisms/discretization/index.html) of bounded values
//!   and the discretized mean estimator
//! * the [Duchi](mechanisms/duchi/index.html) multivariate mean mechanism, in
//!   its original form and with the corrected sampling probability
//! * the [single-coordinate](mechanisms/proposed/index.html) mean mechanism
//! * the [Bassily-Smith](mechanisms/bassily/index.html) frequency oracle
//! * [PrivKV](mechanisms/privkv/index.html) for key-value data
//!
//! Every user-side encoder is a pure function of its input, the privacy
//! parameters and an explicitly passed random number generator. Aggregators
//! implement [`Aggregator`]: reports are absorbed one at a time (or merged
//! from partial accumulators) and the estimate is produced once at the end.
//! ## Details
//! ### Example Usage
//! **Randomized response and count correction**
//! ```
//! use ldp::{adjust, random_response, Epsilon, GeneratorSeeded};
//!
//! let epsilon = Epsilon::new(3f64.ln()).unwrap();
//! let mut rng = GeneratorSeeded::new(7);
//! let n = 10_000;
//! let ones: u32 = (0..n)
//!     .map(|_| random_response(1, epsilon, &mut rng).unwrap() as u32)
//!     .sum();
//! let estimate = adjust(ones as f64, n, epsilon);
//! assert!((estimate - n as f64).abs() < 0.1 * n as f64);
//! ```
//! **Estimating a mean vector**
//!
//! Production use should draw from [`GeneratorOpenSSL`]; seeded generators
//! make simulations reproducible.
//! ```
//! use ldp::{Aggregator, DuchiMechanism, DuchiVariant, Epsilon, GeneratorOpenSSL};
//!
//! let epsilon = Epsilon::new(1.0).unwrap();
//! let mechanism = DuchiMechanism::new(3, epsilon, DuchiVariant::Corrected).unwrap();
//! let mut rng = GeneratorOpenSSL {};
//! let mut aggregator = mechanism.aggregator();
//! for _ in 0..1000 {
//!     let report = mechanism.encode(&[0.5, -0.5, 0.0], &mut rng).unwrap();
//!     aggregator.absorb(&report).unwrap();
//! }
//! let mean = aggregator.estimate().unwrap();
//! assert_eq!(mean.len(), 3);
//! ```
//! **Key-value data**
//! ```
//! use ldp::{Aggregator, Epsilon, GeneratorSeeded, KeyValueBudget};
//! use ldp::mechanisms::privkv::{encode_privkv, KeyValueRecord, KvAggregator};
//!
//! let budget = KeyValueBudget::new(Epsilon::new(2.0).unwrap(), Epsilon::new(2.0).unwrap());
//! let record = KeyValueRecord::new(vec![(1, 0.5), (3, -0.25)], 4).unwrap();
//! let mut rng = GeneratorSeeded::new(1);
//! let mut aggregator = KvAggregator::new(4, budget);
//! let report = encode_privkv(&record, 4, budget, &mut rng).unwrap();
//! aggregator.absorb(&report).unwrap();
//! let estimate = aggregator.estimate().unwrap();
//! assert_eq!(estimate.frequencies.len(), 4);
//! ```

/// Parameters, randomness and other utilities
pub mod utilities;
/// Local differential privacy mechanisms
pub mod mechanisms;

pub use mechanisms::Aggregator;
pub use mechanisms::randomized_response::{adjust, epsilon_to_probability, flip, perturbation, random_response, Flip};
pub use mechanisms::discretization::discretize;
pub use mechanisms::duchi::{CandidateSampling, DuchiMechanism, DuchiVariant};
pub use mechanisms::bassily::{build_projection_matrix, ProjectionMatrix};
pub use utilities::config::EstimationConfig;
pub use utilities::errors::{LdpError, Result};
pub use utilities::params::{Beta, Bounds, Epsilon, KeyValueBudget};
pub use utilities::randomness::{GeneratorOpenSSL, GeneratorSeeded};
