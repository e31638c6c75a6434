//! Duchi et al.'s multivariate mean mechanism.
//!
//! A user holding `tp` in `[-1, 1]^d` first draws a sign vector `v` with
//! `P(v[j] = +1) = (1 + tp[j]) / 2`. The output space is `{-B, +B}^d`, split
//! into `T+` (candidates whose inner product with `v` is positive) and `T-`
//! (the rest). The user reports a uniform element of `T+` with probability
//! `p`, else a uniform element of `T-`. `B` is chosen so that each output
//! coordinate has expectation `tp[j]`, and the population mean of the
//! reports is the mean estimate.
//!
//! `B = (2^d + C_d (e^epsilon - 1)) / (binom(d - 1, floor(d / 2)) (e^epsilon - 1))`.
//! The variants differ in `C_d` and `p`:
//! * [`DuchiVariant::Original`] uses `p = e^epsilon / (e^epsilon + 1)` and
//!   `C_d = 2^(d-1) - binom(d, d/2)` for even `d`. For even `d` the halves
//!   differ in size and `C_d` is not `|T+|`, so this is not exactly
//!   `epsilon`-LDP and the estimate carries a bias of about ten percent.
//! * [`DuchiVariant::Corrected`] uses `C_d = |T+|` and
//!   `p = e^epsilon * C_d / ((e^epsilon - 1) * C_d + 2^d)`,
//!   which makes every candidate in `T+` exactly `e^epsilon` times as likely
//!   as every candidate in `T-` and the estimate exactly unbiased.
//!
//! For odd `d` both choices of `C_d` equal `2^(d-1)` and the variants coincide.
//!
//! ## Candidate sampling
//! [`CandidateSampling::Exhaustive`] walks all `2^d` candidates, counts the
//! chosen half and picks a uniform member. [`CandidateSampling::Rejection`]
//! draws uniform candidates until one falls in the chosen half; both halves
//! hold at least a quarter of the space for `d >= 2`, so this needs few draws.
//! Both strategies produce the same output distribution.

use log::{debug, warn};
use rug::rand::ThreadRandGen;
use serde::{Deserialize, Serialize};

use crate::mechanisms::mean::MeanAggregator;
use crate::utilities::errors::{LdpError, Result};
use crate::utilities::exactarithmetic::{binomial, strict_majority_count, tie_excluded_count};
use crate::utilities::params::{Bounds, Epsilon};
use crate::utilities::randomness::{bernoulli, uniform_index, uniform_mask};

/// Largest dimension accepted for exhaustive candidate enumeration.
pub const MAX_EXHAUSTIVE_DIMENSION: usize = 20;

/// Largest dimension accepted for rejection sampling (candidates are held
/// as 64-bit masks).
pub const MAX_REJECTION_DIMENSION: usize = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuchiVariant {
    Original,
    Corrected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateSampling {
    Exhaustive,
    Rejection,
}

impl CandidateSampling {
    fn limit(self) -> usize {
        match self {
            CandidateSampling::Exhaustive => MAX_EXHAUSTIVE_DIMENSION,
            CandidateSampling::Rejection => MAX_REJECTION_DIMENSION,
        }
    }
}

/// A configured Duchi mechanism for one dimension and budget.
#[derive(Debug, Clone, PartialEq)]
pub struct DuchiMechanism {
    dimension: usize,
    epsilon: Epsilon,
    variant: DuchiVariant,
    sampling: CandidateSampling,
    bound: f64,
    balance: f64,
    positive_probability: f64,
}

// Constructors
impl DuchiMechanism {
    /// Configure the mechanism with exhaustive candidate sampling.
    /// ## Arguments
    ///   * `dimension`: the record dimension `d`
    ///   * `epsilon`: the privacy parameter
    ///   * `variant`: which probability of sampling from `T+` to use
    /// ## Errors
    /// Returns a configuration error if `dimension` is 0, and
    /// `IntractableEnumeration` if it exceeds [`MAX_EXHAUSTIVE_DIMENSION`].
    pub fn new(dimension: usize, epsilon: Epsilon, variant: DuchiVariant) -> Result<DuchiMechanism> {
        DuchiMechanism::with_sampling(dimension, epsilon, variant, CandidateSampling::Exhaustive)
    }

    pub fn with_sampling(
        dimension: usize,
        epsilon: Epsilon,
        variant: DuchiVariant,
        sampling: CandidateSampling,
    ) -> Result<DuchiMechanism> {
        epsilon.check()?;
        if dimension == 0 {
            return Err(LdpError::configuration(
                "DuchiMechanism::new",
                "dimension must be positive",
            ));
        }
        if dimension > sampling.limit() {
            return Err(LdpError::IntractableEnumeration {
                dimension,
                limit: sampling.limit(),
            });
        }

        let d = dimension as u32;
        let space = 2f64.powi(d as i32);
        let balance = match variant {
            DuchiVariant::Original => tie_excluded_count(d),
            DuchiVariant::Corrected => strict_majority_count(d),
        };
        let central = if d % 2 == 1 {
            binomial(d - 1, (d - 1) / 2)
        } else {
            binomial(d - 1, d / 2)
        };
        let expm1 = epsilon.exp_m1();
        let bound = space / (central * expm1) + balance / central;

        // e^eps C_d / ((e^eps - 1) C_d + 2^d), scaled by e^-eps
        let positive_probability = match variant {
            DuchiVariant::Original => epsilon.keep_probability(),
            DuchiVariant::Corrected => {
                balance / (balance + (space - balance) * (-epsilon.value()).exp())
            }
        };

        if variant == DuchiVariant::Original && d % 2 == 0 {
            warn!(
                "original Duchi mechanism with even dimension {} is not exactly {}-LDP",
                d,
                epsilon.value()
            );
        }
        debug!(
            "duchi d = {} variant = {:?} B = {} C_d = {} p = {}",
            d, variant, bound, balance, positive_probability
        );

        Ok(DuchiMechanism {
            dimension,
            epsilon,
            variant,
            sampling,
            bound,
            balance,
            positive_probability,
        })
    }
}

impl DuchiMechanism {
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn epsilon(&self) -> Epsilon {
        self.epsilon
    }

    pub fn variant(&self) -> DuchiVariant {
        self.variant
    }

    pub fn sampling(&self) -> CandidateSampling {
        self.sampling
    }

    /// Output magnitude `B`.
    pub fn bound(&self) -> f64 {
        self.bound
    }

    /// `C_d`. The number of candidates in `T+` for the corrected variant.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Probability of reporting from `T+`.
    pub fn positive_probability(&self) -> f64 {
        self.positive_probability
    }

    /// An empty accumulator for this mechanism's reports.
    pub fn aggregator(&self) -> MeanAggregator {
        MeanAggregator::new(self.dimension)
    }

    /// Perturb one record.
    /// ## Arguments
    ///   * `tp`: the user's record, `d` coordinates in `[-1, 1]`
    ///   * `rng`: a random number generator
    /// ## Returns
    /// A vector in `{-B, +B}^d`.
    /// ## Errors
    /// Returns a domain error if `tp` has the wrong length or a coordinate
    /// outside `[-1, 1]`.
    pub fn encode<R: ThreadRandGen>(&self, tp: &[f64], rng: &mut R) -> Result<Vec<f64>> {
        if tp.len() != self.dimension {
            return Err(LdpError::domain(
                "DuchiMechanism::encode",
                format!("expected {} coordinates, got {}", self.dimension, tp.len()),
            ));
        }
        let unit = Bounds::unit();
        for x in tp {
            unit.require("DuchiMechanism::encode", *x)?;
        }

        let mut signs = 0u64;
        for (j, x) in tp.iter().enumerate() {
            if bernoulli(rng, 0.5 + 0.5 * x) {
                signs |= 1 << j;
            }
        }

        let positive = bernoulli(rng, self.positive_probability);
        let candidate = match self.sampling {
            CandidateSampling::Exhaustive => self.sample_exhaustive(signs, positive, rng),
            CandidateSampling::Rejection => self.sample_rejection(signs, positive, rng),
        };

        Ok((0..self.dimension)
            .map(|j| {
                if candidate & (1 << j) != 0 {
                    self.bound
                } else {
                    -self.bound
                }
            })
            .collect())
    }

    fn sample_exhaustive<R: ThreadRandGen>(&self, signs: u64, positive: bool, rng: &mut R) -> u64 {
        let d = self.dimension;
        let space = 1u64 << d;
        let members = (0..space)
            .filter(|c| in_positive_half(*c, signs, d) == positive)
            .count();
        let pick = uniform_index(rng, members);
        (0..space)
            .filter(|c| in_positive_half(*c, signs, d) == positive)
            .nth(pick)
            .unwrap_or(signs)
    }

    fn sample_rejection<R: ThreadRandGen>(&self, signs: u64, positive: bool, rng: &mut R) -> u64 {
        loop {
            let candidate = uniform_mask(rng, self.dimension);
            if in_positive_half(candidate, signs, self.dimension) == positive {
                return candidate;
            }
        }
    }
}

/// A candidate (bit `j` set means `+B`) is in `T+` when it agrees with the
/// sign vector in strictly more than half of the coordinates.
fn in_positive_half(candidate: u64, signs: u64, d: usize) -> bool {
    let mask = if d == 64 { u64::MAX } else { (1u64 << d) - 1 };
    let disagreements = ((candidate ^ signs) & mask).count_ones() as usize;
    2 * (d - disagreements) > d
}

/// Perturb `tp` with the original Duchi mechanism.
///
/// Configures a fresh [`DuchiMechanism`] on every call; build one once when
/// encoding a whole population.
pub fn encode_duchi<R: ThreadRandGen>(tp: &[f64], epsilon: Epsilon, rng: &mut R) -> Result<Vec<f64>> {
    DuchiMechanism::new(tp.len(), epsilon, DuchiVariant::Original)?.encode(tp, rng)
}

/// Perturb `tp` with the corrected-probability Duchi mechanism.
pub fn encode_duchi_corrected<R: ThreadRandGen>(
    tp: &[f64],
    epsilon: Epsilon,
    rng: &mut R,
) -> Result<Vec<f64>> {
    DuchiMechanism::new(tp.len(), epsilon, DuchiVariant::Corrected)?.encode(tp, rng)
}
