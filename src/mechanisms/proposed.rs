//! Single-coordinate mean mechanism.
//!
//! Instead of perturbing the whole record, the user picks one coordinate `j`
//! uniformly and reports `+/- d * (e^epsilon + 1) / (e^epsilon - 1)` in that
//! coordinate only, with the sign chosen so its expectation is `d * tp[j]`.
//! Each coordinate is sampled by a `1/d` share of users, which the factor `d`
//! compensates, so the plain average of reports is unbiased. No enumeration
//! is involved, so any dimension is tractable.

use rug::rand::ThreadRandGen;

use crate::mechanisms::mean::MeanAggregator;
use crate::utilities::errors::{LdpError, Result};
use crate::utilities::params::{Bounds, Epsilon};
use crate::utilities::randomness::{bernoulli, uniform_index};

/// Magnitude of the single nonzero coordinate, `d * (e^eps + 1) / (e^eps - 1)`.
pub fn report_magnitude(dimension: usize, epsilon: Epsilon) -> f64 {
    dimension as f64 * epsilon.debias_scale()
}

/// Perturb one record.
/// ## Arguments
///   * `tp`: the user's record, coordinates in `[-1, 1]`
///   * `epsilon`: the privacy parameter
///   * `rng`: a random number generator
/// ## Returns
/// A vector of the same dimension with exactly one nonzero coordinate.
/// ## Errors
/// Returns a domain error if `tp` is empty or a coordinate lies outside
/// `[-1, 1]`.
pub fn encode_proposed<R: ThreadRandGen>(tp: &[f64], epsilon: Epsilon, rng: &mut R) -> Result<Vec<f64>> {
    let d = tp.len();
    if d == 0 {
        return Err(LdpError::domain("encode_proposed", "record is empty"));
    }
    let unit = Bounds::unit();
    for x in tp {
        unit.require("encode_proposed", *x)?;
    }

    let j = uniform_index(rng, d);
    // (tp[j] (e^eps - 1) + e^eps + 1) / (2 e^eps + 2)
    let pr = 0.5 + 0.5 * tp[j] * epsilon.bias_denominator();
    let value = report_magnitude(d, epsilon);

    let mut out = vec![0.0; d];
    out[j] = if bernoulli(rng, pr) { value } else { -value };
    Ok(out)
}

/// An empty accumulator for `dimension`-dimensional reports.
pub fn proposed_aggregator(dimension: usize) -> MeanAggregator {
    MeanAggregator::new(dimension)
}
