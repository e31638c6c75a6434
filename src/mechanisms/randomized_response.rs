//! Randomized response, the primitive behind every other mechanism.
//!
//! A user keeps their true answer with probability
//! `p = e^epsilon / (e^epsilon + n - 1)` for an alphabet of size `n`, and
//! otherwise reports an alternative. Because `p` is known, the aggregator
//! can invert the expected bias of the observed counts.

use rug::rand::ThreadRandGen;

use crate::utilities::errors::{LdpError, Result};
use crate::utilities::params::Epsilon;
use crate::utilities::randomness::{bernoulli, uniform};

/// Outcome of a single biased coin flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flip {
    Kept,
    Alternative,
}

/// Flip a coin that lands on [`Flip::Kept`] with probability
/// `true_probability`.
/// ## Errors
/// Returns a configuration error if `true_probability` is not in `[0, 1]`.
pub fn flip<R: ThreadRandGen>(true_probability: f64, rng: &mut R) -> Result<Flip> {
    if !(0.0..=1.0).contains(&true_probability) {
        return Err(LdpError::configuration(
            "flip",
            format!("probability must be in [0, 1], got {}", true_probability),
        ));
    }
    if uniform(rng) < true_probability {
        Ok(Flip::Kept)
    } else {
        Ok(Flip::Alternative)
    }
}

/// Probability of reporting the true value among `alphabet_size` choices,
/// `e^epsilon / (e^epsilon + alphabet_size - 1)`. Always in
/// `(1/alphabet_size, 1)`.
/// ## Errors
/// Returns a configuration error if `alphabet_size < 2`.
pub fn epsilon_to_probability(epsilon: Epsilon, alphabet_size: usize) -> Result<f64> {
    if alphabet_size < 2 {
        return Err(LdpError::configuration(
            "epsilon_to_probability",
            format!("alphabet size must be at least 2, got {}", alphabet_size),
        ));
    }
    // e^eps / (e^eps + n - 1) rewritten so e^eps never overflows.
    let others = (alphabet_size - 1) as f64;
    Ok(1.0 / (1.0 + others * (-epsilon.value()).exp()))
}

/// Return `value` with probability `e^epsilon / (e^epsilon + 1)`, otherwise
/// `alternative`.
pub fn perturbation<T, R: ThreadRandGen>(value: T, alternative: T, epsilon: Epsilon, rng: &mut R) -> T {
    if bernoulli(rng, epsilon.keep_probability()) {
        value
    } else {
        alternative
    }
}

/// Binary randomized response on a bit.
/// ## Arguments
///   * `bit`: the true value, 0 or 1
///   * `epsilon`: the privacy parameter
///   * `rng`: a random number generator
/// ## Returns
/// `bit` with probability `e^epsilon / (e^epsilon + 1)`, else `1 - bit`.
/// ## Errors
/// Returns a domain error if `bit` is not 0 or 1.
pub fn random_response<R: ThreadRandGen>(bit: u8, epsilon: Epsilon, rng: &mut R) -> Result<u8> {
    if bit > 1 {
        return Err(LdpError::domain(
            "random_response",
            format!("input must be 0 or 1, got {}", bit),
        ));
    }
    Ok(perturbation(bit, 1 - bit, epsilon, rng))
}

/// Estimate the true number of ones from `sum` observed ones out of `n`
/// randomized responses: `(sum + p*n - n) / (2p - 1)`.
///
/// The estimate is unbiased and is not clamped, so it can fall outside
/// `[0, n]` through sampling noise.
pub fn adjust(sum: f64, n: usize, epsilon: Epsilon) -> f64 {
    let p = epsilon.keep_probability();
    let n = n as f64;
    (sum + p * n - n) / epsilon.bias_denominator()
}
