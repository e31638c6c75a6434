//! Randomized rounding of bounded continuous values, and the mean estimator
//! built on it.
//!
//! Rounding a value to one of the interval endpoints with a probability
//! linear in its position keeps the expectation equal to the value. A
//! continuous mean can then be estimated with binary randomized response:
//! the user rounds, encodes the upper endpoint as bit 1 and randomizes the
//! bit; the aggregator corrects the count of ones and maps it back to the
//! interval.

use rug::rand::ThreadRandGen;

use crate::mechanisms::randomized_response::{adjust, random_response};
use crate::mechanisms::Aggregator;
use crate::utilities::errors::{LdpError, Result};
use crate::utilities::params::{Bounds, Epsilon};
use crate::utilities::randomness::bernoulli;

/// Round `value` to `bounds.lower()` or `bounds.upper()`.
///
/// Returns `upper` with probability `(value - lower) / (upper - lower)` and
/// `lower` otherwise, so the expected output is `value`. Putting that weight
/// on `lower` instead would give the expectation `lower + upper - value`.
/// ## Errors
/// Returns a domain error if `value` lies outside `bounds`.
pub fn discretize<R: ThreadRandGen>(value: f64, bounds: Bounds, rng: &mut R) -> Result<f64> {
    bounds.require("discretize", value)?;
    let p = (value - bounds.lower()) / bounds.width();
    if bernoulli(rng, p) {
        Ok(bounds.upper())
    } else {
        Ok(bounds.lower())
    }
}

/// User side of the discretized mean estimator: round `value`, map the upper
/// endpoint to 1, and apply randomized response.
pub fn encode_discretized<R: ThreadRandGen>(
    value: f64,
    bounds: Bounds,
    epsilon: Epsilon,
    rng: &mut R,
) -> Result<u8> {
    let rounded = discretize(value, bounds, rng)?;
    let bit = if rounded == bounds.upper() { 1 } else { 0 };
    random_response(bit, epsilon, rng)
}

/// Aggregator for [`encode_discretized`] reports.
#[derive(Debug, Clone)]
pub struct DiscretizedMean {
    bounds: Bounds,
    epsilon: Epsilon,
    ones: u64,
    n: usize,
}

impl DiscretizedMean {
    pub fn new(bounds: Bounds, epsilon: Epsilon) -> DiscretizedMean {
        DiscretizedMean {
            bounds,
            epsilon,
            ones: 0,
            n: 0,
        }
    }
}

impl Aggregator for DiscretizedMean {
    type Report = u8;
    type Estimate = f64;

    fn absorb(&mut self, report: &u8) -> Result<()> {
        if *report > 1 {
            return Err(LdpError::domain(
                "DiscretizedMean::absorb",
                format!("report must be 0 or 1, got {}", report),
            ));
        }
        self.ones += *report as u64;
        self.n += 1;
        Ok(())
    }

    fn merge(&mut self, other: DiscretizedMean) -> Result<()> {
        if self.bounds != other.bounds || self.epsilon != other.epsilon {
            return Err(LdpError::configuration(
                "DiscretizedMean::merge",
                "accumulators were built with different parameters",
            ));
        }
        self.ones += other.ones;
        self.n += other.n;
        Ok(())
    }

    fn reports(&self) -> usize {
        self.n
    }

    /// `lower + (upper - lower) * adjust(ones, n, epsilon) / n`
    fn estimate(&self) -> Result<f64> {
        if self.n == 0 {
            return Err(LdpError::EmptyAggregate {
                operation: "DiscretizedMean::estimate",
            });
        }
        let upper_share = adjust(self.ones as f64, self.n, self.epsilon) / self.n as f64;
        Ok(self.bounds.lower() + self.bounds.width() * upper_share)
    }
}
