//! One-hot randomized-response histogram.
//!
//! A user holding category `i` of `k` builds the one-hot vector for `i` and
//! applies binary randomized response to every position with `epsilon / 2`.
//! Two users with different categories differ in exactly two positions, so
//! the whole vector is `epsilon`-LDP. The aggregator corrects each bucket's
//! count of ones independently.

use log::debug;
use rug::rand::ThreadRandGen;

use crate::mechanisms::randomized_response::{adjust, random_response};
use crate::mechanisms::Aggregator;
use crate::utilities::errors::{LdpError, Result};
use crate::utilities::params::Epsilon;

/// Perturb the one-hot encoding of `category` in `[0, k)`.
/// ## Errors
/// Returns a domain error if `category >= k`, and a configuration error if
/// `epsilon / 2` is degenerate.
pub fn encode_one_hot<R: ThreadRandGen>(
    category: usize,
    k: usize,
    epsilon: Epsilon,
    rng: &mut R,
) -> Result<Vec<u8>> {
    if category >= k {
        return Err(LdpError::domain(
            "encode_one_hot",
            format!("category {} outside [0, {})", category, k),
        ));
    }
    let per_bit = epsilon.scale(0.5)?;
    (0..k)
        .map(|i| random_response((i == category) as u8, per_bit, rng))
        .collect()
}

/// Per-bucket counts of ones over all one-hot reports.
#[derive(Debug, Clone)]
pub struct HistogramAggregator {
    epsilon: Epsilon,
    sums: Vec<u64>,
    n: usize,
}

impl HistogramAggregator {
    pub fn new(k: usize, epsilon: Epsilon) -> HistogramAggregator {
        HistogramAggregator {
            epsilon,
            sums: vec![0; k],
            n: 0,
        }
    }
}

impl Aggregator for HistogramAggregator {
    type Report = Vec<u8>;
    /// Estimated count of users per category. Not clamped.
    type Estimate = Vec<f64>;

    fn absorb(&mut self, report: &Vec<u8>) -> Result<()> {
        if report.len() != self.sums.len() {
            return Err(LdpError::domain(
                "HistogramAggregator::absorb",
                format!("expected {} bits, got {}", self.sums.len(), report.len()),
            ));
        }
        if let Some(bad) = report.iter().find(|b| **b > 1) {
            return Err(LdpError::domain(
                "HistogramAggregator::absorb",
                format!("report bits must be 0 or 1, got {}", bad),
            ));
        }
        for (sum, bit) in self.sums.iter_mut().zip(report) {
            *sum += *bit as u64;
        }
        self.n += 1;
        Ok(())
    }

    fn merge(&mut self, other: HistogramAggregator) -> Result<()> {
        if other.sums.len() != self.sums.len() || other.epsilon != self.epsilon {
            return Err(LdpError::configuration(
                "HistogramAggregator::merge",
                "accumulators were built with different parameters",
            ));
        }
        for (a, b) in self.sums.iter_mut().zip(other.sums) {
            *a += b;
        }
        self.n += other.n;
        Ok(())
    }

    fn reports(&self) -> usize {
        self.n
    }

    fn estimate(&self) -> Result<Vec<f64>> {
        if self.n == 0 {
            return Err(LdpError::EmptyAggregate {
                operation: "HistogramAggregator::estimate",
            });
        }
        let per_bit = self.epsilon.scale(0.5)?;
        debug!("histogram over {} buckets from {} reports", self.sums.len(), self.n);
        Ok(self
            .sums
            .iter()
            .map(|s| adjust(*s as f64, self.n, per_bit))
            .collect())
    }
}
