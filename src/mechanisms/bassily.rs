//! Bassily-Smith frequency oracle.
//!
//! The run shares one random `m x k` projection matrix `Phi` with entries
//! `+/- 1/sqrt(m)`. A user with value `v` picks a row `s` uniformly and
//! reports the single entry `Phi[s][v]`, scaled by `c * m` and passed through
//! binary randomized response (`c = (e^eps + 1) / (e^eps - 1)` undoes the
//! flip bias). The aggregator averages contributions per row into `z` and
//! estimates the frequency of value `l` as `<Phi[., l], z>`.
//!
//! The report size is independent of `k`. Users and the aggregator must use
//! the same matrix: build it once with [`ProjectionMatrix::build`] and pass
//! the same reference to every encoder and to the [`FrequencyAggregator`].
//! ## Example
//! ```
//! use ldp::{Aggregator, Beta, Epsilon, GeneratorSeeded};
//! use ldp::mechanisms::bassily::{encode_bassily, FrequencyAggregator, ProjectionMatrix};
//!
//! let epsilon = Epsilon::new(2.0).unwrap();
//! let beta = Beta::new(0.05).unwrap();
//! let values = vec![1usize; 500];
//! let mut rng = GeneratorSeeded::new(1);
//! let matrix = ProjectionMatrix::build(4, epsilon, beta, values.len(), &mut rng).unwrap();
//! let mut aggregator = FrequencyAggregator::new(&matrix);
//! for v in &values {
//!     let report = encode_bassily(*v, epsilon, &matrix, &mut rng).unwrap();
//!     aggregator.absorb(&report).unwrap();
//! }
//! let frequencies = aggregator.estimate().unwrap();
//! assert_eq!(frequencies.len(), 4);
//! ```

use log::debug;
use rug::rand::ThreadRandGen;
use serde::{Deserialize, Serialize};

use crate::mechanisms::Aggregator;
use crate::utilities::errors::{LdpError, Result};
use crate::utilities::params::{Beta, Epsilon};
use crate::utilities::randomness::{bernoulli, next_u64, uniform_index};

/// Largest accepted number of matrix entries.
pub const MAX_SKETCH_ENTRIES: u64 = 1 << 33;

/// Number of rows `m` of the projection matrix.
///
/// `gamma = sqrt(ln(2k/beta) / (epsilon^2 n))` and
/// `m = round(ln(k+1) ln(2/beta) / gamma^2)`.
/// ## Errors
/// Returns a configuration error if `k` or `n` is 0 or the matrix would be
/// too large, and `DegenerateSketch` if `m` rounds to 0.
pub fn sketch_size(k: usize, epsilon: Epsilon, beta: Beta, n: usize) -> Result<usize> {
    if k == 0 {
        return Err(LdpError::configuration("sketch_size", "k must be positive"));
    }
    if n == 0 {
        return Err(LdpError::configuration("sketch_size", "n must be positive"));
    }
    let (kf, e, b, nf) = (k as f64, epsilon.value(), beta.value(), n as f64);
    let gamma = ((2.0 * kf / b).ln() / (e * e * nf)).sqrt();
    let m = ((kf + 1.0).ln() * (2.0 / b).ln() / (gamma * gamma)).round();
    debug!("bassily sketch: gamma = {} m = {}", gamma, m);

    if !m.is_finite() || m <= 0.0 {
        return Err(LdpError::DegenerateSketch {
            m,
            k,
            epsilon: e,
            beta: b,
            n,
        });
    }
    if m * kf > MAX_SKETCH_ENTRIES as f64 {
        return Err(LdpError::configuration(
            "sketch_size",
            format!("projection matrix of {} x {} entries is too large", m, k),
        ));
    }
    Ok(m as usize)
}

/// The shared `m x k` sign matrix. Entry `(s, l)` is `+1/sqrt(m)` when its
/// bit is set and `-1/sqrt(m)` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionMatrix {
    rows: usize,
    cols: usize,
    scale: f64,
    signs: Vec<u64>,
}

impl ProjectionMatrix {
    /// Build the matrix for `k` values and `n` users.
    /// ## Arguments
    ///   * `k`: alphabet size
    ///   * `epsilon`: the privacy parameter
    ///   * `beta`: confidence of the error bound
    ///   * `n`: number of users
    ///   * `rng`: a random number generator
    /// ## Errors
    /// See [`sketch_size`].
    pub fn build<R: ThreadRandGen>(
        k: usize,
        epsilon: Epsilon,
        beta: Beta,
        n: usize,
        rng: &mut R,
    ) -> Result<ProjectionMatrix> {
        let m = sketch_size(k, epsilon, beta, n)?;
        let words = (m * k + 63) / 64;
        let signs = (0..words).map(|_| next_u64(rng)).collect();
        debug!("built {} x {} projection matrix", m, k);
        Ok(ProjectionMatrix {
            rows: m,
            cols: k,
            scale: 1.0 / (m as f64).sqrt(),
            signs,
        })
    }

    /// `m`
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// `k`
    pub fn cols(&self) -> usize {
        self.cols
    }

    fn sign(&self, row: usize, col: usize) -> f64 {
        let idx = row * self.cols + col;
        if (self.signs[idx / 64] >> (idx % 64)) & 1 == 1 {
            1.0
        } else {
            -1.0
        }
    }

    /// `Phi[row][col]`, zero-indexed.
    pub fn entry(&self, row: usize, col: usize) -> f64 {
        self.sign(row, col) * self.scale
    }

    /// `Phi^T z`, one value per column.
    pub fn project(&self, z: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.cols];
        for (row, zs) in z.iter().enumerate().take(self.rows) {
            if *zs == 0.0 {
                continue;
            }
            for (col, o) in out.iter_mut().enumerate() {
                *o += self.sign(row, col) * zs;
            }
        }
        out.iter_mut().for_each(|o| *o *= self.scale);
        out
    }
}

/// Build the run's matrix and return it with its row count `m`.
pub fn build_projection_matrix<R: ThreadRandGen>(
    k: usize,
    epsilon: Epsilon,
    beta: Beta,
    n: usize,
    rng: &mut R,
) -> Result<(usize, ProjectionMatrix)> {
    let matrix = ProjectionMatrix::build(k, epsilon, beta, n, rng)?;
    Ok((matrix.rows(), matrix))
}

/// One user's report: a row index and a signed contribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BassilyReport {
    pub bucket: usize,
    pub contribution: f64,
}

/// Perturb a value in `[1, k]`.
/// ## Errors
/// Returns a domain error if `value` is outside `[1, k]`.
pub fn encode_bassily<R: ThreadRandGen>(
    value: usize,
    epsilon: Epsilon,
    matrix: &ProjectionMatrix,
    rng: &mut R,
) -> Result<BassilyReport> {
    if value == 0 || value > matrix.cols() {
        return Err(LdpError::domain(
            "encode_bassily",
            format!("value {} outside [1, {}]", value, matrix.cols()),
        ));
    }
    let s = uniform_index(rng, matrix.rows());
    let c = epsilon.debias_scale();
    let alpha = c * matrix.rows() as f64 * matrix.entry(s, value - 1);
    let contribution = if bernoulli(rng, epsilon.keep_probability()) {
        alpha
    } else {
        -alpha
    };
    Ok(BassilyReport {
        bucket: s,
        contribution,
    })
}

/// Per-row sums of contributions against one shared matrix.
#[derive(Debug, Clone)]
pub struct FrequencyAggregator<'a> {
    matrix: &'a ProjectionMatrix,
    z_sum: Vec<f64>,
    n: usize,
}

impl<'a> FrequencyAggregator<'a> {
    pub fn new(matrix: &'a ProjectionMatrix) -> FrequencyAggregator<'a> {
        FrequencyAggregator {
            matrix,
            z_sum: vec![0.0; matrix.rows()],
            n: 0,
        }
    }
}

impl<'a> Aggregator for FrequencyAggregator<'a> {
    type Report = BassilyReport;
    type Estimate = Vec<f64>;

    fn absorb(&mut self, report: &BassilyReport) -> Result<()> {
        if report.bucket >= self.z_sum.len() {
            return Err(LdpError::domain(
                "FrequencyAggregator::absorb",
                format!("bucket {} outside [0, {})", report.bucket, self.z_sum.len()),
            ));
        }
        if !report.contribution.is_finite() {
            return Err(LdpError::domain(
                "FrequencyAggregator::absorb",
                "contribution is not finite",
            ));
        }
        self.z_sum[report.bucket] += report.contribution;
        self.n += 1;
        Ok(())
    }

    fn merge(&mut self, other: FrequencyAggregator<'a>) -> Result<()> {
        if !std::ptr::eq(self.matrix, other.matrix) {
            return Err(LdpError::configuration(
                "FrequencyAggregator::merge",
                "accumulators were built against different projection matrices",
            ));
        }
        for (a, b) in self.z_sum.iter_mut().zip(other.z_sum) {
            *a += b;
        }
        self.n += other.n;
        Ok(())
    }

    fn reports(&self) -> usize {
        self.n
    }

    /// Frequency estimate per value, index `l - 1` for value `l`. Negative
    /// estimates are clamped to 0; the result is not renormalized.
    fn estimate(&self) -> Result<Vec<f64>> {
        if self.n == 0 {
            return Err(LdpError::EmptyAggregate {
                operation: "FrequencyAggregator::estimate",
            });
        }
        let n = self.n as f64;
        let z_mean: Vec<f64> = self.z_sum.iter().map(|z| z / n).collect();
        let estimate: Vec<f64> = self
            .matrix
            .project(&z_mean)
            .into_iter()
            .map(|f| f.max(0.0))
            .collect();
        debug!(
            "bassily estimate from {} reports, total mass {}",
            self.n,
            estimate.iter().sum::<f64>()
        );
        Ok(estimate)
    }
}

/// Error bound `sqrt(ln(k/beta)) / (epsilon sqrt(n))` on each frequency.
pub fn error_bound(k: usize, beta: Beta, epsilon: Epsilon, n: usize) -> f64 {
    (k as f64 / beta.value()).ln().sqrt() / (epsilon.value() * (n as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::randomness::GeneratorSeeded;

    fn params() -> (Epsilon, Beta) {
        (Epsilon::new(2.0).unwrap(), Beta::new(0.05).unwrap())
    }

    #[test]
    fn test_sketch_size_formula() {
        let (eps, beta) = params();
        let (k, n) = (10usize, 20_000usize);
        let gamma2 = (2.0 * 10.0 / 0.05f64).ln() / (4.0 * 20_000.0);
        let expected = (11f64.ln() * (2.0 / 0.05f64).ln() / gamma2).round() as usize;
        assert_eq!(sketch_size(k, eps, beta, n).unwrap(), expected);
    }

    #[test]
    fn test_degenerate_sketch_rejected() {
        let eps = Epsilon::new(0.01).unwrap();
        let beta = Beta::new(0.5).unwrap();
        let mut rng = GeneratorSeeded::new(0);
        assert!(matches!(
            ProjectionMatrix::build(2, eps, beta, 1, &mut rng),
            Err(LdpError::DegenerateSketch { .. })
        ));
        assert!(sketch_size(2, eps, beta, 0).is_err());
        assert!(sketch_size(0, eps, beta, 10).is_err());
    }

    #[test]
    fn test_matrix_entries() {
        let (eps, beta) = params();
        let mut rng = GeneratorSeeded::new(3);
        let (m, matrix) = build_projection_matrix(5, eps, beta, 200, &mut rng).unwrap();
        assert_eq!(m, matrix.rows());
        assert_eq!(matrix.cols(), 5);
        let scale = 1.0 / (m as f64).sqrt();
        let mut positives = 0usize;
        for s in 0..m {
            for l in 0..5 {
                let e = matrix.entry(s, l);
                assert!((e.abs() - scale).abs() < 1e-15);
                if e > 0.0 {
                    positives += 1;
                }
            }
        }
        let share = positives as f64 / (m * 5) as f64;
        assert!((share - 0.5).abs() < 0.05, "share {}", share);
    }

    #[test]
    fn test_contribution_magnitude() {
        let (eps, beta) = params();
        let mut rng = GeneratorSeeded::new(4);
        let matrix = ProjectionMatrix::build(3, eps, beta, 100, &mut rng).unwrap();
        let magnitude = eps.debias_scale() * (matrix.rows() as f64).sqrt();
        for _ in 0..100 {
            let r = encode_bassily(2, eps, &matrix, &mut rng).unwrap();
            assert!(r.bucket < matrix.rows());
            assert!((r.contribution.abs() - magnitude).abs() < 1e-9);
        }
        assert!(encode_bassily(0, eps, &matrix, &mut rng).is_err());
        assert!(encode_bassily(4, eps, &matrix, &mut rng).is_err());
    }

    #[test]
    fn test_frequencies_recovered() {
        let (eps, beta) = params();
        let k = 10;
        let n = 20_000;
        let mut rng = GeneratorSeeded::new(21);
        let matrix = ProjectionMatrix::build(k, eps, beta, n, &mut rng).unwrap();
        let mut agg = FrequencyAggregator::new(&matrix);
        for i in 0..n {
            let v = match i % 10 {
                0..=4 => 1,
                5..=7 => 2,
                _ => 3,
            };
            agg.absorb(&encode_bassily(v, eps, &matrix, &mut rng).unwrap())
                .unwrap();
        }
        let est = agg.estimate().unwrap();
        let truth = [0.5, 0.3, 0.2, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        for (e, t) in est.iter().zip(truth.iter()) {
            assert!(*e >= 0.0);
            assert!((e - t).abs() < 0.05, "estimate {:?}", est);
        }
    }

    #[test]
    fn test_aggregator_validation_and_merge() {
        let (eps, beta) = params();
        let mut rng = GeneratorSeeded::new(5);
        let matrix = ProjectionMatrix::build(3, eps, beta, 100, &mut rng).unwrap();
        let other = ProjectionMatrix::build(3, eps, beta, 100, &mut rng).unwrap();

        let mut agg = FrequencyAggregator::new(&matrix);
        assert!(agg.estimate().is_err());
        let bad = BassilyReport {
            bucket: matrix.rows(),
            contribution: 1.0,
        };
        assert!(agg.absorb(&bad).is_err());
        assert_eq!(agg.reports(), 0);

        let mut part = FrequencyAggregator::new(&matrix);
        part.absorb(&encode_bassily(1, eps, &matrix, &mut rng).unwrap())
            .unwrap();
        agg.merge(part).unwrap();
        assert_eq!(agg.reports(), 1);

        assert!(agg.merge(FrequencyAggregator::new(&other)).is_err());
    }

    #[test]
    fn test_error_bound() {
        let eps = Epsilon::new(4.0).unwrap();
        let beta = Beta::new(0.05).unwrap();
        let bound = error_bound(100, beta, eps, 50_000);
        let expected = (100.0f64 / 0.05).ln().sqrt() / (4.0 * 50_000f64.sqrt());
        assert!((bound - expected).abs() < 1e-15);
    }
}
