//! Running vector sum shared by the mean mechanisms.

use crate::mechanisms::Aggregator;
use crate::utilities::errors::{LdpError, Result};

/// Coordinate-wise average of perturbed vectors.
///
/// Duchi and single-coordinate reports are already unbiased per coordinate,
/// so no correction beyond the average is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanAggregator {
    sum: Vec<f64>,
    n: usize,
}

impl MeanAggregator {
    pub fn new(dimension: usize) -> MeanAggregator {
        MeanAggregator {
            sum: vec![0.0; dimension],
            n: 0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.sum.len()
    }
}

impl Aggregator for MeanAggregator {
    type Report = Vec<f64>;
    type Estimate = Vec<f64>;

    fn absorb(&mut self, report: &Vec<f64>) -> Result<()> {
        if report.len() != self.sum.len() {
            return Err(LdpError::domain(
                "MeanAggregator::absorb",
                format!(
                    "expected a vector of dimension {}, got {}",
                    self.sum.len(),
                    report.len()
                ),
            ));
        }
        if report.iter().any(|x| !x.is_finite()) {
            return Err(LdpError::domain(
                "MeanAggregator::absorb",
                "report contains a non-finite coordinate",
            ));
        }
        for (s, x) in self.sum.iter_mut().zip(report) {
            *s += x;
        }
        self.n += 1;
        Ok(())
    }

    fn merge(&mut self, other: MeanAggregator) -> Result<()> {
        if other.sum.len() != self.sum.len() {
            return Err(LdpError::configuration(
                "MeanAggregator::merge",
                format!(
                    "dimension mismatch: {} vs {}",
                    self.sum.len(),
                    other.sum.len()
                ),
            ));
        }
        for (s, x) in self.sum.iter_mut().zip(other.sum) {
            *s += x;
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
                operation: "MeanAggregator::estimate",
            });
        }
        let n = self.n as f64;
        Ok(self.sum.iter().map(|s| s / n).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average() {
        let mut agg = MeanAggregator::new(2);
        agg.absorb(&vec![1.0, -3.0]).unwrap();
        agg.absorb(&vec![3.0, 1.0]).unwrap();
        assert_eq!(agg.estimate().unwrap(), vec![2.0, -1.0]);
    }

    #[test]
    fn test_merge_equals_single_pass() {
        let reports = vec![vec![1.0], vec![2.0], vec![4.0], vec![8.0]];
        let mut whole = MeanAggregator::new(1);
        for r in &reports {
            whole.absorb(r).unwrap();
        }
        let mut left = MeanAggregator::new(1);
        let mut right = MeanAggregator::new(1);
        left.absorb(&reports[0]).unwrap();
        right.absorb(&reports[1]).unwrap();
        right.absorb(&reports[2]).unwrap();
        right.absorb(&reports[3]).unwrap();
        left.merge(right).unwrap();
        assert_eq!(left, whole);
    }

    #[test]
    fn test_rejections_leave_state_untouched() {
        let mut agg = MeanAggregator::new(2);
        assert!(agg.absorb(&vec![1.0]).is_err());
        assert!(agg.absorb(&vec![1.0, f64::NAN]).is_err());
        assert!(matches!(
            agg.estimate(),
            Err(LdpError::EmptyAggregate { .. })
        ));
        assert!(agg.merge(MeanAggregator::new(3)).is_err());
    }
}
