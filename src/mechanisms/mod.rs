//! User-side perturbation and aggregator-side estimation.
//!
//! Each mechanism module exposes a pure encoder that turns one user's private
//! input into a perturbed report, and an [`Aggregator`] that folds reports
//! into sums and produces the bias-corrected estimate once all reports are in.

use crate::utilities::errors::Result;

pub mod randomized_response;
pub mod discretization;
pub mod histogram;
pub mod mean;
pub mod duchi;
pub mod proposed;
pub mod bassily;
pub mod privkv;

/// Accumulates perturbed reports and produces a corrected estimate.
///
/// `absorb` validates the report before touching any accumulator, so a
/// rejected report leaves the state unchanged. `merge` is associative and
/// commutative, so partial accumulators built on separate workers can be
/// combined in any order.
pub trait Aggregator: Sized {
    /// The perturbed message sent by one user.
    type Report;
    /// The corrected estimate.
    type Estimate;

    /// Add one report.
    fn absorb(&mut self, report: &Self::Report) -> Result<()>;

    /// Combine with an accumulator built from a disjoint set of reports.
    fn merge(&mut self, other: Self) -> Result<()>;

    /// Number of reports absorbed so far.
    fn reports(&self) -> usize;

    /// Produce the bias-corrected estimate.
    fn estimate(&self) -> Result<Self::Estimate>;
}
