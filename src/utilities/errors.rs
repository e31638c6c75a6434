//! Error taxonomy shared by every mechanism and aggregator.

use thiserror::Error;

/// Errors raised by parameter validation, user-side encoding and
/// aggregator-side estimation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LdpError {
    /// An input value lies outside its declared domain.
    #[error("domain error in {operation}: {reason}")]
    Domain {
        operation: &'static str,
        reason: String,
    },

    /// A privacy parameter or structural option is invalid or numerically
    /// degenerate.
    #[error("configuration error in {operation}: {reason}")]
    Configuration {
        operation: &'static str,
        reason: String,
    },

    /// The derived Bassily sketch size is not positive.
    #[error(
        "degenerate sketch: derived size m = {m} (k = {k}, epsilon = {epsilon}, beta = {beta}, n = {n})"
    )]
    DegenerateSketch {
        m: f64,
        k: usize,
        epsilon: f64,
        beta: f64,
        n: usize,
    },

    /// Candidate space of the Duchi mechanism is too large to sample from.
    #[error("intractable enumeration: dimension {dimension} exceeds the limit of {limit}")]
    IntractableEnumeration { dimension: usize, limit: usize },

    /// Estimation was requested before any report was absorbed.
    #[error("empty aggregate in {operation}: no reports were absorbed")]
    EmptyAggregate { operation: &'static str },
}

impl LdpError {
    pub(crate) fn domain(operation: &'static str, reason: impl Into<String>) -> Self {
        LdpError::Domain {
            operation,
            reason: reason.into(),
        }
    }

    pub(crate) fn configuration(operation: &'static str, reason: impl Into<String>) -> Self {
        LdpError::Configuration {
            operation,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LdpError>;
