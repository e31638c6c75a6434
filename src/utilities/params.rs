//! Privacy and domain parameters.
//!
//! Every mechanism takes its parameters through these types so that range
//! checks happen once, at construction, and derived probabilities are always
//! computed the same way.

use serde::{Deserialize, Serialize};

use crate::utilities::errors::{LdpError, Result};

/// Smallest accepted epsilon. Below this `2p - 1` and `e^epsilon - 1` are too
/// close to zero for the bias corrections to be meaningful.
pub const MIN_EPSILON: f64 = 1e-6;

/// Largest accepted epsilon. `e^epsilon` must stay finite; `f64` overflows
/// just above `ln(f64::MAX) = 709.78`.
pub const MAX_EPSILON: f64 = 709.0;

/// The privacy parameter epsilon.
///
/// Higher epsilon means less noise and less privacy.
/// ## Example
/// ```
/// use ldp::Epsilon;
/// let epsilon = Epsilon::new(3f64.ln()).unwrap();
/// assert!((epsilon.keep_probability() - 0.75).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Epsilon(f64);

impl Epsilon {
    /// Create a new privacy parameter.
    /// ## Errors
    /// Returns a configuration error if `epsilon` is not finite or lies outside
    /// `[MIN_EPSILON, MAX_EPSILON]`.
    pub fn new(epsilon: f64) -> Result<Epsilon> {
        let e = Epsilon(epsilon);
        e.check()?;
        Ok(e)
    }

    /// Re-validate the parameter.
    pub fn check(&self) -> Result<()> {
        if !self.0.is_finite() || self.0 <= 0.0 {
            return Err(LdpError::configuration(
                "Epsilon::check",
                format!("epsilon must be a positive finite number, got {}", self.0),
            ));
        }
        if self.0 < MIN_EPSILON {
            return Err(LdpError::configuration(
                "Epsilon::check",
                format!(
                    "epsilon {} is below {}; bias correction denominators degenerate",
                    self.0, MIN_EPSILON
                ),
            ));
        }
        if self.0 > MAX_EPSILON {
            return Err(LdpError::configuration(
                "Epsilon::check",
                format!("epsilon {} exceeds {}", self.0, MAX_EPSILON),
            ));
        }
        Ok(())
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// `e^epsilon`
    pub fn exp(&self) -> f64 {
        self.0.exp()
    }

    /// `e^epsilon - 1`, computed without cancellation for small epsilon.
    pub fn exp_m1(&self) -> f64 {
        self.0.exp_m1()
    }

    /// Probability of reporting the true value under binary randomized
    /// response, `e^epsilon / (e^epsilon + 1)`.
    pub fn keep_probability(&self) -> f64 {
        1.0 / (1.0 + (-self.0).exp())
    }

    /// `2p - 1` for the binary keep probability `p`. Equal to
    /// `tanh(epsilon / 2)`.
    pub fn bias_denominator(&self) -> f64 {
        (self.0 / 2.0).tanh()
    }

    /// `(e^epsilon + 1) / (e^epsilon - 1)`, the inverse of
    /// [`bias_denominator`](#method.bias_denominator).
    pub fn debias_scale(&self) -> f64 {
        1.0 / self.bias_denominator()
    }

    /// Split off a fraction of this budget.
    /// ## Errors
    /// Returns a configuration error if `fraction` is not in `(0, 1]` or if
    /// the resulting epsilon is degenerate.
    pub fn scale(&self, fraction: f64) -> Result<Epsilon> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(LdpError::configuration(
                "Epsilon::scale",
                format!("fraction must be in (0, 1], got {}", fraction),
            ));
        }
        Epsilon::new(self.0 * fraction)
    }
}

impl std::convert::TryFrom<f64> for Epsilon {
    type Error = LdpError;

    fn try_from(value: f64) -> Result<Epsilon> {
        Epsilon::new(value)
    }
}

impl From<Epsilon> for f64 {
    fn from(e: Epsilon) -> f64 {
        e.0
    }
}

/// Confidence parameter of the Bassily-Smith error bound, in `(0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Beta(f64);

impl Beta {
    pub fn new(beta: f64) -> Result<Beta> {
        if !(beta > 0.0 && beta < 1.0) {
            return Err(LdpError::configuration(
                "Beta::new",
                format!("beta must be in (0, 1), got {}", beta),
            ));
        }
        Ok(Beta(beta))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl std::convert::TryFrom<f64> for Beta {
    type Error = LdpError;

    fn try_from(value: f64) -> Result<Beta> {
        Beta::new(value)
    }
}

impl From<Beta> for f64 {
    fn from(b: Beta) -> f64 {
        b.0
    }
}

/// The pair of budgets used by PrivKV: `epsilon_k` protects key presence,
/// `epsilon_v` protects the value. A single report is
/// `(epsilon_k + epsilon_v)`-LDP.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyValueBudget {
    pub epsilon_k: Epsilon,
    pub epsilon_v: Epsilon,
}

impl KeyValueBudget {
    pub fn new(epsilon_k: Epsilon, epsilon_v: Epsilon) -> KeyValueBudget {
        KeyValueBudget {
            epsilon_k,
            epsilon_v,
        }
    }

    /// Split a total budget, giving `key_share` of it to the key.
    /// ## Errors
    /// Returns a configuration error unless `key_share` is strictly between
    /// 0 and 1, or if either part is degenerate.
    pub fn split(total: Epsilon, key_share: f64) -> Result<KeyValueBudget> {
        if !(key_share > 0.0 && key_share < 1.0) {
            return Err(LdpError::configuration(
                "KeyValueBudget::split",
                format!("key share must be in (0, 1), got {}", key_share),
            ));
        }
        Ok(KeyValueBudget {
            epsilon_k: total.scale(key_share)?,
            epsilon_v: total.scale(1.0 - key_share)?,
        })
    }

    pub fn total(&self) -> f64 {
        self.epsilon_k.value() + self.epsilon_v.value()
    }
}

/// A closed real interval `[lower, upper]` with `lower < upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    lower: f64,
    upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Result<Bounds> {
        if !lower.is_finite() || !upper.is_finite() || lower >= upper {
            return Err(LdpError::configuration(
                "Bounds::new",
                format!("need finite lower < upper, got [{}, {}]", lower, upper),
            ));
        }
        Ok(Bounds { lower, upper })
    }

    /// The interval `[-1, 1]` used by every mean mechanism.
    pub fn unit() -> Bounds {
        Bounds {
            lower: -1.0,
            upper: 1.0,
        }
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Fail with a domain error naming `operation` if `value` is outside.
    pub fn require(&self, operation: &'static str, value: f64) -> Result<()> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(LdpError::domain(
                operation,
                format!(
                    "value {} outside [{}, {}]",
                    value, self.lower, self.upper
                ),
            ))
        }
    }
}
