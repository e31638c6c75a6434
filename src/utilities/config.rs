//! Estimation run configuration.
//!
//! A run is described by a flat record of the recognized options. Every
//! field except `epsilon` is optional; accessors validate on demand and name
//! the missing option when a mechanism needs it.
//! ## Example
//! ```
//! use ldp::EstimationConfig;
//! let config = EstimationConfig::from_json(r#"{
//!     "epsilon": 4.0,
//!     "beta": 0.05,
//!     "alphabet_size": 100,
//!     "seed": 11
//! }"#).unwrap();
//! assert_eq!(config.alphabet_size().unwrap(), 100);
//! assert!(config.dimension().is_err());
//! assert_eq!(config.key_value_budget().unwrap().epsilon_k.value(), 2.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::utilities::errors::{LdpError, Result};
use crate::utilities::params::{Beta, Bounds, Epsilon, KeyValueBudget};
use crate::utilities::randomness::GeneratorSeeded;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EstimationConfig {
    pub epsilon: f64,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default)]
    pub epsilon_k: Option<f64>,
    #[serde(default)]
    pub epsilon_v: Option<f64>,
    #[serde(default)]
    pub dimension: Option<usize>,
    #[serde(default)]
    pub alphabet_size: Option<usize>,
    #[serde(default)]
    pub lower: Option<f64>,
    #[serde(default)]
    pub upper: Option<f64>,
    /// Seed for reproducible runs. Absent means fresh entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn missing(option: &str) -> LdpError {
    LdpError::configuration("EstimationConfig", format!("option `{}` is required", option))
}

impl EstimationConfig {
    pub fn new(epsilon: f64) -> EstimationConfig {
        EstimationConfig {
            epsilon,
            beta: None,
            epsilon_k: None,
            epsilon_v: None,
            dimension: None,
            alphabet_size: None,
            lower: None,
            upper: None,
            seed: None,
        }
    }

    /// Parse and validate a JSON configuration.
    /// ## Errors
    /// Returns a configuration error on malformed JSON, unknown options, or an
    /// invalid `epsilon`.
    pub fn from_json(json: &str) -> Result<EstimationConfig> {
        let config: EstimationConfig = serde_json::from_str(json).map_err(|e| {
            LdpError::configuration("EstimationConfig::from_json", e.to_string())
        })?;
        config.epsilon()?;
        Ok(config)
    }

    pub fn epsilon(&self) -> Result<Epsilon> {
        Epsilon::new(self.epsilon)
    }

    pub fn beta(&self) -> Result<Beta> {
        Beta::new(self.beta.ok_or_else(|| missing("beta"))?)
    }

    /// Key and value budgets for PrivKV. Falls back to an even split of
    /// `epsilon` when neither `epsilon_k` nor `epsilon_v` is set.
    pub fn key_value_budget(&self) -> Result<KeyValueBudget> {
        match (self.epsilon_k, self.epsilon_v) {
            (Some(k), Some(v)) => Ok(KeyValueBudget::new(Epsilon::new(k)?, Epsilon::new(v)?)),
            (None, None) => KeyValueBudget::split(self.epsilon()?, 0.5),
            (None, _) => Err(missing("epsilon_k")),
            (_, None) => Err(missing("epsilon_v")),
        }
    }

    pub fn dimension(&self) -> Result<usize> {
        match self.dimension {
            Some(0) => Err(LdpError::configuration(
                "EstimationConfig",
                "dimension must be positive",
            )),
            Some(d) => Ok(d),
            None => Err(missing("dimension")),
        }
    }

    pub fn alphabet_size(&self) -> Result<usize> {
        match self.alphabet_size {
            Some(0) => Err(LdpError::configuration(
                "EstimationConfig",
                "alphabet_size must be positive",
            )),
            Some(k) => Ok(k),
            None => Err(missing("alphabet_size")),
        }
    }

    pub fn bounds(&self) -> Result<Bounds> {
        let lower = self.lower.ok_or_else(|| missing("lower"))?;
        let upper = self.upper.ok_or_else(|| missing("upper"))?;
        Bounds::new(lower, upper)
    }

    /// Generator for the run: seeded when `seed` is set.
    pub fn generator(&self) -> GeneratorSeeded {
        match self.seed {
            Some(seed) => GeneratorSeeded::new(seed),
            None => GeneratorSeeded::from_entropy(),
        }
    }
}
