//! PrivKV: frequency and mean estimation over key-value data.
//!
//! Each user holds a sparse set of `(key, value)` pairs with keys in `[1, d]`
//! and values in `[-1, 1]`. The user samples one key `j` uniformly and sends
//! a single triple `(presence, value bit, j)`:
//! * the value (or, for a missing key, a uniform fake value) is rounded to
//!   `+/-1` and randomized with `epsilon_v`;
//! * presence is randomized with `epsilon_k`, with the roles of "keep" and
//!   "flip" swapped when the key is missing, so the presence bit is
//!   `epsilon_k`-LDP for key membership.
//!
//! The aggregator corrects the presence counts into key frequencies, then
//! corrects the positive and negative value counts per key into a mean.

use std::collections::BTreeMap;

use log::debug;
use rug::rand::ThreadRandGen;
use serde::{Deserialize, Serialize};

use crate::mechanisms::Aggregator;
use crate::utilities::errors::{LdpError, Result};
use crate::utilities::params::{Bounds, Epsilon, KeyValueBudget};
use crate::utilities::randomness::{bernoulli, uniform_index, uniform_range};

/// One user's key-value data.
///
/// Serialized as a map from key to value. Deserialization applies the same
/// checks as [`KeyValueRecord::new`] except the upper key limit, which
/// [`encode_privkv`] checks against its dimension.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<usize, f64>", into = "BTreeMap<usize, f64>")]
pub struct KeyValueRecord {
    pairs: BTreeMap<usize, f64>,
}

impl KeyValueRecord {
    /// Build a record from `(key, value)` pairs.
    /// ## Errors
    /// Returns a domain error if a key is outside `[1, dimension]`, a value is
    /// outside `[-1, 1]`, or a key repeats.
    pub fn new<I>(pairs: I, dimension: usize) -> Result<KeyValueRecord>
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        let unit = Bounds::unit();
        let mut map = BTreeMap::new();
        for (key, value) in pairs {
            check_key("KeyValueRecord::new", key, dimension)?;
            unit.require("KeyValueRecord::new", value)?;
            if map.insert(key, value).is_some() {
                return Err(LdpError::domain(
                    "KeyValueRecord::new",
                    format!("key {} appears more than once", key),
                ));
            }
        }
        Ok(KeyValueRecord { pairs: map })
    }

    pub fn get(&self, key: usize) -> Option<f64> {
        self.pairs.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Largest key held, if any.
    pub fn max_key(&self) -> Option<usize> {
        self.pairs.keys().next_back().copied()
    }
}

impl std::convert::TryFrom<BTreeMap<usize, f64>> for KeyValueRecord {
    type Error = LdpError;

    fn try_from(pairs: BTreeMap<usize, f64>) -> Result<KeyValueRecord> {
        let dimension = pairs.keys().next_back().copied().unwrap_or(0);
        KeyValueRecord::new(pairs, dimension)
    }
}

impl From<KeyValueRecord> for BTreeMap<usize, f64> {
    fn from(record: KeyValueRecord) -> BTreeMap<usize, f64> {
        record.pairs
    }
}

fn check_key(operation: &'static str, key: usize, dimension: usize) -> Result<()> {
    if key == 0 || key > dimension {
        return Err(LdpError::domain(
            operation,
            format!("key {} outside [1, {}]", key, dimension),
        ));
    }
    Ok(())
}

/// One user's perturbed triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvReport {
    /// Randomized presence bit.
    pub present: bool,
    /// `+1` or `-1` when `present`, `0` otherwise.
    pub value: i8,
    /// Sampled key, in `[1, d]`.
    pub key: usize,
}

/// Round `value` to `+/-1` (`+1` with probability `(1 + value) / 2`) and keep
/// the sign with probability `e^epsilon / (e^epsilon + 1)`.
/// ## Errors
/// Returns a domain error if `value` is outside `[-1, 1]`.
pub fn perturb_value<R: ThreadRandGen>(value: f64, epsilon: Epsilon, rng: &mut R) -> Result<i8> {
    Bounds::unit().require("perturb_value", value)?;
    let rounded: i8 = if bernoulli(rng, (1.0 + value) / 2.0) { 1 } else { -1 };
    if bernoulli(rng, epsilon.keep_probability()) {
        Ok(rounded)
    } else {
        Ok(-rounded)
    }
}

/// Perturb one user's data.
/// ## Arguments
///   * `record`: the user's key-value pairs
///   * `dimension`: number of possible keys `d`
///   * `budget`: `epsilon_k` for presence, `epsilon_v` for the value
///   * `rng`: a random number generator
/// ## Errors
/// Returns a configuration error if `dimension` is 0 and a domain error if
/// the record holds a key above `dimension`.
pub fn encode_privkv<R: ThreadRandGen>(
    record: &KeyValueRecord,
    dimension: usize,
    budget: KeyValueBudget,
    rng: &mut R,
) -> Result<KvReport> {
    if dimension == 0 {
        return Err(LdpError::configuration(
            "encode_privkv",
            "dimension must be positive",
        ));
    }
    if let Some(max) = record.max_key() {
        check_key("encode_privkv", max, dimension)?;
    }

    let key = uniform_index(rng, dimension) + 1;
    let p_keep = budget.epsilon_k.keep_probability();
    let (present, value) = match record.get(key) {
        Some(v) => {
            let bit = perturb_value(v, budget.epsilon_v, rng)?;
            (bernoulli(rng, p_keep), bit)
        }
        None => {
            let fake = uniform_range(rng, -1.0, 1.0);
            let bit = perturb_value(fake, budget.epsilon_v, rng)?;
            (!bernoulli(rng, p_keep), bit)
        }
    };

    Ok(KvReport {
        present,
        value: if present { value } else { 0 },
        key,
    })
}

/// Per-key estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvEstimate {
    /// `f_k[j - 1]`: fraction of users holding key `j`.
    pub frequencies: Vec<f64>,
    /// `m_k[j - 1]`: mean value of key `j` among its holders.
    pub means: Vec<f64>,
}

/// Per-key positive, negative and presence counts.
#[derive(Debug, Clone, PartialEq)]
pub struct KvAggregator {
    budget: KeyValueBudget,
    count: Vec<u64>,
    pos: Vec<u64>,
    neg: Vec<u64>,
    n: usize,
}

impl KvAggregator {
    pub fn new(dimension: usize, budget: KeyValueBudget) -> KvAggregator {
        KvAggregator {
            budget,
            count: vec![0; dimension],
            pos: vec![0; dimension],
            neg: vec![0; dimension],
            n: 0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.count.len()
    }
}

impl Aggregator for KvAggregator {
    type Report = KvReport;
    type Estimate = KvEstimate;

    fn absorb(&mut self, report: &KvReport) -> Result<()> {
        check_key("KvAggregator::absorb", report.key, self.dimension())?;
        let consistent = match (report.present, report.value) {
            (true, 1) | (true, -1) | (false, 0) => true,
            _ => false,
        };
        if !consistent {
            return Err(LdpError::domain(
                "KvAggregator::absorb",
                format!(
                    "value bit {} is inconsistent with presence {}",
                    report.value, report.present
                ),
            ));
        }

        let j = report.key - 1;
        if report.present {
            self.count[j] += 1;
            if report.value == 1 {
                self.pos[j] += 1;
            } else {
                self.neg[j] += 1;
            }
        }
        self.n += 1;
        Ok(())
    }

    fn merge(&mut self, other: KvAggregator) -> Result<()> {
        if other.dimension() != self.dimension() || other.budget != self.budget {
            return Err(LdpError::configuration(
                "KvAggregator::merge",
                "accumulators were built with different parameters",
            ));
        }
        for j in 0..self.dimension() {
            self.count[j] += other.count[j];
            self.pos[j] += other.pos[j];
            self.neg[j] += other.neg[j];
        }
        self.n += other.n;
        Ok(())
    }

    fn reports(&self) -> usize {
        self.n
    }

    fn estimate(&self) -> Result<KvEstimate> {
        if self.n == 0 {
            return Err(LdpError::EmptyAggregate {
                operation: "KvAggregator::estimate",
            });
        }
        let n = self.n as f64;

        // Key frequencies.
        let p1 = self.budget.epsilon_k.keep_probability();
        let denom1 = self.budget.epsilon_k.bias_denominator();
        let frequencies = self
            .count
            .iter()
            .map(|c| (p1 - 1.0 + *c as f64 / n) / denom1)
            .collect();

        // Value means.
        let p2 = self.budget.epsilon_v.keep_probability();
        let denom2 = self.budget.epsilon_v.bias_denominator();
        let means = self
            .pos
            .iter()
            .zip(&self.neg)
            .map(|(pos, neg)| {
                let (pos, neg) = (*pos as f64, *neg as f64);
                let total = pos + neg;
                let n1 = (total * (p2 - 1.0) / denom2 + pos / denom2).max(0.0).min(total);
                let n2 = (total * (p2 - 1.0) / denom2 + neg / denom2).max(0.0).min(total);
                let total = if total == 0.0 { 1.0 } else { total };
                (n1 - n2) / total
            })
            .collect();

        debug!(
            "privkv estimate over {} keys from {} reports",
            self.dimension(),
            self.n
        );
        Ok(KvEstimate { frequencies, means })
    }
}
