//! Population-level drivers.
//!
//! Per-user encoding is independent across users, so user `i` always draws
//! from stream `i` of the run seed. The sequential and parallel drivers
//! therefore produce identical reports for the same seed. A failed user is
//! reported in place and does not affect any other user.

use log::{debug, trace};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::mechanisms::Aggregator;
use crate::utilities::errors::Result;
use crate::utilities::randomness::GeneratorSeeded;

/// Reports per chunk handed to one aggregation worker.
#[cfg(feature = "parallel")]
const AGGREGATION_CHUNK: usize = 4096;

/// Encode every record with its own random stream.
/// ## Arguments
///   * `records`: one private input per user
///   * `seed`: the run seed; user `i` uses stream `i`
///   * `encode`: the user-side encoder of a mechanism
/// ## Returns
/// One result per record, in input order.
pub fn encode_batch<T, M, F>(records: &[T], seed: u64, encode: F) -> Vec<Result<M>>
where
    F: Fn(&T, &mut GeneratorSeeded) -> Result<M>,
{
    debug!("encoding {} records sequentially", records.len());
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let mut rng = GeneratorSeeded::for_stream(seed, i as u64);
            encode(record, &mut rng)
        })
        .collect()
}

/// Parallel counterpart of [`encode_batch`] on the rayon thread pool.
#[cfg(feature = "parallel")]
pub fn encode_batch_parallel<T, M, F>(records: &[T], seed: u64, encode: F) -> Vec<Result<M>>
where
    T: Sync,
    M: Send,
    F: Fn(&T, &mut GeneratorSeeded) -> Result<M> + Sync + Send,
{
    debug!("encoding {} records in parallel", records.len());
    records
        .par_iter()
        .enumerate()
        .map(|(i, record)| {
            let mut rng = GeneratorSeeded::for_stream(seed, i as u64);
            encode(record, &mut rng)
        })
        .collect()
}

/// Fold `reports` into `aggregator`, stopping at the first invalid report.
pub fn aggregate_batch<'r, A>(
    mut aggregator: A,
    reports: impl IntoIterator<Item = &'r A::Report>,
) -> Result<A>
where
    A: Aggregator,
    A::Report: 'r,
{
    let mut absorbed = 0usize;
    for report in reports {
        aggregator.absorb(report)?;
        absorbed += 1;
    }
    trace!("absorbed {} reports", absorbed);
    Ok(aggregator)
}

/// Fold `reports` with partial accumulators on the rayon thread pool and
/// merge them. `empty` is the accumulator every partial sum starts from.
#[cfg(feature = "parallel")]
pub fn aggregate_parallel<A>(empty: &A, reports: &[A::Report]) -> Result<A>
where
    A: Aggregator + Clone + Send + Sync,
    A::Report: Sync,
{
    debug!("aggregating {} reports in parallel", reports.len());
    reports
        .par_chunks(AGGREGATION_CHUNK)
        .map(|chunk| {
            let mut partial = empty.clone();
            for report in chunk {
                partial.absorb(report)?;
            }
            Ok(partial)
        })
        .try_reduce(
            || empty.clone(),
            |mut left, right| {
                left.merge(right)?;
                Ok(left)
            },
        )
}
