//! Sources of randomness.
//!
//! Mechanisms are generic over [`ThreadRandGen`](rug::rand::ThreadRandGen) and
//! take the generator by mutable reference, so every call site decides where
//! its entropy comes from:
//! * [`GeneratorOpenSSL`] draws from the OpenSSL CSPRNG and is the generator
//!   to use when perturbing real user data.
//! * [`GeneratorSeeded`] is a ChaCha20 stream keyed by a `u64` seed. Numbered
//!   streams give each worker an independent sequence, which makes
//!   simulations reproducible and safe to run in parallel.
//!
//! The helpers below convert raw 32-bit words into the uniform draws the
//! mechanisms need.

use openssl::rand::rand_bytes;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rug::rand::ThreadRandGen;

/// Random generator backed by OpenSSL's `rand_bytes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratorOpenSSL {}

impl ThreadRandGen for GeneratorOpenSSL {
    /// ## Panics
    /// Panics if OpenSSL cannot supply entropy. Continuing with a weak
    /// source would silently void the privacy guarantee.
    fn gen(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        if let Err(e) = rand_bytes(&mut buf) {
            panic!("OpenSSL entropy source failed: {}", e);
        }
        u32::from_le_bytes(buf)
    }
}

/// Deterministic generator for reproducible simulations.
///
/// Two generators built from the same `(seed, stream)` pair produce the same
/// sequence; different streams under one seed are independent.
/// ## Example
/// ```
/// use ldp::GeneratorSeeded;
/// use rug::rand::ThreadRandGen;
/// let mut a = GeneratorSeeded::new(7);
/// let mut b = GeneratorSeeded::new(7);
/// assert_eq!(a.gen(), b.gen());
/// ```
#[derive(Debug, Clone)]
pub struct GeneratorSeeded {
    inner: ChaCha20Rng,
}

impl GeneratorSeeded {
    pub fn new(seed: u64) -> GeneratorSeeded {
        GeneratorSeeded {
            inner: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Generator for worker or user number `stream` under `seed`.
    pub fn for_stream(seed: u64, stream: u64) -> GeneratorSeeded {
        let mut inner = ChaCha20Rng::seed_from_u64(seed);
        inner.set_stream(stream);
        GeneratorSeeded { inner }
    }

    /// Generator keyed from the operating system's entropy pool.
    pub fn from_entropy() -> GeneratorSeeded {
        GeneratorSeeded {
            inner: ChaCha20Rng::from_entropy(),
        }
    }
}

impl ThreadRandGen for GeneratorSeeded {
    fn gen(&mut self) -> u32 {
        self.inner.next_u32()
    }
}

const TWO_POW_53: f64 = 9_007_199_254_740_992.0;

/// 64 random bits from two 32-bit draws.
pub fn next_u64<R: ThreadRandGen>(rng: &mut R) -> u64 {
    let hi = rng.gen() as u64;
    let lo = rng.gen() as u64;
    (hi << 32) | lo
}

/// Uniform draw from `[0, 1)` with 53 bits of precision.
pub fn uniform<R: ThreadRandGen>(rng: &mut R) -> f64 {
    (next_u64(rng) >> 11) as f64 / TWO_POW_53
}

/// Uniform draw from `[lower, upper)`.
pub fn uniform_range<R: ThreadRandGen>(rng: &mut R, lower: f64, upper: f64) -> f64 {
    lower + (upper - lower) * uniform(rng)
}

/// `true` with probability `p`.
pub fn bernoulli<R: ThreadRandGen>(rng: &mut R, p: f64) -> bool {
    uniform(rng) < p
}

/// Uniform index in `[0, bound)`, without modulo bias. `bound` must be
/// positive.
pub fn uniform_index<R: ThreadRandGen>(rng: &mut R, bound: usize) -> usize {
    debug_assert!(bound > 0);
    let bound = bound as u64;
    // Largest multiple of bound that fits; draws at or above it are retried.
    let zone = u64::MAX - (u64::MAX % bound);
    loop {
        let x = next_u64(rng);
        if x < zone {
            return (x % bound) as usize;
        }
    }
}

/// Uniform mask over the lowest `bits` bits (`bits <= 64`).
pub fn uniform_mask<R: ThreadRandGen>(rng: &mut R, bits: usize) -> u64 {
    debug_assert!(bits <= 64);
    let x = next_u64(rng);
    if bits == 64 {
        x
    } else {
        x & ((1u64 << bits) - 1)
    }
}
