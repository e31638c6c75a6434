//! Exact integer arithmetic for combinatorial constants.
//!
//! Binomial coefficients and powers of two are computed exactly with
//! `rug::Integer` and rounded to `f64` once, so constants stay correctly
//! rounded even where the intermediate values overflow `u64`.

use rug::Integer;

/// `binom(n, k)` rounded to the nearest `f64`. Zero when `k > n`.
pub fn binomial(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    Integer::from(Integer::binomial_u(n, k)).to_f64()
}

/// `2^exponent` as an exact integer.
pub fn pow2(exponent: u32) -> Integer {
    Integer::from(1) << exponent
}

/// Number of sign vectors in `{-1, +1}^d` that agree with a fixed vector in
/// strictly more than half of their coordinates.
///
/// Odd `d`: `2^(d-1)`. Even `d`: `2^(d-1) - binom(d, d/2) / 2`, since the
/// `binom(d, d/2)` ties are excluded and the rest split evenly.
pub fn strict_majority_count(d: u32) -> f64 {
    debug_assert!(d > 0);
    let half = pow2(d - 1);
    if d % 2 == 1 {
        half.to_f64()
    } else {
        let ties = Integer::from(Integer::binomial_u(d, d / 2));
        (half - (ties >> 1u32)).to_f64()
    }
}

/// `2^(d-1)` for odd `d` and `2^(d-1) - binom(d, d/2)` for even `d`.
///
/// For even `d` this removes every tie rather than half of them, so it
/// undercounts [`strict_majority_count`]. The uncorrected Duchi bound is
/// defined with this value.
pub fn tie_excluded_count(d: u32) -> f64 {
    debug_assert!(d > 0);
    let half = pow2(d - 1);
    if d % 2 == 1 {
        half.to_f64()
    } else {
        (half - Integer::from(Integer::binomial_u(d, d / 2))).to_f64()
    }
}
