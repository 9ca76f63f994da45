//! # Pretest — Cheap Composite Rejection Cascade
//!
//! Rejects most composites before any modular exponentiation is spent on
//! them. The cascade is ordered by cost:
//!
//! 1. Values below 1009 are settled outright by trial division.
//! 2. Evenness, then two packed-word GCDs covering the primes 3–101 (two
//!    u64 products, one GCD each).
//! 3. GCD against the cached primorial of all primes ≤ 997 (`BGCD`); any
//!    shared factor proves compositeness in one operation. Values below
//!    1009² that survive are prime outright.
//! 4. For inputs above 300 (resp. 700) bits, GCD against the larger cached
//!    primorials `BGCD2`/`BGCD3` covering primes up to 9973 / 39 989.
//! 5. For very large inputs, deep trial division from 40 009 up to a bound
//!    that balances one trial division against the cost of a Miller–Rabin
//!    round at that size (Menezes §4.45): 30·log2(N) above 1600 bits,
//!    80·log2(N) above 4000 bits, 0.005·log2(N)² above 16 000 bits.
//!
//! Anything that survives is reported as unknown (tri-state 1) and moves on
//! to the probable-prime engine.

use rug::Integer;

use crate::cache::{self, BGCD3_NEXT_PRIME, BGCD_LAST_PRIME, BGCD_NEXT_PRIME};
use crate::primes::PrimeIterator;
use crate::Primality;

/// 3·5·7·…·53 packed into one word (as two u32-range factors).
const GCD_PRIMES_3_53: u64 = 4_127_218_095 * 3_948_078_067;
/// 59·61·…·101 packed into one word.
const GCD_PRIMES_59_101: u64 = 4_269_855_901 * 1_673_450_759;

/// Cascaded composite pretest.
///
/// Returns [`Primality::Composite`] on any found factor,
/// [`Primality::Prime`] when the cascade itself is decisive (below 1009²),
/// and [`Primality::ProbablyPrime`] meaning *unknown — keep testing*.
pub fn pretest(n: &Integer) -> Primality {
    // Below 1009 trial division is the whole answer.
    if *n < BGCD_NEXT_PRIME {
        if *n <= 1u32 {
            return Primality::Composite;
        }
        return match trial_factor(n, 2, BGCD_LAST_PRIME as u64) {
            Some(_) => Primality::Composite,
            None => Primality::Prime,
        };
    }

    if n.is_even() {
        return Primality::Composite;
    }
    if Integer::from(n.gcd_ref(&Integer::from(GCD_PRIMES_3_53))) != 1u32 {
        return Primality::Composite;
    }
    if Integer::from(n.gcd_ref(&Integer::from(GCD_PRIMES_59_101))) != 1u32 {
        return Primality::Composite;
    }

    if Integer::from(n.gcd_ref(cache::bgcd())) != 1u32 {
        return Primality::Composite;
    }
    // No divisor under 1009, so anything below 1009^2 is prime.
    if *n < BGCD_NEXT_PRIME as u64 * BGCD_NEXT_PRIME as u64 {
        return Primality::Prime;
    }

    let log2n = n.significant_bits() as u64;
    if log2n > 700 {
        if Integer::from(n.gcd_ref(cache::bgcd3())) != 1u32 {
            return Primality::Composite;
        }
    } else if log2n > 300 {
        if Integer::from(n.gcd_ref(cache::bgcd2())) != 1u32 {
            return Primality::Composite;
        }
    }

    // Deep trial division, bounded by when one more division stops paying
    // for itself against the cost of a single M-R round at this size.
    let deep_bound = if log2n > 16_000 {
        Some((log2n as f64 * log2n as f64 * 0.005) as u64)
    } else if log2n > 4_000 {
        Some(80 * log2n)
    } else if log2n > 1_600 {
        Some(30 * log2n)
    } else {
        None
    };
    if let Some(bound) = deep_bound {
        if trial_factor(n, BGCD3_NEXT_PRIME, bound).is_some() {
            return Primality::Composite;
        }
    }

    Primality::ProbablyPrime
}

/// Smallest prime factor of `n` in `[from, to]`, or `None`.
///
/// Stops at √n; a `None` with `to ≥ √n` therefore proves primality.
pub fn trial_factor(n: &Integer, from: u64, to: u64) -> Option<u64> {
    if *n <= 3u32 {
        return None;
    }
    let root = Integer::from(n.sqrt_ref());
    let cap = root.to_u64().map_or(to, |r| to.min(r));

    // The hot path divides by table primes only; spinning up the
    // segmented iterator is reserved for deep ranges.
    for &sp in crate::primes::SMALL_PRIMES.iter() {
        let p = sp as u64;
        if p > cap {
            return None;
        }
        if p >= from && n.is_divisible_u(sp as u32) {
            return Some(p);
        }
    }
    if cap <= BGCD_LAST_PRIME as u64 {
        return None;
    }

    let mut iter = PrimeIterator::new();
    let mut p = iter.next_prime();
    while p <= BGCD_LAST_PRIME as u64 || p < from {
        p = iter.next_prime();
    }
    while p <= cap {
        let divisible = if p <= u32::MAX as u64 {
            n.is_divisible_u(p as u32)
        } else {
            n.is_divisible(&Integer::from(p))
        };
        if divisible {
            return Some(p);
        }
        p = iter.next_prime();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rug::ops::Pow;

    #[test]
    fn pretest_settles_small_values() {
        assert_eq!(pretest(&Integer::from(0u32)), Primality::Composite);
        assert_eq!(pretest(&Integer::from(1u32)), Primality::Composite);
        assert_eq!(pretest(&Integer::from(2u32)), Primality::Prime);
        assert_eq!(pretest(&Integer::from(3u32)), Primality::Prime);
        assert_eq!(pretest(&Integer::from(4u32)), Primality::Composite);
        assert_eq!(pretest(&Integer::from(997u32)), Primality::Prime);
        assert_eq!(pretest(&Integer::from(1008u32)), Primality::Composite);
    }

    #[test]
    fn pretest_decides_below_1009_squared() {
        // 1009 and 1013 survive every GCD and sit below 1009^2.
        assert_eq!(pretest(&Integer::from(1009u32)), Primality::Prime);
        assert_eq!(pretest(&Integer::from(1013u32)), Primality::Prime);
        // 1009 * 1013 has no factor <= 997: the cascade cannot decide.
        assert_eq!(
            pretest(&Integer::from(1009u32 * 1013)),
            Primality::ProbablyPrime
        );
        // 1009^2 is exactly at the boundary: undecided.
        assert_eq!(
            pretest(&Integer::from(1009u32).pow(2)),
            Primality::ProbablyPrime
        );
    }

    #[test]
    fn pretest_rejects_via_small_gcds() {
        // 3 * big odd prime-ish value: caught by the packed-word GCD.
        let n = Integer::from(3u32) * (Integer::from(10u32).pow(30) + 1u32);
        assert_eq!(pretest(&n), Primality::Composite);
        // Factor 853 (inside BGCD, outside the packed words).
        let n = Integer::from(853u32) * (Integer::from(10u32).pow(40) + 9u32);
        assert_eq!(pretest(&n), Primality::Composite);
    }

    #[test]
    fn pretest_rejects_via_bgcd2_band() {
        // 2003 is outside BGCD but inside BGCD2; pick a >300-bit cofactor
        // that itself has no factor <= 997 (a known prime power).
        let cofactor = Integer::from(1013u32).pow(31); // ~310 bits
        let n = Integer::from(2003u32) * cofactor;
        assert!(n.significant_bits() > 300);
        assert_eq!(pretest(&n), Primality::Composite);
    }

    #[test]
    fn pretest_unknown_for_large_primes() {
        // 2^127 - 1 is a Mersenne prime; nothing in the cascade decides it.
        let m127 = (Integer::from(1u32) << 127u32) - 1u32;
        assert_eq!(pretest(&m127), Primality::ProbablyPrime);
    }

    #[test]
    fn trial_factor_basics() {
        assert_eq!(trial_factor(&Integer::from(91u32), 2, 100), Some(7));
        assert_eq!(trial_factor(&Integer::from(97u32), 2, 100), None);
        assert_eq!(trial_factor(&Integer::from(899u32), 2, 100), Some(29)); // 29*31
        // Range below the factor: 13 * 17 * 19 found from 11 upward.
        assert_eq!(trial_factor(&Integer::from(4199u32), 11, 100), Some(13));
        // Stops at sqrt(n): no factor of 35 in [11, sqrt(35)].
        assert_eq!(trial_factor(&Integer::from(35u32), 11, 100), None);
    }
}
