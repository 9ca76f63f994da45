//! # NT Funcs — π Digits, Perfect Powers, Mangoldt
//!
//! - [`pidigits`] — decimal digits of π by the Brent–Salamin
//!   arithmetic-geometric mean: ⌈log2 n⌉ iterations at ≈ 3.322·n bits of
//!   working precision, each one doubling the number of correct digits.
//! - [`is_power`] / [`power_factor`] — perfect-power detection and the
//!   largest exponent a with N = root^a.
//! - [`exp_mangoldt`] — e^Λ(n): p when n is a power of the prime p,
//!   1 otherwise.
//!
//! ## References
//!
//! - Brent, "Fast multiple-precision evaluation of elementary functions",
//!   JACM 23(2), 1976; Salamin, "Computation of π using
//!   arithmetic-geometric mean", Math. Comp. 30(135), 1976.

use rug::ops::Pow;
use rug::{Float, Integer};

use crate::error::Result;
use crate::primality::is_prob_prime;
use crate::primes::{PrimeIterator, SMALL_PRIMES};

/// The first `n` decimal digits of π as a string ("3.14159…").
///
/// `pidigits(1)` is just "3"; larger n gives n−1 fractional digits,
/// rounded.
pub fn pidigits(n: u64) -> String {
    if n <= 1 {
        return "3".to_string();
    }

    let prec = (10.0 + n as f64 * 3.322) as u32;
    let mut a = Float::with_val(prec, 1u32);
    let mut b = Float::with_val(prec, 0.5f64).sqrt();
    let mut t = Float::with_val(prec, 0.25f64);

    let mut k = 0u32;
    while k < 64 && (n >> k) > 0 {
        let prev_a = a.clone();
        a = Float::with_val(prec, &prev_a + &b) / 2u32;
        b = Float::with_val(prec, &b * &prev_a).sqrt();
        let diff = prev_a - &a;
        let sq = Float::with_val(prec, &diff * &diff);
        t -= sq << k;
        k += 1;
    }
    let sum = Float::with_val(prec, &a + &b);
    let pi = Float::with_val(prec, &sum * &sum) / (t * 4u32);

    // Shift to an integer with n digits and round half-up.
    let scale = Integer::from(10u32).pow((n - 1) as u32);
    let mut scaled = pi * Float::with_val(prec, scale);
    scaled += 0.5f64;
    let digits = scaled.trunc().to_integer().unwrap_or_default().to_string();
    format!("{}.{}", &digits[..1], &digits[1..])
}

/// Largest exponent a ≥ 2 with n = root^a, plus the root, or `None` when n
/// is not a perfect power.
pub fn power_factor(n: &Integer) -> Option<(u64, Integer)> {
    if *n <= 3u32 {
        return None;
    }
    let mut total = 1u64;
    let mut cur = n.clone();
    loop {
        // Candidate exponents are primes up to the bit length; the table
        // covers every input below 2^997 and the iterator the rest.
        let maxexp = cur.significant_bits() as u64;
        let mut found = false;
        let mut table = SMALL_PRIMES.iter().map(|&p| p as u64);
        let mut deep: Option<PrimeIterator> = None;
        loop {
            let p = match table.next() {
                Some(p) => p,
                None => {
                    let iter = deep.get_or_insert_with(|| {
                        let mut it = PrimeIterator::new();
                        while it.peek() <= 997 {
                            it.next_prime();
                        }
                        it
                    });
                    iter.next_prime()
                }
            };
            if p > maxexp {
                break;
            }
            let (root, rem) = cur.clone().root_rem(Integer::new(), p as u32);
            if rem == 0u32 && root > 1u32 {
                cur = root;
                total *= p;
                found = true;
                break;
            }
        }
        if !found {
            break;
        }
    }
    if total > 1 {
        Some((total, cur))
    } else {
        None
    }
}

/// Perfect-power queries, one entry point for several questions:
/// a = 1 always answers 1; a = 2 is the perfect-square test; a = 0 returns
/// the highest a such that n is an a-th power (0 if none); other a answer
/// whether n is an a-th power.
pub fn is_power(n: &Integer, a: u64) -> u64 {
    if *n <= 3u32 {
        return 0;
    }
    match a {
        1 => 1,
        2 => u64::from(n.is_perfect_square()),
        0 => power_factor(n).map_or(0, |(e, _)| e),
        _ => {
            // An a-th power with root >= 2 needs at least a+1 bits.
            if a >= n.significant_bits() as u64 {
                return 0;
            }
            let (_, rem) = n.clone().root_rem(Integer::new(), a as u32);
            u64::from(rem == 0u32)
        }
    }
}

/// e^Λ(n): the prime p when n = p^k for prime p and k ≥ 1, else 1.
pub fn exp_mangoldt(n: &Integer) -> Result<Integer> {
    if *n <= 1u32 {
        return Ok(Integer::from(1u32));
    }
    let k = n.find_one(0).unwrap_or(0);
    if k > 0 {
        // Even: only pure powers of two contribute.
        return Ok(if k + 1 == n.significant_bits() {
            Integer::from(2u32)
        } else {
            Integer::from(1u32)
        });
    }
    if is_prob_prime(n)?.is_probable() {
        return Ok(n.clone());
    }
    if let Some((e, root)) = power_factor(n) {
        if e > 1 && is_prob_prime(&root)?.is_probable() {
            return Ok(root);
        }
    }
    Ok(Integer::from(1u32))
}
