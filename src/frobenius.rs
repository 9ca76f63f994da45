//! # Frobenius — Quadratic Frobenius Pseudoprime Tests
//!
//! Four independent Frobenius-style tests usable as defence in depth behind
//! BPSW. All of them work in a quadratic extension of Z/nZ, where the
//! Frobenius endomorphism x → x^n acts as conjugation when n is prime; a
//! composite that mimics that action across these unrelated parameter
//! choices has never been exhibited.
//!
//! - [`is_frobenius_pseudoprime`] — Lucas-based Frobenius with explicit
//!   (P, Q), or a jacobi-driven parameter search when both are zero.
//! - [`is_frobenius_cp_pseudoprime`] — Crandall–Pomerance randomized
//!   rounds (steps per Loebenberger 2008).
//! - [`is_frobenius_underwood_pseudoprime`] — Underwood's minimal-lambda
//!   test over x² − ax + 1.
//! - [`is_frobenius_khashin_pseudoprime`] — Khashin's test in Z[√c] for the
//!   smallest odd c with jacobi(c, n) = −1.
//!
//! ## References
//!
//! - Grantham, "Frobenius Pseudoprimes", Math. Comp. 70(234), 2001.
//! - Crandall & Pomerance, "Prime Numbers: A Computational Perspective",
//!   §3.6.5.
//! - Khashin, "Counterexamples for Frobenius primality test", 2013
//!   (arXiv:1307.7920).

use std::cmp::Ordering;

use rug::ops::RemRounding;
use rug::Integer;
use tracing::debug;

use crate::cache;
use crate::error::{Error, Result};
use crate::lucas::lucas_seq;
use crate::pretest::trial_factor;
use crate::primality::is_prob_prime;

/// Frobenius test with Lucas parameters (P, Q).
///
/// Passing (0, 0) selects parameters by the jacobi search: Q = 2 and
/// P = 5, 7, 9, … until jacobi(P² − 8, n) = −1. Explicit parameters whose
/// discriminant is a perfect square are a contract violation.
pub fn is_frobenius_pseudoprime(n: &Integer, p_in: i64, q_in: i64) -> Result<bool> {
    match n.partial_cmp(&2u32) {
        Some(Ordering::Equal) => return Ok(true),
        Some(Ordering::Less) => return Ok(false),
        _ => {}
    }
    if n.is_even() {
        return Ok(false);
    }

    let (p, q, d, k) = if p_in == 0 && q_in == 0 {
        let q: i64 = 2;
        let mut p: i64 = 1;
        let mut k = 0i32;
        let mut d;
        loop {
            p += 2;
            if p == 3 {
                p = 5; // P=3, Q=2 gives D=1: degenerate
            }
            if p == 21 && n.is_perfect_square() {
                return Ok(false);
            }
            d = p * p - 4 * q;
            if *n <= p.unsigned_abs() || *n <= d.unsigned_abs() {
                break;
            }
            k = Integer::from(d).jacobi(n);
            if k != 1 {
                break;
            }
        }
        (p, q, d, k)
    } else {
        let d = p_in
            .checked_mul(p_in)
            .and_then(|pp| pp.checked_sub(4 * q_in))
            .ok_or_else(|| Error::invalid("Frobenius P, Q overflow"))?;
        if Integer::from(d.unsigned_abs()).is_perfect_square() {
            return Err(Error::invalid(format!(
                "Frobenius invalid P,Q: ({},{})",
                p_in, q_in
            )));
        }
        let k = Integer::from(d).jacobi(n);
        (p_in, q_in, d, k)
    };

    let (pu, qu, du) = (p.unsigned_abs(), q.unsigned_abs(), d.unsigned_abs());
    if *n <= pu || *n <= qu || *n <= du {
        // Too small for the Lucas chain; settle by trial division.
        return Ok(trial_factor(n, 2, du + pu + qu).is_none());
    }
    if k == 0 {
        return Ok(false); // D divides n
    }
    if Integer::from(n.gcd_ref(&(Integer::from(du) * pu * qu))) > 1u32 {
        return Ok(false);
    }

    let vcomp = if k == 1 {
        Integer::from(2u32)
    } else {
        Integer::from(2 * q).rem_euc(n)
    };
    let d_idx = if k == 1 {
        Integer::from(n - 1u32)
    } else {
        Integer::from(n + 1u32)
    };
    let (u, v, _) = lucas_seq(n, p, q, &d_idx)?;
    Ok(u.cmp0() == Ordering::Equal && v == vcomp)
}

/// Crandall–Pomerance Frobenius: `ntests` rounds with random (a, b),
/// d = a² − 4b non-square, checking the Lucas chain identity
/// w1·w_m ≡ 2·w_{m+1}, the Euler criterion on b, and B·w_m ≡ 2.
pub fn is_frobenius_cp_pseudoprime(n: &Integer, ntests: u64) -> Result<bool> {
    if *n < 100u32 {
        return Ok(is_prob_prime(n)?.is_probable());
    }
    if n.is_even() {
        return Ok(false);
    }

    let nminus1 = Integer::from(n - 1u32);
    for _ in 0..ntests {
        // Step 1: a, b in [1, n-1] with d = a^2 - 4b not a square.
        let (a, b, d) = loop {
            let (a, b) = cache::with_randstate(|rs| {
                let a = nminus1.clone().random_below(rs) + 1u32;
                let b = nminus1.clone().random_below(rs) + 1u32;
                (a, b)
            });
            let d = Integer::from(&a * &a) - Integer::from(4u32) * &b;
            if !d.is_perfect_square() {
                break (a, b, d);
            }
        };
        let g = (Integer::from(&a * &b) * &d).gcd(n);
        if g != 1u32 && g != *n {
            return Ok(false);
        }
        // Step 2: w1 = a^2 b^{-1} - 2 mod n.
        let Ok(binv) = Integer::from(&b).invert(n) else {
            return Ok(false);
        };
        let w1 = (Integer::from(&a * &a) * binv - 2u32).rem_euc(n);
        // Step 3: m = (n - (d|n)) / 2.
        let j = d.jacobi(n);
        let m = match j {
            -1 => Integer::from(n + 1u32),
            0 => n.clone(),
            _ => Integer::from(n - 1u32),
        } >> 1u32;
        // Euler criterion: B = b^((n-1)/2) must be ±1.
        let half = Integer::from(&nminus1 >> 1u32);
        let bb = match b.pow_mod(&half, n) {
            Ok(v) => v,
            Err(_) => return Ok(false),
        };
        if bb != 1u32 && bb != nminus1 {
            return Ok(false);
        }
        // Step 4: Lucas chain for w_m, w_{m+1}.
        let mut wm = Integer::from(2u32);
        let mut wm1 = w1.clone();
        let bits = m.significant_bits();
        for bit in (0..bits).rev() {
            if m.get_bit(bit) {
                wm = (Integer::from(&wm * &wm1) - &w1).rem_euc(n);
                wm1 = (Integer::from(&wm1 * &wm1) - 2u32).rem_euc(n);
            } else {
                wm1 = (Integer::from(&wm * &wm1) - &w1).rem_euc(n);
                wm = (Integer::from(&wm * &wm) - 2u32).rem_euc(n);
            }
        }
        // Steps 5-7: w1·wm ≡ 2·w_{m+1}.
        let lhs = Integer::from(&w1 * &wm).rem_euc(n);
        let rhs = (Integer::from(&wm1) * 2u32).rem_euc(n);
        if lhs != rhs {
            return Ok(false);
        }
        // Step 9: B·wm ≡ 2.
        if (Integer::from(&wm * &bb)).rem_euc(n) != 2u32 {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Underwood's Frobenius variant over x² − ax + 1.
pub fn is_frobenius_underwood_pseudoprime(n: &Integer) -> Result<bool> {
    if *n < 7u32 {
        // The a-search degenerates against tiny moduli.
        return Ok(*n == 2u32 || *n == 3u32 || *n == 5u32);
    }
    if n.is_even() {
        return Ok(false);
    }

    const A_CAP: u64 = 1_000_000;
    let mut chosen = None;
    for a in 0u64..A_CAP {
        if matches!(a, 2 | 4 | 7 | 8 | 10 | 14 | 16 | 18) {
            continue;
        }
        let disc = Integer::from(a as i64 * a as i64 - 4);
        let j = disc.jacobi(n);
        if j == -1 {
            chosen = Some(a);
            break;
        }
        if j == 0 || (a == 20 && n.is_perfect_square()) {
            return Ok(false);
        }
    }
    let Some(a) = chosen else {
        return Err(Error::ParameterSearchExhausted {
            what: "Frobenius-Underwood a",
            bound: A_CAP,
        });
    };
    if Integer::from(n.gcd_ref(&Integer::from((a + 4) * (2 * a + 5)))) != 1u32 {
        return Ok(false);
    }

    let ap2 = a + 2;
    let np1 = Integer::from(n + 1u32);
    let len = np1.significant_bits();
    let mut s = Integer::from(1u32);
    let mut t = Integer::from(2u32);

    for bit in (0..len - 1).rev() {
        // (s, t) ← (s·(a·s + 2t) mod n, (s + t)·(t − s) mod n)
        let mut temp2 = Integer::from(&t + &t);
        if a != 0 {
            temp2 += Integer::from(&s * a);
        }
        let temp1 = Integer::from(&temp2 * &s);
        let diff = Integer::from(&t - &s);
        s += &t;
        t = (Integer::from(&s * &diff)).rem_euc(n);
        s = temp1.rem_euc(n);
        if np1.get_bit(bit) {
            let mut new_s = if a == 0 {
                Integer::from(&s + &s)
            } else {
                Integer::from(&s * ap2)
            };
            new_s += &t;
            let temp2 = Integer::from(&t + &t);
            t = temp2 - &s;
            s = new_s;
        }
    }

    let expected = Integer::from(2 * a + 5).rem_euc(n);
    let rval = s.cmp0() == Ordering::Equal && t == expected;
    debug!(a, pass = rval, "Frobenius-Underwood");
    Ok(rval)
}

/// Khashin's Frobenius test: (1 + √c)^n ≡ 1 − √c (mod n) for the smallest
/// odd c with jacobi(c, n) = −1.
pub fn is_frobenius_khashin_pseudoprime(n: &Integer) -> Result<bool> {
    if *n < 7u32 {
        // c = 3 collides with n = 3; settle tiny inputs directly.
        return Ok(*n == 2u32 || *n == 3u32 || *n == 5u32);
    }
    if n.is_even() {
        return Ok(false);
    }
    if n.is_perfect_square() {
        return Ok(false);
    }

    let mut c: u64 = 1;
    let k = loop {
        c += 2;
        let k = Integer::from(c).jacobi(n);
        if k != 1 {
            break k;
        }
    };
    if k == 0 {
        return Ok(false);
    }

    // (ra + rb√c) accumulates (1+√c)^(n-1)·(1+√c); (a + b√c) is the
    // square ladder.
    let mut ra = Integer::from(1u32);
    let mut rb = Integer::from(1u32);
    let mut a = Integer::from(1u32);
    let mut b = Integer::from(1u32);
    let nminus1 = Integer::from(n - 1u32);
    let len = nminus1.significant_bits();

    for bit in 0..len {
        if nminus1.get_bit(bit) {
            let ta = Integer::from(&ra * &a);
            let tb = Integer::from(&rb * &b);
            let t = Integer::from(&ra + &rb);
            rb = ((Integer::from(&a + &b) * t) - &ta - &tb).rem_euc(n);
            ra = (ta + tb * c).rem_euc(n);
        }
        if bit < len - 1 {
            let t = Integer::from(&b * &b) * c;
            b *= &a;
            b += b.clone();
            b = b.rem_euc(n);
            a.square_mut();
            a += t;
            a = a.rem_euc(n);
        }
    }
    Ok(ra == 1u32 && rb == nminus1)
}
