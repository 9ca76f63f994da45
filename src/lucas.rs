//! # Lucas — Lucas Sequences and Parameter Selection
//!
//! Computes U_k, V_k (mod n) for the sequence U_0=0, U_1=1, V_0=2, V_1=P,
//! X_{k+1} = P·X_k − Q·X_{k−1}, plus the two parameter-selection rules the
//! probable-prime engine needs:
//!
//! - **Selfridge (method A)**: D ∈ {5, −7, 9, −11, …} until
//!   jacobi(D, n) = −1, then P = 1, Q = (1 − D)/4. Used by the standard and
//!   strong Lucas tests.
//! - **Extra-strong**: P ∈ {3, 4, 5, …} (configurable increment) until
//!   jacobi(P² − 4, n) = −1, with Q = 1. Baillie's parameters from OEIS
//!   [A217719](https://oeis.org/A217719).
//!
//! Both searches short-circuit to composite when a candidate D shares a
//! nontrivial factor with n, and reject perfect squares (for which no D
//! with jacobi(D, n) = −1 exists) at a fixed probe point rather than
//! looping forever. Exceeding the hard search caps (|D| > 10^6,
//! P > 65 535) is an error, never a silent composite.
//!
//! ## Ladder
//!
//! The binary ladder doubles with U_{2k} = U_k·V_k and
//! V_{2k} = V_k² − 2·Q^k, and steps with the addition formulas, halving
//! (P·U + V)/2 and (D·U + P·V)/2 after adding n to fix parity. Two
//! specializations: an even modulus routes to an auxiliary ladder that
//! never divides by 2, and Q = 1 with invertible
//! P² − 4 computes V_k, V_{k+1} only, recovering
//! U_k = (2·V_{k+1} − P·V_k)·(P² − 4)^{−1}.
//!
//! ## References
//!
//! - Baillie & Wagstaff, "Lucas Pseudoprimes", Math. Comp. 35(152), 1980.

use std::cmp::Ordering;

use rug::ops::RemRounding;
use rug::Integer;

use crate::error::{Error, Result};

/// Hard cap for the Selfridge |D| search.
const SELFRIDGE_D_CAP: u64 = 1_000_000;
/// Hard cap for the extra-strong P search.
const EXTRA_STRONG_P_CAP: u64 = 65_535;

/// Lucas sequence U_k mod n, V_k mod n and Q^k mod n.
///
/// Requires n > 1, k ≥ 0, |P| < n, |Q| < n and D = P² − 4Q ≠ 0.
pub fn lucas_seq(n: &Integer, p: i64, q: i64, k: &Integer) -> Result<(Integer, Integer, Integer)> {
    if *n < 2u32 {
        return Err(Error::invalid("Lucas sequence modulus must be > 1"));
    }
    if k.cmp0() == Ordering::Less {
        return Err(Error::invalid("Lucas sequence index k is negative"));
    }
    if *n <= p.unsigned_abs() || *n <= q.unsigned_abs() {
        return Err(Error::invalid("Lucas parameters P, Q out of range for n"));
    }
    let d128 = (p as i128) * (p as i128) - 4 * (q as i128);
    if d128 == 0 {
        return Err(Error::invalid("Lucas discriminant P^2 - 4Q is zero"));
    }

    if k.cmp0() == Ordering::Equal {
        return Ok((Integer::new(), Integer::from(2u32), Integer::from(1u32)));
    }
    if n.is_even() {
        // Even modulus: the halving steps below would be ill-defined.
        return Ok(alt_lucas_seq(n, p, q, k));
    }

    let d = Integer::from(d128);
    let b = k.significant_bits();
    let mut u = Integer::from(1u32);
    let mut v = Integer::from(p);
    let mut qk = Integer::from(q);

    if q == 1 {
        let tinv = Integer::from(p as i128 * p as i128 - 4).invert(n).ok();
        if let (true, Some(tinv)) = (p > 2, tinv) {
            // V-only ladder: r = V_m, s = V_{m+1}; recover U at the end.
            let mut r = Integer::from(p);
            let mut s = (Integer::from(p) * p - 2u32).rem_euc(n);
            for i in (0..b - 1).rev() {
                if k.get_bit(i) {
                    r = Integer::from(&r * &s - Integer::from(p)).rem_euc(n);
                    s.square_mut();
                    s -= 2u32;
                    s = s.rem_euc(n);
                } else {
                    s = Integer::from(&r * &s - Integer::from(p)).rem_euc(n);
                    r.square_mut();
                    r -= 2u32;
                    r = r.rem_euc(n);
                }
            }
            let uk = (Integer::from(2u32) * &s - Integer::from(p) * &r) * tinv;
            return Ok((uk.rem_euc(n), r, Integer::from(1u32)));
        }
        // Generic ladder, Q^k ≡ 1 throughout.
        for i in (0..b - 1).rev() {
            u = Integer::from(&u * &v).rem_euc(n);
            v.square_mut();
            v -= 2u32;
            v = v.rem_euc(n);
            if k.get_bit(i) {
                let t = Integer::from(&u * &d);
                u = half_mod(Integer::from(&u * p) + &v, n);
                v = half_mod(Integer::from(&v * p) + t, n);
            }
        }
    } else {
        for i in (0..b - 1).rev() {
            u = Integer::from(&u * &v).rem_euc(n);
            v.square_mut();
            v -= Integer::from(2u32) * &qk;
            v = v.rem_euc(n);
            qk.square_mut();
            if k.get_bit(i) {
                let t = Integer::from(&u * &d);
                u = half_mod(Integer::from(&u * p) + &v, n);
                v = half_mod(Integer::from(&v * p) + t, n);
                qk *= q;
            }
            qk = qk.rem_euc(n);
        }
    }
    Ok((u.rem_euc(n), v.rem_euc(n), qk.rem_euc(n)))
}

/// (x + n·parity)/2 mod n for odd n: exact halving in Z/nZ.
fn half_mod(mut x: Integer, n: &Integer) -> Integer {
    if x.is_odd() {
        x += n;
    }
    (x >> 1u32).rem_euc(n)
}

/// Lucas ladder for even moduli: tracks V_low, V_high and the Q powers so
/// no division by 2 is ever needed. Returns (U_k, V_k, Q^k) mod n.
fn alt_lucas_seq(n: &Integer, p: i64, q: i64, k: &Integer) -> (Integer, Integer, Integer) {
    if k.cmp0() != Ordering::Greater {
        return (Integer::new(), Integer::from(2u32), Integer::from(1u32));
    }
    let s = k.find_one(0).unwrap_or(0);
    let b = k.significant_bits();

    let mut uh = Integer::from(1u32);
    let mut vl = Integer::from(2u32);
    let mut vh = Integer::from(p);
    let mut ql = Integer::from(1u32);
    let mut qh = Integer::from(1u32);

    for j in ((s + 1)..=b).rev() {
        ql *= &qh;
        if k.get_bit(j) {
            qh = Integer::from(&ql * q);
            uh *= &vh;
            let t = Integer::from(&ql * p);
            vl = Integer::from(&vl * &vh) - t;
            vh.square_mut();
            vh -= Integer::from(2u32) * &qh;
        } else {
            qh = ql.clone();
            uh = Integer::from(&uh * &vl) - &ql;
            let t = Integer::from(&ql * p);
            vh = Integer::from(&vh * &vl) - t;
            vl.square_mut();
            vl -= Integer::from(2u32) * &ql;
        }
        qh = qh.rem_euc(n);
        uh = uh.rem_euc(n);
        vh = vh.rem_euc(n);
        vl = vl.rem_euc(n);
    }
    ql *= &qh;
    qh = Integer::from(&ql * q);
    uh = Integer::from(&uh * &vl) - &ql;
    let t = Integer::from(&ql * p);
    vl = Integer::from(&vl * &vh) - t;
    ql *= &qh;
    ql = ql.rem_euc(n);
    uh = uh.rem_euc(n);
    vl = vl.rem_euc(n);
    for _ in 0..s {
        uh *= &vl;
        vl.square_mut();
        vl -= Integer::from(2u32) * &ql;
        ql.square_mut();
        ql = ql.rem_euc(n);
        uh = uh.rem_euc(n);
        vl = vl.rem_euc(n);
    }
    (uh, vl, ql)
}

/// Selfridge method-A parameters. `Ok(None)` means the search itself proved
/// n composite (shared factor with D, or perfect square).
pub(crate) fn selfridge_params(n: &Integer) -> Result<Option<(i64, i64)>> {
    let mut d: i64 = 5;
    loop {
        let dui = d.unsigned_abs();
        let g = Integer::from(n.gcd_ref(&Integer::from(dui)));
        if g > 1u32 && g != *n {
            return Ok(None);
        }
        if Integer::from(d).jacobi(n) == -1 {
            break;
        }
        if dui == 21 && n.is_perfect_square() {
            return Ok(None);
        }
        let next = dui + 2;
        if next > SELFRIDGE_D_CAP {
            return Err(Error::ParameterSearchExhausted {
                what: "Lucas Selfridge D",
                bound: SELFRIDGE_D_CAP,
            });
        }
        d = if d > 0 { -(next as i64) } else { next as i64 };
    }
    Ok(Some((1, (1 - d) / 4)))
}

/// Extra-strong parameters: smallest P ≥ 3 (stepping by `inc`) with
/// jacobi(P² − 4, n) = −1; Q = 1. `inc` = 1 gives Baillie's parameters,
/// 2 gives Pari's.
pub(crate) fn extra_strong_params(n: &Integer, inc: u64) -> Result<Option<(i64, i64)>> {
    if inc < 1 || inc > 256 {
        return Err(Error::invalid(format!(
            "invalid Lucas parameter increment {}",
            inc
        )));
    }
    let mut tp: u64 = 3;
    loop {
        let d = tp * tp - 4;
        let g = Integer::from(n.gcd_ref(&Integer::from(d)));
        if g > 1u32 && g != *n {
            return Ok(None);
        }
        if Integer::from(d).jacobi(n) == -1 {
            break;
        }
        if tp == 3 + 20 * inc && n.is_perfect_square() {
            return Ok(None);
        }
        tp += inc;
        if tp > EXTRA_STRONG_P_CAP {
            return Err(Error::ParameterSearchExhausted {
                what: "Lucas extra-strong P",
                bound: EXTRA_STRONG_P_CAP,
            });
        }
    }
    Ok(Some((tp as i64, 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Direct recurrence U_{k+1} = P·U_k − Q·U_{k−1} (same for V), mod n.
    fn lucas_ref(n: &Integer, p: i64, q: i64, k: u64) -> (Integer, Integer, Integer) {
        let mut u_prev = Integer::new(); // U_0
        let mut u = Integer::from(1u32); // U_1
        let mut v_prev = Integer::from(2u32); // V_0
        let mut v = Integer::from(p); // V_1
        if k == 0 {
            return (u_prev, v_prev, Integer::from(1u32));
        }
        for _ in 1..k {
            let un = (Integer::from(&u * p) - Integer::from(&u_prev * q)).rem_euc(n);
            let vn = (Integer::from(&v * p) - Integer::from(&v_prev * q)).rem_euc(n);
            u_prev = std::mem::replace(&mut u, un);
            v_prev = std::mem::replace(&mut v, vn);
        }
        let qk = Integer::from(q)
            .rem_euc(n)
            .pow_mod(&Integer::from(k), n)
            .unwrap();
        (u.rem_euc(n), v.rem_euc(n), qk)
    }

    #[test]
    fn matches_recurrence_across_parameter_shapes() {
        let cases: &[(u64, i64, i64)] = &[
            (1_000_003, 1, -1), // Fibonacci/Lucas numbers
            (1_000_003, 4, 1),  // Q = 1 fast path (P > 2)
            (1_000_003, 1, 2),  // generic Q
            (1_000_003, 3, -5),
            (1_000_003, 1, 1),  // Q = 1, P <= 2: generic ladder
            (99_993, 4, 1),     // Q = 1 but P^2 - 4 shares a factor with n
            (99_991, 5, 3),
            (100_000, 5, 3),  // even modulus, auxiliary ladder
            (65_536, 7, -3),  // power-of-two modulus
        ];
        for &(nn, p, q) in cases {
            let n = Integer::from(nn);
            for k in [0u64, 1, 2, 3, 10, 31, 64, 100] {
                let got = lucas_seq(&n, p, q, &Integer::from(k)).unwrap();
                let want = lucas_ref(&n, p, q, k);
                assert_eq!(got.0, want.0, "U_{} P={} Q={} n={}", k, p, q, nn);
                assert_eq!(got.1, want.1, "V_{} P={} Q={} n={}", k, p, q, nn);
                assert_eq!(got.2, want.2, "Q^{} P={} Q={} n={}", k, p, q, nn);
            }
        }
    }

    #[test]
    fn fibonacci_values() {
        let n = Integer::from(1_000_000_007u64);
        let (u, v, _) = lucas_seq(&n, 1, -1, &Integer::from(10u32)).unwrap();
        assert_eq!(u, 55u32); // F_10
        assert_eq!(v, 123u32); // L_10
    }

    #[test]
    fn rejects_contract_violations() {
        let n = Integer::from(21u32);
        assert!(lucas_seq(&Integer::from(1u32), 3, 1, &Integer::from(5u32)).is_err());
        assert!(lucas_seq(&n, 2, 1, &Integer::from(5u32)).is_err()); // D = 0
        assert!(lucas_seq(&n, 25, 1, &Integer::from(5u32)).is_err()); // |P| >= n
        assert!(lucas_seq(&n, 3, 1, &Integer::from(-1i32)).is_err());
    }

    #[test]
    fn selfridge_finds_valid_parameters() {
        for nn in [1009u64, 10_007, 1_000_003, 99_991] {
            let n = Integer::from(nn);
            let (p, q) = selfridge_params(&n).unwrap().expect("prime input");
            assert_eq!(p, 1);
            let d = p * p - 4 * q;
            assert_eq!(Integer::from(d).jacobi(&n), -1, "n = {}", nn);
        }
    }

    #[test]
    fn selfridge_rejects_perfect_squares() {
        let sq = Integer::from(1093u32 * 1093);
        assert_eq!(selfridge_params(&sq).unwrap(), None);
    }

    #[test]
    fn extra_strong_finds_valid_parameters() {
        for nn in [1009u64, 10_007, 1_000_003] {
            let n = Integer::from(nn);
            let (p, q) = extra_strong_params(&n, 1).unwrap().expect("prime input");
            assert_eq!(q, 1);
            assert!(p >= 3);
            let d = p * p - 4;
            assert_eq!(Integer::from(d).jacobi(&n), -1, "n = {}", nn);
        }
    }

    #[test]
    fn extra_strong_rejects_bad_increment() {
        let n = Integer::from(1009u32);
        assert!(extra_strong_params(&n, 0).is_err());
        assert!(extra_strong_params(&n, 257).is_err());
    }
}
