//! # Combinat — Bernoulli, Harmonic, Stirling, Binomial
//!
//! Exact combinatorial generators:
//!
//! - [`bernfrac`] — Bernoulli numbers as reduced fractions, by the
//!   Brent–Harvey tangent-number recurrence in Luschny's formulation:
//!   O(n²) word operations with a single big-integer row.
//! - [`harmfrac`] — harmonic numbers H(n) by binary splitting, keeping the
//!   two partial sums balanced instead of accumulating a giant denominator
//!   term by term. [`harmreal`] renders the same fraction as a decimal
//!   string to a requested precision.
//! - [`stirling`] — Stirling numbers of the first (signed), second, and
//!   third (Lah) kinds via closed-form expansions over binomials.
//! - [`binomial`] — Goetgheluck's prime-power method: the exponent of each
//!   prime in C(n,k) falls out of Kummer's carry-counting theorem, and the
//!   prime powers multiply up through a product tree.
//!
//! ## References
//!
//! - Brent & Harvey, "Fast computation of Bernoulli, Tangent and Secant
//!   numbers", 2011 (arXiv:1108.0286); Luschny's variant.
//! - Goetgheluck, "Computing Binomial Coefficients", Amer. Math. Monthly
//!   94(4), 1987.
//! - Kummer's theorem: the exponent of p in C(n,k) is the number of carries
//!   when adding k and n−k in base p.

use rug::ops::Pow;
use rug::Integer;

use crate::error::{Error, Result};
use crate::primes::primes_up_to;
use crate::primorial::product_tree;

/// Bernoulli number B_n as a reduced fraction (numerator, denominator).
///
/// B_0 = 1, B_1 = 1/2 (positive convention), B_odd = 0 for odd n ≥ 3.
pub fn bernfrac(n: u64) -> (Integer, Integer) {
    if n == 0 {
        return (Integer::from(1u32), Integer::from(1u32));
    }
    if n == 1 {
        return (Integer::from(1u32), Integer::from(2u32));
    }
    if n & 1 == 1 {
        return (Integer::new(), Integer::from(1u32));
    }

    let half = (n >> 1) as usize;
    // Tangent-number row: T[k] seeded with (k-1)!, then swept in place.
    let mut t: Vec<Integer> = vec![Integer::new(); half + 1];
    t[1] = Integer::from(1u32);
    for k in 2..=half {
        t[k] = Integer::from(&t[k - 1] * (k as u64 - 1));
    }
    for k in 2..=half {
        for j in k..=half {
            let keep = Integer::from(&t[j] * (j - k + 2) as u64);
            let shifted = Integer::from(&t[j - 1] * (j - k) as u64);
            t[j] = keep + shifted;
        }
    }

    let mut num = Integer::from(&t[half] * half as u64);
    num *= if half & 1 == 1 { 2i32 } else { -2i32 };
    let u = Integer::from(1u32) << n as u32;
    let den = Integer::from(&u - 1u32) * u;

    let g = Integer::from(num.gcd_ref(&den));
    (num.div_exact(&g), den.div_exact(&g))
}

/// Numerator/denominator pair for the sum 1/a + 1/(a+1) + … + 1/(b−1),
/// computed by splitting at the midpoint. On entry (a, b) are the range
/// bounds; on exit they hold the (num, den) of the partial sum.
fn harmonic_split(a: &mut Integer, b: &mut Integer) {
    let width = Integer::from(&*b - &*a);
    if width == 1u32 {
        // A single term 1/a.
        *b = a.clone();
        *a = Integer::from(1u32);
    } else {
        let mid = Integer::from(&*a + &*b) >> 1u32;
        let mut left_den = mid.clone();
        let mut right_num = mid;
        harmonic_split(a, &mut left_den);
        harmonic_split(&mut right_num, b);
        // an/ad + bn/bd = (an·bd + ad·bn)/(ad·bd)
        *a = Integer::from(&*a * &*b) + Integer::from(&left_den * &right_num);
        *b *= left_den;
    }
}

/// Harmonic number H(n) = Σ 1/i as a reduced fraction.
pub fn harmfrac(n: u64) -> (Integer, Integer) {
    if n == 0 {
        return (Integer::new(), Integer::from(1u32));
    }
    let mut num = Integer::from(1u32);
    let mut den = Integer::from(n + 1);
    harmonic_split(&mut num, &mut den);
    let g = Integer::from(num.gcd_ref(&den));
    (num.div_exact(&g), den.div_exact(&g))
}

/// H(n) as a decimal string with `digits` fractional digits (half-up
/// rounding).
pub fn harmreal(n: u64, digits: u32) -> String {
    let (num, den) = harmfrac(n);
    // Round-half-up of num·10^digits / den in one exact division.
    let scale = Integer::from(10u32).pow(digits);
    let q = (num * scale * 2u32 + &den) / (den * 2u32);
    let mut s = q.to_string();
    if digits == 0 {
        return s;
    }
    while s.len() <= digits as usize {
        s.insert(0, '0');
    }
    s.insert(s.len() - digits as usize, '.');
    s
}

/// Stirling numbers: `sty` 1 is the signed first kind, 2 the second kind,
/// 3 the Lah numbers. Any other type is a contract violation.
pub fn stirling(n: u64, m: u64, sty: u32) -> Result<Integer> {
    if !(1..=3).contains(&sty) {
        return Err(Error::invalid(format!("stirling type {} not in 1..=3", sty)));
    }
    let nu = u32::try_from(n).map_err(|_| Error::invalid("stirling n too large"))?;
    if n == m {
        return Ok(Integer::from(1u32));
    }
    if n == 0 || m == 0 || m > n {
        return Ok(Integer::new());
    }
    if m == 1 {
        return Ok(match sty {
            1 => {
                let f = Integer::from(Integer::factorial(nu - 1));
                if n & 1 == 0 {
                    -f
                } else {
                    f
                }
            }
            2 => Integer::from(1u32),
            _ => Integer::from(Integer::factorial(nu)),
        });
    }

    let mu = m as u32;
    let mut r = Integer::new();
    match sty {
        3 => {
            // Lah: C(n-1, m-1) · n!/m!
            r = binomial(n - 1, m - 1) * Integer::from(Integer::factorial(nu));
            r = r.div_exact(&Integer::from(Integer::factorial(mu)));
        }
        2 => {
            for j in 1..=m {
                let t = binomial(m, j) * Integer::from(j).pow(nu);
                if (m - j) & 1 == 1 {
                    r -= t;
                } else {
                    r += t;
                }
            }
            r = r.div_exact(&Integer::from(Integer::factorial(mu)));
        }
        _ => {
            for j in 1..=(n - m) {
                let t = binomial(n + j - 1, n + j - m)
                    * binomial(2 * n - m, n - j - m)
                    * stirling(n + j - m, j, 2)?;
                if j & 1 == 1 {
                    r -= t;
                } else {
                    r += t;
                }
            }
        }
    }
    Ok(r)
}

/// Binomial coefficient C(n, k) by Goetgheluck's prime-power method.
pub fn binomial(n: u64, k: u64) -> Integer {
    if k > n {
        return Integer::new();
    }
    if k == 0 || k == n {
        return Integer::from(1u32);
    }
    let k = k.min(n - k);
    let nk = n - k;
    let sqrtn = (n as f64).sqrt() as u64;

    // Pack prime powers eight to a leaf as they are found.
    let mut leaves: Vec<Integer> = Vec::new();
    let mut packed = 0usize;
    let mut push = |leaves: &mut Vec<Integer>, w: u64| {
        if packed % 8 == 0 {
            leaves.push(Integer::from(w));
        } else if let Some(last) = leaves.last_mut() {
            *last *= w;
        }
        packed += 1;
    };

    for p in primes_up_to(n) {
        if p > nk {
            // Every prime in (n-k, n] appears exactly once.
            push(&mut leaves, p);
        } else if p > n / 2 {
            // Primes in (n/2, n-k] never appear.
        } else if p > sqrtn {
            if n % p < k % p {
                push(&mut leaves, p);
            }
        } else {
            // Kummer: count carries of k + (n-k) in base p.
            let (mut nn, mut kk, mut pw, mut carry) = (n, k, 1u64, 0u64);
            while nn > 0 {
                carry = u64::from(nn % p < kk % p + carry);
                if carry == 1 {
                    pw *= p;
                }
                nn /= p;
                kk /= p;
            }
            if pw > 1 {
                push(&mut leaves, pw);
            }
        }
    }
    product_tree(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bernoulli_known_values() {
        let cases: &[(u64, i64, u64)] = &[
            (0, 1, 1),
            (1, 1, 2),
            (2, 1, 6),
            (4, -1, 30),
            (6, 1, 42),
            (8, -1, 30),
            (10, 5, 66),
            (12, -691, 2730),
            (14, 7, 6),
            (20, -174611, 330),
        ];
        for &(n, num, den) in cases {
            let (bn, bd) = bernfrac(n);
            assert_eq!(bn, num, "B_{} numerator", n);
            assert_eq!(bd, den, "B_{} denominator", n);
        }
    }

    #[test]
    fn bernoulli_odd_is_zero() {
        for n in [3u64, 5, 7, 9, 99] {
            assert_eq!(bernfrac(n), (Integer::new(), Integer::from(1u32)));
        }
    }

    #[test]
    fn bernoulli_fractions_are_reduced() {
        for n in (2u64..60).step_by(2) {
            let (num, den) = bernfrac(n);
            assert_eq!(Integer::from(num.gcd_ref(&den)), 1u32, "B_{}", n);
            assert!(den > 0u32);
        }
    }

    #[test]
    fn harmonic_known_values() {
        assert_eq!(harmfrac(0), (Integer::new(), Integer::from(1u32)));
        assert_eq!(harmfrac(1), (Integer::from(1u32), Integer::from(1u32)));
        assert_eq!(harmfrac(2), (Integer::from(3u32), Integer::from(2u32)));
        assert_eq!(harmfrac(3), (Integer::from(11u32), Integer::from(6u32)));
        assert_eq!(harmfrac(10), (Integer::from(7381u32), Integer::from(2520u32)));
    }

    #[test]
    fn harmonic_matches_term_by_term_sum() {
        for n in [4u64, 17, 100] {
            let (num, den) = harmfrac(n);
            let mut snum = Integer::new();
            let mut sden = Integer::from(1u32);
            for i in 1..=n {
                snum = snum * i + &sden;
                sden *= i;
            }
            let g = Integer::from(snum.gcd_ref(&sden));
            assert_eq!((num, den), (snum.div_exact(&g), sden.div_exact(&g)), "H({})", n);
        }
    }

    #[test]
    fn harmreal_formatting() {
        assert_eq!(harmreal(1, 3), "1.000");
        assert_eq!(harmreal(2, 4), "1.5000");
        assert_eq!(harmreal(10, 5), "2.92897"); // 2.9289682…
        assert_eq!(harmreal(10, 0), "3"); // rounds up from 2.93
    }

    #[test]
    fn stirling_second_kind() {
        assert_eq!(stirling(5, 2, 2).unwrap(), 15u32);
        assert_eq!(stirling(10, 3, 2).unwrap(), 9330u32);
        assert_eq!(stirling(10, 10, 2).unwrap(), 1u32);
        assert_eq!(stirling(10, 1, 2).unwrap(), 1u32);
        assert_eq!(stirling(3, 5, 2).unwrap(), 0u32);
    }

    #[test]
    fn stirling_first_kind_signed() {
        assert_eq!(stirling(4, 2, 1).unwrap(), 11u32);
        assert_eq!(stirling(4, 1, 1).unwrap(), -6i32);
        assert_eq!(stirling(5, 1, 1).unwrap(), 24u32);
        assert_eq!(stirling(10, 3, 1).unwrap(), -1_172_700i64);
        // Row sums of unsigned |s(n,m)| equal n!; spot-check via identity
        // Σ_m s(n,m)·x^m at x=1: falling factorial of 1 is 0 for n ≥ 2.
        for n in 2u64..8 {
            let sum = (1..=n).fold(Integer::new(), |acc, m| acc + stirling(n, m, 1).unwrap());
            assert_eq!(sum, 0u32, "Σ s({}, m)", n);
        }
    }

    #[test]
    fn stirling_lah() {
        assert_eq!(stirling(4, 2, 3).unwrap(), 36u32);
        assert_eq!(stirling(5, 2, 3).unwrap(), 240u32);
        assert_eq!(stirling(5, 1, 3).unwrap(), 120u32);
    }

    #[test]
    fn stirling_bad_type_is_error() {
        assert!(stirling(5, 2, 0).is_err());
        assert!(stirling(5, 2, 4).is_err());
    }

    #[test]
    fn binomial_matches_gmp_small_grid() {
        for n in 0u64..=60 {
            for k in 0..=n {
                let ours = binomial(n, k);
                let gmp = Integer::from(Integer::binomial_u(n as u32, k as u32));
                assert_eq!(ours, gmp, "C({}, {})", n, k);
            }
        }
    }

    #[test]
    fn binomial_known_large_value() {
        let c = binomial(100, 50);
        assert_eq!(c.to_string(), "100891344545564193334812497256");
    }

    #[test]
    fn binomial_identities() {
        assert_eq!(binomial(10, 12), 0u32);
        assert_eq!(binomial(500, 0), 1u32);
        assert_eq!(binomial(500, 500), 1u32);
        for (n, k) in [(500u64, 3u64), (1000, 71), (2000, 1999)] {
            assert_eq!(binomial(n, k), binomial(n, n - k), "symmetry at ({}, {})", n, k);
        }
        // Pascal: C(n,k) = C(n-1,k-1) + C(n-1,k).
        for (n, k) in [(300u64, 150u64), (1234, 56)] {
            assert_eq!(
                binomial(n, k),
                binomial(n - 1, k - 1) + binomial(n - 1, k),
                "Pascal at ({}, {})",
                n,
                k
            );
        }
    }
}
