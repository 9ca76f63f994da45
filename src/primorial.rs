//! # Primorial — Primorials, LCM of Consecutive Integers, Product Trees
//!
//! Builders whose difficulty is intermediate-size blow-up, not arithmetic:
//! multiplying thousands of word-sized factors one at a time degenerates to
//! quadratic cost because the accumulator keeps growing. Every builder here
//! therefore packs several machine-word factors per leaf and reduces the
//! leaves pairwise in a balanced tree, so operands at each level stay the
//! same size.
//!
//! - [`pn_primorial`] — product of the first n primes (p_n#).
//! - [`primorial`] — product of the primes ≤ n (n#).
//! - [`lcm_consecutive`] — lcm(1, 2, …, B) via p^⌊log_p B⌋ per prime.
//!
//! ## Growth
//!
//! By Chebyshev, log2(p#) ≈ p, so these values get large quickly: 9973# is
//! already ~14 000 bits. The product tree keeps the total multiplication
//! cost quasi-linear in the output size.
//!
//! ## References
//!
//! - OEIS [A002110](https://oeis.org/A002110) — primorial numbers.
//! - OEIS [A003418](https://oeis.org/A003418) — lcm(1..n).

use rug::Integer;

use crate::primes::PrimeIterator;

/// Largest single prime that can still absorb two more neighbouring primes
/// in one u64 (p·p'·p'' < 2^64 for consecutive primes).
const LAST_TRIPLE_PROD: u64 = 2_642_231;
/// Largest value that can absorb one more neighbouring prime in one u64.
const LAST_DOUBLE_PROD: u64 = 4_294_967_291;

/// Reduce a list of partial products to a single value by pairwise
/// multiplication. Consumes the workspace; an empty list yields 1.
pub(crate) fn product_tree(mut leaves: Vec<Integer>) -> Integer {
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity(leaves.len() / 2 + 1);
        let mut it = leaves.into_iter();
        while let Some(a) = it.next() {
            match it.next() {
                Some(b) => next.push(a * b),
                None => next.push(a),
            }
        }
        leaves = next;
    }
    leaves.pop().unwrap_or_else(|| Integer::from(1u32))
}

/// Product of the first `n` primes.
pub fn pn_primorial(n: u64) -> Integer {
    if n <= 4 {
        let v: u32 = match n {
            0 => 1,
            1 => 2,
            2 => 6,
            3 => 30,
            _ => 210,
        };
        return Integer::from(v);
    }

    let mut iter = PrimeIterator::new();
    let mut p = iter.next_prime();
    let mut n = n;

    if n < 200 {
        // Simple linear multiply, pairing two primes per big-int operation.
        let mut prim = Integer::from(1u32);
        while n > 0 {
            n -= 1;
            if n > 0 {
                p *= iter.next_prime();
                n -= 1;
            }
            prim *= p;
            p = iter.next_prime();
        }
        return prim;
    }

    // Tree multiply over leaves that each hold the product of 8 packed words,
    // where each word combines two or three primes while they fit.
    let mut leaves: Vec<Integer> = Vec::with_capacity(n as usize / 16 + 1);
    let mut i = 0usize;
    while n > 0 {
        n -= 1;
        if p <= LAST_TRIPLE_PROD && n > 0 {
            p *= iter.next_prime();
            n -= 1;
        }
        if p <= LAST_DOUBLE_PROD && n > 0 {
            p *= iter.next_prime();
            n -= 1;
        }
        if i % 8 == 0 {
            leaves.push(Integer::from(p));
        } else if let Some(last) = leaves.last_mut() {
            *last *= p;
        }
        i += 1;
        p = iter.next_prime();
    }
    product_tree(leaves)
}

/// Product of all primes ≤ `n`.
pub fn primorial(n: u64) -> Integer {
    if n <= 4 {
        let v: u32 = match n {
            0 | 1 => 1,
            2 => 2,
            _ => 6,
        };
        return Integer::from(v);
    }

    let mut primes = crate::primes::primes_up_to(n);

    // Pack word pairs from both ends while the products still fit, shrinking
    // the list before any big-int arithmetic happens.
    let mut np = primes.len();
    while np > 1 && u64::MAX / primes[0] > primes[np - 1] {
        let mut i = 0;
        while np > i + 1 && u64::MAX / primes[i] > primes[np - 1] {
            np -= 1;
            primes[i] *= primes[np];
            i += 1;
        }
    }
    primes.truncate(np);

    if np <= 8 {
        return primes.iter().fold(Integer::from(1u32), |acc, &p| acc * p);
    }

    // Four packed words per leaf, then a balanced reduction.
    let mut leaves: Vec<Integer> = Vec::with_capacity(np / 4 + 1);
    for chunk in primes.chunks(4) {
        let mut leaf = Integer::from(chunk[0]);
        for &w in &chunk[1..] {
            leaf *= w;
        }
        leaves.push(leaf);
    }
    product_tree(leaves)
}

/// lcm(1, 2, …, B): for every prime p ≤ B the factor p^⌊log_p B⌋.
///
/// Eight round-robin sub-accumulators keep the operands balanced; they are
/// combined by the same pairwise reduction the primorials use.
pub fn lcm_consecutive(b: u64) -> Integer {
    let mut accs: Vec<Integer> = (0..8).map(|_| Integer::from(1u32)).collect();
    let mut i = 0usize;

    if b >= 2 {
        let mut pp = 2u64;
        while pp <= b / 2 {
            pp *= 2;
        }
        accs[i & 7] *= pp;
        i += 1;
    }

    let mut iter = PrimeIterator::new();
    iter.next_prime(); // skip 2, handled above
    let mut p = iter.next_prime();

    // Primes whose square still fits below B contribute a higher power.
    while p <= b {
        let pmin = b / p;
        if p > pmin {
            break;
        }
        let mut pp = p * p;
        while pp <= pmin {
            pp *= p;
        }
        accs[i & 7] *= pp;
        i += 1;
        p = iter.next_prime();
    }
    // The rest appear to the first power only.
    while p <= b {
        accs[i & 7] *= p;
        i += 1;
        p = iter.next_prime();
    }

    product_tree(accs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primes::SMALL_PRIMES;

    #[test]
    fn pn_primorial_tiny() {
        for (n, want) in [(0u64, 1u64), (1, 2), (2, 6), (3, 30), (4, 210), (5, 2310)] {
            assert_eq!(pn_primorial(n), Integer::from(want), "p_{}#", n);
        }
    }

    #[test]
    fn pn_primorial_matches_direct_product() {
        // Linear path (n < 200) and tree path (n >= 200) both checked against
        // a naive fold.
        for n in [50u64, 168, 200, 350] {
            let mut it = PrimeIterator::new();
            let direct = (0..n).fold(Integer::from(1u32), |acc, _| acc * it.next_prime());
            assert_eq!(pn_primorial(n), direct, "n = {}", n);
        }
    }

    #[test]
    fn pn_primorial_of_168_is_small_prime_product() {
        let table = SMALL_PRIMES
            .iter()
            .fold(Integer::from(1u32), |acc, &p| acc * p);
        assert_eq!(pn_primorial(168), table);
    }

    #[test]
    fn primorial_matches_gmp() {
        for n in [0u64, 1, 2, 3, 4, 5, 29, 30, 100, 541, 1000, 9973] {
            let ours = primorial(n);
            let gmp = Integer::from(Integer::primorial(n as u32));
            assert_eq!(ours, gmp, "{}#", n);
        }
    }

    #[test]
    fn lcm_consecutive_known_values() {
        assert_eq!(lcm_consecutive(0), 1u32);
        assert_eq!(lcm_consecutive(1), 1u32);
        assert_eq!(lcm_consecutive(2), 2u32);
        assert_eq!(lcm_consecutive(10), 2520u32);
        assert_eq!(lcm_consecutive(20), 232_792_560u32);
    }

    #[test]
    fn lcm_consecutive_divisibility() {
        let m = lcm_consecutive(50);
        for i in 1..=50u32 {
            assert!(m.is_divisible_u(i), "lcm(1..50) not divisible by {}", i);
        }
        let m30 = lcm_consecutive(30);
        let direct = (1..=30u32).fold(Integer::from(1u32), |acc, i| acc.lcm(&Integer::from(i)));
        assert_eq!(m30, direct);
    }

    #[test]
    fn product_tree_handles_degenerate_shapes() {
        assert_eq!(product_tree(vec![]), 1u32);
        assert_eq!(product_tree(vec![Integer::from(7u32)]), 7u32);
        let v: Vec<Integer> = (1..=9u32).map(Integer::from).collect();
        assert_eq!(product_tree(v), 362_880u32); // 9!
    }
}
