//! Property-based tests for the engine's mathematical invariants.
//!
//! Example-based tests pin known values; these express universal truths
//! over randomly drawn inputs, with proptest shrinking any failure to a
//! minimal counterexample.
//!
//! Properties covered:
//! - BPSW agrees with trial division everywhere in the sampled range.
//! - Miller–Rabin never rejects a prime, for any valid base.
//! - The Lucas ladder satisfies the defining recurrence.
//! - The partial sieve marks exactly the composites with a small factor.
//! - `next_prime` is the least prime strictly above its argument.
//! - Bernoulli and harmonic fractions come back fully reduced.
//! - Binomials satisfy symmetry and the Pascal recurrence.
//! - `power_factor` reconstructs its input and returns a maximal exponent.

use proptest::prelude::*;
use rug::Integer;

use primekit::combinat::{bernfrac, binomial, harmfrac};
use primekit::lucas::lucas_seq;
use primekit::nt_funcs::power_factor;
use primekit::primality::{bpsw, miller_rabin_u64};
use primekit::sieve::partial_sieve;
use primekit::{next_prime, Primality};

/// Deterministic trial-division oracle.
fn is_prime_u64(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3u64;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

proptest! {
    /// BPSW is deterministic below 2^64 and must match trial division.
    #[test]
    fn prop_bpsw_matches_trial_division(n in 0u64..5_000_000) {
        let got = bpsw(&Integer::from(n)).unwrap();
        if is_prime_u64(n) {
            prop_assert_eq!(got, Primality::Prime);
        } else {
            prop_assert_eq!(got, Primality::Composite);
        }
    }

    /// No Miller-Rabin witness ever condemns an actual prime.
    #[test]
    fn prop_mr_never_rejects_primes(idx in 1usize..1000, base in 2u64..10_000) {
        let primes = primekit::primes::primes_up_to(10_000);
        let p = primes[idx % primes.len()];
        prop_assert!(miller_rabin_u64(&Integer::from(p), base).unwrap());
    }

    /// U and V from the ladder obey X_{k+1} = P·X_k − Q·X_{k−1} (mod n).
    #[test]
    fn prop_lucas_recurrence(
        nn in 5u64..1_000_000,
        p in -20i64..20,
        q in -20i64..20,
        k in 1u64..200,
    ) {
        let n = Integer::from(2 * nn + 1); // odd modulus > 10
        prop_assume!(p * p - 4 * q != 0);

        let (u0, v0, _) = lucas_seq(&n, p, q, &Integer::from(k - 1)).unwrap();
        let (u1, v1, _) = lucas_seq(&n, p, q, &Integer::from(k)).unwrap();
        let (u2, v2, _) = lucas_seq(&n, p, q, &Integer::from(k + 1)).unwrap();

        use rug::ops::RemRounding;
        let want_u = (Integer::from(&u1 * p) - Integer::from(&u0 * q)).rem_euc(&n);
        let want_v = (Integer::from(&v1 * p) - Integer::from(&v0 * q)).rem_euc(&n);
        prop_assert_eq!(u2, want_u);
        prop_assert_eq!(v2, want_v);
    }

    /// Every odd value in the window with a factor ≤ maxp is marked, and
    /// nothing whose factors all exceed maxp is.
    #[test]
    fn prop_partial_sieve_completeness(
        start in 1_000u64..1_000_000,
        len in 64u64..512,
        maxp in 3u64..200,
    ) {
        let start = Integer::from(2 * start + 1); // odd
        let comp = partial_sieve(&start, len, maxp);
        let base = Integer::from(&start - 1u32);
        let mut i = 1u64;
        while i < len {
            let v = Integer::from(&base + i);
            let mut has_small = false;
            for p in primekit::primes::primes_up_to(maxp) {
                if p > 2 && v.is_divisible_u(p as u32) {
                    has_small = true;
                    break;
                }
            }
            prop_assert_eq!(comp.is_composite(i), has_small, "offset {}", i);
            i += 2;
        }
    }

    /// next_prime(n) is prime and nothing in (n, next_prime(n)) is.
    #[test]
    fn prop_next_prime_is_least(n in 0u64..2_000_000) {
        let np = next_prime(&Integer::from(n)).unwrap().to_u64().unwrap();
        prop_assert!(np > n);
        prop_assert!(is_prime_u64(np));
        for between in (n + 1)..np {
            prop_assert!(!is_prime_u64(between));
        }
    }

    /// Returned Bernoulli and harmonic fractions are in lowest terms.
    #[test]
    fn prop_fraction_round_trip(n in 0u64..120) {
        let (bn, bd) = bernfrac(n);
        prop_assert_eq!(Integer::from(bn.gcd_ref(&bd)), 1u32);
        prop_assert!(bd > 0u32);
        let (hn, hd) = harmfrac(n);
        prop_assert_eq!(Integer::from(hn.gcd_ref(&hd)), 1u32);
        prop_assert!(hd > 0u32);
    }

    /// C(n,k) = C(n,n−k) and the Pascal recurrence.
    #[test]
    fn prop_binomial_identities(n in 1u64..400, k in 0u64..400) {
        prop_assume!(k <= n);
        prop_assert_eq!(binomial(n, k), binomial(n, n - k));
        if k >= 1 {
            prop_assert_eq!(
                binomial(n, k),
                binomial(n - 1, k - 1) + binomial(n - 1, k)
            );
        }
    }

    /// power_factor reconstructs its input with a maximal exponent whose
    /// base is not itself a perfect power.
    #[test]
    fn prop_power_factor_reconstructs(base in 2u64..50, exp in 2u32..11) {
        use rug::ops::Pow;
        let n = Integer::from(base).pow(exp);
        let (a, root) = power_factor(&n).expect("a perfect power");
        prop_assert!(a >= exp as u64);
        prop_assert_eq!(Integer::from((&root).pow(a as u32)), n);
        prop_assert!(power_factor(&root).is_none(), "root must be primitive");
    }
}
