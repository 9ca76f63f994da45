//! # Primality — Probable-Prime Engine and Deciders
//!
//! The testing pipeline, ordered cheap → expensive → exotic:
//!
//! - **Miller–Rabin**: single-base ([`miller_rabin`], [`miller_rabin_u64`]),
//!   random-base ([`miller_rabin_random`]), the Sorenson–Webster
//!   deterministic base sets below 2^82, and the fully deterministic Miller
//!   test ([`is_miller_prime`]) for callers willing to pay for it.
//! - **Lucas pseudoprime tests** in three strengths
//!   ([`is_lucas_pseudoprime`]), plus the faster, slightly weaker
//!   V-only variant ([`is_almost_extra_strong_lucas_pseudoprime`]).
//! - **Perrin**: 3×3 companion-matrix power, trace ≡ 0 test
//!   ([`is_perrin_pseudoprime`]).
//! - **BPSW** ([`bpsw`]): strong base-2 Miller–Rabin + extra-strong Lucas.
//!   Verified against Feitsma's base-2 pseudoprime table: no composite
//!   below 2^64 passes, so the result is deterministic there. No
//!   counterexample of any size is known.
//! - **Deterministic deciders for special forms**: Lucas–Lehmer
//!   ([`lucas_lehmer`]) for 2^p − 1, LLR ([`llr`]) for k·2^n − 1, Proth
//!   ([`proth`]) for k·2^n + 1.
//! - **Front doors**: [`is_prob_prime`] (pretest + BPSW), [`is_prime`]
//!   (adds the form deciders, Sorenson–Webster, and random-base rounds to
//!   push the error bound below 10⁻⁵ unconditionally), [`is_bpsw_prime`],
//!   and [`is_provable_prime`] (delegates to an external
//!   [`ProofBackend`](crate::provers::ProofBackend)).
//!
//! A BPSW pass contradicted by deterministic Miller–Rabin would be a
//! publishable counterexample; the engine logs it at `error` level and
//! returns composite.
//!
//! ## References
//!
//! - Baillie & Wagstaff, "Lucas Pseudoprimes", Math. Comp. 35(152), 1980.
//! - Sorenson & Webster, "Strong pseudoprimes to twelve prime bases",
//!   Math. Comp. 86(304), 2017.
//! - Damgård, Landrock & Pomerance, "Average case error estimates for the
//!   strong probable prime test", Math. Comp. 61(203), 1993.
//! - Riesel, "Lucasian Criteria for the Primality of N = h·2^n − 1",
//!   Math. Comp. 23(108), 1969.

use std::cmp::Ordering;

use rug::ops::RemRounding;
use rug::Integer;
use tracing::{debug, error};

use crate::cache;
use crate::error::{Error, Result};
use crate::lucas::{extra_strong_params, lucas_seq, selfridge_params};
use crate::pretest::pretest;
use crate::primes::SMALL_PRIMES;
use crate::provers::ProofBackend;
use crate::Primality;

/// One Miller–Rabin round with an arbitrary big-integer base.
///
/// Bases congruent to 0, ±1 mod n carry no information and pass trivially;
/// a base below 2 is a contract violation.
pub fn miller_rabin(n: &Integer, a: &Integer) -> Result<bool> {
    match n.partial_cmp(&2u32) {
        Some(Ordering::Equal) => return Ok(true),
        Some(Ordering::Less) => return Ok(false),
        _ => {}
    }
    if n.is_even() {
        return Ok(false);
    }
    if *a <= 1u32 {
        return Err(Error::invalid(format!("Miller-Rabin base {} is invalid", a)));
    }

    let nminus1 = Integer::from(n - 1u32);
    let mut x = a.clone();
    if x >= *n {
        x = x.rem_euc(n);
    }
    if x <= 1u32 || x >= nminus1 {
        return Ok(true);
    }

    let s = nminus1.find_one(0).unwrap_or(0);
    let d = Integer::from(&nminus1 >> s);

    let mut x = match x.pow_mod(&d, n) {
        Ok(v) => v,
        Err(_) => return Ok(false),
    };
    if x == 1u32 || x == nminus1 {
        return Ok(true);
    }
    for _ in 1..s {
        x.square_mut();
        x = x.rem_euc(n);
        if x == 1u32 {
            return Ok(false);
        }
        if x == nminus1 {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Miller–Rabin with a machine-word base.
pub fn miller_rabin_u64(n: &Integer, base: u64) -> Result<bool> {
    miller_rabin(n, &Integer::from(base))
}

/// `numbases` Miller–Rabin rounds with bases drawn uniformly from [2, n−2].
///
/// A `seed` reseeds the shared random state first, for reproducible runs.
pub fn miller_rabin_random(n: &Integer, numbases: u64, seed: Option<&Integer>) -> Result<bool> {
    if numbases == 0 {
        return Ok(true);
    }
    if *n < 100u32 {
        return Ok(is_prob_prime(n)?.is_probable());
    }
    if let Some(s) = seed {
        cache::seed_randstate(s);
    }
    let span = Integer::from(n - 3u32);
    for _ in 0..numbases {
        let base = cache::with_randstate(|rs| span.clone().random_below(rs)) + 2u32;
        if !miller_rabin(n, &base)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Deterministic Miller test: try every base in [2, maxa].
///
/// maxa is 3 below 1 373 653, else 2·ln²(n) under GRH (Bach 1990), else the
/// unconditional Bober–Goldmakher bound exp(ln(n)/6.5948…). Expensive —
/// this is a correctness backstop, not a production path.
pub fn is_miller_prime(n: &Integer, assume_grh: bool) -> Result<bool> {
    match n.partial_cmp(&2u32) {
        Some(Ordering::Equal) => return Ok(true),
        Some(Ordering::Less) => return Ok(false),
        _ => {}
    }
    if n.is_even() {
        return Ok(false);
    }

    let maxa: u64 = if *n < 1_373_653u32 {
        3
    } else {
        let logn = rug::Float::with_val(64, n).ln().to_f64();
        let dmaxa = if assume_grh {
            2.0 * logn * logn
        } else {
            (logn / 6.594_885_082_8).exp()
        };
        if dmaxa >= u64::MAX as f64 {
            return Err(Error::invalid(
                "input too large for deterministic Miller test",
            ));
        }
        dmaxa.ceil() as u64
    };
    let maxa = if *n <= maxa {
        Integer::from(n - 1u32).to_u64().unwrap_or(maxa)
    } else {
        maxa
    };
    debug!(maxa, "deterministic Miller-Rabin over all bases");

    for a in 2..=maxa {
        if !miller_rabin_u64(n, a)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Which Lucas pseudoprime flavour to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LucasStrength {
    /// U_{n+1} ≡ 0 with Selfridge parameters.
    Standard,
    /// The strong version over n+1 = 2^s·d, Selfridge parameters.
    Strong,
    /// Baillie's extra-strong version with P from the A217719 parameters.
    ExtraStrong,
}

/// Lucas pseudoprime test per Baillie–Wagstaff.
///
/// The standard and strong flavours use the Selfridge (method A)
/// parameters; the extra-strong flavour uses P ≥ 3, Q = 1. All three leave
/// the set of base-2 strong pseudoprimes below 2^64 with zero overlap,
/// which is what makes BPSW deterministic there.
pub fn is_lucas_pseudoprime(n: &Integer, strength: LucasStrength) -> Result<bool> {
    match n.partial_cmp(&2u32) {
        Some(Ordering::Equal) => return Ok(true),
        Some(Ordering::Less) => return Ok(false),
        _ => {}
    }
    if n.is_even() {
        return Ok(false);
    }
    if *n == 3u32 {
        // Smallest case where the extra-strong P search would collide with n.
        return Ok(true);
    }

    let params = match strength {
        LucasStrength::Standard | LucasStrength::Strong => selfridge_params(n)?,
        LucasStrength::ExtraStrong => extra_strong_params(n, 1)?,
    };
    let (p, q) = match params {
        Some(pq) => pq,
        None => return Ok(false),
    };
    debug!(P = p, Q = q, "Lucas parameters");

    let mut d = Integer::from(n + 1u32);
    let mut s: u32 = 0;
    if strength != LucasStrength::Standard {
        s = d.find_one(0).unwrap_or(0);
        d >>= s;
    }

    let (u, v, qk) = lucas_seq(n, p, q, &d)?;

    match strength {
        LucasStrength::Standard => Ok(u.cmp0() == Ordering::Equal),
        LucasStrength::Strong => {
            if u.cmp0() == Ordering::Equal {
                return Ok(true);
            }
            let mut v = v;
            let mut qk = qk;
            let mut rem = s;
            while rem > 0 {
                if v.cmp0() == Ordering::Equal {
                    return Ok(true);
                }
                rem -= 1;
                if rem > 0 {
                    v.square_mut();
                    v -= Integer::from(2u32) * &qk;
                    v = v.rem_euc(n);
                    qk.square_mut();
                    qk = qk.rem_euc(n);
                }
            }
            Ok(false)
        }
        LucasStrength::ExtraStrong => {
            let nminus2 = Integer::from(n - 2u32);
            if u.cmp0() == Ordering::Equal && (v == 2u32 || v == nminus2) {
                return Ok(true);
            }
            // The extra strong test checks r < s-1 rather than r < s.
            let mut v = v;
            let mut rem = s - 1;
            while rem > 0 {
                if v.cmp0() == Ordering::Equal {
                    return Ok(true);
                }
                rem -= 1;
                if rem > 0 {
                    v.square_mut();
                    v -= 2u32;
                    v = v.rem_euc(n);
                }
            }
            Ok(false)
        }
    }
}

/// Pari-style extra-strong Lucas test that never computes U_d.
///
/// Faster than the full extra-strong test but admits more pseudoprimes.
/// `increment` 1 yields a subset of the extra-strong pseudoprimes
/// (Baillie); 2 reproduces Pari's results.
pub fn is_almost_extra_strong_lucas_pseudoprime(n: &Integer, increment: u64) -> Result<bool> {
    match n.partial_cmp(&2u32) {
        Some(Ordering::Equal) => return Ok(true),
        Some(Ordering::Less) => return Ok(false),
        _ => {}
    }
    if n.is_even() {
        return Ok(false);
    }
    if *n == 3u32 {
        return Ok(true);
    }

    let p = match extra_strong_params(n, increment)? {
        Some((p, _)) => p,
        None => return Ok(false),
    };

    let mut d = Integer::from(n + 1u32);
    let s = d.find_one(0).unwrap_or(0);
    d >>= s;

    // V-only ladder: v = V_m, w = V_{m+1}.
    let b = d.significant_bits();
    let mut v = Integer::from(p);
    let mut w = Integer::from(p * p - 2);
    for i in (0..b - 1).rev() {
        if d.get_bit(i) {
            v = Integer::from(&v * &w) - p;
            w.square_mut();
            w -= 2u32;
        } else {
            w = Integer::from(&v * &w) - p;
            v.square_mut();
            v -= 2u32;
        }
        v = v.rem_euc(n);
        w = w.rem_euc(n);
    }

    let nminus2 = Integer::from(n - 2u32);
    if v == 2u32 || v == nminus2 {
        return Ok(true);
    }
    let mut rem = s - 1;
    while rem > 0 {
        if v.cmp0() == Ordering::Equal {
            return Ok(true);
        }
        rem -= 1;
        if rem > 0 {
            v.square_mut();
            v -= 2u32;
            v = v.rem_euc(n);
        }
    }
    Ok(false)
}

fn mat_mulmod_3x3(a: &[Integer; 9], b: &[Integer; 9], n: &Integer) -> [Integer; 9] {
    std::array::from_fn(|idx| {
        let (row, col) = (idx / 3, idx % 3);
        let mut acc = Integer::from(&a[3 * row] * &b[col]);
        acc += Integer::from(&a[3 * row + 1] * &b[3 + col]);
        acc += Integer::from(&a[3 * row + 2] * &b[6 + col]);
        acc.rem_euc(n)
    })
}

fn mat_powmod_3x3(m: &[Integer; 9], k: &Integer, n: &Integer) -> [Integer; 9] {
    let mut result: [Integer; 9] =
        std::array::from_fn(|i| Integer::from(u32::from(i % 4 == 0)));
    let mut base = m.clone();
    let mut k = k.clone();
    while k.cmp0() == Ordering::Greater {
        if k.is_odd() {
            result = mat_mulmod_3x3(&result, &base, n);
        }
        k >>= 1u32;
        if k.cmp0() == Ordering::Greater {
            base = mat_mulmod_3x3(&base, &base, n);
        }
    }
    result
}

/// Perrin pseudoprime test: trace of the Perrin companion matrix to the
/// n-th power ≡ 0 (mod n). Equivalently the Perrin number P(n) ≡ 0.
///
/// The first composites to pass are 271 441 = 521² and 904 631.
pub fn is_perrin_pseudoprime(n: &Integer) -> bool {
    match n.partial_cmp(&2u32) {
        Some(Ordering::Equal) => return true,
        Some(Ordering::Less) => return false,
        _ => {}
    }
    let companion: [Integer; 9] = [
        Integer::new(),
        Integer::from(1u32),
        Integer::new(),
        Integer::new(),
        Integer::new(),
        Integer::from(1u32),
        Integer::from(1u32),
        Integer::from(1u32),
        Integer::new(),
    ];
    let m = mat_powmod_3x3(&companion, n, n);
    let trace = (Integer::from(&m[0] + &m[4]) + &m[8]).rem_euc(n);
    trace.cmp0() == Ordering::Equal
}

/// The Baillie–PSW composite: strong base-2 Miller–Rabin, then the
/// extra-strong Lucas test.
///
/// Deterministic (returns [`Primality::Prime`]) below 2^64 — the range has
/// been exhaustively verified — and [`Primality::ProbablyPrime`] above.
pub fn bpsw(n: &Integer) -> Result<Primality> {
    if *n < 4u32 {
        return Ok(if *n <= 1u32 {
            Primality::Composite
        } else {
            Primality::Prime
        });
    }
    if !miller_rabin_u64(n, 2)? {
        return Ok(Primality::Composite);
    }
    if !is_lucas_pseudoprime(n, LucasStrength::ExtraStrong)? {
        return Ok(Primality::Composite);
    }
    if n.significant_bits() <= 64 {
        return Ok(Primality::Prime);
    }
    Ok(Primality::ProbablyPrime)
}

/// Sorenson–Webster deterministic Miller–Rabin, applicable below 2^82 to a
/// value that already passed BPSW.
///
/// Returns `Prime`/`Composite` inside the verified ranges and
/// `ProbablyPrime` (no result) outside them.
fn deterministic_miller_rabin(n: &Integer) -> Result<Primality> {
    if n.significant_bits() > 82 {
        return Ok(Primality::ProbablyPrime);
    }
    let maxp = if *n < *cache::sw_bound_12() {
        12
    } else if *n < *cache::sw_bound_13() {
        13
    } else {
        return Ok(Primality::ProbablyPrime);
    };
    // Base 2 is covered by the BPSW precondition; run bases 3..=p_maxp.
    for &p in &SMALL_PRIMES[1..maxp] {
        if !miller_rabin_u64(n, p as u64)? {
            return Ok(Primality::Composite);
        }
    }
    Ok(Primality::Prime)
}

/// Pretest + BPSW: tri-state with no known counterexample.
pub fn is_prob_prime(n: &Integer) -> Result<Primality> {
    let res = pretest(n);
    if res != Primality::ProbablyPrime {
        return Ok(res);
    }
    bpsw(n)
}

/// BPSW upgraded by Sorenson–Webster deterministic Miller–Rabin where that
/// applies. A disagreement between the two would be a BPSW counterexample;
/// it is reported loudly and the composite verdict wins.
pub fn is_bpsw_prime(n: &Integer) -> Result<Primality> {
    let prob = bpsw(n)?;
    if prob != Primality::ProbablyPrime {
        return Ok(prob);
    }
    let res = deterministic_miller_rabin(n)?;
    if res == Primality::Composite {
        error!(%n, "BPSW counter-example found? Deterministic M-R disagrees");
    }
    Ok(res)
}

/// The full decider: pretest, LLR and Proth for k·2^n ∓ 1 forms, BPSW,
/// Sorenson–Webster, then 1–5 random-base Miller–Rabin rounds chosen by
/// bit length to push the composite-acceptance bound below 1/595 000
/// (Damgård–Landrock–Pomerance makes the true bound far smaller).
pub fn is_prime(n: &Integer) -> Result<Primality> {
    let pre = pretest(n);
    if pre != Primality::ProbablyPrime {
        return Ok(pre);
    }

    let r = llr(n)?;
    if r != Primality::ProbablyPrime {
        return Ok(r);
    }
    let r = proth(n)?;
    if r != Primality::ProbablyPrime {
        return Ok(r);
    }

    let mut prob = bpsw(n)?;
    let nbits = n.significant_bits();

    if prob == Primality::ProbablyPrime {
        prob = deterministic_miller_rabin(n)?;
        if prob == Primality::Composite {
            error!(%n, "BPSW counter-example found? Deterministic M-R disagrees");
            return Ok(Primality::Composite);
        }
    }

    if prob == Primality::ProbablyPrime {
        let ntests = match nbits {
            0..=79 => 5,
            80..=104 => 4,
            105..=159 => 3,
            160..=412 => 2,
            _ => 1,
        };
        prob = if miller_rabin_random(n, ntests, None)? {
            Primality::ProbablyPrime
        } else {
            Primality::Composite
        };
    }
    Ok(prob)
}

/// Run the full cascade, then hand anything still unproven to the external
/// N−1 prover and, failing that, ECPP. Returns the verdict and a proof
/// certificate when the backend produced one.
///
/// With no backend, deterministic results from the form deciders are still
/// possible; everything else comes back `ProbablyPrime`.
pub fn is_provable_prime(
    n: &Integer,
    backend: Option<&dyn ProofBackend>,
) -> Result<(Primality, Option<String>)> {
    let pre = pretest(n);
    if pre != Primality::ProbablyPrime {
        return Ok((pre, None));
    }

    // LLR/Proth prove primality but yield no certificate text, so only use
    // them when the caller has no backend to feed a certificate chain.
    if backend.is_none() {
        let r = llr(n)?;
        if r != Primality::ProbablyPrime {
            return Ok((r, None));
        }
        let r = proth(n)?;
        if r != Primality::ProbablyPrime {
            return Ok((r, None));
        }
    }

    let prob = bpsw(n)?;
    if prob != Primality::ProbablyPrime {
        return Ok((prob, None));
    }
    let prob = deterministic_miller_rabin(n)?;
    if prob != Primality::ProbablyPrime {
        return Ok((prob, None));
    }
    if !miller_rabin_random(n, 1, None)? {
        return Ok((Primality::Composite, None));
    }

    let Some(backend) = backend else {
        return Ok((Primality::ProbablyPrime, None));
    };

    let effort = if is_proth_form(n) { 3 } else { 1 };
    let (res, cert) = backend.prove_n_minus_1(n, effort)?;
    if res != Primality::ProbablyPrime {
        return Ok((res, cert));
    }
    backend.prove_ecpp(n)
}

/// Lucas–Lehmer: deterministic primality of the Mersenne number 2^p − 1.
pub fn lucas_lehmer(p: u64) -> Result<bool> {
    if p == 2 {
        return Ok(true);
    }
    if p % 2 == 0 {
        return Ok(false);
    }
    if !is_prob_prime(&Integer::from(p))?.is_probable() {
        return Ok(false);
    }
    if p < 23 {
        return Ok(p != 11);
    }

    let pbits = 64 - p.leading_zeros();
    let mp = (Integer::from(1u32) << p as u32) - 1u32;

    // If p ≡ 3 (mod 4) and 2p+1 is prime, then 2p+1 | 2^p − 1.
    if p % 4 == 3 {
        let t = Integer::from(2 * p + 1);
        if is_prob_prime(&t)?.is_probable() && mp.is_divisible(&t) {
            return Ok(false);
        }
    }

    // Trial division over candidate factors q = 2pk+1, which must be
    // ±1 mod 8 and prime.
    let tlim = if p < 1500 {
        p / 2
    } else if p < 5000 {
        p
    } else {
        2 * p
    };
    let tlim = tlim.min(u64::MAX / (2 * p));
    for k in 1..tlim {
        let q = 2 * p * k + 1;
        if (q % 8 == 1 || q % 8 == 7)
            && q % 3 != 0
            && q % 5 != 0
            && q % 7 != 0
            && q % 11 != 0
            && q % 13 != 0
        {
            if q < (1u64 << 32) {
                // 2^p mod q on machine words.
                let mut b: u64 = 1;
                let mut j = pbits;
                while j > 0 {
                    j -= 1;
                    b = (b * b) % q;
                    if p & (1u64 << j) != 0 {
                        b *= 2;
                        if b >= q {
                            b -= q;
                        }
                    }
                }
                if b == 1 {
                    return Ok(false);
                }
            } else if mp.is_divisible(&Integer::from(q)) {
                return Ok(false);
            }
        }
    }

    let mut v = Integer::from(4u32);
    let pu = p as u32;
    for _ in 3..=p {
        v.square_mut();
        v -= 2u32;
        if v.cmp0() == Ordering::Less {
            v += &mp;
        }
        // Reduction mod 2^p − 1 by shift-and-fold: at most one fold plus a
        // final carry subtraction.
        let low = Integer::from(&v).keep_bits(pu);
        v >>= pu;
        v += low;
        while v >= mp {
            v -= &mp;
        }
    }
    Ok(v.cmp0() == Ordering::Equal)
}

/// Lucas–Lehmer–Riesel decider for N = k·2^n − 1 (k odd, k ≤ 2^n).
///
/// Returns `Prime` or `Composite` when N has the form, `ProbablyPrime`
/// (no result) when it does not.
pub fn llr(n: &Integer) -> Result<Primality> {
    if *n <= 100u32 {
        return Ok(if is_prob_prime(n)?.is_probable() {
            Primality::Prime
        } else {
            Primality::Composite
        });
    }
    if n.is_even() || n.is_divisible_u(3) {
        return Ok(Primality::Composite);
    }

    let v = Integer::from(n + 1u32);
    let shift = v.find_one(0).unwrap_or(0);
    let k = Integer::from(&v >> shift);
    // N = k·2^shift − 1.
    if k == 1u32 {
        return Ok(if lucas_lehmer(shift as u64)? {
            Primality::Prime
        } else {
            Primality::Composite
        });
    }
    if k.significant_bits() > shift {
        return Ok(Primality::ProbablyPrime);
    }

    let mut vcur: Integer;
    if !k.is_divisible_u(3) {
        vcur = lucas_seq(n, 4, 1, &k)?.1;
    } else if (shift % 4 == 0 || shift % 4 == 3) && k == 3u32 {
        vcur = Integer::from(5778u32);
    } else {
        // Rödseth's selection for 3 | k.
        let mut found = None;
        for p in 5u32..1000 {
            if Integer::from(p - 2).jacobi(n) == 1 && Integer::from(p + 2).jacobi(n) == -1 {
                found = Some(p);
                break;
            }
        }
        let Some(p) = found else {
            return Ok(Primality::ProbablyPrime);
        };
        vcur = lucas_seq(n, p as i64, 1, &k)?.1;
    }

    for _ in 3..=shift {
        vcur.square_mut();
        vcur -= 2u32;
        vcur = vcur.rem_euc(n);
    }
    let res = if vcur.cmp0() == Ordering::Equal {
        Primality::Prime
    } else {
        Primality::Composite
    };
    debug!(?res, "LLR decided");
    Ok(res)
}

/// Proth decider for N = k·2^n + 1 (k odd, k ≤ 2^n).
///
/// Finds a small prime a with jacobi(a, N) = −1, then N is prime iff
/// a^((N−1)/2) ≡ −1 (mod N). `ProbablyPrime` when N is not of Proth form
/// or no witness turned up among the first 25 small primes.
pub fn proth(n: &Integer) -> Result<Primality> {
    if *n <= 100u32 {
        return Ok(if is_prob_prime(n)?.is_probable() {
            Primality::Prime
        } else {
            Primality::Composite
        });
    }
    if n.is_even() || n.is_divisible_u(3) {
        return Ok(Primality::Composite);
    }

    let v = Integer::from(n - 1u32);
    let shift = v.find_one(0).unwrap_or(0);
    let k = Integer::from(&v >> shift);
    if k.significant_bits() > shift {
        return Ok(Primality::ProbablyPrime);
    }

    let mut witness = None;
    for &a in SMALL_PRIMES[..25].iter() {
        if Integer::from(a).jacobi(n) == -1 {
            witness = Some(a);
            break;
        }
    }
    let Some(a) = witness else {
        return Ok(Primality::ProbablyPrime);
    };

    let exp = Integer::from(&v >> 1u32);
    let r = match Integer::from(a).pow_mod(&exp, n) {
        Ok(r) => r,
        Err(_) => return Ok(Primality::Composite),
    };
    let res = if r == v {
        Primality::Prime
    } else {
        Primality::Composite
    };
    debug!(?res, "Proth decided");
    Ok(res)
}

/// True when N = k·2^n + 1 with k odd and k ≤ 2^n.
pub fn is_proth_form(n: &Integer) -> bool {
    if *n <= 100u32 || n.is_even() {
        return false;
    }
    let v = Integer::from(n - 1u32);
    let shift = v.find_one(0).unwrap_or(0);
    let k = Integer::from(&v >> shift);
    k.significant_bits() <= shift
}
