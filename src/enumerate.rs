//! # Enumerate — Next/Previous Prime and Ranged Prime Sieves
//!
//! Two regimes, picked by input size:
//!
//! - **Wheel stepping** for moderate values: advance along the mod-30 wheel
//!   while carrying `m23 = n mod 223 092 870` (= 2·3·…·23), so divisibility
//!   by 7…23 is a few word remainders and only survivors reach BPSW.
//! - **Sieve driven** for large values (above 120 bits going up, 200 going
//!   down): sieve a window of ≈ 30/ln 2 · log2(n) integers (merit 30) to a
//!   depth that grows with log2(n)², then BPSW the survivors in order.
//!
//! The ranged enumerators ([`sieve_primes`], [`sieve_twin_primes`]) sieve
//! `[lo, hi]` with all primes ≤ k and BPSW-verify what remains — unless
//! k ≥ √hi, in which case the sieve alone is exhaustive. Survivor
//! verification fans out over rayon; output order stays ascending.
//!
//! All range results are offsets relative to the caller's `lo`, and
//! `next_prime`/`prev_prime` are value-in value-out (`prev_prime` of 2 or
//! less returns 0, there being no previous prime).

use rayon::prelude::*;
use rug::Integer;
use tracing::debug;

use crate::error::{Error, Result};
use crate::primality::bpsw;
use crate::primes::{
    primes_up_to, PrimeIterator, NEXT_WHEEL, PREV_WHEEL, WHEEL_ADVANCE, WHEEL_RETREAT,
};
use crate::sieve::partial_sieve;

/// 2·3·5·7·11·13·17·19·23.
const WHEEL_M23: u32 = 223_092_870;

/// Merit controlling how many numbers each sieve window spans.
const NPS_MERIT: f64 = 30.0;

/// Bit-size thresholds where stepping hands over to the windowed sieve.
const NEXT_SIEVE_BITS: u32 = 120;
const PREV_SIEVE_BITS: u32 = 200;

fn sieve_window_width(log2n: u64) -> u64 {
    let w = (NPS_MERIT / 1.4427 * log2n as f64 + 0.5) as u64;
    if w & 1 == 1 {
        w + 1
    } else {
        w
    }
}

/// Sieve depth per input size; deeper for larger inputs where each BPSW
/// test costs more than a great many strikes.
fn sieve_window_depth(log2n: u64) -> u64 {
    if log2n < 100 {
        return 1000;
    }
    if log2n > 4_294_967_294 {
        return 9_300_000_000_000_000_000;
    }
    let log2log2n = 64 - log2n.leading_zeros() as u64;
    let d = (log2n as u128 * (log2n >> 5) as u128 * log2log2n as u128) >> 1;
    d as u64
}

/// The smallest prime strictly greater than n.
pub fn next_prime(n: &Integer) -> Result<Integer> {
    if *n < 29u32 {
        let m = n.to_u32().unwrap_or(0);
        let v = if m < 2 {
            2
        } else if m < 3 {
            3
        } else if m < 5 {
            5
        } else {
            NEXT_WHEEL[(m % 30) as usize] as u32
        };
        return Ok(Integer::from(v));
    }

    if n.significant_bits() > NEXT_SIEVE_BITS {
        return next_prime_with_sieve(n);
    }

    let mut n = n.clone();
    let mut m23 = n.mod_u(WHEEL_M23) as u64;
    let mut m = (m23 % 30) as usize;
    loop {
        let skip = WHEEL_ADVANCE[m] as u64;
        n += skip;
        m23 += skip;
        m = NEXT_WHEEL[m] as usize;
        if m23 % 7 != 0
            && m23 % 11 != 0
            && m23 % 13 != 0
            && m23 % 17 != 0
            && m23 % 19 != 0
            && m23 % 23 != 0
            && crate::primality::is_prob_prime(&n)?.is_probable()
        {
            return Ok(n);
        }
    }
}

/// The largest prime strictly smaller than n; 0 when n ≤ 2.
pub fn prev_prime(n: &Integer) -> Result<Integer> {
    if *n <= 29u32 {
        let m = n.to_u32().unwrap_or(0);
        let v = if m < 3 {
            0
        } else if m < 4 {
            2
        } else if m < 6 {
            3
        } else if m < 8 {
            5
        } else {
            PREV_WHEEL[(m % 30) as usize] as u32
        };
        return Ok(Integer::from(v));
    }

    if n.significant_bits() > PREV_SIEVE_BITS {
        return prev_prime_with_sieve(n);
    }

    let mut n = n.clone();
    let mut m23 = n.mod_u(WHEEL_M23) as u64;
    let mut m = (m23 % 30) as usize;
    m23 += WHEEL_M23 as u64; // keep the tracker positive while retreating
    loop {
        let skip = WHEEL_RETREAT[m] as u64;
        n -= skip;
        m23 -= skip;
        m = PREV_WHEEL[m] as usize;
        if m23 % 7 != 0
            && m23 % 11 != 0
            && m23 % 13 != 0
            && m23 % 17 != 0
            && m23 % 19 != 0
            && m23 % 23 != 0
            && crate::primality::is_prob_prime(&n)?.is_probable()
        {
            return Ok(n);
        }
    }
}

fn next_prime_with_sieve(n: &Integer) -> Result<Integer> {
    let log2n = n.significant_bits() as u64;
    let width = sieve_window_width(log2n);
    let depth = sieve_window_depth(log2n);
    debug!(width, depth, "next_prime sieve window");

    let mut n = Integer::from(n + if n.is_even() { 1u32 } else { 2u32 });
    loop {
        let comp = partial_sieve(&n, width, depth);
        let base = Integer::from(&n - 1u32);
        let mut i = 1;
        while i <= width {
            if !comp.is_composite(i) {
                let t = Integer::from(&base + i);
                if bpsw(&t)?.is_probable() {
                    return Ok(t);
                }
            }
            i += 2;
        }
        // A huge gap: sieve the following window.
        n += width;
    }
}

fn prev_prime_with_sieve(n: &Integer) -> Result<Integer> {
    let log2n = n.significant_bits() as u64;
    let width = sieve_window_width(log2n).div_ceil(64) * 64;
    let depth = sieve_window_depth(log2n);
    debug!(width, depth, "prev_prime sieve window");

    let mut n = Integer::from(n - if n.is_even() { 1u32 } else { 2u32 });
    loop {
        let start = Integer::from(&n - (width - 2));
        let comp = partial_sieve(&start, width, depth);
        let base = Integer::from(&start - 1u32);
        let mut j = 1;
        while j < width {
            let i = width - j;
            if !comp.is_composite(i) {
                let t = Integer::from(&base + i);
                if bpsw(&t)?.is_probable() {
                    return Ok(t);
                }
            }
            j += 2;
        }
        n -= width;
    }
}

/// BPSW-verify candidate offsets in parallel, keeping ascending order.
fn verify_survivors(base: &Integer, cands: Vec<u64>) -> Result<Vec<u64>> {
    let checked: Vec<(u64, bool)> = cands
        .into_par_iter()
        .map(|i| bpsw(&Integer::from(base + i)).map(|r| (i, r.is_probable())))
        .collect::<Result<_>>()?;
    Ok(checked.into_iter().filter(|&(_, ok)| ok).map(|(i, _)| i).collect())
}

fn range_length(low: &Integer, high: &Integer) -> Result<u64> {
    Integer::from(high - low)
        .to_u64()
        .map(|d| d + 1)
        .ok_or_else(|| Error::invalid("sieve range is too wide"))
}

/// Offsets (relative to `lo`, clamped below at 2) of every prime in
/// `[lo, hi]`.
///
/// `k` is the sieve depth: 0 picks one automatically; any k ≥ √hi makes
/// the sieve exhaustive and skips BPSW verification entirely.
pub fn sieve_primes(lo: &Integer, hi: &Integer, k: u64) -> Result<Vec<u64>> {
    let inlow = if *lo < 2u32 {
        Integer::from(2u32)
    } else {
        lo.clone()
    };
    let mut high = hi.clone();
    if inlow > high {
        return Ok(Vec::new());
    }

    let root = Integer::from(high.sqrt_ref());
    let mut k = k;
    if k == 0 {
        let hbits = high.significant_bits() as u64;
        k = if hbits < 100 {
            50_000_000
        } else {
            hbits * 500_000
        };
    }
    // Depth at or past sqrt(hi) makes the sieve exhaustive; anything less
    // gets BPSW verification of the survivors.
    let mut test_primality = true;
    if root <= k {
        k = root.to_u64().unwrap_or(k);
        test_primality = false;
    }

    let mut ret: Vec<u64> = Vec::new();

    // Small ranges settle straight off the base sieve.
    if high <= 2_000_000_000u64 {
        let ulow = inlow.to_u64().unwrap_or(2);
        let uhigh = high.to_u64().unwrap_or(0);
        if uhigh < 1_000_000 || uhigh / ulow >= 4 {
            for p in primes_up_to(uhigh) {
                if p >= ulow {
                    ret.push(p - ulow);
                }
            }
            return Ok(ret);
        }
    }

    let mut low = inlow.clone();
    if k < 2 {
        k = 2;
    }

    // Primes up to k divide themselves out of the partial sieve, so list
    // them verbatim first.
    if low <= k {
        let ulow = low.to_u64().unwrap_or(2);
        for p in primes_up_to(k) {
            if p >= ulow {
                ret.push(p - ulow);
            }
        }
    }

    if low.is_even() {
        low += 1u32;
    }
    if high.is_even() {
        high -= 1u32;
    }
    if low <= high {
        let length = range_length(&low, &high)?;
        let comp = partial_sieve(&low, length, k);
        let base = Integer::from(&low - 1u32);
        let delta = Integer::from(&low - &inlow).to_u64().unwrap_or(0);

        let mut cands: Vec<u64> = Vec::new();
        let mut i = 1;
        while i <= length {
            if !comp.is_composite(i) {
                cands.push(i);
            }
            i += 2;
        }
        let confirmed = if test_primality {
            verify_survivors(&base, cands)?
        } else {
            cands
        };
        ret.extend(confirmed.into_iter().map(|i| i - 1 + delta));
    }
    Ok(ret)
}

/// Offsets r (relative to `lo`, clamped below at 3) such that both
/// `lo + r` and `lo + r + twin` are (probable) primes. `twin` must be even
/// and positive.
pub fn sieve_twin_primes(lo: &Integer, hi: &Integer, twin: u64) -> Result<Vec<u64>> {
    if twin & 1 == 1 || twin == 0 {
        return Err(Error::invalid("twin prime offset must be even and nonzero"));
    }
    let orig_lo = lo;
    let mut low = if *lo <= 3u32 {
        Integer::from(3u32)
    } else {
        lo.clone()
    };
    let mut high = hi.clone();
    if low.is_even() {
        low += 1u32;
    }
    if high.is_even() {
        high -= 1u32;
    }

    // Residue classes mod 6 that can hold both ends of the pair.
    let (skipi, starti) = match twin % 6 {
        2 => (6u64, 5u64),
        4 => (6, 1),
        _ => (2, 1),
    };

    if low > high {
        return Ok(Vec::new());
    }

    let mut k = 80_000 * high.significant_bits() as u64;
    let root = Integer::from(high.sqrt_ref());
    if root < k {
        k = root.to_u64().unwrap_or(k);
    }

    let mut ret: Vec<u64> = Vec::new();
    let push_value = |ret: &mut Vec<u64>, value: &Integer| -> Result<()> {
        let rel = Integer::from(value - orig_lo)
            .to_u64()
            .ok_or_else(|| Error::invalid("twin sieve range is too wide"))?;
        ret.push(rel);
        Ok(())
    };

    // Primes ≤ k never survive the partial sieve; handle them here.
    if low <= k {
        let ulow = low.to_u64().unwrap_or(3);
        let mut iter = PrimeIterator::new();
        loop {
            let p = iter.next_prime();
            if p > k {
                break;
            }
            if p < ulow {
                continue;
            }
            if bpsw(&Integer::from(p + twin))?.is_probable() {
                push_value(&mut ret, &Integer::from(p))?;
            }
        }
    }

    let length = range_length(&low, &high)?;
    let starti = ((starti + skipi) - (low.mod_u(skipi as u32) as u64) + 1) % skipi;

    let comp = partial_sieve(&low, length + twin, k);
    let base = Integer::from(&low - 1u32);
    let mut cands: Vec<u64> = Vec::new();
    let mut i = starti;
    while i <= length {
        if !comp.is_composite(i) && !comp.is_composite(i + twin) {
            cands.push(i);
        }
        i += skipi;
    }
    let verified: Vec<(u64, bool)> = cands
        .into_par_iter()
        .map(|i| {
            let first = Integer::from(&base + i);
            let ok = bpsw(&first)?.is_probable()
                && bpsw(&Integer::from(first + twin))?.is_probable();
            Ok((i, ok))
        })
        .collect::<Result<_>>()?;
    for (i, ok) in verified {
        if ok {
            push_value(&mut ret, &Integer::from(&base + i))?;
        }
    }
    Ok(ret)
}
