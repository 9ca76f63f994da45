//! # Cluster — Admissible k-Tuple Sieve
//!
//! Enumerate r such that every element of `{lo + r + c : c ∈ offsets}` is a
//! (probable) prime — prime quadruplets, quintuplets, arbitrary admissible
//! constellations. The intricacy is in how candidates are killed before any
//! BPSW test runs:
//!
//! 1. **Primorial residue list.** Start from the residues mod 30 that keep
//!    every cluster offset coprime to 30, then repeatedly multiply the next
//!    small prime into the primorial, expanding the residue list p-fold and
//!    filtering it, while the list stays within budget and the primorial
//!    within the window span.
//! 2. **Paired-prime tables.** For the next six primes, three tables
//!    indexed by `r mod (p·p')` mark residues where some cluster element is
//!    divisible by p or p'; one precomputed remainder per pair per chunk
//!    replaces six per-candidate modulos.
//! 3. **Per-prime remainder tables.** Every remaining prime ≤ 997 gets a
//!    1K row marking unacceptable remainders; the surviving residue list is
//!    filtered through them until it empties or the table runs out.
//! 4. The interval is walked in primorial-sized chunks; survivors get an
//!    optional GCD pretest against the second primorial battery (above 260
//!    bits) and finally per-element BPSW.
//!
//! Offsets in the result are relative to the caller's `lo`.

use rug::Integer;
use tracing::debug;

use crate::cache;
use crate::error::{Error, Result};
use crate::primality::{bpsw, is_prob_prime};
use crate::primes::SMALL_PRIMES;
use crate::sieve::mod_u64;

/// Residue-list budget: growing the primorial stops once the expected list
/// size would exceed this.
const TARGET_RESIDUES: u64 = 4_000_000;
/// Primorial growth cutoff: index into the small-prime table (64-bit hosts).
const GROWTH_CUTOFF_PI: usize = 14;
/// Input size (bits) above which chunk survivors get a GCD pretest.
const PRETEST_BITS: u32 = 260;

fn gcd_u64(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Sieve `[lo, hi]` for clusters with the given offsets.
///
/// `offsets` must start with 0 and be strictly increasing, with every
/// later element even (an odd offset would force one element of every
/// cluster to be even). Returns r values, ascending, relative to `lo`.
pub fn sieve_cluster(lo: &Integer, hi: &Integer, offsets: &[u32]) -> Result<Vec<u64>> {
    let nc = offsets.len();
    if nc == 0 || offsets[0] != 0 {
        return Err(Error::invalid("cluster offsets must start with 0"));
    }
    if offsets.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::invalid("cluster offsets must be strictly increasing"));
    }
    if offsets[1..].iter().any(|&c| c & 1 == 1) {
        return Err(Error::invalid("cluster offsets must be even"));
    }
    if nc == 1 {
        return crate::enumerate::sieve_primes(lo, hi, 0);
    }
    if nc == 2 {
        return crate::enumerate::sieve_twin_primes(lo, hi, offsets[1] as u64);
    }

    let last_small_prime = *SMALL_PRIMES.last().unwrap_or(&997) as u64;
    let mut low = lo.clone();
    let mut high = hi.clone();
    if low.is_even() {
        low += 1u32;
    }
    if high.is_even() {
        high -= 1u32;
    }
    if low > high {
        return Ok(Vec::new());
    }

    let mut ret: Vec<u64> = Vec::new();
    let push_value = |ret: &mut Vec<u64>, value: &Integer| -> Result<()> {
        let rel = Integer::from(value - lo)
            .to_u64()
            .ok_or_else(|| Error::invalid("cluster range is too wide"))?;
        ret.push(rel);
        Ok(())
    };

    // Values at or below 997 would be sieved away by their own residue
    // rows; test them directly.
    if low <= last_small_prime {
        let ui_low = low.to_u64().unwrap_or(3);
        let ui_high = if high > last_small_prime {
            last_small_prime
        } else {
            high.to_u64().unwrap_or(0)
        };
        for &p in SMALL_PRIMES.iter() {
            let p = p as u64;
            if p > ui_high {
                break;
            }
            if p < ui_low {
                continue;
            }
            let mut all = true;
            for &c in &offsets[1..] {
                if !is_prob_prime(&Integer::from(p + c as u64))?.is_probable() {
                    all = false;
                    break;
                }
            }
            if all {
                push_value(&mut ret, &Integer::from(p))?;
            }
        }
    }
    // Work from an even base from here on.
    if low.is_odd() {
        low -= 1u32;
    }
    if high <= last_small_prime {
        return Ok(ret);
    }

    // Build the residue list modulo a growing primorial.
    let mut ppr: u64 = 30; // 2·3·5
    let mut pi: usize = 2; // index of 5, the last prime in ppr
    let mut remr = low.mod_u(30) as u64;
    let mut residues: Vec<u64> = Vec::with_capacity(1024);
    let mut i = 1u64;
    while i <= ppr {
        let remi = remr + i;
        if offsets
            .iter()
            .all(|&c| gcd_u64(remi + c as u64, ppr) == 1)
        {
            residues.push(i);
        }
        i += 2;
    }

    let span = Integer::from(&high - &low);
    let max_ppr: u64 = if span.significant_bits() >= 64 {
        u64::MAX
    } else {
        1u64 << span.significant_bits()
    };
    loop {
        if pi >= GROWTH_CUTOFF_PI {
            pi += 1;
            break;
        }
        pi += 1;
        let p = SMALL_PRIMES[pi] as u64;
        let newppr = ppr * p;
        let nres = residues.len() as u64;
        if nres == 0 || nres > TARGET_RESIDUES / (p / 2) || newppr > max_ppr {
            break;
        }
        debug!(nres, ppr, "cluster sieve residues before growth");
        remr = mod_u64(&low, newppr);
        let mut res2: Vec<u64> = Vec::with_capacity(residues.len() * p as usize / 2);
        for mult in 0..p {
            for &r0 in &residues {
                let r = mult * ppr + r0;
                if offsets
                    .iter()
                    .all(|&c| (remr + r + c as u64) % p != 0)
                {
                    res2.push(r);
                }
            }
        }
        ppr = newppr;
        residues = res2;
    }
    let startpi = pi;
    debug!(nres = residues.len(), ppr, "cluster sieve residue list");

    if residues.is_empty() {
        return Ok(ret);
    }

    let run_pretests = low.significant_bits() > PRETEST_BITS;

    // Three paired-prime compatibility tables for the next six primes.
    let p: [u64; 6] = std::array::from_fn(|j| SMALL_PRIMES[startpi + j] as u64);
    let pp: [u64; 3] = [p[0] * p[1], p[2] * p[3], p[4] * p[5]];
    let mut crem: [Vec<u8>; 3] = [
        vec![1u8; pp[0] as usize],
        vec![1u8; pp[1] as usize],
        vec![1u8; pp[2] as usize],
    ];
    for t in 0..3 {
        let (p1, p2, m) = (p[2 * t], p[2 * t + 1], pp[t]);
        // Remainders divisible by p1 or p2 kill the base element.
        for i in 0..p2 {
            crem[t][(i * p1) as usize] = 0;
        }
        for i in 0..p1 {
            crem[t][(i * p2) as usize] = 0;
        }
        // Remainders where some later cluster element is divisible.
        for &c in &offsets[1..] {
            let (c1, c2) = (c as u64 % p1, c as u64 % p2);
            for i in 1..=p2 {
                crem[t][((i * p1 + m - c1) % m) as usize] = 0;
            }
            for i in 1..=p1 {
                crem[t][((i * p2 + m - c2) % m) as usize] = 0;
            }
        }
    }
    let resmod: [Vec<u32>; 3] = std::array::from_fn(|t| {
        residues.iter().map(|&r| (r % pp[t]) as u32).collect()
    });

    // Acceptable-remainder rows for every remaining small prime.
    let maxpi = SMALL_PRIMES.len();
    let mut vprem = vec![1u8; maxpi * 1024];
    for pi in startpi + 6..maxpi {
        let p = SMALL_PRIMES[pi] as u64;
        let row = &mut vprem[pi * 1024..(pi + 1) * 1024];
        row[0] = 0;
        let mut smallnc = 0;
        while smallnc < nc && (offsets[smallnc] as u64) < p {
            smallnc += 1;
        }
        for &c in &offsets[1..smallnc.max(1)] {
            row[(p - c as u64) as usize] = 0;
        }
        for &c in &offsets[smallnc.max(1)..] {
            row[(p - (c as u64 % p)) as usize % 1024] = 0;
        }
    }

    let mut rem: [u64; 3] = std::array::from_fn(|t| mod_u64(&low, pp[t]));
    let remadd: [u64; 3] = std::array::from_fn(|t| ppr % pp[t]);

    let mut cres: Vec<u64> = Vec::with_capacity(residues.len());
    let mut nprps: u64 = 0;

    // Walk the interval in primorial-sized chunks.
    let mut low = low;
    while low <= high {
        let ui_low = if low.significant_bits() > 64 {
            None
        } else {
            low.to_u64()
        };

        // Filter this chunk's residues through the three pair tables.
        cres.clear();
        for (r_idx, &r) in residues.iter().enumerate() {
            let m0 = add_mod(rem[0], resmod[0][r_idx] as u64, pp[0]);
            if crem[0][m0 as usize] != 0 {
                let m1 = add_mod(rem[1], resmod[1][r_idx] as u64, pp[1]);
                if crem[1][m1 as usize] != 0 {
                    let m2 = add_mod(rem[2], resmod[2][r_idx] as u64, pp[2]);
                    if crem[2][m2 as usize] != 0 {
                        cres.push(r);
                    }
                }
            }
        }
        for t in 0..3 {
            rem[t] = add_mod(rem[t], remadd[t], pp[t]);
        }

        // One prime at a time, drop residues with an unacceptable remainder.
        for pi in startpi + 6..maxpi {
            if cres.is_empty() {
                break;
            }
            let p = SMALL_PRIMES[pi] as u64;
            let lowmod = match ui_low {
                Some(u) => u % p,
                None => mod_u64(&low, p),
            };
            let row = &vprem[pi * 1024..(pi + 1) * 1024];
            cres.retain(|&r| row[((lowmod + r) % p) as usize] != 0);
        }
        debug!(survivors = cres.len(), "cluster chunk filtered");

        // BPSW every element of every surviving cluster.
        for &r in &cres {
            let t = Integer::from(&low + r);
            if t > high {
                break;
            }
            if run_pretests {
                let battery = cache::bgcd2();
                let mut hit = false;
                for &c in offsets.iter() {
                    let v = Integer::from(&low + (r + c as u64));
                    if Integer::from(v.gcd_ref(battery)) != 1u32 {
                        hit = true;
                        break;
                    }
                }
                if hit {
                    continue;
                }
            }
            let mut all = true;
            for &c in offsets.iter() {
                nprps += 1;
                if !bpsw(&Integer::from(&low + (r + c as u64)))?.is_probable() {
                    all = false;
                    break;
                }
            }
            if all {
                push_value(&mut ret, &t)?;
            }
        }
        low += ppr;
    }
    debug!(nprps, pretests = run_pretests, "cluster sieve BPSW tests");
    Ok(ret)
}

#[inline]
fn add_mod(a: u64, b: u64, m: u64) -> u64 {
    let r = a + b;
    if r >= m {
        r - m
    } else {
        r
    }
}
