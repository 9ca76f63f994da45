//! # Sieve — Partial Segmented Sieve Over Arbitrary Offsets
//!
//! The kernel driver for `next_prime`, `prev_prime`, and the ranged
//! enumerators: mark every odd value in a window `[base, base + len)` that is
//! divisible by some prime ≤ `maxprime`, where `base` can be an arbitrary
//! big-integer offset. Survivors go on to BPSW.
//!
//! ## Algorithm
//!
//! 1. **Tile phase.** Small primes are struck into a tiny leading window,
//!    which is then replicated across the whole array by memcpy-doubling.
//!    A window of w 32-bit words covers 64·w integers; striking prime p into
//!    it and then tiling w → w·p keeps every prime's bit pattern aligned, so
//!    the work for 3, 5, 7, … is amortized over the entire segment.
//! 2. **Direct phase.** Primes above the tile limit are struck by computing
//!    `pos = p − (base mod p)`, parity-correcting to odd, and stepping by 2p.
//!    Two primes are processed per big-integer remainder: one
//!    `base mod (p1·p2)` yields both residues while the product fits a word.
//! 3. Larger primes (beyond 2^32) fall back to one remainder each; a u64
//!    covers every depth the callers request.
//!
//! Bit i of the result (odd i) says `base + i` is known composite. Even
//! positions carry no information — callers only probe odd offsets.

use rug::Integer;

use crate::primes::PrimeIterator;

/// Odds-only composite map over `[base, base + len)`.
///
/// Backing storage is 32-bit words, 64 integers (32 odd candidates) per
/// word: bit `(i >> 1) & 31` of word `i >> 6` covers offset `i`.
pub struct CompositeMap {
    words: Vec<u32>,
    len: u64,
}

impl CompositeMap {
    fn new(len: u64) -> Self {
        let wlen = (len + 63) / 64;
        CompositeMap {
            words: vec![0u32; wlen as usize],
            len,
        }
    }

    /// Window length in integers (always even).
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if offset `i` is marked composite. Meaningful for odd `i` only.
    #[inline]
    pub fn is_composite(&self, i: u64) -> bool {
        self.words[(i >> 6) as usize] & (1u32 << ((i >> 1) & 31)) != 0
    }

    #[inline]
    fn mark(&mut self, i: u64) {
        self.words[(i >> 6) as usize] |= 1u32 << ((i >> 1) & 31);
    }

    /// Strike odd multiples starting at `pos` (parity-corrected), stepping 2p.
    fn strike(&mut self, mut pos: u64, p: u64, limit: u64) {
        if pos & 1 == 0 {
            pos += p;
        }
        while pos < limit {
            self.mark(pos);
            pos += 2 * p;
        }
    }

    /// Replicate the first `from` words across `[from, to)` by doubling.
    fn tile(&mut self, mut from: usize, to: usize) {
        while from < to {
            let count = if 2 * from > to { to - from } else { from };
            self.words.copy_within(0..count, from);
            from += count;
        }
    }
}

/// `n mod m` for nonnegative big `n` and machine-word `m`.
pub(crate) fn mod_u64(n: &Integer, m: u64) -> u64 {
    if m <= u32::MAX as u64 {
        n.mod_u(m as u32) as u64
    } else {
        Integer::from(n % &Integer::from(m)).to_u64().unwrap_or(0)
    }
}

/// Partial sieve of the window starting at odd `start`.
///
/// Returns the composite map of `[start − 1, start − 1 + len)` where
/// `len` is `length` rounded up to even: bit i (odd) set ⇔ `start − 1 + i`
/// has a prime factor ≤ `maxprime`. The even alignment base means callers
/// recover values as `start − 1 + i`.
pub fn partial_sieve(start: &Integer, length: u64, maxprime: u64) -> CompositeMap {
    debug_assert!(start.is_odd(), "partial sieve given even start");
    debug_assert!(length > 0, "partial sieve given zero length");

    let base = Integer::from(start - 1u32);
    let length = if length & 1 == 1 { length + 1 } else { length };
    let mut comp = CompositeMap::new(length);
    let wlen = comp.words.len();

    let mut iter = PrimeIterator::new();
    iter.next_prime(); // 2: even positions are never consulted
    let mut p = iter.next_prime();

    // Tile phase: strike 3, 5, 7, … into the leading window and replicate it
    // while the tiled span still fits.
    let mut pwlen = wlen.min(3);
    while p <= maxprime {
        comp.strike(p - mod_u64(&base, p), p, (pwlen as u64) * 64);
        let next = iter.next_prime();
        if pwlen * (next as usize) >= wlen {
            p = next;
            break;
        }
        comp.tile(pwlen, pwlen * next as usize);
        pwlen *= next as usize;
        p = next;
    }
    comp.tile(pwlen, wlen);

    // Direct phase: two primes per big-integer remainder while their product
    // fits in a word.
    let doublelim = (u32::MAX as u64).min(maxprime);
    let mut p1 = p;
    let mut p2 = iter.next_prime();
    while p2 <= doublelim {
        let pp = p1 * p2;
        let ddiv = mod_u64(&base, pp);
        comp.strike(p1 - ddiv % p1, p1, length);
        comp.strike(p2 - ddiv % p2, p2, length);
        p1 = iter.next_prime();
        p2 = iter.next_prime();
    }
    if p1 <= maxprime {
        comp.strike(p1 - mod_u64(&base, p1), p1, length);
    }
    let mut p = p2;
    while p <= maxprime {
        comp.strike(p - mod_u64(&base, p), p, length);
        p = iter.next_prime();
    }

    comp
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Brute-force reference: does v have a prime factor ≤ bound?
    fn has_factor_leq(v: &Integer, bound: u64) -> bool {
        crate::primes::primes_up_to(bound)
            .into_iter()
            .any(|p| v.is_divisible_u(p as u32))
    }

    #[test]
    fn composite_map_word_boundaries() {
        let mut map = CompositeMap::new(256);
        for &i in &[1u64, 63, 65, 127, 129, 255] {
            map.mark(i);
        }
        for &i in &[1u64, 63, 65, 127, 129, 255] {
            assert!(map.is_composite(i), "bit {} should be set", i);
        }
        for &i in &[3u64, 61, 67, 131, 253] {
            assert!(!map.is_composite(i), "bit {} should be clear", i);
        }
    }

    #[test]
    fn small_window_matches_brute_force() {
        let start = Integer::from(10_001u32); // odd
        let len = 2000u64;
        let maxp = 100u64;
        let comp = partial_sieve(&start, len, maxp);
        let base = Integer::from(&start - 1u32);
        for i in (1..len).step_by(2) {
            let v = Integer::from(&base + i);
            let expect = has_factor_leq(&v, maxp);
            assert_eq!(
                comp.is_composite(i),
                expect,
                "offset {} (value {})",
                i,
                v
            );
        }
    }

    #[test]
    fn large_base_window_matches_brute_force() {
        // A base past 2^70 exercises the big-integer remainder path.
        let start = Integer::from(Integer::from(1u32) << 70u32) + 1u32; // odd
        let len = 512u64;
        let maxp = 500u64;
        let comp = partial_sieve(&start, len, maxp);
        let base = Integer::from(&start - 1u32);
        for i in (1..len).step_by(2) {
            let v = Integer::from(&base + i);
            assert_eq!(
                comp.is_composite(i),
                has_factor_leq(&v, maxp),
                "offset {}",
                i
            );
        }
    }

    #[test]
    fn deep_depth_covers_pair_phase_boundary() {
        // maxprime far above the tile limit so the paired-prime loop runs for
        // many iterations.
        let start = Integer::from(1_000_003u64);
        let len = 4096u64;
        let maxp = 20_000u64;
        let comp = partial_sieve(&start, len, maxp);
        let base = Integer::from(&start - 1u32);
        let mut survivors = 0;
        for i in (1..len).step_by(2) {
            let v = Integer::from(&base + i);
            assert_eq!(comp.is_composite(i), has_factor_leq(&v, maxp), "offset {}", i);
            if !comp.is_composite(i) {
                survivors += 1;
            }
        }
        assert!(survivors > 0, "window should retain candidates");
    }

    #[test]
    fn odd_length_rounds_up() {
        let start = Integer::from(101u32);
        let comp = partial_sieve(&start, 99, 7);
        assert_eq!(comp.len(), 100);
        assert!(!comp.is_empty());
    }
}
