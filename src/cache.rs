//! # Cache — Process-Wide Primorial GCDs and Random State
//!
//! Holds the only shared state in the engine:
//!
//! - Three cached primorials used by the pretest cascade as GCD batteries:
//!   `BGCD` (product of the 168 primes ≤ 997), `BGCD2` (the next 1061 primes,
//!   up to 9973) and `BGCD3` (the 4035 primes after 997 up to 39 989). The
//!   second and third are disjoint from the first by construction: they are
//!   built from the prime iterator starting *after* 997.
//! - The PRNG cursor consulted by random-base Miller–Rabin and the
//!   Frobenius–Crandall–Pomerance test. Seeded from the wall clock; this is
//!   explicitly not cryptographic-grade randomness.
//! - The two Sorenson–Webster range bounds, parsed once and shared by
//!   every deterministic Miller–Rabin check.
//!
//! Everything is materialized lazily on first demand and reused for the life
//! of the process. [`init`] forces the eager path for callers that want the
//! one-time cost up front. Teardown is left to process exit; nothing
//! observable depends on destruction order.

use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use rug::rand::RandState;
use rug::Integer;

use crate::primes::PrimeIterator;
use crate::primorial::product_tree;

/// Count of primes in `BGCD` (π(997)).
pub const BGCD_PRIMES: usize = 168;
/// Count of primes covered by `BGCD` + `BGCD2` (π(9973)).
pub const BGCD2_PRIMES: usize = 1229;
/// Count of primes covered by `BGCD` + `BGCD3` (π(39 989)).
pub const BGCD3_PRIMES: usize = 4203;
/// Largest prime in `BGCD`.
pub const BGCD_LAST_PRIME: u32 = 997;
/// First prime not covered by `BGCD`.
pub const BGCD_NEXT_PRIME: u32 = 1009;
/// First prime not covered by `BGCD3`; deep trial division starts here.
pub const BGCD3_NEXT_PRIME: u64 = 40_009;

static BGCD: OnceLock<Integer> = OnceLock::new();
static BGCD2: OnceLock<Integer> = OnceLock::new();
static BGCD3: OnceLock<Integer> = OnceLock::new();
static RANDSTATE: OnceLock<Mutex<RandState<'static>>> = OnceLock::new();
static SW_BOUND_12: OnceLock<Integer> = OnceLock::new();
static SW_BOUND_13: OnceLock<Integer> = OnceLock::new();

/// Warm the engine: seed the PRNG and build the first primorial battery.
///
/// Optional — every consumer self-initializes on first use.
pub fn init() {
    with_randstate(|_| ());
    let _ = bgcd();
}

/// Product of the primes with index in `[skip, upto)` of the prime sequence,
/// leaves packed eight machine words at a time.
fn primorial_slice(skip: usize, upto: usize) -> Integer {
    let mut iter = PrimeIterator::new();
    for _ in 0..skip {
        iter.next_prime();
    }
    let mut leaves: Vec<Integer> = Vec::with_capacity((upto - skip) / 8 + 1);
    for i in 0..(upto - skip) {
        let p = iter.next_prime();
        if i % 8 == 0 {
            leaves.push(Integer::from(p));
        } else if let Some(last) = leaves.last_mut() {
            *last *= p;
        }
    }
    product_tree(leaves)
}

/// Primes ≤ 997 as one big product.
pub(crate) fn bgcd() -> &'static Integer {
    BGCD.get_or_init(|| primorial_slice(0, BGCD_PRIMES))
}

/// Primes in (997, 9973] as one big product. Built on first demand.
pub(crate) fn bgcd2() -> &'static Integer {
    BGCD2.get_or_init(|| primorial_slice(BGCD_PRIMES, BGCD2_PRIMES))
}

/// Primes in (997, 39 989] as one big product. Built on first demand.
pub(crate) fn bgcd3() -> &'static Integer {
    BGCD3.get_or_init(|| primorial_slice(BGCD_PRIMES, BGCD3_PRIMES))
}

/// Values below this are proven prime by strong tests to the 12 prime
/// bases 2..37 (Sorenson–Webster 2017).
pub(crate) fn sw_bound_12() -> &'static Integer {
    SW_BOUND_12.get_or_init(|| "318665857834031151167461".parse().expect("literal"))
}

/// As [`sw_bound_12`], for the 13 prime bases 2..41.
pub(crate) fn sw_bound_13() -> &'static Integer {
    SW_BOUND_13.get_or_init(|| "3317044064679887385961981".parse().expect("literal"))
}

/// Run `f` with exclusive access to the shared random state.
pub(crate) fn with_randstate<T>(f: impl FnOnce(&mut RandState) -> T) -> T {
    let state = RANDSTATE.get_or_init(|| {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        let mut rs = RandState::new();
        rs.seed(&Integer::from(seed));
        Mutex::new(rs)
    });
    let mut guard = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut guard)
}

/// Reseed the shared random state (deterministic replay of random-base runs).
pub fn seed_randstate(seed: &Integer) {
    with_randstate(|rs| rs.seed(seed));
}
