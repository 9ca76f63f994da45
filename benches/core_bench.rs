//! Criterion benchmarks for the hot paths: BPSW at several sizes, wheel
//! and sieve-driven next_prime, the partial sieve, and the product-tree
//! generators.

use criterion::{criterion_group, criterion_main, Criterion};
use rug::ops::Pow;
use rug::Integer;

use primekit::combinat::binomial;
use primekit::primality::bpsw;
use primekit::primorial::pn_primorial;
use primekit::sieve::partial_sieve;
use primekit::{next_prime, pidigits};

fn bench_bpsw(c: &mut Criterion) {
    let m89 = Integer::from(2u32).pow(89) - 1u32;
    let m607 = Integer::from(2u32).pow(607) - 1u32;
    c.bench_function("bpsw_m89", |b| b.iter(|| bpsw(&m89).unwrap()));
    c.bench_function("bpsw_m607", |b| b.iter(|| bpsw(&m607).unwrap()));
}

fn bench_next_prime(c: &mut Criterion) {
    let wheel_base = Integer::from(10u32).pow(30);
    let sieve_base = Integer::from(10u32).pow(60);
    c.bench_function("next_prime_10e30_wheel", |b| {
        b.iter(|| next_prime(&wheel_base).unwrap())
    });
    c.bench_function("next_prime_10e60_sieve", |b| {
        b.iter(|| next_prime(&sieve_base).unwrap())
    });
}

fn bench_partial_sieve(c: &mut Criterion) {
    let start = Integer::from(10u32).pow(60) + 1u32;
    c.bench_function("partial_sieve_8k_deep", |b| {
        b.iter(|| partial_sieve(&start, 8192, 100_000))
    });
}

fn bench_generators(c: &mut Criterion) {
    c.bench_function("pn_primorial_2000", |b| b.iter(|| pn_primorial(2000)));
    c.bench_function("binomial_4000_2000", |b| b.iter(|| binomial(4000, 2000)));
    c.bench_function("pidigits_500", |b| b.iter(|| pidigits(500)));
}

criterion_group!(
    benches,
    bench_bpsw,
    bench_next_prime,
    bench_partial_sieve,
    bench_generators
);
criterion_main!(benches);
