//! External primality-proving backends.
//!
//! Producing an actual certificate (Brillhart–Lehmer–Selfridge N−1/N+1, or
//! elliptic-curve ECPP) is outside this engine; callers supply a backend
//! and [`is_provable_prime`](crate::primality::is_provable_prime) drives
//! it once the probable-prime cascade has done everything cheap.

use rug::Integer;

use crate::error::Result;
use crate::Primality;

/// A deterministic prover the decider can delegate to.
///
/// Both methods return the usual tri-state — `ProbablyPrime` means the
/// prover gave up without a verdict — plus a textual certificate when one
/// was produced.
pub trait ProofBackend {
    /// Brillhart–Lehmer–Selfridge style N−1 (and N+1) proof attempt.
    /// `effort` scales how hard the backend should try to factor; the
    /// decider passes a higher value for Proth-form inputs where N−1 is
    /// mostly a power of two.
    fn prove_n_minus_1(&self, n: &Integer, effort: u32) -> Result<(Primality, Option<String>)>;

    /// Elliptic-curve primality proof attempt.
    fn prove_ecpp(&self, n: &Integer) -> Result<(Primality, Option<String>)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A backend that proves nothing, as a contract smoke test.
    struct NullBackend;

    impl ProofBackend for NullBackend {
        fn prove_n_minus_1(&self, _: &Integer, _: u32) -> Result<(Primality, Option<String>)> {
            Ok((Primality::ProbablyPrime, None))
        }
        fn prove_ecpp(&self, _: &Integer) -> Result<(Primality, Option<String>)> {
            Ok((Primality::ProbablyPrime, None))
        }
    }

    #[test]
    fn give_up_backend_leaves_probable_verdicts() {
        let p = (Integer::from(1u32) << 107u32) - 1u32; // M107, prime, >2^82
        let (r, cert) =
            crate::primality::is_provable_prime(&p, Some(&NullBackend)).unwrap();
        assert_eq!(r, Primality::ProbablyPrime);
        assert!(cert.is_none());
    }

    #[test]
    fn composite_never_reaches_backend() {
        struct PanicBackend;
        impl ProofBackend for PanicBackend {
            fn prove_n_minus_1(
                &self,
                _: &Integer,
                _: u32,
            ) -> Result<(Primality, Option<String>)> {
                panic!("backend must not see composites");
            }
            fn prove_ecpp(&self, _: &Integer) -> Result<(Primality, Option<String>)> {
                panic!("backend must not see composites");
            }
        }
        let c = (Integer::from(1u32) << 101u32) + 1u32; // 3 | 2^101+1
        let (r, _) = crate::primality::is_provable_prime(&c, Some(&PanicBackend)).unwrap();
        assert_eq!(r, Primality::Composite);
    }
}
