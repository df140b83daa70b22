// Derivation of RSA key material from a pair of primes.

use crate::{MissionError, Result};

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::ToPrimitive;

pub const DEFAULT_EXPONENT_CHOICES: usize = 5;

/// Public modulus and totient derived from two primes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modulus {
    pub p: u64,
    pub q: u64,
    pub n: u64,
    pub phi: u64,
}

/// Complete key set for one mission attempt. Only constructed through
/// [`forge_key_material`], so the RSA relations between fields always hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    modulus: Modulus,
    e: u64,
    d: u64,
}

impl KeyMaterial {
    pub fn p(&self) -> u64 {
        self.modulus.p
    }

    pub fn q(&self) -> u64 {
        self.modulus.q
    }

    pub fn n(&self) -> u64 {
        self.modulus.n
    }

    pub fn phi(&self) -> u64 {
        self.modulus.phi
    }

    pub fn e(&self) -> u64 {
        self.e
    }

    pub fn d(&self) -> u64 {
        self.d
    }
}

/// `n = p * q` and `phi = (p - 1) * (q - 1)`. Both factors must be at least 2
/// and the product must fit in a `u64`.
pub fn derive_modulus(p: u64, q: u64) -> Result<Modulus> {
    let invalid = || MissionError::InvalidModulus { p, q };
    if p < 2 || q < 2 {
        return Err(invalid());
    }
    let n = p.checked_mul(q).ok_or_else(invalid)?;
    Ok(Modulus {
        p,
        q,
        n,
        phi: (p - 1) * (q - 1),
    })
}

/// The first `limit` integers from 3 upwards that are coprime with `phi`.
pub fn candidate_exponents(phi: u64, limit: usize) -> Vec<u64> {
    (3..phi).filter(|e| e.gcd(&phi) == 1).take(limit).collect()
}

/// Modular inverse of `e` modulo `phi`, in `[0, phi)`.
pub fn derive_private_exponent(e: u64, phi: u64) -> Result<u64> {
    let not_invertible = || MissionError::NotInvertible { e, phi };
    if phi < 2 || e.gcd(&phi) != 1 {
        return Err(not_invertible());
    }
    BigUint::from(e)
        .modinv(&BigUint::from(phi))
        .and_then(|d| d.to_u64())
        .ok_or_else(not_invertible)
}

pub fn forge_key_material(modulus: Modulus, e: u64) -> Result<KeyMaterial> {
    let d = derive_private_exponent(e, modulus.phi)?;
    Ok(KeyMaterial { modulus, e, d })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::prime::primes_in_range;

    use rstest::rstest;

    #[test]
    fn derive_modulus_computes_n_and_phi() {
        let modulus = derive_modulus(13, 17).unwrap();

        assert_eq!(modulus.n, 221);
        assert_eq!(modulus.phi, 192);
    }

    #[rstest]
    #[case(0, 17)]
    #[case(13, 1)]
    #[case(u64::MAX, 3)]
    fn derive_modulus_rejects_degenerate_factors(#[case] p: u64, #[case] q: u64) {
        let err = derive_modulus(p, q).unwrap_err();

        assert!(matches!(err, MissionError::InvalidModulus { .. }));
    }

    #[test]
    fn candidate_exponents_skips_common_factors() {
        assert_eq!(candidate_exponents(192, 5), vec![5, 7, 11, 13, 17]);
    }

    #[test]
    fn candidate_exponents_stops_at_phi() {
        // p = 2, q = 5 gives phi = 4: only 3 qualifies below phi.
        assert_eq!(candidate_exponents(4, 5), vec![3]);
        assert!(candidate_exponents(3, 5).is_empty());
    }

    #[test]
    fn candidate_exponents_are_coprime_for_all_easy_primes() {
        let primes = primes_in_range(10, 50);
        for &p in &primes {
            for &q in primes.iter().filter(|&&q| q != p) {
                let modulus = derive_modulus(p, q).unwrap();
                assert_eq!(modulus.n, p * q);
                assert_eq!(modulus.phi, (p - 1) * (q - 1));

                let candidates = candidate_exponents(modulus.phi, DEFAULT_EXPONENT_CHOICES);
                assert_eq!(candidates.len(), DEFAULT_EXPONENT_CHOICES);
                for e in candidates {
                    assert_eq!(e.gcd(&modulus.phi), 1);
                }
            }
        }
    }

    #[rstest]
    #[case(5, 192, 77)]
    #[case(7, 40, 23)]
    #[case(3, 20, 7)]
    fn derive_private_exponent_returns_inverse(#[case] e: u64, #[case] phi: u64, #[case] d: u64) {
        assert_eq!(derive_private_exponent(e, phi).unwrap(), d);
    }

    #[test]
    fn private_exponent_satisfies_inverse_relation() {
        for phi in [192, 1_056, 247_528] {
            for e in candidate_exponents(phi, 20) {
                let d = derive_private_exponent(e, phi).unwrap();
                assert!(d < phi);
                assert_eq!((e * d) % phi, 1);
            }
        }
    }

    #[rstest]
    #[case(4, 8)]
    #[case(6, 192)]
    #[case(5, 1)]
    fn derive_private_exponent_rejects_non_invertible(#[case] e: u64, #[case] phi: u64) {
        let err = derive_private_exponent(e, phi).unwrap_err();

        assert!(matches!(err, MissionError::NotInvertible { .. }));
    }

    #[test]
    fn forge_key_material_keeps_all_parameters() {
        let keys = forge_key_material(derive_modulus(13, 17).unwrap(), 5).unwrap();

        assert_eq!(
            (keys.p(), keys.q(), keys.n(), keys.phi(), keys.e(), keys.d()),
            (13, 17, 221, 192, 5, 77)
        );
    }
}
