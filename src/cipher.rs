// Textbook RSA applied one character at a time.

use crate::{KeyMaterial, MissionError, Result};

use num_bigint::BigUint;

pub type Ciphertext = Vec<u64>;

/// Encrypt each character of `message` as `c^e mod n`.
///
/// Every code point must be below `n`, otherwise the character could not be
/// recovered by decryption.
pub fn encrypt(message: &str, e: u64, n: u64) -> Result<Ciphertext> {
    if message.is_empty() {
        return Err(MissionError::EmptyMessage);
    }
    message
        .chars()
        .map(|character| {
            let code_point = u64::from(character);
            if code_point >= n {
                return Err(MissionError::MessageTooWide {
                    character,
                    code_point,
                    n,
                });
            }
            Ok(mod_pow(code_point, e, n))
        })
        .collect()
}

pub fn decrypt(ciphertext: &[u64], d: u64, n: u64) -> Result<String> {
    if n == 0 {
        return Err(MissionError::ZeroModulus);
    }
    ciphertext
        .iter()
        .map(|&value| {
            let code_point = mod_pow(value, d, n);
            u32::try_from(code_point)
                .ok()
                .and_then(char::from_u32)
                .ok_or(MissionError::InvalidCodePoint(code_point))
        })
        .collect()
}

/// Decrypt only if `candidate_d` is the mission's private exponent.
///
/// This is an access check, not a cryptographic one: any integer equal to `d`
/// unlocks the message.
pub fn attempt_unlock(ciphertext: &[u64], candidate_d: u64, keys: &KeyMaterial) -> Result<String> {
    if candidate_d != keys.d() {
        return Err(MissionError::WrongKey);
    }
    decrypt(ciphertext, keys.d(), keys.n())
}

/// `modulus` must be positive.
fn mod_pow(base: u64, exponent: u64, modulus: u64) -> u64 {
    // The result is below `modulus`, so it has at most one 64-bit digit.
    BigUint::from(base)
        .modpow(&BigUint::from(exponent), &BigUint::from(modulus))
        .iter_u64_digits()
        .next()
        .unwrap_or(0)
}
