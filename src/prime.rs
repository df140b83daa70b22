// Functions related to identification, generation and validation of the small
// primes a mission is built from.

use crate::{difficulty::decimal_digits, Difficulty, MissionError, Result};

use num_integer::Roots;
use rand::{seq::SliceRandom, Rng};

/// Trial division up to `floor(sqrt(n))`.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    (2..=n.sqrt()).all(|divisor| n % divisor != 0)
}

/// All primes in the half-open range `[lo, hi)`, in increasing order.
pub fn primes_in_range(lo: u64, hi: u64) -> Vec<u64> {
    (lo..hi).filter(|&n| is_prime(n)).collect()
}

/// Draw two distinct primes uniformly from the difficulty's range.
pub fn generate_prime_pair(difficulty: Difficulty, rng: &mut impl Rng) -> Result<(u64, u64)> {
    let (lo, hi) = difficulty.range();
    let primes = primes_in_range(lo, hi);
    if primes.len() < 2 {
        return Err(MissionError::InsufficientPrimes {
            lo,
            hi,
            found: primes.len(),
        });
    }

    let mut picked = primes.choose_multiple(rng, 2).copied();
    match (picked.next(), picked.next()) {
        (Some(p), Some(q)) => Ok((p, q)),
        _ => Err(MissionError::InsufficientPrimes {
            lo,
            hi,
            found: primes.len(),
        }),
    }
}

/// Check a user supplied pair against the difficulty's policy.
///
/// The cheap, most specific checks run first so the user sees the most useful
/// error: sign, then distinctness, then range and digit count, and finally
/// primality.
pub fn validate_user_pair(p: i64, q: i64, difficulty: Difficulty) -> Result<(u64, u64)> {
    let p = non_negative(p)?;
    let q = non_negative(q)?;
    if p == q {
        return Err(MissionError::IdenticalPrimes(p));
    }
    check_in_range(p, difficulty)?;
    check_in_range(q, difficulty)?;
    for value in [p, q] {
        if !is_prime(value) {
            return Err(MissionError::NotPrime(value));
        }
    }
    Ok((p, q))
}

/// Parse a line of user input as an integer, allowing surrounding whitespace.
pub fn parse_integer(input: &str) -> Result<i64> {
    let trimmed = input.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| MissionError::NotANumber(trimmed.to_string()))
}

fn non_negative(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| MissionError::NegativeValue(value))
}

fn check_in_range(value: u64, difficulty: Difficulty) -> Result<()> {
    let (lo, hi) = difficulty.range();
    let max_digits = difficulty.max_digits();
    if decimal_digits(value) > max_digits || !(lo..hi).contains(&value) {
        return Err(MissionError::OutOfRange {
            value,
            difficulty,
            lo,
            hi,
            max_digits,
        });
    }
    Ok(())
}
