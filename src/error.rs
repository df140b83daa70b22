// Errors reported by mission operations.

use crate::{Difficulty, Stage};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MissionError>;

/// Broad grouping of [`MissionError`]s, used by front ends to decide whether a
/// mission can continue after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad user input. The session is left unchanged.
    Validation,
    /// A key derivation step could not complete. The stage must be redone.
    Derivation,
    /// Wrong private key. Retries are unlimited.
    Access,
    /// The mission ran out of time and has been discarded.
    Timeout,
    /// An operation was called in the wrong stage.
    Sequence,
    /// The leaderboard could not be read or written.
    Storage,
}

#[derive(Debug, Error)]
pub enum MissionError {
    #[error("agent name cannot be empty")]
    EmptyAgentName,

    #[error("agent name '{0}' may not contain commas or line breaks")]
    InvalidAgentName(String),

    #[error("'{0}' is not an integer")]
    NotANumber(String),

    #[error("{0} is negative")]
    NegativeValue(i64),

    #[error("p and q must be distinct, both are {0}")]
    IdenticalPrimes(u64),

    #[error("{value} is outside the {difficulty} range [{lo}, {hi}) of at most {max_digits} digits")]
    OutOfRange {
        value: u64,
        difficulty: Difficulty,
        lo: u64,
        hi: u64,
        max_digits: u32,
    },

    #[error("{0} is not prime")]
    NotPrime(u64),

    #[error("only {found} prime(s) in [{lo}, {hi}), at least 2 are needed")]
    InsufficientPrimes { lo: u64, hi: u64, found: usize },

    #[error("no public exponent is coprime with phi = {0}")]
    NoValidExponent(u64),

    #[error("p = {p} and q = {q} do not give a usable modulus")]
    InvalidModulus { p: u64, q: u64 },

    #[error("modulus n must be positive")]
    ZeroModulus,

    #[error("{e} has no inverse modulo {phi}")]
    NotInvertible { e: u64, phi: u64 },

    #[error("e = {e} was not one of the offered exponents {offered:?}")]
    ExponentNotOffered { e: u64, offered: Vec<u64> },

    #[error("message is empty")]
    EmptyMessage,

    #[error("character {character:?} (code point {code_point}) does not fit below n = {n}")]
    MessageTooWide {
        character: char,
        code_point: u64,
        n: u64,
    },

    #[error("{0} is not a valid character code point")]
    InvalidCodePoint(u64),

    #[error("incorrect private key")]
    WrongKey,

    #[error("mission timed out after {0}s")]
    TimedOut(u64),

    #[error("expected stage {expected:?}, but the mission is at {actual:?}")]
    OutOfOrder { expected: Stage, actual: Stage },

    #[error("leaderboard I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl MissionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyAgentName
            | Self::InvalidAgentName(_)
            | Self::NotANumber(_)
            | Self::NegativeValue(_)
            | Self::IdenticalPrimes(_)
            | Self::OutOfRange { .. }
            | Self::NotPrime(_)
            | Self::ExponentNotOffered { .. }
            | Self::EmptyMessage
            | Self::MessageTooWide { .. } => ErrorCategory::Validation,
            Self::InsufficientPrimes { .. }
            | Self::NoValidExponent(_)
            | Self::InvalidModulus { .. }
            | Self::ZeroModulus
            | Self::NotInvertible { .. }
            | Self::InvalidCodePoint(_) => ErrorCategory::Derivation,
            Self::WrongKey => ErrorCategory::Access,
            Self::TimedOut(_) => ErrorCategory::Timeout,
            Self::OutOfOrder { .. } => ErrorCategory::Sequence,
            Self::Io(_) => ErrorCategory::Storage,
        }
    }
}
