//! Mission engine for an interactive RSA trainer.
//!
//! Small primes, no padding: this is for learning how RSA fits together, not
//! for protecting anything.

mod cipher;
mod clock;
mod config;
mod difficulty;
mod error;
mod keys;
mod leaderboard;
mod prime;
mod session;

pub use cipher::{attempt_unlock, decrypt, encrypt, Ciphertext};
pub use clock::{Countdown, MissionClock, TICK};
pub use config::{MissionConfig, DEFAULT_LEADERBOARD_PATH, TIMED_MISSION_SECONDS};
pub use difficulty::Difficulty;
pub use error::{ErrorCategory, MissionError, Result};
pub use keys::{
    candidate_exponents, derive_modulus, derive_private_exponent, forge_key_material,
    KeyMaterial, Modulus, DEFAULT_EXPONENT_CHOICES,
};
pub use leaderboard::{ScoreLedger, ScoreRecord, DEFAULT_LEADERBOARD_SIZE};
pub use prime::{generate_prime_pair, is_prime, parse_integer, primes_in_range, validate_user_pair};
pub use session::{MissionReport, MissionSession, Stage};
