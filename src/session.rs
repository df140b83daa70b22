// A single RSA mission, from agent identification to unlocking the vault.

use crate::{
    attempt_unlock, candidate_exponents, derive_modulus, encrypt, forge_key_material,
    generate_prime_pair, leaderboard::check_agent_name, parse_integer, validate_user_pair,
    Ciphertext, Countdown, Difficulty, KeyMaterial, MissionClock, MissionConfig, MissionError,
    Modulus, Result, ScoreLedger, ScoreRecord,
};

use rand::{rngs::StdRng, SeedableRng};

/// Mission stages, in the order they are passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    IdentityCaptured,
    DifficultyChosen,
    PrimesChosen,
    KeyGenerated,
    ExponentChosen,
    Encrypted,
    Unlocked,
    TimedOut,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Unlocked | Stage::TimedOut)
    }

    /// Whether the mission clock is running in this stage.
    pub fn is_timed(self) -> bool {
        (Stage::DifficultyChosen..=Stage::Encrypted).contains(&self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionReport {
    pub record: ScoreRecord,
    pub plaintext: String,
    pub wrong_attempts: u32,
}

/// Mutable state of one mission attempt.
///
/// All operations take `&mut self`, so the owner of the session is its only
/// writer. Each operation either advances the mission by one stage or fails
/// with a typed error and leaves the stage untouched. The exceptions are a
/// timeout, which discards the attempt, and a failed key derivation, which
/// sends the mission back to prime selection.
#[derive(Debug)]
pub struct MissionSession {
    config: MissionConfig,
    ledger: ScoreLedger,
    rng: StdRng,
    stage: Stage,
    agent_name: Option<String>,
    difficulty: Option<Difficulty>,
    primes: Option<(u64, u64)>,
    modulus: Option<Modulus>,
    exponents: Vec<u64>,
    keys: Option<KeyMaterial>,
    ciphertext: Option<Ciphertext>,
    clock: MissionClock,
    wrong_attempts: u32,
}

impl MissionSession {
    pub fn new(config: MissionConfig, rng: StdRng) -> Self {
        let ledger = ScoreLedger::new(config.leaderboard_path.clone());
        let clock = idle_clock(&config);
        Self {
            config,
            ledger,
            rng,
            stage: Stage::Idle,
            agent_name: None,
            difficulty: None,
            primes: None,
            modulus: None,
            exponents: Vec::new(),
            keys: None,
            ciphertext: None,
            clock,
            wrong_attempts: 0,
        }
    }

    pub fn from_config(config: MissionConfig) -> Self {
        Self::new(config, StdRng::from_entropy())
    }

    pub fn capture_identity(&mut self, name: &str) -> Result<()> {
        self.require(Stage::Idle)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(MissionError::EmptyAgentName);
        }
        check_agent_name(name)?;
        self.agent_name = Some(name.to_string());
        self.advance(Stage::IdentityCaptured);
        Ok(())
    }

    /// Pick the difficulty and start the mission clock.
    pub fn choose_difficulty(&mut self, difficulty: Difficulty) -> Result<()> {
        self.require(Stage::IdentityCaptured)?;
        self.difficulty = Some(difficulty);
        self.clock.stop();
        self.clock = MissionClock::new(self.config.time_limit);
        self.advance(Stage::DifficultyChosen);
        Ok(())
    }

    /// A random valid prime pair for the chosen difficulty. Does not commit it.
    pub fn suggest_primes(&mut self) -> Result<(u64, u64)> {
        let difficulty = self.difficulty_for(Stage::DifficultyChosen)?;
        generate_prime_pair(difficulty, &mut self.rng)
    }

    pub fn generate_primes(&mut self) -> Result<(u64, u64)> {
        let (p, q) = self.suggest_primes()?;
        self.commit_primes(p, q);
        Ok((p, q))
    }

    pub fn submit_primes(&mut self, p: i64, q: i64) -> Result<(u64, u64)> {
        let difficulty = self.difficulty_for(Stage::DifficultyChosen)?;
        let (p, q) = validate_user_pair(p, q, difficulty)?;
        self.commit_primes(p, q);
        Ok((p, q))
    }

    /// Like [`MissionSession::submit_primes`], for raw user input.
    pub fn submit_prime_text(&mut self, p: &str, q: &str) -> Result<(u64, u64)> {
        self.difficulty_for(Stage::DifficultyChosen)?;
        let p = parse_integer(p)?;
        let q = parse_integer(q)?;
        self.submit_primes(p, q)
    }

    /// Derive `n` and `phi` and offer the public exponents to choose from.
    ///
    /// If no exponent qualifies the primes are discarded and the mission goes
    /// back to prime selection.
    pub fn generate_keys(&mut self) -> Result<(Modulus, Vec<u64>)> {
        self.check_clock()?;
        self.require(Stage::PrimesChosen)?;
        let (p, q) = self
            .primes
            .ok_or_else(|| self.out_of_order(Stage::PrimesChosen))?;
        let modulus = derive_modulus(p, q)?;
        let exponents = candidate_exponents(modulus.phi, self.config.exponent_choices);
        if exponents.is_empty() {
            self.primes = None;
            self.advance(Stage::DifficultyChosen);
            return Err(MissionError::NoValidExponent(modulus.phi));
        }
        self.modulus = Some(modulus);
        self.exponents = exponents.clone();
        self.advance(Stage::KeyGenerated);
        Ok((modulus, exponents))
    }

    /// Choose one of the offered exponents and derive the private key `d`.
    pub fn choose_exponent(&mut self, e: u64) -> Result<u64> {
        self.check_clock()?;
        self.require(Stage::KeyGenerated)?;
        let modulus = self
            .modulus
            .ok_or_else(|| self.out_of_order(Stage::KeyGenerated))?;
        if !self.exponents.contains(&e) {
            return Err(MissionError::ExponentNotOffered {
                e,
                offered: self.exponents.clone(),
            });
        }
        let keys = forge_key_material(modulus, e)?;
        let d = keys.d();
        self.keys = Some(keys);
        self.advance(Stage::ExponentChosen);
        Ok(d)
    }

    pub fn encrypt_message(&mut self, message: &str) -> Result<Ciphertext> {
        self.check_clock()?;
        self.require(Stage::ExponentChosen)?;
        let keys = self
            .keys
            .as_ref()
            .ok_or_else(|| self.out_of_order(Stage::ExponentChosen))?;
        let ciphertext = encrypt(message, keys.e(), keys.n())?;
        self.ciphertext = Some(ciphertext.clone());
        self.advance(Stage::Encrypted);
        Ok(ciphertext)
    }

    /// Try to decrypt the ciphertext with `candidate_d`.
    ///
    /// A wrong key leaves the mission encrypted and may be retried any number
    /// of times. The right key stops the clock and records the score.
    pub fn unlock(&mut self, candidate_d: u64) -> Result<MissionReport> {
        self.check_clock()?;
        self.require(Stage::Encrypted)?;
        let (Some(keys), Some(ciphertext), Some(agent_name), Some(difficulty)) = (
            self.keys.as_ref(),
            self.ciphertext.as_ref(),
            self.agent_name.as_deref(),
            self.difficulty,
        ) else {
            return Err(self.out_of_order(Stage::Encrypted));
        };

        let plaintext = match attempt_unlock(ciphertext, candidate_d, keys) {
            Ok(plaintext) => plaintext,
            Err(MissionError::WrongKey) => {
                self.wrong_attempts += 1;
                log::debug!("wrong private key, attempt {}", self.wrong_attempts);
                return Err(MissionError::WrongKey);
            }
            Err(e) => return Err(e),
        };

        let record = ScoreRecord::new(agent_name, self.clock.elapsed(), difficulty);
        self.ledger.append(&record)?;
        self.clock.stop();
        log::info!(
            "agent {} unlocked the vault in {}s on {}",
            record.agent_name,
            record.elapsed_seconds,
            record.difficulty
        );
        self.advance(Stage::Unlocked);
        Ok(MissionReport {
            record,
            plaintext,
            wrong_attempts: self.wrong_attempts,
        })
    }

    /// Abandon the mission from any stage and return to [`Stage::Idle`].
    pub fn abort(&mut self) {
        self.clock.stop();
        self.clock = idle_clock(&self.config);
        self.agent_name = None;
        self.difficulty = None;
        self.discard_key_material();
        self.wrong_attempts = 0;
        self.advance(Stage::Idle);
    }

    /// Move the mission to [`Stage::TimedOut`] if its time limit has passed.
    pub fn check_clock(&mut self) -> Result<()> {
        if self.stage.is_timed() && self.clock.is_expired() {
            let elapsed = self.clock.elapsed();
            log::warn!("mission timed out after {elapsed}s at {:?}", self.stage);
            self.clock.stop();
            self.discard_key_material();
            self.advance(Stage::TimedOut);
            return Err(MissionError::TimedOut(elapsed));
        }
        Ok(())
    }

    pub fn leaderboard(&self, n: usize) -> Result<Vec<ScoreRecord>> {
        self.ledger.top_n(n)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn config(&self) -> &MissionConfig {
        &self.config
    }

    pub fn agent_name(&self) -> Option<&str> {
        self.agent_name.as_deref()
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    pub fn primes(&self) -> Option<(u64, u64)> {
        self.primes
    }

    pub fn modulus(&self) -> Option<Modulus> {
        self.modulus
    }

    pub fn exponents(&self) -> &[u64] {
        &self.exponents
    }

    pub fn key_material(&self) -> Option<&KeyMaterial> {
        self.keys.as_ref()
    }

    pub fn ciphertext(&self) -> Option<&[u64]> {
        self.ciphertext.as_deref()
    }

    /// Handle on the running clock.
    pub fn clock(&self) -> MissionClock {
        self.clock.clone()
    }

    /// Start ticking the current mission clock, timed or not.
    ///
    /// Must be called from within a tokio runtime after
    /// [`MissionSession::choose_difficulty`].
    pub fn start_countdown(&self) -> Countdown {
        Countdown::start(self.clock())
    }

    pub fn elapsed(&self) -> u64 {
        self.clock.elapsed()
    }

    pub fn wrong_attempts(&self) -> u32 {
        self.wrong_attempts
    }

    fn commit_primes(&mut self, p: u64, q: u64) {
        self.primes = Some((p, q));
        self.advance(Stage::PrimesChosen);
    }

    fn difficulty_for(&mut self, expected: Stage) -> Result<Difficulty> {
        self.check_clock()?;
        self.require(expected)?;
        self.difficulty.ok_or_else(|| self.out_of_order(expected))
    }

    fn discard_key_material(&mut self) {
        self.primes = None;
        self.modulus = None;
        self.exponents.clear();
        self.keys = None;
        self.ciphertext = None;
    }

    fn require(&self, expected: Stage) -> Result<()> {
        if self.stage != expected {
            return Err(self.out_of_order(expected));
        }
        Ok(())
    }

    fn out_of_order(&self, expected: Stage) -> MissionError {
        MissionError::OutOfOrder {
            expected,
            actual: self.stage,
        }
    }

    fn advance(&mut self, next: Stage) {
        log::debug!("mission stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }
}

fn idle_clock(config: &MissionConfig) -> MissionClock {
    let clock = MissionClock::new(config.time_limit);
    clock.stop();
    clock
}
