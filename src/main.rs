use rsa_mission::{
    parse_integer, Countdown, Difficulty, ErrorCategory, MissionConfig, MissionError,
    MissionReport, MissionSession, ScoreRecord, Stage, DEFAULT_EXPONENT_CHOICES,
    DEFAULT_LEADERBOARD_PATH, DEFAULT_LEADERBOARD_SIZE,
};

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use std::{error::Error, io::Write, path::PathBuf};

#[derive(Parser)]
#[command(author, version, about = "Walk through RSA key generation, encryption and decryption against the clock")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Leaderboard log file.
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_LEADERBOARD_PATH)]
    leaderboard: PathBuf,

    /// Mission time limit in seconds, 0 for untimed.
    #[arg(long, global = true, value_name = "SECONDS", default_value_t = 0)]
    time_limit: u64,

    /// Number of public exponents to offer.
    #[arg(long, global = true, default_value_t = DEFAULT_EXPONENT_CHOICES)]
    exponents: usize,

    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run interactive missions (the default).
    Play,
    /// Print the fastest agents.
    Leaderboard {
        #[arg(long, default_value_t = DEFAULT_LEADERBOARD_SIZE)]
        top: usize,
    },
}

impl Cli {
    fn config(&self) -> MissionConfig {
        MissionConfig {
            leaderboard_path: self.leaderboard.clone(),
            exponent_choices: self.exponents,
            ..MissionConfig::default()
        }
        .with_time_limit(self.time_limit)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = cli.config();
    match cli.command.unwrap_or(Command::Play) {
        Command::Play => play(config).await,
        Command::Leaderboard { top } => {
            let session = MissionSession::from_config(config);
            print_leaderboard(&session.leaderboard(top)?);
            Ok(())
        }
    }
}

enum Input {
    Line(String),
    Abort,
    Expired,
    Closed,
}

enum Outcome {
    Completed(MissionReport),
    Aborted,
    TimedOut,
    Quit,
}

struct Terminal {
    lines: Lines<BufReader<Stdin>>,
    countdown: Option<Countdown>,
}

impl Terminal {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            countdown: None,
        }
    }

    async fn ask(&mut self, label: &str) -> std::io::Result<Input> {
        print!("{label}> ");
        std::io::stdout().flush()?;
        let line = match self.countdown.as_mut() {
            Some(countdown) => tokio::select! {
                line = self.lines.next_line() => line?,
                () = countdown.expired() => return Ok(Input::Expired),
            },
            None => self.lines.next_line().await?,
        };
        Ok(match line {
            None => Input::Closed,
            Some(line) if line.trim().eq_ignore_ascii_case("abort") => Input::Abort,
            Some(line) => Input::Line(line),
        })
    }

    /// Ask for a line, turning abort, timeout and end of input into the
    /// mission outcome they imply.
    async fn read(
        &mut self,
        session: &mut MissionSession,
        label: &str,
    ) -> std::io::Result<Result<String, Outcome>> {
        loop {
            let outcome = match self.ask(label).await? {
                Input::Line(line) => return Ok(Ok(line)),
                Input::Abort => {
                    session.abort();
                    Outcome::Aborted
                }
                Input::Expired => match session.check_clock() {
                    Err(MissionError::TimedOut(_)) => Outcome::TimedOut,
                    Err(err) => match report(err) {
                        Some(outcome) => outcome,
                        None => continue,
                    },
                    Ok(()) => {
                        log::error!(
                            "countdown expired but the mission clock reads {}s of {:?}",
                            session.elapsed(),
                            session.config().time_limit
                        );
                        self.countdown = None;
                        continue;
                    }
                },
                Input::Closed => Outcome::Quit,
            };
            return Ok(Err(outcome));
        }
    }
}

/// Print a failed call. Returns the outcome if the mission cannot continue.
fn report(err: MissionError) -> Option<Outcome> {
    println!("[{:?}] {err}", err.category());
    match err.category() {
        ErrorCategory::Timeout => Some(Outcome::TimedOut),
        _ => None,
    }
}

macro_rules! read_or_return {
    ($term:expr, $session:expr, $label:expr) => {
        match $term.read($session, $label).await? {
            Ok(line) => line,
            Err(outcome) => return Ok(outcome),
        }
    };
}

macro_rules! try_or_return {
    ($call:expr) => {
        match $call {
            Ok(value) => Some(value),
            Err(err) => match report(err) {
                Some(outcome) => return Ok(outcome),
                None => None,
            },
        }
    };
}

async fn play(config: MissionConfig) -> Result<(), Box<dyn Error>> {
    let mut session = MissionSession::from_config(config);
    let mut term = Terminal::new();
    println!("R S A   V A U L T    (type 'abort' at any prompt to abandon a mission)");

    loop {
        let outcome = run_mission(&mut session, &mut term).await?;
        term.countdown = None;
        match outcome {
            Outcome::Completed(report) => {
                println!("A C C E S S   G R A N T E D");
                println!("MESSAGE: {}", report.plaintext);
                println!(
                    "Agent {} finished in {}s with {} wrong key(s).",
                    report.record.agent_name, report.record.elapsed_seconds, report.wrong_attempts
                );
            }
            Outcome::Aborted => println!("Mission aborted."),
            Outcome::TimedOut => println!("Mission timed out. Key material destroyed."),
            Outcome::Quit => return Ok(()),
        }
        print_leaderboard(&session.leaderboard(session.config().leaderboard_size)?);
        session.abort();

        match term.ask("Another mission? [y/N]").await? {
            Input::Line(line) if line.trim().eq_ignore_ascii_case("y") => continue,
            _ => return Ok(()),
        }
    }
}

async fn run_mission(
    session: &mut MissionSession,
    term: &mut Terminal,
) -> std::io::Result<Outcome> {
    while session.stage() == Stage::Idle {
        let name = read_or_return!(term, session, "ENTER AGENT ID");
        try_or_return!(session.capture_identity(&name));
    }

    while session.stage() == Stage::IdentityCaptured {
        let level = read_or_return!(term, session, "DIFFICULTY [easy/medium/hard]");
        match level.parse::<Difficulty>() {
            Ok(difficulty) => {
                try_or_return!(session.choose_difficulty(difficulty));
            }
            Err(e) => println!("{e}"),
        }
    }
    term.countdown = Some(session.start_countdown());
    if let Some(difficulty) = session.difficulty() {
        let (lo, hi) = difficulty.range();
        println!("Choose two distinct primes in [{lo}, {hi}), or type 'auto'.");
    }

    while session.stage() < Stage::KeyGenerated {
        let p = read_or_return!(term, session, "PRIME P");
        if p.trim().eq_ignore_ascii_case("auto") {
            if let Some((p, q)) = try_or_return!(session.generate_primes()) {
                println!("p = {p}, q = {q}");
            }
        } else {
            let q = read_or_return!(term, session, "PRIME Q");
            try_or_return!(session.submit_prime_text(&p, &q));
        }
        if session.stage() == Stage::PrimesChosen {
            if let Some((modulus, exponents)) = try_or_return!(session.generate_keys()) {
                println!("n = {}, phi = {}", modulus.n, modulus.phi);
                println!("Public exponents: {exponents:?}");
            }
        }
    }

    while session.stage() == Stage::KeyGenerated {
        let e = read_or_return!(term, session, "CHOOSE e");
        let Some(e) = try_or_return!(parse_integer(&e).and_then(non_negative)) else {
            continue;
        };
        if let Some(d) = try_or_return!(session.choose_exponent(e)) {
            println!("PRIVATE KEY (d) = {d}. Memorize this value.");
        }
    }

    while session.stage() == Stage::ExponentChosen {
        let message = read_or_return!(term, session, "SECRET MESSAGE");
        if let Some(ciphertext) = try_or_return!(session.encrypt_message(&message)) {
            println!("CIPHER: {ciphertext:?}");
        }
    }

    loop {
        let d = read_or_return!(term, session, "ENTER PRIVATE KEY (d)");
        let Some(d) = try_or_return!(parse_integer(&d).and_then(non_negative)) else {
            continue;
        };
        if let Some(report) = try_or_return!(session.unlock(d)) {
            return Ok(Outcome::Completed(report));
        }
    }
}

fn non_negative(value: i64) -> rsa_mission::Result<u64> {
    u64::try_from(value).map_err(|_| MissionError::NegativeValue(value))
}

fn print_leaderboard(records: &[ScoreRecord]) {
    println!("TOP AGENTS");
    if records.is_empty() {
        println!("NO MISSION DATA FOUND");
    }
    for (i, record) in records.iter().enumerate() {
        println!(
            "{}. {:<15} {}s | Level: {}",
            i + 1,
            record.agent_name,
            record.elapsed_seconds,
            record.difficulty
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_defaults_to_untimed_mission() {
        let cli = Cli::parse_from(["rsa-mission"]);

        assert!(cli.command.is_none());
        assert_eq!(cli.config(), MissionConfig::default());
    }

    #[test]
    fn cli_builds_timed_config() {
        let cli = Cli::parse_from([
            "rsa-mission",
            "leaderboard",
            "--top",
            "3",
            "--leaderboard",
            "scores.txt",
            "--time-limit",
            "120",
            "-vv",
        ]);

        assert!(matches!(cli.command, Some(Command::Leaderboard { top: 3 })));
        assert_eq!(cli.verbose, 2);
        let config = cli.config();
        assert_eq!(config.leaderboard_path, PathBuf::from("scores.txt"));
        assert_eq!(config.time_limit, Some(120));
    }
}
