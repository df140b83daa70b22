// Append-only leaderboard of completed missions.
//
// One record per line: `agent,elapsed_seconds,DIFFICULTY`.

use crate::{Difficulty, MissionError, Result};

use std::{
    fmt::Display,
    fs::OpenOptions,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub agent_name: String,
    pub elapsed_seconds: u64,
    pub difficulty: Difficulty,
}

impl ScoreRecord {
    pub fn new(agent_name: &str, elapsed_seconds: u64, difficulty: Difficulty) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            elapsed_seconds,
            difficulty,
        }
    }
}

impl Display for ScoreRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.agent_name, self.elapsed_seconds, self.difficulty
        )
    }
}

impl TryFrom<&str> for ScoreRecord {
    type Error = String;

    fn try_from(line: &str) -> std::result::Result<Self, Self::Error> {
        let fields: Vec<&str> = line.trim().split(',').collect();
        let [agent_name, elapsed, difficulty] = fields.as_slice() else {
            return Err(format!("expected 3 fields, found {}", fields.len()));
        };
        Ok(Self {
            agent_name: agent_name.to_string(),
            elapsed_seconds: elapsed
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("cannot parse elapsed time '{elapsed}': {e}"))?,
            difficulty: difficulty.parse()?,
        })
    }
}

/// Names end up unescaped in a comma separated line, so they may not contain
/// the separator or a line break.
pub(crate) fn check_agent_name(name: &str) -> Result<()> {
    if name.contains([',', '\n', '\r']) {
        return Err(MissionError::InvalidAgentName(name.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ScoreLedger {
    path: PathBuf,
}

impl ScoreLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record to the log. The line is written with a single call on
    /// a file opened in append mode, so concurrent writers do not interleave.
    pub fn append(&self, record: &ScoreRecord) -> Result<()> {
        check_agent_name(&record.agent_name)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format!("{record}\n").as_bytes())?;
        log::debug!("appended '{record}' to {}", self.path.display());
        Ok(())
    }

    /// Every well formed record, in the order they were appended. A missing
    /// log is treated as empty.
    pub fn records(&self) -> Result<Vec<ScoreRecord>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(contents
            .lines()
            .enumerate()
            .filter(|(_, line)| line.contains(','))
            .filter_map(|(idx, line)| match ScoreRecord::try_from(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("skipping leaderboard line {}: {e}", idx + 1);
                    None
                }
            })
            .collect())
    }

    /// The `n` fastest records. Ties keep insertion order.
    pub fn top_n(&self, n: usize) -> Result<Vec<ScoreRecord>> {
        let mut records = self.records()?;
        records.sort_by_key(|record| record.elapsed_seconds);
        records.truncate(n);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use tempfile::TempDir;

    fn ledger_in(dir: &TempDir) -> ScoreLedger {
        ScoreLedger::new(dir.path().join("leaderboard.txt"))
    }

    fn names(records: &[ScoreRecord]) -> Vec<&str> {
        records.iter().map(|r| r.agent_name.as_str()).collect()
    }

    #[test]
    fn top_n_orders_fastest_first() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        ledger
            .append(&ScoreRecord::new("A", 50, Difficulty::Easy))
            .unwrap();
        ledger
            .append(&ScoreRecord::new("B", 10, Difficulty::Hard))
            .unwrap();
        ledger
            .append(&ScoreRecord::new("C", 30, Difficulty::Medium))
            .unwrap();

        let top = ledger.top_n(DEFAULT_LEADERBOARD_SIZE).unwrap();

        assert_eq!(names(&top), vec!["B", "C", "A"]);
        assert_eq!(top[0], ScoreRecord::new("B", 10, Difficulty::Hard));
    }

    #[test]
    fn top_n_keeps_insertion_order_for_ties_and_truncates() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        for (name, secs) in [("first", 20), ("second", 20), ("third", 5), ("fourth", 20)] {
            ledger
                .append(&ScoreRecord::new(name, secs, Difficulty::Easy))
                .unwrap();
        }

        let top = ledger.top_n(3).unwrap();

        assert_eq!(names(&top), vec!["third", "first", "second"]);
    }

    #[test]
    fn append_never_overwrites_or_deduplicates() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        let record = ScoreRecord::new("Alice", 42, Difficulty::Medium);

        ledger.append(&record).unwrap();
        ledger.append(&record).unwrap();

        assert_eq!(ledger.records().unwrap(), vec![record.clone(), record]);
        assert_eq!(
            std::fs::read_to_string(ledger.path()).unwrap(),
            "Alice,42,MEDIUM\nAlice,42,MEDIUM\n"
        );
    }

    #[test]
    fn missing_log_reads_as_empty() {
        let dir = TempDir::new().unwrap();

        assert!(ledger_in(&dir).top_n(10).unwrap().is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        std::fs::write(
            ledger.path(),
            "no separator here\n\
             Bob,12,EASY\n\
             Eve,fast,HARD\n\
             Mallory,3\n\
             Trent,1,EASY,extra\n\
             Carol,8,LEGENDARY\n\
             \n\
             Dave,7,HARD\n",
        )
        .unwrap();

        let top = ledger.top_n(10).unwrap();

        assert_eq!(names(&top), vec!["Dave", "Bob"]);
    }

    #[rstest]
    #[case("Smith, J")]
    #[case("line\nbreak")]
    fn append_rejects_names_that_would_corrupt_the_log(#[case] name: &str) {
        let dir = TempDir::new().unwrap();
        let ledger = ledger_in(&dir);

        let err = ledger
            .append(&ScoreRecord::new(name, 1, Difficulty::Easy))
            .unwrap_err();

        assert!(matches!(err, MissionError::InvalidAgentName(_)));
        assert!(!ledger.path().exists());
    }

    #[test]
    fn record_parses_from_log_line() {
        let record = ScoreRecord::try_from("Q,120,HARD\n").unwrap();

        assert_eq!(record, ScoreRecord::new("Q", 120, Difficulty::Hard));
    }
}
