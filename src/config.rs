// Mission settings.

use crate::{keys::DEFAULT_EXPONENT_CHOICES, leaderboard::DEFAULT_LEADERBOARD_SIZE};

use std::path::PathBuf;

pub const DEFAULT_LEADERBOARD_PATH: &str = "leaderboard.txt";
/// Time limit used by timed missions, in seconds.
pub const TIMED_MISSION_SECONDS: u64 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionConfig {
    pub leaderboard_path: PathBuf,
    /// `None` for an untimed mission.
    pub time_limit: Option<u64>,
    pub exponent_choices: usize,
    pub leaderboard_size: usize,
}

impl MissionConfig {
    /// A zero limit means untimed.
    pub fn with_time_limit(mut self, seconds: u64) -> Self {
        self.time_limit = (seconds > 0).then_some(seconds);
        self
    }
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            leaderboard_path: PathBuf::from(DEFAULT_LEADERBOARD_PATH),
            time_limit: None,
            exponent_choices: DEFAULT_EXPONENT_CHOICES,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(0, None)]
    #[case(TIMED_MISSION_SECONDS, Some(120))]
    fn with_time_limit_treats_zero_as_untimed(#[case] seconds: u64, #[case] limit: Option<u64>) {
        let config = MissionConfig::default().with_time_limit(seconds);

        assert_eq!(config.time_limit, limit);
    }

    #[test]
    fn default_config_is_untimed_with_five_exponents() {
        let config = MissionConfig::default();

        assert_eq!(config.time_limit, None);
        assert_eq!(config.exponent_choices, 5);
        assert_eq!(config.leaderboard_size, 10);
        assert_eq!(config.leaderboard_path, PathBuf::from("leaderboard.txt"));
    }
}
