// Difficulty tiers and the prime ranges they allow.

use std::{fmt::Display, str::FromStr};

/// Named tier controlling which primes a mission may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Half-open range `[lo, hi)` that primes for this tier are drawn from.
    pub fn range(self) -> (u64, u64) {
        match self {
            Difficulty::Easy => (10, 50),
            Difficulty::Medium => (50, 150),
            Difficulty::Hard => (150, 500),
        }
    }

    /// Largest number of decimal digits a prime may have at this tier.
    ///
    /// Derived from the top of [`Difficulty::range`] so the two checks can
    /// never disagree.
    pub fn max_digits(self) -> u32 {
        let (_, hi) = self.range();
        decimal_digits(hi - 1)
    }
}

pub(crate) fn decimal_digits(n: u64) -> u32 {
    n.checked_ilog10().unwrap_or(0) + 1
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EASY" => Ok(Difficulty::Easy),
            "MEDIUM" => Ok(Difficulty::Medium),
            "HARD" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(Difficulty::Easy, 2)]
    #[case(Difficulty::Medium, 3)]
    #[case(Difficulty::Hard, 3)]
    fn max_digits_matches_top_of_range(#[case] difficulty: Difficulty, #[case] digits: u32) {
        assert_eq!(difficulty.max_digits(), digits);
    }

    #[test]
    fn ranges_are_ordered_and_do_not_overlap() {
        let ranges = Difficulty::ALL.map(Difficulty::range);

        for (lo, hi) in ranges {
            assert!(lo < hi);
        }
        for pair in ranges.windows(2) {
            assert!(pair[0].1 <= pair[1].0);
        }
    }

    #[rstest]
    #[case("easy", Difficulty::Easy)]
    #[case(" Medium ", Difficulty::Medium)]
    #[case("HARD", Difficulty::Hard)]
    fn difficulty_parses_case_insensitively(#[case] s: &str, #[case] expected: Difficulty) {
        assert_eq!(s.parse::<Difficulty>(), Ok(expected));
    }

    #[test]
    fn difficulty_display_parses_back() {
        for difficulty in Difficulty::ALL {
            assert_eq!(difficulty.to_string().parse::<Difficulty>(), Ok(difficulty));
        }
    }

    #[test]
    fn unknown_difficulty_is_rejected() {
        assert!("nightmare".parse::<Difficulty>().is_err());
    }

    #[rstest]
    #[case(0, 1)]
    #[case(9, 1)]
    #[case(49, 2)]
    #[case(499, 3)]
    fn decimal_digits_counts_digits(#[case] n: u64, #[case] digits: u32) {
        assert_eq!(decimal_digits(n), digits);
    }
}
