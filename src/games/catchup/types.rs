//! Core domain types for the Catch-Up number pool game.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::instrument;

/// Side whose turn it is.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Turn {
    /// Player one (always moves first).
    #[strum(to_string = "p1")]
    P1,
    /// Player two.
    #[strum(to_string = "p2")]
    P2,
}

impl Turn {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Turn::P1 => Turn::P2,
            Turn::P2 => Turn::P1,
        }
    }

    /// Returns true for player one.
    pub fn is_p1(self) -> bool {
        matches!(self, Turn::P1)
    }
}

/// Who controls each side, fixed for a session's lifetime.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum Mode {
    /// Two humans sharing the local input.
    #[strum(to_string = "hvh", serialize = "human_vs_human")]
    HumanVsHuman,
    /// Human plays P1, the bot plays P2.
    #[default]
    #[strum(to_string = "hvbot", serialize = "human_vs_bot")]
    HumanVsBot,
    /// Both sides are bots; local input is never accepted.
    #[strum(to_string = "bvb", serialize = "bot_vs_bot")]
    BotVsBot,
}

impl Mode {
    /// Returns true if `turn` is played by a bot in this mode.
    #[instrument]
    pub fn is_bot(self, turn: Turn) -> bool {
        match self {
            Mode::HumanVsHuman => false,
            Mode::HumanVsBot => turn == Turn::P2,
            Mode::BotVsBot => true,
        }
    }

    /// Returns true if local input may act for `turn`.
    pub fn accepts_local_input(self, turn: Turn) -> bool {
        !self.is_bot(turn)
    }

    /// Number of committed moves a single user-visible undo unwinds when
    /// `to_move` is the side to move.
    ///
    /// Against a bot, one undo removes the bot's reply and the human's move
    /// before it, so control returns to the human. While the bot is still to
    /// move only the human's pending move is unwound.
    pub fn undo_depth(self, to_move: Turn) -> usize {
        match self {
            Mode::HumanVsBot if self.is_bot(to_move) => 1,
            Mode::HumanVsBot => 2,
            Mode::HumanVsHuman | Mode::BotVsBot => 1,
        }
    }
}

/// Unclaimed numbers of the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pool {
    numbers: BTreeSet<u32>,
}

impl Pool {
    /// Creates the starting pool `{1..=count}`.
    #[instrument]
    pub fn with_count(count: u32) -> Self {
        Self {
            numbers: (1..=count).collect(),
        }
    }

    /// Creates a pool from arbitrary numbers.
    pub fn from_numbers(numbers: impl IntoIterator<Item = u32>) -> Self {
        Self {
            numbers: numbers.into_iter().collect(),
        }
    }

    /// Returns true if `number` is still claimable.
    pub fn contains(&self, number: u32) -> bool {
        self.numbers.contains(&number)
    }

    /// Returns true if every number of `numbers` is claimable.
    pub fn contains_all<'a>(&self, numbers: impl IntoIterator<Item = &'a u32>) -> bool {
        numbers.into_iter().all(|n| self.numbers.contains(n))
    }

    /// Returns true once every number has been claimed.
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Count of unclaimed numbers.
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    /// Sum of unclaimed numbers.
    pub fn sum(&self) -> u64 {
        self.numbers.iter().map(|&n| u64::from(n)).sum()
    }

    /// Unclaimed numbers in ascending order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = u32> + '_ {
        self.numbers.iter().copied()
    }

    /// Unclaimed numbers as a vector, ascending.
    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }

    /// Removes every number of `numbers` from the pool.
    pub(crate) fn remove_all<'a>(&mut self, numbers: impl IntoIterator<Item = &'a u32>) {
        for n in numbers {
            self.numbers.remove(n);
        }
    }

    /// Borrow of the underlying set.
    pub fn as_set(&self) -> &BTreeSet<u32> {
        &self.numbers
    }
}

/// Per-side scores of the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scores {
    /// Player one's score.
    pub p1: u64,
    /// Player two's score.
    pub p2: u64,
}

impl Scores {
    /// Creates a score pair.
    pub fn new(p1: u64, p2: u64) -> Self {
        Self { p1, p2 }
    }

    /// Score of `turn`.
    pub fn get(&self, turn: Turn) -> u64 {
        match turn {
            Turn::P1 => self.p1,
            Turn::P2 => self.p2,
        }
    }

    /// Adds `points` to the score of `turn`.
    pub(crate) fn add(&mut self, turn: Turn, points: u64) {
        match turn {
            Turn::P1 => self.p1 += points,
            Turn::P2 => self.p2 += points,
        }
    }

    /// How far `turn` trails its opponent (zero when level or ahead).
    pub fn deficit(&self, turn: Turn) -> u64 {
        self.get(turn.opponent()).saturating_sub(self.get(turn))
    }

    /// Sum of both scores.
    pub fn total(&self) -> u64 {
        self.p1 + self.p2
    }
}

/// Display names of both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerNames {
    /// Player one's name.
    pub p1: String,
    /// Player two's name.
    pub p2: String,
}

impl PlayerNames {
    /// Creates names from explicit values.
    pub fn new(p1: impl Into<String>, p2: impl Into<String>) -> Self {
        Self {
            p1: p1.into(),
            p2: p2.into(),
        }
    }

    /// Resolves names for `mode`, preferring user input where the mode has humans.
    #[instrument]
    pub fn for_mode(mode: Mode, p1_input: Option<&str>, p2_input: Option<&str>) -> Self {
        let pick = |input: Option<&str>, fallback: &str| {
            input
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };

        match mode {
            Mode::BotVsBot => Self::new("Bot 1", "Bot 2"),
            Mode::HumanVsBot => Self::new(pick(p1_input, "You"), "AI Bot"),
            Mode::HumanVsHuman => Self::new(pick(p1_input, "Player 1"), pick(p2_input, "Player 2")),
        }
    }

    /// Name of `turn`.
    pub fn get(&self, turn: Turn) -> &str {
        match turn {
            Turn::P1 => &self.p1,
            Turn::P2 => &self.p2,
        }
    }
}

impl Default for PlayerNames {
    fn default() -> Self {
        Self::for_mode(Mode::default(), None, None)
    }
}

/// Cumulative wins across sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WinTally {
    /// Games won by player one.
    pub p1: u32,
    /// Games won by player two.
    pub p2: u32,
}

impl WinTally {
    /// Wins of `turn`.
    pub fn get(&self, turn: Turn) -> u32 {
        match turn {
            Turn::P1 => self.p1,
            Turn::P2 => self.p2,
        }
    }

    /// Credits one win to `turn`.
    pub(crate) fn credit(&mut self, turn: Turn) {
        match turn {
            Turn::P1 => self.p1 += 1,
            Turn::P2 => self.p2 += 1,
        }
    }
}
