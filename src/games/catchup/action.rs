//! First-class move type for Catch-Up.
//!
//! A move is the set of pool numbers one side claims in a single turn. It is
//! validated structurally here; legality against the pool and the scores is
//! decided by the session and the move validator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::instrument;

/// A non-empty set of distinct, positive numbers claimed in one turn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct Move {
    numbers: BTreeSet<u32>,
}

impl Move {
    /// Builds a move, rejecting empty input, zeros and repeated numbers.
    #[instrument(skip(numbers))]
    pub fn new(numbers: impl IntoIterator<Item = u32>) -> Result<Self, MoveError> {
        let mut set = BTreeSet::new();
        for n in numbers {
            if n == 0 {
                return Err(MoveError::Zero);
            }
            if !set.insert(n) {
                return Err(MoveError::Duplicate(n));
            }
        }

        if set.is_empty() {
            return Err(MoveError::Empty);
        }

        Ok(Self { numbers: set })
    }

    /// Numbers of this move, ascending.
    pub fn numbers(&self) -> &BTreeSet<u32> {
        &self.numbers
    }

    /// Numbers of this move as a vector, ascending.
    pub fn to_vec(&self) -> Vec<u32> {
        self.numbers.iter().copied().collect()
    }

    /// Points this move scores.
    pub fn sum(&self) -> u64 {
        self.numbers.iter().map(|&n| u64::from(n)).sum()
    }

    /// Largest number of the move.
    pub fn max(&self) -> u32 {
        self.numbers.last().copied().unwrap_or_default()
    }

    /// How many numbers the move claims.
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    /// Returns true if no numbers are claimed, which a built move never is.
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}

impl TryFrom<Vec<u32>> for Move {
    type Error = MoveError;

    fn try_from(value: Vec<u32>) -> Result<Self, Self::Error> {
        Move::new(value)
    }
}

impl From<Move> for Vec<u32> {
    fn from(value: Move) -> Self {
        value.numbers.into_iter().collect()
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.numbers.iter().map(u32::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Structural problems with a proposed move.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// No numbers were proposed.
    #[display("A move must claim at least one number")]
    Empty,

    /// Zero is never part of a pool.
    #[display("Zero is not a claimable number")]
    Zero,

    /// The same number appeared twice.
    #[display("Number {} was proposed more than once", _0)]
    Duplicate(u32),
}

impl std::error::Error for MoveError {}
