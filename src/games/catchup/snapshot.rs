//! Immutable captures of the live game state.

use super::types::{Pool, Scores, Turn};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// The `{pool, scores, turn}` triple at one point in time.
///
/// A snapshot owns its pool outright, so later mutation of the live session
/// can never reach back into a stored snapshot. There are no mutators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unclaimed numbers.
    pool: Pool,
    /// Scores of both sides.
    scores: Scores,
    /// Side to move.
    turn: Turn,
}

impl Snapshot {
    /// Captures a deep copy of the given state.
    pub fn new(pool: &Pool, scores: Scores, turn: Turn) -> Self {
        Self {
            pool: pool.clone(),
            scores,
            turn,
        }
    }

    /// Splits the snapshot into its parts for restoration.
    pub fn into_parts(self) -> (Pool, Scores, Turn) {
        (self.pool, self.scores, self.turn)
    }
}
