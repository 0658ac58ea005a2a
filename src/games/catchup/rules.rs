//! Catch-Up legality rules.
//!
//! The side to move claims numbers one at a time until its score reaches
//! the opponent's. A move therefore has to reach the deficit, and no proper
//! prefix of it (taken in the most favourable order, largest number last)
//! may already reach it. A move that empties the pool is exempt from the
//! reaching requirement. When the scores are level a move is a single number.

use super::action::Move;
use super::types::{Pool, Scores, Turn};
use tracing::instrument;

/// Why a move breaks the rules.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RuleViolation {
    /// The move claims a number that is not in the pool.
    #[display("{} is not available", _0)]
    NotInPool(u32),

    /// The move stops before the mover has caught up.
    #[display("move totals {} but {} is needed to catch up", total, needed)]
    FallsShort {
        /// Points the move scores.
        total: u64,
        /// Points needed to catch up.
        needed: u64,
    },

    /// The mover had caught up before the last number.
    #[display("caught up before the last number; stop at {}", needed)]
    Overshoots {
        /// Points needed to catch up.
        needed: u64,
    },
}

impl std::error::Error for RuleViolation {}

/// Checks `mv` for the side `turn` against the pool and scores.
#[instrument(skip(pool, mv), fields(mv = %mv))]
pub fn check_move(pool: &Pool, scores: &Scores, turn: Turn, mv: &Move) -> Result<(), RuleViolation> {
    if let Some(&missing) = mv.numbers().iter().find(|&&n| !pool.contains(n)) {
        return Err(RuleViolation::NotInPool(missing));
    }

    let needed = scores.deficit(turn);
    let total = mv.sum();

    if mv.len() > 1 && total - u64::from(mv.max()) >= needed {
        return Err(RuleViolation::Overshoots { needed });
    }

    let empties_pool = mv.len() == pool.len();
    if total < needed && !empties_pool {
        return Err(RuleViolation::FallsShort { total, needed });
    }

    Ok(())
}

/// Picks a legal move greedily: largest numbers first until caught up.
///
/// Returns `None` only for an empty pool.
#[instrument(skip(pool))]
pub fn greedy_move(pool: &Pool, scores: &Scores, turn: Turn) -> Option<Move> {
    let needed = scores.deficit(turn);
    let mut picked = Vec::new();
    let mut total = 0u64;

    for n in pool.iter().rev() {
        picked.push(n);
        total += u64::from(n);
        if total >= needed {
            break;
        }
    }

    Move::new(picked).ok()
}
