//! State invariants for Catch-Up sessions.
//!
//! Checked after every committed move and history restore in debug builds,
//! and testable on their own.

use super::phases::SessionPhase;
use super::session::GameSession;
use std::collections::BTreeSet;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants checked together. Implemented for tuples.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let violations: Vec<_> = [
            (I1::holds(state), I1::description()),
            (I2::holds(state), I2::description()),
            (I3::holds(state), I3::description()),
        ]
        .into_iter()
        .filter(|(held, _)| !held)
        .map(|(_, description)| InvariantViolation::new(description))
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Every number from `1..=ball_count` is either still in the pool or was
/// claimed by a logged move, and nothing else appears in either.
pub struct PoolConservationInvariant;

impl Invariant<GameSession> for PoolConservationInvariant {
    fn holds(session: &GameSession) -> bool {
        let expected: BTreeSet<u32> = (1..=session.ball_count()).collect();
        let mut seen: BTreeSet<u32> = session.pool().iter().collect();
        seen.extend(session.replay().claimed_numbers());
        seen == expected
    }

    fn description() -> &'static str {
        "Pool plus claimed numbers equal the numbers dealt at start"
    }
}

/// Points are conserved: scores plus the pool add up to `1 + 2 + … + N`.
pub struct ScoreConservationInvariant;

impl Invariant<GameSession> for ScoreConservationInvariant {
    fn holds(session: &GameSession) -> bool {
        let n = u64::from(session.ball_count());
        let all = n * (n + 1) / 2;
        session.scores().total() + session.pool().sum() == all
    }

    fn description() -> &'static str {
        "Scores plus remaining pool equal the sum of all numbers"
    }
}

/// The phase agrees with the pool and the side to move.
pub struct PhaseAgreementInvariant;

impl Invariant<GameSession> for PhaseAgreementInvariant {
    fn holds(session: &GameSession) -> bool {
        match session.phase() {
            SessionPhase::AwaitingMove(turn) | SessionPhase::BotThinking(turn) => {
                turn == session.turn() && !session.pool().is_empty()
            }
            SessionPhase::GameOver(_) => session.pool().is_empty(),
            SessionPhase::Idle | SessionPhase::Applying => true,
        }
    }

    fn description() -> &'static str {
        "Phase turn matches the side to move and the game ends exactly when the pool is empty"
    }
}

/// All session invariants as a composable set.
pub type SessionInvariants = (
    PoolConservationInvariant,
    ScoreConservationInvariant,
    PhaseAgreementInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::catchup::{Mode, Move, PlayerNames};

    #[test]
    fn test_invariants_hold_through_a_game() {
        let mut session = GameSession::new();
        assert!(SessionInvariants::check_all(&session).is_ok());

        session
            .start(Mode::HumanVsHuman, 4, PlayerNames::default())
            .unwrap();
        assert!(SessionInvariants::check_all(&session).is_ok());

        for numbers in [vec![4], vec![1, 3], vec![2]] {
            session.apply_move(&Move::new(numbers).unwrap()).unwrap();
            assert!(SessionInvariants::check_all(&session).is_ok());
        }
        assert!(matches!(session.phase(), SessionPhase::GameOver(_)));
    }

    #[test]
    fn test_invariants_hold_after_undo() {
        let mut session = GameSession::new();
        session
            .start(Mode::HumanVsHuman, 6, PlayerNames::default())
            .unwrap();
        session.apply_move(&Move::new([6]).unwrap()).unwrap();
        session.apply_move(&Move::new([5, 1]).unwrap()).unwrap();
        assert!(session.undo_move());
        assert!(ScoreConservationInvariant::holds(&session));
        assert!(PhaseAgreementInvariant::holds(&session));
    }
}
