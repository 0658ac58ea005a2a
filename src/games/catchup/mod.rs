//! Catch-Up: two sides claim numbers from a shared pool, each move bringing
//! the mover level with or ahead of the opponent.
//!
//! Value types live in [`types`], [`action`] and [`snapshot`]; the
//! [`GameSession`] controller mutates them and keeps the undo/redo
//! history and the replay log.

mod action;
mod history;
mod invariants;
mod phases;
mod replay;
mod rules;
mod session;
mod snapshot;
mod types;

pub use action::{Move, MoveError};
pub use history::CommandHistory;
pub use invariants::{
    Invariant, InvariantSet, InvariantViolation, PhaseAgreementInvariant, PoolConservationInvariant,
    ScoreConservationInvariant, SessionInvariants,
};
pub use phases::{Outcome, SessionPhase, SessionStatus, StatusKind};
pub use replay::{ReplayLog, ReplayStep};
pub use rules::{RuleViolation, check_move, greedy_move};
pub use session::{ConfirmOutcome, GameSession, MoveRecord, SessionError};
pub use snapshot::Snapshot;
pub use types::{Mode, PlayerNames, Pool, Scores, Turn, WinTally};
