//! Session phases, outcomes and the typed status shown to observers.

use super::types::{PlayerNames, Scores, Turn};
use serde::{Deserialize, Serialize};

/// Final result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// One side finished with a strictly higher score.
    Winner(Turn),
    /// Both sides finished level.
    Draw,
}

impl Outcome {
    /// Decides the outcome from final scores.
    pub fn from_scores(scores: &Scores) -> Self {
        use std::cmp::Ordering;
        match scores.p1.cmp(&scores.p2) {
            Ordering::Greater => Outcome::Winner(Turn::P1),
            Ordering::Less => Outcome::Winner(Turn::P2),
            Ordering::Equal => Outcome::Draw,
        }
    }

    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Turn> {
        match self {
            Outcome::Winner(turn) => Some(*turn),
            Outcome::Draw => None,
        }
    }

    /// Returns true if the game was a draw.
    pub fn is_draw(&self) -> bool {
        matches!(self, Outcome::Draw)
    }
}

/// Where the session is in its lifecycle.
///
/// `Idle` is the only entry state. `GameOver` is terminal until the session
/// is started again or reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No game running.
    Idle,
    /// Waiting for `turn` to move.
    AwaitingMove(Turn),
    /// A bot is choosing a move for `turn`.
    BotThinking(Turn),
    /// A move is being committed.
    Applying,
    /// The pool is empty.
    GameOver(Outcome),
}

impl SessionPhase {
    /// Returns true while moves can still be made.
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            SessionPhase::AwaitingMove(_) | SessionPhase::BotThinking(_) | SessionPhase::Applying
        )
    }
}

/// Category of the status shown to observers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum StatusKind {
    /// Waiting for a game to start.
    Idle,
    /// A session was just started.
    SessionStarted,
    /// A human is expected to move.
    AwaitingHuman,
    /// A bot side is to move but has not started thinking.
    AwaitingBot,
    /// A bot is choosing a move.
    BotThinking,
    /// A move is being committed.
    Applying,
    /// The validator rejected the last move.
    MoveRejected,
    /// The last move(s) were undone.
    Undone,
    /// A previously undone move was redone.
    Redone,
    /// A replay step is being previewed.
    Replaying,
    /// The game ended.
    GameOver,
    /// An external service failed.
    ServiceError,
}

/// Typed status plus the human-readable message for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    kind: StatusKind,
    message: String,
}

impl SessionStatus {
    /// Creates a status.
    pub fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Status before any game starts.
    pub fn idle() -> Self {
        Self::new(StatusKind::Idle, "PRESS START")
    }

    /// Status right after `start`.
    pub fn started() -> Self {
        Self::new(StatusKind::SessionStarted, "GAME STARTED")
    }

    /// Status while a human side is to move.
    pub fn awaiting(names: &PlayerNames, turn: Turn) -> Self {
        Self::new(
            StatusKind::AwaitingHuman,
            format!("{}'S TURN", names.get(turn).to_uppercase()),
        )
    }

    /// Status while a bot side is to move.
    pub fn awaiting_bot(names: &PlayerNames, turn: Turn) -> Self {
        Self::new(
            StatusKind::AwaitingBot,
            format!("{}'S TURN", names.get(turn).to_uppercase()),
        )
    }

    /// Status while a bot side is thinking.
    pub fn bot_thinking(difficulty: u8) -> Self {
        Self::new(
            StatusKind::BotThinking,
            format!("BOT (LEVEL {}) THINKING...", difficulty),
        )
    }

    /// Status after the validator rejected a move.
    pub fn rejected(reason: &str) -> Self {
        Self::new(StatusKind::MoveRejected, format!("INVALID MOVE: {}", reason))
    }

    /// Status after a finished game.
    pub fn game_over(names: &PlayerNames, outcome: Outcome) -> Self {
        let message = match outcome {
            Outcome::Winner(turn) => format!("{} WINS!", names.get(turn).to_uppercase()),
            Outcome::Draw => "DRAW".to_string(),
        };
        Self::new(StatusKind::GameOver, message)
    }

    /// Status after an external service failed.
    pub fn service_error(detail: &str) -> Self {
        Self::new(StatusKind::ServiceError, format!("API ERROR: {}", detail))
    }

    /// Category of the status.
    pub fn kind(&self) -> StatusKind {
        self.kind
    }

    /// Display message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
