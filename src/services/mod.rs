//! Seams to the external collaborators: move validation and bot move selection.
//!
//! The session never decides numeric legality or bot play itself; it asks a
//! [`MoveValidator`] and a [`MoveService`]. [`RestGameApi`] talks to the
//! remote game API; [`LocalRules`] and [`GreedyBot`] play offline.

mod error;
mod local;
mod rest;

pub use error::{ServiceError, ServiceErrorKind};
pub use local::{GreedyBot, LocalRules};
pub use rest::RestGameApi;

use crate::games::catchup::{Move, Pool, Scores, Turn};
use serde::{Deserialize, Serialize};

/// Request sent to the move validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    /// Numbers still in the pool.
    pub available: Vec<u32>,
    /// Player one's score.
    pub p1: u64,
    /// Player two's score.
    pub p2: u64,
    /// Proposed move.
    #[serde(rename = "move")]
    pub proposed: Vec<u32>,
    /// Whether player one is moving.
    pub is_p1_turn: bool,
}

impl ValidationRequest {
    /// Builds a request for `proposed` by `turn`.
    pub fn new(pool: &Pool, scores: &Scores, turn: Turn, proposed: &Move) -> Self {
        Self {
            available: pool.to_vec(),
            p1: scores.p1,
            p2: scores.p2,
            proposed: proposed.to_vec(),
            is_p1_turn: turn.is_p1(),
        }
    }

    /// Side that is moving.
    pub fn turn(&self) -> Turn {
        if self.is_p1_turn { Turn::P1 } else { Turn::P2 }
    }
}

/// Validator answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the move is legal.
    pub valid: bool,
    /// Explanation for a rejection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Verdict {
    /// A legal move.
    pub fn accept() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    /// An illegal move with an explanation.
    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Request sent to the bot move service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Numbers still in the pool.
    pub available_numbers: Vec<u32>,
    /// Player one's score.
    pub player1_score: u64,
    /// Player two's score.
    pub player2_score: u64,
    /// Whether the bot plays player one.
    pub is_p1_turn: bool,
    /// Search depth / strength requested from the service.
    pub difficulty: u8,
}

impl MoveRequest {
    /// Builds a request for the side `turn`.
    pub fn new(pool: &Pool, scores: &Scores, turn: Turn, difficulty: u8) -> Self {
        Self {
            available_numbers: pool.to_vec(),
            player1_score: scores.p1,
            player2_score: scores.p2,
            is_p1_turn: turn.is_p1(),
            difficulty,
        }
    }

    /// Side the bot plays.
    pub fn turn(&self) -> Turn {
        if self.is_p1_turn { Turn::P1 } else { Turn::P2 }
    }

    /// Pool described by the request.
    pub fn pool(&self) -> Pool {
        Pool::from_numbers(self.available_numbers.iter().copied())
    }

    /// Scores described by the request.
    pub fn scores(&self) -> Scores {
        Scores::new(self.player1_score, self.player2_score)
    }
}

/// Bot move service answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResponse {
    /// Numbers the bot claims.
    #[serde(rename = "move")]
    pub numbers: Option<Vec<u32>>,
}

/// Decides whether a proposed move is legal.
#[async_trait::async_trait]
pub trait MoveValidator: Send + Sync {
    /// Validates a proposed move.
    async fn validate(&self, request: &ValidationRequest) -> Result<Verdict, ServiceError>;
}

/// Chooses moves for bot-controlled sides.
#[async_trait::async_trait]
pub trait MoveService: Send + Sync {
    /// Returns the move the bot wants to play.
    async fn request_move(&self, request: &MoveRequest) -> Result<Move, ServiceError>;

    /// Display name of the service.
    fn name(&self) -> &str;
}
