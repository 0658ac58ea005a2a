//! Offline collaborators: rule-based validator and a greedy bot.

use super::{MoveRequest, MoveService, ServiceError, ServiceErrorKind, ValidationRequest, Verdict, MoveValidator};
use crate::games::catchup::{Move, Pool, Scores, check_move, greedy_move};
use tracing::{debug, instrument};

/// Validates moves with the Catch-Up rules, without a network round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRules;

impl LocalRules {
    /// Creates the validator.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl MoveValidator for LocalRules {
    #[instrument(skip(self, request), fields(proposed = ?request.proposed))]
    async fn validate(&self, request: &ValidationRequest) -> Result<Verdict, ServiceError> {
        let mv = match Move::new(request.proposed.iter().copied()) {
            Ok(mv) => mv,
            Err(e) => return Ok(Verdict::reject(e.to_string())),
        };

        let pool = Pool::from_numbers(request.available.iter().copied());
        let scores = Scores::new(request.p1, request.p2);

        match check_move(&pool, &scores, request.turn(), &mv) {
            Ok(()) => Ok(Verdict::accept()),
            Err(violation) => {
                debug!(%violation, "Move breaks the rules");
                Ok(Verdict::reject(violation.to_string()))
            }
        }
    }
}

/// Bot that claims the largest numbers until it has caught up.
#[derive(Debug, Clone)]
pub struct GreedyBot {
    name: String,
}

impl GreedyBot {
    /// Creates a greedy bot.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for GreedyBot {
    fn default() -> Self {
        Self::new("Greedy Bot")
    }
}

#[async_trait::async_trait]
impl MoveService for GreedyBot {
    #[instrument(skip(self, request), fields(bot = %self.name))]
    async fn request_move(&self, request: &MoveRequest) -> Result<Move, ServiceError> {
        let chosen = greedy_move(&request.pool(), &request.scores(), request.turn())
            .ok_or_else(|| ServiceError::new(ServiceErrorKind::Rejected, "No numbers left to claim"))?;
        debug!(%chosen, "Greedy bot chose move");
        Ok(chosen)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
