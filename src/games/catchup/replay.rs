//! Append-only log of committed moves, used for post-game scrubbing.

use super::action::Move;
use super::types::{Pool, Scores, Turn};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// The state resulting from one committed move.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize, new)]
pub struct ReplayStep {
    /// Side that committed the move.
    actor: Turn,
    /// Numbers claimed by the move.
    claimed: Move,
    /// Pool after the move.
    pool_after: Pool,
    /// Scores after the move.
    scores_after: Scores,
}

/// Ordered, append-only sequence of [`ReplayStep`]s.
///
/// Indices are assigned in commit order and never change; the log is only
/// ever appended to or cleared as a whole.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayLog {
    steps: Vec<ReplayStep>,
}

impl ReplayLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step and returns its index.
    #[instrument(skip(self, step), fields(actor = %step.actor, len = self.steps.len()))]
    pub fn append(&mut self, step: ReplayStep) -> usize {
        self.steps.push(step);
        let index = self.steps.len() - 1;
        debug!(index, "Appended replay step");
        index
    }

    /// Random access to a step.
    pub fn get(&self, index: usize) -> Option<&ReplayStep> {
        self.steps.get(index)
    }

    /// All steps in commit order.
    pub fn steps(&self) -> &[ReplayStep] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if nothing has been committed.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Most recent step.
    pub fn last(&self) -> Option<&ReplayStep> {
        self.steps.last()
    }

    /// Drops every step.
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Every number claimed by any logged step.
    pub fn claimed_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.steps
            .iter()
            .flat_map(|step| step.claimed.numbers().iter().copied())
    }
}
