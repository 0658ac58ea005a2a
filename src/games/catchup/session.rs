//! The game session controller.
//!
//! [`GameSession`] owns the live pool, scores and turn, the command history
//! and the replay log. Every state change goes through its operations;
//! observers only read.

use super::action::{Move, MoveError};
use super::history::CommandHistory;
use super::invariants::{InvariantSet, SessionInvariants};
use super::phases::{Outcome, SessionPhase, SessionStatus, StatusKind};
use super::replay::{ReplayLog, ReplayStep};
use super::snapshot::Snapshot;
use super::types::{Mode, PlayerNames, Pool, Scores, Turn, WinTally};
use crate::services::{MoveRequest, MoveValidator, ValidationRequest};
use derive_getters::Getters;
use std::collections::BTreeSet;
use tracing::{debug, error, info, instrument, warn};

/// Errors for actions the session refuses outright.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SessionError {
    /// No game is running.
    #[display("No game is running")]
    NotRunning,

    /// Local input cannot act for the side to move.
    #[display("Local input is not accepted for {}", _0)]
    NotLocalTurn(Turn),

    /// The move is structurally malformed.
    #[display("Malformed move: {}", _0)]
    Move(MoveError),

    /// The move claims a number that is not in the pool.
    #[display("{} is not in the pool", _0)]
    NotInPool(u32),

    /// A session needs at least one number.
    #[display("Ball count must be at least 1")]
    InvalidBallCount,

    /// Replay preview is only possible when no game is running.
    #[display("Cannot preview the replay while a game is running")]
    ReplayWhileRunning,

    /// The replay step does not exist.
    #[display("Replay step {} does not exist (log has {} steps)", index, len)]
    ReplayIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Length of the log.
        len: usize,
    },

    /// A state invariant failed after a mutation.
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),
}

impl std::error::Error for SessionError {}

impl From<MoveError> for SessionError {
    fn from(err: MoveError) -> Self {
        SessionError::Move(err)
    }
}

/// Result of a committed move.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct MoveRecord {
    /// Side that moved.
    actor: Turn,
    /// Numbers claimed.
    claimed: Move,
    /// Points scored.
    points: u64,
    /// Index of the replay step appended for this move.
    replay_index: usize,
    /// Final outcome if this move emptied the pool.
    outcome: Option<Outcome>,
}

/// What happened to a confirmed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The validator accepted the move and it was committed.
    Applied(MoveRecord),
    /// The validator rejected the move; state is unchanged.
    Rejected {
        /// Validator's explanation.
        reason: String,
    },
    /// The validator could not be reached; state is unchanged.
    Unavailable {
        /// Failure description.
        message: String,
    },
}

/// A turn-based Catch-Up session.
#[derive(Debug, Clone)]
pub struct GameSession {
    mode: Mode,
    names: PlayerNames,
    ball_count: u32,
    pool: Pool,
    scores: Scores,
    turn: Turn,
    phase: SessionPhase,
    status: SessionStatus,
    selection: BTreeSet<u32>,
    bot_preview: Option<Move>,
    history: CommandHistory,
    replay: ReplayLog,
    replay_position: Option<usize>,
    wins: WinTally,
    generation: u64,
}

impl GameSession {
    /// Creates an idle session with no wins recorded.
    #[instrument]
    pub fn new() -> Self {
        Self::with_wins(WinTally::default())
    }

    /// Creates an idle session carrying a previously stored win tally.
    #[instrument]
    pub fn with_wins(wins: WinTally) -> Self {
        info!(p1 = wins.p1, p2 = wins.p2, "Creating idle game session");
        Self {
            mode: Mode::default(),
            names: PlayerNames::default(),
            ball_count: 0,
            pool: Pool::default(),
            scores: Scores::default(),
            turn: Turn::P1,
            phase: SessionPhase::Idle,
            status: SessionStatus::idle(),
            selection: BTreeSet::new(),
            bot_preview: None,
            history: CommandHistory::new(),
            replay: ReplayLog::new(),
            replay_position: None,
            wins,
            generation: 0,
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Lifecycle
    // ─────────────────────────────────────────────────────────────

    /// Starts a fresh game with the pool `{1..=ball_count}`.
    ///
    /// Clears the command history and the replay log. The win tally is kept.
    #[instrument(skip(self, names), fields(generation = self.generation))]
    pub fn start(&mut self, mode: Mode, ball_count: u32, names: PlayerNames) -> Result<(), SessionError> {
        if ball_count == 0 {
            warn!("Refusing to start with an empty pool");
            return Err(SessionError::InvalidBallCount);
        }

        self.generation += 1;
        self.mode = mode;
        self.names = names;
        self.ball_count = ball_count;
        self.pool = Pool::with_count(ball_count);
        self.scores = Scores::default();
        self.turn = Turn::P1;
        self.selection.clear();
        self.bot_preview = None;
        self.history.clear();
        self.replay.clear();
        self.replay_position = None;
        self.phase = SessionPhase::AwaitingMove(Turn::P1);
        self.status = SessionStatus::started();

        info!(%mode, ball_count, p1 = %self.names.p1, p2 = %self.names.p2, "Session started");
        Ok(())
    }

    /// Returns to the idle, pre-start state.
    ///
    /// The win tally survives unless `keep_wins` is false; the replay log
    /// survives unless `clear_replay` is true.
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn reset_session(&mut self, keep_wins: bool, clear_replay: bool) {
        self.generation += 1;
        self.history.clear();
        self.pool = Pool::default();
        self.scores = Scores::default();
        self.turn = Turn::P1;
        self.selection.clear();
        self.bot_preview = None;
        self.phase = SessionPhase::Idle;
        self.status = SessionStatus::idle();

        if clear_replay {
            self.replay.clear();
            self.replay_position = None;
        }
        if !keep_wins {
            self.wins = WinTally::default();
        }

        info!(replay_len = self.replay.len(), "Session reset");
    }

    // ─────────────────────────────────────────────────────────────
    //  Local input
    // ─────────────────────────────────────────────────────────────

    /// Toggles `number` in the pending local selection.
    ///
    /// Returns false, changing nothing, when local input cannot act right now
    /// or the number is not in the pool.
    #[instrument(skip(self))]
    pub fn propose_selection(&mut self, number: u32) -> bool {
        if self.local_turn().is_err() {
            debug!(phase = ?self.phase, "Selection ignored: not a local turn");
            return false;
        }
        if !self.pool.contains(number) {
            debug!("Selection ignored: number not in pool");
            return false;
        }

        if !self.selection.remove(&number) {
            self.selection.insert(number);
        }
        debug!(selection = ?self.selection, "Selection updated");
        true
    }

    /// Drops the pending local selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Submits `numbers` to the validator and commits them if accepted.
    ///
    /// Local problems (wrong turn, malformed move, numbers outside the pool)
    /// are returned as errors without touching the status. Validator
    /// rejections and outages leave the state unchanged and are surfaced in
    /// the status; they are not retried.
    #[instrument(skip(self, validator, numbers))]
    pub async fn confirm_move(
        &mut self,
        validator: &dyn MoveValidator,
        numbers: impl IntoIterator<Item = u32>,
    ) -> Result<ConfirmOutcome, SessionError> {
        let turn = self.local_turn()?;
        let mv = Move::new(numbers)?;
        self.ensure_in_pool(&mv)?;

        let request = ValidationRequest::new(&self.pool, &self.scores, turn, &mv);
        debug!(%mv, %turn, "Asking validator");

        match validator.validate(&request).await {
            Ok(verdict) if verdict.valid => {
                let record = self.apply_move(&mv)?;
                Ok(ConfirmOutcome::Applied(record))
            }
            Ok(verdict) => {
                let reason = verdict.reason.unwrap_or_else(|| "Move rejected".to_string());
                info!(%mv, reason = %reason, "Validator rejected move");
                self.status = SessionStatus::rejected(&reason);
                Ok(ConfirmOutcome::Rejected { reason })
            }
            Err(e) => {
                warn!(error = %e, "Validator unreachable");
                let message = e.summary();
                self.status = SessionStatus::service_error(&message);
                Ok(ConfirmOutcome::Unavailable { message })
            }
        }
    }

    /// Confirms the pending local selection.
    pub async fn confirm_selection(
        &mut self,
        validator: &dyn MoveValidator,
    ) -> Result<ConfirmOutcome, SessionError> {
        let numbers: Vec<u32> = self.selection.iter().copied().collect();
        self.confirm_move(validator, numbers).await
    }

    // ─────────────────────────────────────────────────────────────
    //  The mutation primitive
    // ─────────────────────────────────────────────────────────────

    /// Commits `mv` for the side to move.
    ///
    /// Records the pre-move snapshot, scores the move, shrinks the pool,
    /// appends a replay step, flips the turn and finally either ends the game
    /// or announces the next turn. This is the only operation that commits
    /// moves; it does not consult the validator.
    #[instrument(skip(self, mv), fields(mv = %mv, generation = self.generation))]
    pub fn apply_move(&mut self, mv: &Move) -> Result<MoveRecord, SessionError> {
        let actor = match self.phase {
            SessionPhase::AwaitingMove(turn) | SessionPhase::BotThinking(turn) => turn,
            _ => {
                warn!(phase = ?self.phase, "Move applied outside a running game");
                return Err(SessionError::NotRunning);
            }
        };
        self.ensure_in_pool(mv)?;

        self.phase = SessionPhase::Applying;
        self.status = SessionStatus::new(StatusKind::Applying, "APPLYING MOVE");

        self.history
            .record_before_move(Snapshot::new(&self.pool, self.scores, actor));

        let points = mv.sum();
        self.scores.add(actor, points);
        self.pool.remove_all(mv.numbers());

        let replay_index = self.replay.append(ReplayStep::new(
            actor,
            mv.clone(),
            self.pool.clone(),
            self.scores,
        ));

        self.turn = actor.opponent();
        self.selection.clear();
        self.bot_preview = None;
        self.generation += 1;

        let outcome = if self.pool.is_empty() {
            Some(self.finish())
        } else {
            self.phase = SessionPhase::AwaitingMove(self.turn);
            self.status = self.turn_status();
            None
        };

        info!(
            %actor,
            points,
            p1 = self.scores.p1,
            p2 = self.scores.p2,
            remaining = self.pool.len(),
            "Move committed"
        );

        // The move is committed by now; a failed check is reported, not returned.
        self.verify_logged();

        Ok(MoveRecord {
            actor,
            claimed: mv.clone(),
            points,
            replay_index,
            outcome,
        })
    }

    fn finish(&mut self) -> Outcome {
        let outcome = Outcome::from_scores(&self.scores);
        if let Some(winner) = outcome.winner() {
            self.wins.credit(winner);
        }
        self.phase = SessionPhase::GameOver(outcome);
        self.status = SessionStatus::game_over(&self.names, outcome);
        info!(?outcome, p1 = self.scores.p1, p2 = self.scores.p2, "Game over");
        outcome
    }

    // ─────────────────────────────────────────────────────────────
    //  Undo / redo
    // ─────────────────────────────────────────────────────────────

    /// Unwinds the last committed move, or the last two against a bot when
    /// the human is to move.
    ///
    /// Returns false and changes nothing when no game is running or there
    /// is not enough history.
    #[instrument(skip(self), fields(mode = %self.mode, generation = self.generation))]
    pub fn undo_move(&mut self) -> bool {
        if !self.phase.is_running() {
            debug!("Undo ignored: no game running");
            return false;
        }

        let steps = self.mode.undo_depth(self.turn);
        let live = self.live_snapshot();
        let Some(snapshot) = self.history.undo(steps, live) else {
            return false;
        };

        self.restore(snapshot);
        self.status = SessionStatus::new(StatusKind::Undone, "UNDO");
        info!(steps, "Undo applied");
        self.verify_logged();
        true
    }

    /// Re-applies the most recently undone state.
    ///
    /// Returns false and changes nothing when no game is running or nothing
    /// was undone.
    #[instrument(skip(self), fields(generation = self.generation))]
    pub fn redo_move(&mut self) -> bool {
        if !self.phase.is_running() {
            debug!("Redo ignored: no game running");
            return false;
        }

        let live = self.live_snapshot();
        let Some(snapshot) = self.history.redo(live) else {
            debug!("Nothing to redo");
            return false;
        };

        self.restore(snapshot);
        self.status = SessionStatus::new(StatusKind::Redone, "REDO");
        info!("Redo applied");
        self.verify_logged();
        true
    }

    fn live_snapshot(&self) -> Snapshot {
        Snapshot::new(&self.pool, self.scores, self.turn)
    }

    fn restore(&mut self, snapshot: Snapshot) {
        let (pool, scores, turn) = snapshot.into_parts();
        self.pool = pool;
        self.scores = scores;
        self.turn = turn;
        self.selection.clear();
        self.bot_preview = None;
        self.phase = SessionPhase::AwaitingMove(turn);
        self.generation += 1;
    }

    // ─────────────────────────────────────────────────────────────
    //  Replay
    // ─────────────────────────────────────────────────────────────

    /// Projects the pool and scores of replay step `index` for viewing.
    ///
    /// Only allowed while no game is running. The undo/redo stacks are not
    /// touched, and previewing the same index twice gives the same result.
    #[instrument(skip(self))]
    pub fn preview_replay_step(&mut self, index: usize) -> Result<ReplayStep, SessionError> {
        if self.phase.is_running() {
            return Err(SessionError::ReplayWhileRunning);
        }

        let step = self
            .replay
            .get(index)
            .cloned()
            .ok_or(SessionError::ReplayIndexOutOfRange {
                index,
                len: self.replay.len(),
            })?;

        self.pool = step.pool_after().clone();
        self.scores = *step.scores_after();
        self.replay_position = Some(index);
        self.status = SessionStatus::new(
            StatusKind::Replaying,
            format!("REPLAY STEP {}", index + 1),
        );
        debug!(actor = %step.actor(), "Previewing replay step");
        Ok(step)
    }

    // ─────────────────────────────────────────────────────────────
    //  Bot-facing primitives
    // ─────────────────────────────────────────────────────────────

    /// The side to move if it is bot-controlled and the game is running.
    pub fn bot_turn(&self) -> Option<Turn> {
        match self.phase {
            SessionPhase::AwaitingMove(turn) | SessionPhase::BotThinking(turn)
                if self.mode.is_bot(turn) && !self.pool.is_empty() =>
            {
                Some(turn)
            }
            _ => None,
        }
    }

    /// Builds the request a bot move service needs for the current turn.
    pub fn move_request(&self, difficulty: u8) -> MoveRequest {
        MoveRequest::new(&self.pool, &self.scores, self.turn, difficulty)
    }

    pub(crate) fn enter_bot_thinking(&mut self, difficulty: u8) {
        if let SessionPhase::AwaitingMove(turn) = self.phase {
            self.phase = SessionPhase::BotThinking(turn);
        }
        self.status = SessionStatus::bot_thinking(difficulty);
    }

    pub(crate) fn set_bot_preview(&mut self, mv: Move) {
        self.bot_preview = Some(mv);
    }

    pub(crate) fn clear_bot_preview(&mut self) {
        self.bot_preview = None;
    }

    pub(crate) fn report_service_error(&mut self, detail: &str) {
        if let SessionPhase::BotThinking(turn) = self.phase {
            self.phase = SessionPhase::AwaitingMove(turn);
        }
        self.bot_preview = None;
        self.status = SessionStatus::service_error(detail);
    }

    // ─────────────────────────────────────────────────────────────
    //  Observers
    // ─────────────────────────────────────────────────────────────

    /// Mode of the current (or last) session.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Display names.
    pub fn names(&self) -> &PlayerNames {
        &self.names
    }

    /// Size of the starting pool.
    pub fn ball_count(&self) -> u32 {
        self.ball_count
    }

    /// Unclaimed numbers.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Current scores.
    pub fn scores(&self) -> Scores {
        self.scores
    }

    /// Side to move.
    pub fn turn(&self) -> Turn {
        self.turn
    }

    /// Lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Status for display.
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// Pending local selection.
    pub fn selection(&self) -> &BTreeSet<u32> {
        &self.selection
    }

    /// Move a bot is about to commit, if any.
    pub fn bot_preview(&self) -> Option<&Move> {
        self.bot_preview.as_ref()
    }

    /// Log of committed moves.
    pub fn replay(&self) -> &ReplayLog {
        &self.replay
    }

    /// Replay step currently previewed.
    pub fn replay_position(&self) -> Option<usize> {
        self.replay_position
    }

    /// Undo/redo stacks.
    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    /// Cumulative wins.
    pub fn wins(&self) -> WinTally {
        self.wins
    }

    /// Counter identifying the current live state; bumped on every change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true if an undo would change the state.
    pub fn can_undo(&self) -> bool {
        self.phase.is_running() && self.history.can_undo(self.mode.undo_depth(self.turn))
    }

    /// Returns true if a redo would change the state.
    pub fn can_redo(&self) -> bool {
        self.phase.is_running() && self.history.can_redo()
    }

    // ─────────────────────────────────────────────────────────────
    //  Helpers
    // ─────────────────────────────────────────────────────────────

    fn local_turn(&self) -> Result<Turn, SessionError> {
        match self.phase {
            SessionPhase::AwaitingMove(turn) if self.mode.accepts_local_input(turn) => Ok(turn),
            SessionPhase::AwaitingMove(turn) | SessionPhase::BotThinking(turn) => {
                Err(SessionError::NotLocalTurn(turn))
            }
            _ => Err(SessionError::NotRunning),
        }
    }

    fn ensure_in_pool(&self, mv: &Move) -> Result<(), SessionError> {
        match mv.numbers().iter().find(|&&n| !self.pool.contains(n)) {
            Some(&missing) => Err(SessionError::NotInPool(missing)),
            None => Ok(()),
        }
    }

    fn turn_status(&self) -> SessionStatus {
        if self.mode.is_bot(self.turn) {
            SessionStatus::awaiting_bot(&self.names, self.turn)
        } else {
            SessionStatus::awaiting(&self.names, self.turn)
        }
    }

    fn verify(&self) -> Result<(), SessionError> {
        if !cfg!(debug_assertions) {
            return Ok(());
        }
        SessionInvariants::check_all(self).map_err(|violations| {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            error!(%descriptions, "Session invariant violated");
            SessionError::InvariantViolation(descriptions)
        })
    }

    fn verify_logged(&self) {
        if let Err(e) = self.verify() {
            error!(error = %e, "State check failed");
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}
