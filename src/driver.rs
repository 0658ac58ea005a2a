//! Single-threaded event loop around a [`GameSession`].
//!
//! The driver owns the session, the bot orchestrator and the collaborators.
//! UI commands and bot events are applied one at a time on the same task, so
//! no two moves can interleave. Observers receive [`GameEvent`]s.

use crate::bot::{BotEvent, BotOrchestrator, BotOutcome, BotSettings};
use crate::games::catchup::{
    ConfirmOutcome, GameSession, Mode, Move, MoveRecord, Outcome, PlayerNames, Pool, Scores,
    SessionError, SessionStatus, Turn, WinTally,
};
use crate::services::{MoveService, MoveValidator};
use crate::tally::TallyStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Requests from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a new game.
    Start {
        /// Who controls each side.
        mode: Mode,
        /// Size of the starting pool.
        ball_count: u32,
        /// Display names.
        names: PlayerNames,
    },
    /// Toggle a number in the pending selection.
    Select(u32),
    /// Confirm the pending selection.
    Confirm,
    /// Confirm an explicit set of numbers.
    ConfirmNumbers(Vec<u32>),
    /// Undo the last move (two against a bot).
    Undo,
    /// Redo the last undone move.
    Redo,
    /// Return to the idle state.
    Reset {
        /// Keep the cumulative win tally.
        keep_wins: bool,
        /// Drop the replay log.
        clear_replay: bool,
    },
    /// Project the state after a replay step.
    Preview(usize),
    /// Stop the loop.
    Quit,
}

/// Notifications for observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The status line changed.
    StatusChanged(SessionStatus),
    /// Pool, scores or side to move changed.
    BoardChanged {
        /// Unclaimed numbers.
        pool: Pool,
        /// Current scores.
        scores: Scores,
        /// Side to move.
        turn: Turn,
    },
    /// The bot preview appeared or was cleared.
    BotPreview(Option<Move>),
    /// A move was committed.
    MoveCommitted(MoveRecord),
    /// The game ended.
    GameOver {
        /// Winner or draw.
        outcome: Outcome,
        /// Final scores.
        scores: Scores,
    },
    /// The cumulative win tally changed.
    TallyChanged(WinTally),
    /// A command was refused without changing anything.
    Ignored(String),
}

/// Owns a session and routes commands and bot events into it.
pub struct GameDriver {
    session: GameSession,
    bot: BotOrchestrator,
    bot_events: mpsc::UnboundedReceiver<BotEvent>,
    validator: Arc<dyn MoveValidator>,
    tally: Arc<dyn TallyStore>,
    tally_key: String,
    events: mpsc::UnboundedSender<GameEvent>,
    last_status: SessionStatus,
    last_generation: u64,
    last_preview: Option<Move>,
    saved_wins: WinTally,
}

impl GameDriver {
    /// Creates a driver, loading the win tally stored under `tally_key`.
    ///
    /// A tally that cannot be loaded is logged and replaced by zero.
    #[instrument(skip_all)]
    pub fn new(
        validator: Arc<dyn MoveValidator>,
        service: Arc<dyn MoveService>,
        settings: BotSettings,
        tally: Arc<dyn TallyStore>,
        tally_key: impl Into<String>,
        events: mpsc::UnboundedSender<GameEvent>,
    ) -> Self {
        let tally_key = tally_key.into();
        let wins = tally.load(&tally_key).unwrap_or_else(|e| {
            warn!(error = %e, "Could not load win tally; starting from zero");
            WinTally::default()
        });
        info!(p1 = wins.p1, p2 = wins.p2, "Win tally loaded");

        let (bot_tx, bot_events) = mpsc::unbounded_channel();
        let session = GameSession::with_wins(wins);
        let last_status = session.status().clone();
        let last_generation = session.generation();

        Self {
            session,
            bot: BotOrchestrator::new(service, settings, bot_tx),
            bot_events,
            validator,
            tally,
            tally_key,
            events,
            last_status,
            last_generation,
            last_preview: None,
            saved_wins: wins,
        }
    }

    /// The session being driven.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// The bot orchestrator.
    pub fn bot(&self) -> &BotOrchestrator {
        &self.bot
    }

    /// Applies one command.
    ///
    /// Refused commands leave the session unchanged and are reported as
    /// [`GameEvent::Ignored`] as well as returned.
    #[instrument(skip(self), fields(generation = self.session.generation()))]
    pub async fn execute(&mut self, command: Command) -> Result<(), SessionError> {
        let result = self.dispatch(command).await;
        if let Err(e) = &result {
            debug!(error = %e, "Command refused");
            self.publish(GameEvent::Ignored(e.to_string()));
        }
        self.sync();
        result
    }

    async fn dispatch(&mut self, command: Command) -> Result<(), SessionError> {
        match command {
            Command::Start {
                mode,
                ball_count,
                names,
            } => self.session.start(mode, ball_count, names),
            Command::Select(number) => {
                if self.session.propose_selection(number) {
                    Ok(())
                } else {
                    Err(self.selection_refusal(number))
                }
            }
            Command::Confirm => {
                let outcome = self
                    .session
                    .confirm_selection(self.validator.as_ref())
                    .await?;
                self.on_confirmed(outcome);
                Ok(())
            }
            Command::ConfirmNumbers(numbers) => {
                let outcome = self
                    .session
                    .confirm_move(self.validator.as_ref(), numbers)
                    .await?;
                self.on_confirmed(outcome);
                Ok(())
            }
            Command::Undo => {
                if !self.session.undo_move() {
                    debug!("Nothing to undo");
                }
                Ok(())
            }
            Command::Redo => {
                if !self.session.redo_move() {
                    debug!("Nothing to redo");
                }
                Ok(())
            }
            Command::Reset {
                keep_wins,
                clear_replay,
            } => {
                self.session.reset_session(keep_wins, clear_replay);
                Ok(())
            }
            Command::Preview(index) => {
                let step = self.session.preview_replay_step(index)?;
                self.publish(GameEvent::BoardChanged {
                    pool: step.pool_after().clone(),
                    scores: *step.scores_after(),
                    turn: step.actor().opponent(),
                });
                Ok(())
            }
            Command::Quit => Ok(()),
        }
    }

    fn selection_refusal(&self, number: u32) -> SessionError {
        let turn = self.session.turn();
        if !self.session.phase().is_running() {
            SessionError::NotRunning
        } else if !self.session.mode().accepts_local_input(turn) {
            SessionError::NotLocalTurn(turn)
        } else {
            SessionError::NotInPool(number)
        }
    }

    fn on_confirmed(&mut self, outcome: ConfirmOutcome) {
        match outcome {
            ConfirmOutcome::Applied(record) => self.on_committed(record),
            ConfirmOutcome::Rejected { reason } => info!(reason = %reason, "Move rejected"),
            ConfirmOutcome::Unavailable { message } => warn!(message = %message, "Validator unavailable"),
        }
    }

    fn on_committed(&mut self, record: MoveRecord) {
        let outcome = *record.outcome();
        self.publish(GameEvent::MoveCommitted(record));
        if let Some(outcome) = outcome {
            self.publish(GameEvent::GameOver {
                outcome,
                scores: self.session.scores(),
            });
        }
    }

    /// Applies one bot event.
    #[instrument(skip(self, event), fields(generation = self.session.generation()))]
    pub fn handle_bot_event(&mut self, event: BotEvent) -> BotOutcome {
        let outcome = self.bot.handle(&mut self.session, event);
        if let BotOutcome::Committed(record) = &outcome {
            self.on_committed(record.clone());
        }
        self.sync();
        outcome
    }

    /// Waits for the next bot event.
    pub async fn next_bot_event(&mut self) -> Option<BotEvent> {
        self.bot_events.recv().await
    }

    /// Runs until `commands` closes or a [`Command::Quit`] arrives.
    #[instrument(skip_all)]
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        info!("Game driver running");
        self.sync();
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    None | Some(Command::Quit) => break,
                    Some(command) => {
                        if let Err(e) = self.execute(command).await {
                            debug!(error = %e, "Command had no effect");
                        }
                    }
                },
                Some(event) = self.bot_events.recv() => {
                    self.handle_bot_event(event);
                }
            }
        }
        self.bot.cancel();
        info!("Game driver stopped");
    }

    /// Publishes whatever changed, persists the tally and wakes the bot.
    fn sync(&mut self) {
        if self.bot.activate(&mut self.session) {
            debug!("Bot turn activated");
        }

        if self.session.generation() != self.last_generation {
            self.last_generation = self.session.generation();
            self.publish(GameEvent::BoardChanged {
                pool: self.session.pool().clone(),
                scores: self.session.scores(),
                turn: self.session.turn(),
            });
        }

        let preview = self.session.bot_preview().cloned();
        if preview != self.last_preview {
            self.last_preview = preview.clone();
            self.publish(GameEvent::BotPreview(preview));
        }

        if *self.session.status() != self.last_status {
            self.last_status = self.session.status().clone();
            self.publish(GameEvent::StatusChanged(self.last_status.clone()));
        }

        let wins = self.session.wins();
        if wins != self.saved_wins {
            match self.tally.save(&self.tally_key, wins) {
                Ok(()) => debug!(p1 = wins.p1, p2 = wins.p2, "Win tally saved"),
                Err(e) => warn!(error = %e, "Could not save win tally"),
            }
            self.saved_wins = wins;
            self.publish(GameEvent::TallyChanged(wins));
        }
    }

    fn publish(&self, event: GameEvent) {
        if self.events.send(event).is_err() {
            debug!("No observers listening");
        }
    }
}

impl std::fmt::Debug for GameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameDriver")
            .field("session", &self.session)
            .field("bot", &self.bot)
            .field("tally_key", &self.tally_key)
            .finish()
    }
}
