//! Drives bot turns: fetch a move, preview it, then commit it once.
//!
//! The orchestrator never touches the session from a background task.
//! Tasks only sleep, call the move service and report back through a
//! [`BotEvent`] channel; the owner of the session feeds those events to
//! [`BotOrchestrator::handle`] on its own thread. Every event carries the
//! session generation it was issued for, so anything that arrives after a
//! start, reset, undo or redo is dropped.

use super::policy::fetch_with_policy;
use super::settings::BotSettings;
use crate::games::catchup::{GameSession, Move, MoveRecord, Turn};
use crate::services::{MoveService, ServiceError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Single-flight state of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotPhase {
    /// No bot turn in progress.
    Idle,
    /// A move request is outstanding.
    Requesting {
        /// Session generation the request was issued for.
        generation: u64,
        /// Side the bot plays.
        turn: Turn,
    },
    /// A move was received and is shown before being committed.
    Previewing {
        /// Session generation the move was fetched for.
        generation: u64,
        /// Side the bot plays.
        turn: Turn,
        /// The move about to be committed.
        proposal: Move,
    },
    /// The move service failed; nothing happens until the session changes.
    Stalled {
        /// Session generation that failed.
        generation: u64,
    },
}

impl BotPhase {
    fn generation(&self) -> Option<u64> {
        match self {
            BotPhase::Idle => None,
            BotPhase::Requesting { generation, .. }
            | BotPhase::Previewing { generation, .. }
            | BotPhase::Stalled { generation } => Some(*generation),
        }
    }
}

/// Messages from background bot tasks.
#[derive(Debug)]
pub enum BotEvent {
    /// The move service answered (or gave up).
    MoveFetched {
        /// Generation the request was issued for.
        generation: u64,
        /// Side the move is for.
        turn: Turn,
        /// The proposed move or the failure.
        result: Result<Move, ServiceError>,
    },
    /// The preview delay ran out.
    PreviewElapsed {
        /// Generation the preview belongs to.
        generation: u64,
    },
}

/// What handling a [`BotEvent`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotOutcome {
    /// The event was stale and ignored.
    Discarded,
    /// A move is now previewed.
    Previewing(Move),
    /// The previewed move was committed.
    Committed(MoveRecord),
    /// The turn failed and the bot is stalled.
    Failed(String),
}

/// Runs bot turns against a [`GameSession`].
pub struct BotOrchestrator {
    service: Arc<dyn MoveService>,
    settings: BotSettings,
    phase: BotPhase,
    events: mpsc::UnboundedSender<BotEvent>,
    task: Option<JoinHandle<()>>,
}

impl BotOrchestrator {
    /// Creates an idle orchestrator reporting on `events`.
    pub fn new(
        service: Arc<dyn MoveService>,
        settings: BotSettings,
        events: mpsc::UnboundedSender<BotEvent>,
    ) -> Self {
        info!(service = service.name(), difficulty = settings.difficulty(), turbo = settings.turbo(), "Creating bot orchestrator");
        Self {
            service,
            settings,
            phase: BotPhase::Idle,
            events,
            task: None,
        }
    }

    /// Current single-flight state.
    pub fn phase(&self) -> &BotPhase {
        &self.phase
    }

    /// Active settings.
    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    /// Starts a bot turn if the side to move is a bot and none is running.
    ///
    /// Returns true if a request was issued. Safe to call after every state
    /// change: a turn already in flight (or stalled) for the current
    /// generation is left alone, and work for an older generation is
    /// cancelled first.
    #[instrument(skip(self, session), fields(generation = session.generation(), phase = ?self.phase))]
    pub fn activate(&mut self, session: &mut GameSession) -> bool {
        let generation = session.generation();

        let Some(turn) = session.bot_turn() else {
            if self.phase != BotPhase::Idle {
                debug!("No bot turn; dropping bot work");
                self.cancel();
            }
            return false;
        };

        if self.phase.generation() == Some(generation) {
            debug!("Bot turn already handled for this generation");
            return false;
        }
        self.cancel();

        let difficulty = *self.settings.difficulty();
        session.enter_bot_thinking(difficulty);
        let request = session.move_request(difficulty);

        let service = Arc::clone(&self.service);
        let events = self.events.clone();
        let think_delay = *self.settings.think_delay();
        let timeout = *self.settings.service_timeout();
        let retries = *self.settings.service_retries();
        let backoff = *self.settings.retry_backoff();

        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(think_delay).await;
            let result = fetch_with_policy(service.as_ref(), &request, timeout, retries, backoff).await;
            if events
                .send(BotEvent::MoveFetched {
                    generation,
                    turn,
                    result,
                })
                .is_err()
            {
                debug!("Bot event receiver dropped");
            }
        }));

        self.phase = BotPhase::Requesting { generation, turn };
        info!(%turn, difficulty, "Bot turn started");
        true
    }

    /// Applies a background event to the session.
    #[instrument(skip(self, session, event), fields(generation = session.generation()))]
    pub fn handle(&mut self, session: &mut GameSession, event: BotEvent) -> BotOutcome {
        match event {
            BotEvent::MoveFetched {
                generation,
                turn,
                result,
            } => self.on_move_fetched(session, generation, turn, result),
            BotEvent::PreviewElapsed { generation } => self.on_preview_elapsed(session, generation),
        }
    }

    fn on_move_fetched(
        &mut self,
        session: &mut GameSession,
        generation: u64,
        turn: Turn,
        result: Result<Move, ServiceError>,
    ) -> BotOutcome {
        let expected = BotPhase::Requesting { generation, turn };
        if self.phase != expected || session.generation() != generation {
            debug!(event_generation = generation, "Discarding stale move response");
            return BotOutcome::Discarded;
        }
        self.task = None;

        let proposal = match result {
            Ok(mv) if session.pool().contains_all(mv.numbers()) => mv,
            Ok(mv) => {
                let detail = format!("{} proposed numbers outside the pool: {}", self.service.name(), mv);
                return self.stall(session, generation, detail);
            }
            Err(e) => return self.stall(session, generation, e.summary()),
        };

        session.set_bot_preview(proposal.clone());
        self.phase = BotPhase::Previewing {
            generation,
            turn,
            proposal: proposal.clone(),
        };

        let events = self.events.clone();
        let preview_delay = *self.settings.preview_delay();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(preview_delay).await;
            if events.send(BotEvent::PreviewElapsed { generation }).is_err() {
                debug!("Bot event receiver dropped");
            }
        }));

        debug!(%proposal, "Previewing bot move");
        BotOutcome::Previewing(proposal)
    }

    fn on_preview_elapsed(&mut self, session: &mut GameSession, generation: u64) -> BotOutcome {
        let proposal = match &self.phase {
            BotPhase::Previewing {
                generation: g,
                proposal,
                ..
            } if *g == generation && session.generation() == generation => proposal.clone(),
            _ => {
                debug!(event_generation = generation, "Discarding stale preview timer");
                return BotOutcome::Discarded;
            }
        };

        self.phase = BotPhase::Idle;
        self.task = None;
        session.clear_bot_preview();

        match session.apply_move(&proposal) {
            Ok(record) => {
                info!(%proposal, points = record.points(), "Bot move committed");
                BotOutcome::Committed(record)
            }
            Err(e) => {
                let current = session.generation();
                self.stall(session, current, e.to_string())
            }
        }
    }

    fn stall(&mut self, session: &mut GameSession, generation: u64, detail: String) -> BotOutcome {
        warn!(detail = %detail, "Bot turn failed");
        session.report_service_error(&detail);
        self.phase = BotPhase::Stalled { generation };
        BotOutcome::Failed(detail)
    }

    /// Aborts any in-flight bot work and returns to idle.
    ///
    /// Events already queued by the aborted task are dropped later by the
    /// generation check.
    #[instrument(skip(self), fields(phase = ?self.phase))]
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.phase = BotPhase::Idle;
    }
}

impl Drop for BotOrchestrator {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for BotOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotOrchestrator")
            .field("service", &self.service.name())
            .field("settings", &self.settings)
            .field("phase", &self.phase)
            .finish()
    }
}
