//! Strictly Catch-Up library - the Catch-Up number pool game core
//!
//! Two sides take turns claiming numbers from a shared pool until it is
//! empty; the higher total wins.
//!
//! # Architecture
//!
//! - **Session**: [`GameSession`] owns pool, scores and turn, with undo/redo
//!   ([`CommandHistory`]) and a [`ReplayLog`] for scrubbing
//! - **Services**: move legality and bot play live behind [`MoveValidator`]
//!   and [`MoveService`] ([`RestGameApi`] remote, [`LocalRules`] and
//!   [`GreedyBot`] offline)
//! - **Bot**: [`BotOrchestrator`] runs request, preview and commit for bot turns
//! - **Driver**: [`GameDriver`] routes commands and bot events on one task
//!
//! # Example
//!
//! ```no_run
//! use strictly_catchup::{GameSession, LocalRules, Mode, PlayerNames};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut session = GameSession::new();
//! session.start(Mode::HumanVsHuman, 10, PlayerNames::default())?;
//! session.confirm_move(&LocalRules::new(), [10]).await?;
//! assert!(session.undo_move());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod bot;
mod config;
mod console;
mod driver;
mod games;
mod services;
mod tally;

// Crate-level exports - Game core
pub use games::catchup::{
    CommandHistory, ConfirmOutcome, GameSession, Invariant, InvariantSet, InvariantViolation,
    Mode, Move, MoveError, MoveRecord, Outcome, PhaseAgreementInvariant, PlayerNames, Pool,
    PoolConservationInvariant, ReplayLog, ReplayStep, RuleViolation, Scores,
    ScoreConservationInvariant, SessionError, SessionInvariants, SessionPhase, SessionStatus,
    Snapshot, StatusKind, Turn, WinTally, check_move, greedy_move,
};

// Crate-level exports - External services
pub use services::{
    GreedyBot, LocalRules, MoveRequest, MoveResponse, MoveService, MoveValidator, RestGameApi,
    ServiceError, ServiceErrorKind, ValidationRequest, Verdict,
};

// Crate-level exports - Bot orchestration
pub use bot::{BotEvent, BotOrchestrator, BotOutcome, BotPhase, BotSettings, fetch_with_policy};

// Crate-level exports - Driver and front end
pub use console::{build_services, parse_command, render_event, render_pool, run_console};
pub use driver::{Command, GameDriver, GameEvent};

// Crate-level exports - Configuration and persistence
pub use config::{API_URL_ENV, ConfigError, GameConfig};
pub use tally::{JsonFileTallyStore, MemoryTallyStore, StoreError, TallyStore};
