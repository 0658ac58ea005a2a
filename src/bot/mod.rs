//! Bot turn orchestration.
//!
//! [`BotOrchestrator`] runs the request, preview and commit lifecycle for
//! bot-controlled sides, with the timeout/retry policy from [`fetch_with_policy`]
//! and pacing from [`BotSettings`].

mod orchestrator;
mod policy;
mod settings;

pub use orchestrator::{BotEvent, BotOrchestrator, BotOutcome, BotPhase};
pub use policy::fetch_with_policy;
pub use settings::BotSettings;
