//! Timing and strength settings for bot turns.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const THINK_DELAY: Duration = Duration::from_millis(1000);
const THINK_DELAY_TURBO: Duration = Duration::from_millis(100);
const PREVIEW_DELAY: Duration = Duration::from_millis(900);
const PREVIEW_DELAY_TURBO: Duration = Duration::from_millis(400);
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// How a bot turn is paced and how hard the move service is asked to play.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct BotSettings {
    /// Strength forwarded to the move service.
    difficulty: u8,
    /// Whether the shortened delays are in effect.
    turbo: bool,
    /// Pause before the move request is issued.
    think_delay: Duration,
    /// How long a proposed move is shown before it is committed.
    preview_delay: Duration,
    /// Per-attempt deadline for the move service.
    service_timeout: Duration,
    /// Extra attempts after a failed request.
    service_retries: u32,
    /// Base backoff; attempt `n` waits `n` times this.
    retry_backoff: Duration,
}

impl BotSettings {
    /// Settings for `difficulty`, with turbo shortening both delays.
    pub fn new(difficulty: u8, turbo: bool) -> Self {
        let (think_delay, preview_delay) = if turbo {
            (THINK_DELAY_TURBO, PREVIEW_DELAY_TURBO)
        } else {
            (THINK_DELAY, PREVIEW_DELAY)
        };
        Self {
            difficulty,
            turbo,
            think_delay,
            preview_delay,
            service_timeout: Duration::from_millis(8000),
            service_retries: 2,
            retry_backoff: RETRY_BACKOFF,
        }
    }

    /// Settings with no artificial delays at all.
    pub fn instant(difficulty: u8) -> Self {
        Self {
            think_delay: Duration::ZERO,
            preview_delay: Duration::ZERO,
            retry_backoff: Duration::ZERO,
            ..Self::new(difficulty, true)
        }
    }

    /// Replaces the timeout and retry policy.
    pub fn with_service_policy(mut self, timeout: Duration, retries: u32) -> Self {
        self.service_timeout = timeout;
        self.service_retries = retries;
        self
    }

    /// Replaces the base retry backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

impl Default for BotSettings {
    fn default() -> Self {
        Self::new(4, false)
    }
}
