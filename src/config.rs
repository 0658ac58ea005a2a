//! Game configuration loaded from TOML and the environment.

use crate::bot::BotSettings;
use crate::games::catchup::Mode;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Environment variable overriding [`GameConfig::api_url`].
pub const API_URL_ENV: &str = "CATCHUP_API_URL";

/// Configuration for a Catch-Up session and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct GameConfig {
    /// Base URL of the remote game API. Offline rules and bot are used when unset.
    #[serde(default)]
    api_url: Option<String>,

    /// Who controls each side.
    #[serde(default)]
    mode: Mode,

    /// Size of the starting pool.
    #[serde(default = "default_ball_count")]
    ball_count: u32,

    /// Strength requested from the bot move service.
    #[serde(default = "default_difficulty")]
    difficulty: u8,

    /// Shortens bot delays.
    #[serde(default)]
    turbo: bool,

    /// Per-request deadline for the game API, in milliseconds.
    #[serde(default = "default_service_timeout_ms")]
    service_timeout_ms: u64,

    /// Extra attempts after a failed bot move request.
    #[serde(default = "default_service_retries")]
    service_retries: u32,

    /// File holding the win tally.
    #[serde(default = "default_tally_path")]
    tally_path: PathBuf,

    /// Key the win tally is stored under.
    #[serde(default = "default_tally_key")]
    tally_key: String,

    /// Name for player one.
    #[serde(default)]
    player_one: Option<String>,

    /// Name for player two.
    #[serde(default)]
    player_two: Option<String>,
}

#[instrument]
fn default_ball_count() -> u32 {
    10
}

#[instrument]
fn default_difficulty() -> u8 {
    4
}

#[instrument]
fn default_service_timeout_ms() -> u64 {
    8000
}

#[instrument]
fn default_service_retries() -> u32 {
    2
}

#[instrument]
fn default_tally_path() -> PathBuf {
    PathBuf::from("strictly_catchup_tally.json")
}

#[instrument]
fn default_tally_key() -> String {
    "catchup_wins".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            mode: Mode::default(),
            ball_count: default_ball_count(),
            difficulty: default_difficulty(),
            turbo: false,
            service_timeout_ms: default_service_timeout_ms(),
            service_retries: default_service_retries(),
            tally_path: default_tally_path(),
            tally_key: default_tally_key(),
            player_one: None,
            player_two: None,
        }
    }
}

impl GameConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;

        info!(mode = %config.mode, ball_count = config.ball_count, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            debug!("No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Applies `CATCHUP_API_URL` from the environment, if set.
    #[instrument(skip(self))]
    pub fn apply_env(mut self) -> Self {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => {
                info!(url = %url, "Using game API URL from environment");
                self.api_url = Some(url);
            }
            Ok(_) => warn!("{} is set but empty; ignoring", API_URL_ENV),
            Err(_) => {}
        }
        self
    }

    /// Checks values a session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ball_count == 0 {
            return Err(ConfigError::new("ball_count must be at least 1".to_string()));
        }
        if self.service_timeout_ms == 0 {
            return Err(ConfigError::new("service_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Per-request deadline for the game API.
    pub fn service_timeout(&self) -> Duration {
        Duration::from_millis(self.service_timeout_ms)
    }

    /// Bot pacing and retry settings derived from this config.
    pub fn bot_settings(&self) -> BotSettings {
        BotSettings::new(self.difficulty, self.turbo)
            .with_service_policy(self.service_timeout(), self.service_retries)
    }

    /// Overrides the mode.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Overrides the pool size.
    pub fn set_ball_count(&mut self, ball_count: u32) {
        self.ball_count = ball_count;
    }

    /// Overrides the bot difficulty.
    pub fn set_difficulty(&mut self, difficulty: u8) {
        self.difficulty = difficulty;
    }

    /// Overrides the turbo flag.
    pub fn set_turbo(&mut self, turbo: bool) {
        self.turbo = turbo;
    }

    /// Overrides the game API URL.
    pub fn set_api_url(&mut self, api_url: Option<String>) {
        self.api_url = api_url;
    }

    /// Overrides the player names.
    pub fn set_player_names(&mut self, player_one: Option<String>, player_two: Option<String>) {
        if player_one.is_some() {
            self.player_one = player_one;
        }
        if player_two.is_some() {
            self.player_two = player_two;
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
