//! Strictly Catch-Up - terminal front end.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::str::FromStr;
use strictly_catchup::{GameConfig, JsonFileTallyStore, Mode, TallyStore, WinTally, run_console};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "strictly_catchup.log";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging()?;

    let config = GameConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?
        .apply_env();

    match cli.command {
        Command::Play {
            mode,
            balls,
            difficulty,
            turbo,
            api_url,
            p1,
            p2,
        } => {
            let mut config = config;
            if let Some(mode) = mode {
                config.set_mode(
                    Mode::from_str(&mode).map_err(|_| anyhow::anyhow!("unknown mode: {}", mode))?,
                );
            }
            if let Some(balls) = balls {
                config.set_ball_count(balls);
            }
            if let Some(difficulty) = difficulty {
                config.set_difficulty(difficulty);
            }
            if turbo {
                config.set_turbo(true);
            }
            if api_url.is_some() {
                config.set_api_url(api_url);
            }
            config.set_player_names(p1, p2);
            config.validate()?;

            info!(mode = %config.mode(), balls = config.ball_count(), "Starting console game");
            run_console(config).await
        }
        Command::Tally { clear } => run_tally(&config, clear),
    }
}

/// Logs to a file so stdout stays free for the game.
fn init_logging() -> Result<()> {
    let log_file =
        open_log(Path::new(LOG_FILE)).with_context(|| format!("opening {}", LOG_FILE))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,strictly_catchup=debug")),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}

/// Opens `path` for appending, keeping earlier runs' output.
fn open_log(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[instrument(skip(config))]
fn run_tally(config: &GameConfig, clear: bool) -> Result<()> {
    let store = JsonFileTallyStore::new(config.tally_path());
    if clear {
        store.save(config.tally_key(), WinTally::default())?;
        info!("Win tally cleared");
    }
    let wins = store.load(config.tally_key())?;
    println!("p1 {} / p2 {}", wins.p1, wins.p2);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_open_log_appends_to_existing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("strictly_catchup.log");

        writeln!(open_log(&path).unwrap(), "first run").unwrap();
        writeln!(open_log(&path).unwrap(), "second run").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first run\nsecond run\n");
    }

    #[test]
    fn test_cli_parses_tally_subcommand() {
        let cli = Cli::try_parse_from(["strictly_catchup", "tally"]).unwrap();
        assert!(matches!(cli.command, Command::Tally { clear: false }));
        assert!(Cli::try_parse_from(["strictly_catchup", "--help"]).is_err());
    }
}
