//! Line-oriented terminal front end.
//!
//! Reads commands from stdin, forwards them to a [`GameDriver`] and prints
//! the [`GameEvent`]s it publishes.

use crate::config::GameConfig;
use crate::driver::{Command, GameDriver, GameEvent};
use crate::games::catchup::{Mode, Outcome, PlayerNames, Pool, Scores, Turn};
use crate::services::{GreedyBot, LocalRules, MoveService, MoveValidator, RestGameApi};
use crate::tally::{JsonFileTallyStore, TallyStore};
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

const HELP: &str = "\
commands:
  start [hvh|hvbot|bvb] [balls]   start a game
  pick <n>                        toggle a number in the selection
  go                              confirm the selection
  play <n>...                     confirm these numbers directly
  undo | redo                     step through history
  reset [clear-wins] [clear-replay]
  replay <step>                   show the state after a replay step (1-based)
  help | quit";

/// Parses one input line.
///
/// Returns `Ok(None)` for blank lines and `help`. `start` without arguments
/// uses the configured mode and pool size.
pub fn parse_command(line: &str, config: &GameConfig) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let numbers = |args: &[&str]| -> Result<Vec<u32>, String> {
        if args.is_empty() {
            return Err("expected at least one number".to_string());
        }
        args.iter()
            .map(|a| a.parse::<u32>().map_err(|_| format!("not a number: {}", a)))
            .collect()
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "help" | "?" => return Ok(None),
        "start" | "new" => {
            let mode = match rest.first() {
                Some(m) => Mode::from_str(m).map_err(|_| format!("unknown mode: {}", m))?,
                None => *config.mode(),
            };
            let ball_count = match rest.get(1) {
                Some(b) => b.parse().map_err(|_| format!("not a ball count: {}", b))?,
                None => *config.ball_count(),
            };
            let names = PlayerNames::for_mode(
                mode,
                config.player_one().as_deref(),
                config.player_two().as_deref(),
            );
            Command::Start {
                mode,
                ball_count,
                names,
            }
        }
        "pick" | "select" => match numbers(&rest)?.as_slice() {
            [n] => Command::Select(*n),
            _ => return Err("pick one number at a time".to_string()),
        },
        "go" | "confirm" => Command::Confirm,
        "play" | "move" => Command::ConfirmNumbers(numbers(&rest)?),
        "undo" => Command::Undo,
        "redo" => Command::Redo,
        "reset" => Command::Reset {
            keep_wins: !rest.contains(&"clear-wins"),
            clear_replay: rest.contains(&"clear-replay"),
        },
        "replay" => {
            let step = rest
                .first()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|&s| s >= 1)
                .ok_or_else(|| "expected a replay step starting at 1".to_string())?;
            Command::Preview(step - 1)
        }
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command: {}", other)),
    };
    Ok(Some(command))
}

/// Renders a pool as a row of numbers.
pub fn render_pool(pool: &Pool) -> String {
    if pool.is_empty() {
        return "(empty)".to_string();
    }
    pool.iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders one event as a line of text, or nothing for silent events.
pub fn render_event(event: &GameEvent) -> Option<String> {
    match event {
        GameEvent::StatusChanged(status) => Some(format!("» {}", status)),
        GameEvent::BoardChanged { pool, scores, turn } => Some(render_board(pool, scores, *turn)),
        GameEvent::BotPreview(Some(mv)) => Some(format!("  bot picks {}", mv)),
        GameEvent::BotPreview(None) => None,
        GameEvent::MoveCommitted(record) => Some(format!(
            "  {} claimed {} for {} points",
            record.actor(),
            record.claimed(),
            record.points()
        )),
        GameEvent::GameOver { outcome, scores } => Some(match outcome {
            Outcome::Winner(turn) => format!("  final {}-{}, {} wins", scores.p1, scores.p2, turn),
            Outcome::Draw => format!("  final {}-{}, draw", scores.p1, scores.p2),
        }),
        GameEvent::TallyChanged(wins) => Some(format!("  wins p1 {} / p2 {}", wins.p1, wins.p2)),
        GameEvent::Ignored(reason) => Some(format!("  ignored: {}", reason)),
    }
}

fn render_board(pool: &Pool, scores: &Scores, turn: Turn) -> String {
    format!(
        "  pool [{}]  p1 {}  p2 {}  ({} to move)",
        render_pool(pool),
        scores.p1,
        scores.p2,
        turn
    )
}

/// Builds the collaborators described by `config`.
///
/// With an API URL the remote validator and bot are used; otherwise the
/// offline rules and greedy bot.
#[instrument(skip(config))]
pub fn build_services(
    config: &GameConfig,
) -> anyhow::Result<(Arc<dyn MoveValidator>, Arc<dyn MoveService>)> {
    match config.api_url() {
        Some(url) => {
            let api = Arc::new(RestGameApi::new(url, config.service_timeout())?);
            info!(url = %api.base_url(), "Using remote game API");
            let validator: Arc<dyn MoveValidator> = api.clone();
            let service: Arc<dyn MoveService> = api;
            Ok((validator, service))
        }
        None => {
            info!("No game API configured; playing offline");
            let validator: Arc<dyn MoveValidator> = Arc::new(LocalRules::new());
            let service: Arc<dyn MoveService> = Arc::new(GreedyBot::default());
            Ok((validator, service))
        }
    }
}

/// Runs an interactive game on stdin/stdout until `quit` or end of input.
#[instrument(skip(config))]
pub async fn run_console(config: GameConfig) -> anyhow::Result<()> {
    let (validator, service) = build_services(&config)?;
    let tally: Arc<dyn TallyStore> = Arc::new(JsonFileTallyStore::new(config.tally_path()));

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let driver = GameDriver::new(
        validator,
        service,
        config.bot_settings(),
        tally,
        config.tally_key().clone(),
        event_tx,
    );
    let wins = driver.session().wins();
    println!("Catch-Up. Wins so far: p1 {} / p2 {}", wins.p1, wins.p2);
    println!("{}", HELP);

    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if let Some(line) = render_event(&event) {
                println!("{}", line);
            }
        }
    });

    let reader_config = config.clone();
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            };
            match parse_command(&line, &reader_config) {
                Ok(Some(command)) => {
                    let quit = command == Command::Quit;
                    if command_tx.send(command).is_err() || quit {
                        break;
                    }
                }
                Ok(None) => println!("{}", HELP),
                Err(e) => println!("  {}", e),
            }
        }
        debug!("Input closed");
    });

    driver.run(command_rx).await;
    reader.abort();
    if let Err(e) = printer.await {
        debug!(error = %e, "Event printer ended abnormally");
    }
    Ok(())
}
