//! Command-line interface for strictly_catchup.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Catch-Up - number pool game with undo/redo, replay and bots
#[derive(Parser, Debug)]
#[command(name = "strictly_catchup")]
#[command(about = "Play Catch-Up in the terminal against humans or bots", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "catchup.toml")]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play an interactive game
    Play {
        /// Who controls each side (hvh, hvbot, bvb)
        #[arg(short, long)]
        mode: Option<String>,

        /// Number of balls in the starting pool
        #[arg(short, long)]
        balls: Option<u32>,

        /// Bot strength forwarded to the move service
        #[arg(short, long)]
        difficulty: Option<u8>,

        /// Shorten bot thinking and preview delays
        #[arg(long)]
        turbo: bool,

        /// Base URL of the remote game API (offline rules when omitted)
        #[arg(long)]
        api_url: Option<String>,

        /// Name for player one
        #[arg(long)]
        p1: Option<String>,

        /// Name for player two
        #[arg(long)]
        p2: Option<String>,
    },

    /// Show or clear the stored win tally
    Tally {
        /// Reset the tally to zero
        #[arg(long)]
        clear: bool,
    },
}
