//! Command-line interface for the duel server.

use crate::config::DEFAULT_PORT;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Duel - two-player tic-tac-toe over a line protocol
#[derive(Parser, Debug)]
#[command(name = "duel")]
#[command(about = "Two-seat tic-tac-toe server and client", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Host one session and exit when it ends
    Serve {
        /// Path to the TOML config (missing file means defaults)
        #[arg(short, long, default_value = "duel.toml")]
        config: PathBuf,

        /// Override the listen host
        #[arg(long)]
        host: Option<String>,

        /// Override the listen port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Join a server as a player, reading moves from stdin
    Play {
        /// Display name sent as the first line
        #[arg(short, long)]
        name: String,

        /// Server host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Server port
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}
