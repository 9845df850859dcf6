//! Command-line interface for strictly_duel.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use strictly_duel::{ConfigError, ServerConfig};

/// Strictly Duel - real-time two-player tic-tac-toe server
#[derive(Parser, Debug)]
#[command(name = "strictly_duel")]
#[command(about = "Real-time two-player tic-tac-toe over WebSockets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the game server
    Serve {
        /// TOML config file; flags below override it
        #[arg(short, long, env = "STRICTLY_DUEL_CONFIG")]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long, env = "STRICTLY_DUEL_HOST")]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long, env = "STRICTLY_DUEL_PORT")]
        port: Option<u16>,

        /// Path to the stats database (created if it doesn't exist)
        #[arg(long, env = "STRICTLY_DUEL_DB")]
        db_path: Option<String>,

        /// Keep win counts in memory only
        #[arg(long)]
        in_memory: bool,

        /// Seconds between idle-session sweeps
        #[arg(long)]
        reap_interval: Option<u64>,
    },

    /// Print a player's win count
    Stats {
        /// Player identifier
        player_id: String,

        /// Path to the stats database
        #[arg(long, env = "STRICTLY_DUEL_DB", default_value = "strictly_duel.db")]
        db_path: String,
    },

    /// Print the leaderboard
    Leaderboard {
        /// Rows to skip
        #[arg(long, default_value = "0")]
        offset: i64,

        /// Path to the stats database
        #[arg(long, env = "STRICTLY_DUEL_DB", default_value = "strictly_duel.db")]
        db_path: String,
    },
}

/// Merges `serve` flags over the config file (or defaults).
pub fn resolve_serve_config(
    config: Option<&PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    db_path: Option<String>,
    in_memory: bool,
    reap_interval: Option<u64>,
) -> Result<ServerConfig, ConfigError> {
    let mut resolved = match config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(host) = host {
        resolved = resolved.with_host(host);
    }
    if let Some(port) = port {
        resolved = resolved.with_port(port);
    }
    if let Some(db_path) = db_path {
        resolved = resolved.with_database_path(db_path);
    }
    if in_memory {
        resolved = resolved.with_in_memory_stats(true);
    }
    if reap_interval.is_some() {
        resolved = resolved.with_reap_interval_secs(reap_interval);
    }
    Ok(resolved)
}
