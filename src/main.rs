//! Strictly Duel - Unified CLI
//!
//! Runs the game server or queries the stats database.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, resolve_serve_config};
use strictly_duel::{MemoryStats, SessionRegistry, StatsRecorder, StatsRepository, serve};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            db_path,
            in_memory,
            reap_interval,
        } => {
            let config = resolve_serve_config(
                config.as_ref(),
                host,
                port,
                db_path,
                in_memory,
                reap_interval,
            )?;
            run_server(config).await
        }
        Command::Stats { player_id, db_path } => {
            let repository = StatsRepository::open(db_path)?;
            let wins = repository.get_wins(&player_id)?;
            println!("{player_id}: {wins}");
            Ok(())
        }
        Command::Leaderboard { offset, db_path } => {
            let repository = StatsRepository::open(db_path)?;
            for (rank, row) in repository.leaderboard(offset)?.iter().enumerate() {
                let place = i64::try_from(rank).unwrap_or(i64::MAX) + offset.max(0) + 1;
                println!("{place:>4}. {:<24} {}", row.player_id(), row.wins());
            }
            Ok(())
        }
    }
}

/// Run the game server
#[instrument(skip(config))]
async fn run_server(config: strictly_duel::ServerConfig) -> Result<()> {
    let stats: Arc<dyn StatsRecorder> = if *config.in_memory_stats() {
        Arc::new(MemoryStats::new())
    } else {
        Arc::new(StatsRepository::open(config.database_path().clone())?)
    };
    info!(
        addr = %config.bind_address(),
        in_memory = *config.in_memory_stats(),
        "Starting Strictly Duel server"
    );

    let registry = SessionRegistry::new(stats);
    serve(&config, registry).await
}
