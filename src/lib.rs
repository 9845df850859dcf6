//! Strictly Duel - real-time two-player tic-tac-toe server
//!
//! Two participants attach to a session over WebSockets, ready up, and play
//! while the server keeps both views of the board consistent.
//!
//! # Architecture
//!
//! - **Session**: per-game state machine (attach, readiness, turns, outcome)
//! - **Registry**: creates, finds, lists and reaps sessions
//! - **Bridge**: drives a session from one WebSocket
//! - **Server**: axum routes for lobbies, creation, stats and sockets
//! - **Stats**: cumulative win counts in SQLite or memory
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strictly_duel::{MemoryStats, ServerConfig, SessionRegistry, serve};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let registry = SessionRegistry::new(Arc::new(MemoryStats::new()));
//! serve(&ServerConfig::default(), registry).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bridge;
mod config;
mod db;
mod protocol;
mod registry;
mod server;
mod session;
mod stats;

// Crate-level exports - Configuration
pub use config::{ConfigError, ServerConfig};

// Crate-level exports - Persistence
pub use db::{DbError, LEADERBOARD_PAGE_SIZE, NewPlayerStats, PlayerStats, StatsRepository, WinRecord};
pub use stats::{MemoryStats, StatsRecorder};

// Crate-level exports - Wire protocol
pub use protocol::{ClientMessage, MoveRequest, ProtocolError, ServerEvent};

// Crate-level exports - Session management
pub use registry::{LobbySummary, SessionRegistry, SharedSession};
pub use session::{
    BroadcastReport, ConnectionId, DeliveryError, GameSession, MoveOutcome, MoveRejection,
    Player, PlayerConnection, PlayerId, PlayerStatus, SessionError, SessionId, SessionPhase,
};

// Crate-level exports - HTTP surface
pub use bridge::run_connection;
pub use server::{
    ApiError, AppState, CreateGameResponse, LeaderboardQuery, StatsResponse, router, serve,
    spawn_reaper,
};

// Crate-level exports - Board types
pub use strictly_grid::{Board, Cell, Evaluation, Position, PositionError, Symbol};
