//! Database persistence layer for cumulative win counts.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::DbError;
pub use models::{NewPlayerStats, PlayerStats, WinRecord};
pub use repository::{LEADERBOARD_PAGE_SIZE, StatsRepository};
