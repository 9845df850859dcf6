//! Win recording consumed by game sessions.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, instrument};

use crate::db::{DbError, LEADERBOARD_PAGE_SIZE, StatsRepository, WinRecord};

/// Records and reports cumulative wins.
///
/// Sessions only ever call [`StatsRecorder::record_win`]; the read side is
/// used by the HTTP surface and the CLI.
pub trait StatsRecorder: Send + Sync + std::fmt::Debug {
    /// Adds one win for `player_id`, creating the record if needed.
    fn record_win(&self, player_id: &str) -> Result<(), DbError>;

    /// Wins recorded for `player_id`; 0 if unknown.
    fn wins(&self, player_id: &str) -> Result<i32, DbError>;

    /// One page of players ordered by most wins.
    fn leaderboard(&self, offset: i64) -> Result<Vec<WinRecord>, DbError>;
}

impl StatsRecorder for StatsRepository {
    fn record_win(&self, player_id: &str) -> Result<(), DbError> {
        StatsRepository::record_win(self, player_id).map(|_| ())
    }

    fn wins(&self, player_id: &str) -> Result<i32, DbError> {
        self.get_wins(player_id)
    }

    fn leaderboard(&self, offset: i64) -> Result<Vec<WinRecord>, DbError> {
        Ok(StatsRepository::leaderboard(self, offset)?
            .into_iter()
            .map(WinRecord::from)
            .collect())
    }
}

/// Process-local recorder, used when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryStats {
    wins: Mutex<HashMap<String, i32>>,
}

impl MemoryStats {
    /// Creates an empty recorder.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory stats recorder");
        Self::default()
    }
}

impl StatsRecorder for MemoryStats {
    #[instrument(skip(self))]
    fn record_win(&self, player_id: &str) -> Result<(), DbError> {
        let mut wins = self.wins.lock().unwrap_or_else(PoisonError::into_inner);
        let total = wins.entry(player_id.to_string()).or_insert(0);
        *total += 1;
        debug!(wins = *total, "Win recorded in memory");
        Ok(())
    }

    fn wins(&self, player_id: &str) -> Result<i32, DbError> {
        let wins = self.wins.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(wins.get(player_id).copied().unwrap_or(0))
    }

    fn leaderboard(&self, offset: i64) -> Result<Vec<WinRecord>, DbError> {
        let wins = self.wins.lock().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<_> = wins
            .iter()
            .map(|(id, wins)| WinRecord::new(id.clone(), *wins))
            .collect();
        rows.sort_by(|a, b| b.wins().cmp(a.wins()).then_with(|| a.player_id().cmp(b.player_id())));
        let skip = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let take = usize::try_from(LEADERBOARD_PAGE_SIZE).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(skip).take(take).collect())
    }
}
