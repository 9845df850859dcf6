//! Database repository for player win counts.

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::db::{DbError, NewPlayerStats, PlayerStats, schema};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Rows returned per leaderboard page.
pub const LEADERBOARD_PAGE_SIZE: i64 = 50;

/// SQLite-backed store of cumulative win counts.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    db_path: String,
}

impl StatsRepository {
    /// Opens the database at `db_path`, creating it and applying pending
    /// migrations if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened or migrated.
    #[instrument(skip_all)]
    pub fn open(db_path: impl Into<String>) -> Result<Self, DbError> {
        let repository = Self {
            db_path: db_path.into(),
        };
        let mut conn = repository.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migrations failed: {}", e)))?;
        info!(path = %repository.db_path, migrations = applied.len(), "StatsRepository ready");
        Ok(repository)
    }

    /// Path of the backing database.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))
    }

    /// Adds one win for `player_id`, creating the record on first win.
    /// Returns the new total.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn record_win(&self, player_id: &str) -> Result<i32, DbError> {
        use schema::player_stats::dsl;

        let mut conn = self.connection()?;
        let stats = diesel::insert_into(dsl::player_stats)
            .values(&NewPlayerStats::new(player_id.to_string(), 1))
            .on_conflict(dsl::player_id)
            .do_update()
            .set((
                dsl::wins.eq(dsl::wins + 1),
                dsl::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .returning(PlayerStats::as_returning())
            .get_result(&mut conn)?;

        info!(player_id, wins = stats.wins(), "Win recorded");
        Ok(*stats.wins())
    }

    /// Returns the stored win count, or 0 for an unknown player.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_wins(&self, player_id: &str) -> Result<i32, DbError> {
        use schema::player_stats::dsl;

        let mut conn = self.connection()?;
        let wins = dsl::player_stats
            .filter(dsl::player_id.eq(player_id))
            .select(dsl::wins)
            .first::<i32>(&mut conn)
            .optional()?;

        debug!(player_id, ?wins, "Wins loaded");
        Ok(wins.unwrap_or(0))
    }

    /// One page of players ordered by most wins.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn leaderboard(&self, offset: i64) -> Result<Vec<PlayerStats>, DbError> {
        use schema::player_stats::dsl;

        let mut conn = self.connection()?;
        let rows = dsl::player_stats
            .order((dsl::wins.desc(), dsl::player_id.asc()))
            .offset(offset.max(0))
            .limit(LEADERBOARD_PAGE_SIZE)
            .select(PlayerStats::as_select())
            .load(&mut conn)?;

        info!(offset, count = rows.len(), "Leaderboard loaded");
        Ok(rows)
    }
}
