//! Database models.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::schema;

/// Cumulative wins for one player.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::player_stats)]
#[diesel(primary_key(player_id))]
pub struct PlayerStats {
    player_id: String,
    wins: i32,
    updated_at: NaiveDateTime,
}

/// Insertable row for a player's first win.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::player_stats)]
pub struct NewPlayerStats {
    player_id: String,
    wins: i32,
}

/// Win count as reported over HTTP and by the in-memory recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct WinRecord {
    player_id: String,
    wins: i32,
}

impl From<PlayerStats> for WinRecord {
    fn from(stats: PlayerStats) -> Self {
        Self {
            player_id: stats.player_id,
            wins: stats.wins,
        }
    }
}
