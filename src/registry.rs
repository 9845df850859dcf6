//! Registry of live game sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use crate::session::{GameSession, PlayerId, SessionId};
use crate::stats::StatsRecorder;

/// A session shared between the registry and its connections.
///
/// The mutex is the session's single point of mutual exclusion: every
/// operation on the board, turn or players happens while holding it.
pub type SharedSession = Arc<Mutex<GameSession>>;

/// A joinable session as reported by [`SessionRegistry::list_open`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbySummary {
    /// Session ID.
    pub game_id: SessionId,
    /// Players in join order.
    pub players: Vec<PlayerId>,
    /// Readiness of each entry in `players`.
    pub ready: Vec<bool>,
    /// Number of players.
    pub player_count: usize,
}

/// Manages all game sessions.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, SharedSession>>>,
    stats: Arc<dyn StatsRecorder>,
}

impl SessionRegistry {
    /// Creates an empty registry whose sessions report wins to `stats`.
    #[instrument(skip(stats))]
    pub fn new(stats: Arc<dyn StatsRecorder>) -> Self {
        info!("Creating session registry");
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            stats,
        }
    }

    /// The recorder shared with every session.
    pub fn stats(&self) -> &Arc<dyn StatsRecorder> {
        &self.stats
    }

    /// Creates an empty session under a fresh identifier.
    #[instrument(skip(self))]
    pub async fn create(&self) -> SessionId {
        let id = uuid::Uuid::new_v4().to_string();
        let session = GameSession::new(id.clone(), Arc::clone(&self.stats));
        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(session)));
        info!(session_id = %id, "Created new session");
        id
    }

    /// Gets a session by ID.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        let session = self.sessions.read().await.get(id).cloned();
        if session.is_none() {
            debug!(session_id = id, "Session not found");
        }
        session
    }

    /// Removes a session. Returns whether it existed.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!(session_id = id, "Session removed");
        }
        removed
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether there are no live sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    async fn snapshot(&self) -> Vec<SharedSession> {
        self.sessions.read().await.values().cloned().collect()
    }

    /// Sessions that are not started and have fewer than two players.
    ///
    /// A full session that has not started is not listed.
    #[instrument(skip(self))]
    pub async fn list_open(&self) -> Vec<LobbySummary> {
        let mut open = Vec::new();
        for session in self.snapshot().await {
            let session = session.lock().await;
            if session.is_started() || session.player_count() >= 2 {
                continue;
            }
            open.push(LobbySummary {
                game_id: session.id().to_string(),
                players: session.players().map(|p| p.id().clone()).collect(),
                ready: session.players().map(|p| p.is_ready()).collect(),
                player_count: session.player_count(),
            });
        }
        open.sort_by(|a, b| a.game_id.cmp(&b.game_id));
        info!(count = open.len(), "Listed open lobbies");
        open
    }

    /// Drops sessions with nobody connected and no activity for at least
    /// `idle_for`, including matches both players walked away from. Returns
    /// how many were removed.
    #[instrument(skip(self))]
    pub async fn reap_idle(&self, idle_for: Duration) -> usize {
        let abandoned = |session: &GameSession| {
            session.connected_count() == 0 && session.idle_for() >= idle_for
        };

        let mut expired = Vec::new();
        for session in self.snapshot().await {
            let session = session.lock().await;
            if abandoned(&session) {
                expired.push(session.id().to_string());
            }
        }

        if expired.is_empty() {
            return 0;
        }

        // Re-check under the write lock; a session touched since the scan stays.
        let mut sessions = self.sessions.write().await;
        let mut removed = 0;
        for id in expired {
            let still_idle = sessions
                .get(&id)
                .and_then(|s| s.try_lock().ok())
                .is_some_and(|s| abandoned(&s));
            if still_idle {
                sessions.remove(&id);
                removed += 1;
            }
        }
        info!(removed, remaining = sessions.len(), "Reaped idle sessions");
        removed
    }
}
