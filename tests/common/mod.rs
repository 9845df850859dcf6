//! Shared helpers for session and registry tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use strictly_duel::{
    DbError, GameSession, PlayerConnection, ServerEvent, StatsRecorder, Symbol, WinRecord,
};
use tokio::sync::mpsc::UnboundedReceiver;

/// Recorder that remembers every call.
#[derive(Debug, Default)]
pub struct RecordingStats {
    calls: Mutex<Vec<String>>,
}

impl RecordingStats {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("stats lock").clone()
    }
}

impl StatsRecorder for RecordingStats {
    fn record_win(&self, player_id: &str) -> Result<(), DbError> {
        self.calls.lock().expect("stats lock").push(player_id.to_string());
        Ok(())
    }

    fn wins(&self, player_id: &str) -> Result<i32, DbError> {
        let count = self
            .calls
            .lock()
            .expect("stats lock")
            .iter()
            .filter(|id| *id == player_id)
            .count();
        Ok(i32::try_from(count).expect("count fits"))
    }

    fn leaderboard(&self, _offset: i64) -> Result<Vec<WinRecord>, DbError> {
        Ok(Vec::new())
    }
}

/// Recorder whose store is always unavailable.
#[derive(Debug, Default)]
pub struct FailingStats;

impl StatsRecorder for FailingStats {
    fn record_win(&self, _player_id: &str) -> Result<(), DbError> {
        Err(DbError::new("stats store unavailable"))
    }

    fn wins(&self, _player_id: &str) -> Result<i32, DbError> {
        Err(DbError::new("stats store unavailable"))
    }

    fn leaderboard(&self, _offset: i64) -> Result<Vec<WinRecord>, DbError> {
        Err(DbError::new("stats store unavailable"))
    }
}

/// Creates an empty session backed by a [`RecordingStats`].
pub fn new_session() -> (GameSession, Arc<RecordingStats>) {
    let stats = Arc::new(RecordingStats::default());
    let session = GameSession::new("test-session".to_string(), stats.clone());
    (session, stats)
}

/// Attaches `player_id` on a fresh channel and returns its receiver.
pub fn join(session: &mut GameSession, player_id: &str) -> UnboundedReceiver<ServerEvent> {
    let (connection, rx) = PlayerConnection::channel();
    session
        .attach(player_id.to_string(), connection)
        .expect("attach should succeed");
    rx
}

/// Everything queued on `rx` so far.
pub fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

/// Alice (X) and Bob (O) joined and ready, with their queues drained.
pub fn started_session() -> (
    GameSession,
    Arc<RecordingStats>,
    UnboundedReceiver<ServerEvent>,
    UnboundedReceiver<ServerEvent>,
) {
    let (mut session, stats) = new_session();
    let mut alice = join(&mut session, "alice");
    let mut bob = join(&mut session, "bob");
    assert!(session.mark_ready("alice"));
    assert!(session.mark_ready("bob"));
    assert!(session.is_started());
    drain(&mut alice);
    drain(&mut bob);
    (session, stats, alice, bob)
}

pub fn start_event(symbol: Symbol) -> ServerEvent {
    ServerEvent::GameStart {
        this_player: symbol,
    }
}

pub fn joined(player_id: &str) -> ServerEvent {
    ServerEvent::PlayerJoined {
        player_id: player_id.to_string(),
    }
}
