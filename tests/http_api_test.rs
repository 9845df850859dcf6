//! HTTP routes exercised through the router without binding a socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use strictly_duel::{
    AppState, CreateGameResponse, LobbySummary, MemoryStats, SessionRegistry, StatsRecorder,
    StatsResponse, WinRecord, router,
};
use tower::ServiceExt;

fn state() -> (AppState, Arc<MemoryStats>) {
    let stats = Arc::new(MemoryStats::new());
    let registry = SessionRegistry::new(stats.clone());
    (AppState::new(registry), stats)
}

async fn call<T: DeserializeOwned>(state: &AppState, request: Request<Body>) -> (StatusCode, T) {
    let response = router(state.clone())
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).expect("JSON body");
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

#[tokio::test]
async fn test_create_game_registers_session() {
    let (state, _stats) = state();
    let request = Request::post("/create_game")
        .body(Body::empty())
        .expect("request");

    let (status, created): (_, CreateGameResponse) = call(&state, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(state.registry().get(&created.game_id).await.is_some());
}

#[tokio::test]
async fn test_lobbies_lists_new_session() {
    let (state, _stats) = state();
    let game_id = state.registry().create().await;

    let (status, lobbies): (_, Vec<LobbySummary>) = call(&state, get("/lobbies")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        lobbies,
        vec![LobbySummary {
            game_id,
            players: vec![],
            ready: vec![],
            player_count: 0,
        }]
    );
}

#[tokio::test]
async fn test_lobbies_empty_registry() {
    let (state, _stats) = state();
    let (_, lobbies): (_, Vec<LobbySummary>) = call(&state, get("/lobbies")).await;
    assert!(lobbies.is_empty());
}

#[tokio::test]
async fn test_stats_for_unknown_player() {
    let (state, _stats) = state();

    let (status, body): (_, StatsResponse) = call(&state, get("/stats/ghost")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        StatsResponse {
            player_id: "ghost".to_string(),
            wins: 0,
        }
    );
}

#[tokio::test]
async fn test_stats_reflect_recorded_wins() {
    let (state, stats) = state();
    stats.record_win("alice").expect("record");
    stats.record_win("alice").expect("record");

    let (_, body): (_, StatsResponse) = call(&state, get("/stats/alice")).await;

    assert_eq!(body.wins, 2);
}

#[tokio::test]
async fn test_leaderboard_with_offset() {
    let (state, stats) = state();
    for player in ["carol", "carol", "alice", "bob", "carol", "alice"] {
        stats.record_win(player).expect("record");
    }

    let (status, top): (_, Vec<WinRecord>) = call(&state, get("/leaderboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        top,
        vec![
            WinRecord::new("carol".to_string(), 3),
            WinRecord::new("alice".to_string(), 2),
            WinRecord::new("bob".to_string(), 1),
        ]
    );

    let (_, rest): (_, Vec<WinRecord>) = call(&state, get("/leaderboard?offset=2")).await;
    assert_eq!(rest, vec![WinRecord::new("bob".to_string(), 1)]);
}
