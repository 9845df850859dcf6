//! HTTP and WebSocket surface.
//!
//! These handlers are thin: they call the registry or the stats recorder and
//! return the result as JSON.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument};

use crate::bridge::run_connection;
use crate::config::ServerConfig;
use crate::db::{DbError, WinRecord};
use crate::registry::{LobbySummary, SessionRegistry};
use crate::session::{PlayerId, SessionId};
use crate::stats::StatsRecorder;

/// Response to `POST /create_game`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGameResponse {
    /// The new session.
    pub game_id: SessionId,
}

/// Response to `GET /stats/{player_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Who was asked about.
    pub player_id: PlayerId,
    /// Cumulative wins.
    pub wins: i32,
}

/// Query for `GET /leaderboard`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LeaderboardQuery {
    /// Rows to skip.
    #[serde(default)]
    pub offset: i64,
}

/// Error returned from an HTTP handler.
#[derive(Debug, Display, Error, From)]
pub enum ApiError {
    /// The stats store failed.
    #[display("{_0}")]
    Stats(DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self, "Request failed");
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Shared state behind every route.
#[derive(Debug, Clone)]
pub struct AppState {
    registry: SessionRegistry,
}

impl AppState {
    /// Creates state around an existing registry.
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    /// The session registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    fn stats(&self) -> &Arc<dyn StatsRecorder> {
        self.registry.stats()
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/create_game", post(create_game))
        .route("/lobbies", get(list_lobbies))
        .route("/stats/{player_id}", get(player_stats))
        .route("/leaderboard", get(leaderboard))
        .route("/ws/{game_id}/{player_id}", get(connect))
        .with_state(state)
}

#[instrument(skip_all)]
async fn create_game(State(state): State<AppState>) -> Json<CreateGameResponse> {
    let game_id = state.registry.create().await;
    Json(CreateGameResponse { game_id })
}

#[instrument(skip_all)]
async fn list_lobbies(State(state): State<AppState>) -> Json<Vec<LobbySummary>> {
    Json(state.registry.list_open().await)
}

#[instrument(skip_all)]
async fn player_stats(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<StatsResponse>, ApiError> {
    let wins = state.stats().wins(&player_id)?;
    debug!(player_id = %player_id, wins, "Stats served");
    Ok(Json(StatsResponse { player_id, wins }))
}

#[instrument(skip_all)]
async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<WinRecord>>, ApiError> {
    Ok(Json(state.stats().leaderboard(query.offset)?))
}

#[instrument(skip_all)]
async fn connect(
    State(state): State<AppState>,
    Path((game_id, player_id)): Path<(SessionId, PlayerId)>,
    ws: WebSocketUpgrade,
) -> Response {
    info!(game_id = %game_id, player_id = %player_id, "Upgrading connection");
    let registry = state.registry.clone();
    ws.on_upgrade(move |socket| run_connection(socket, registry, game_id, player_id))
}

/// Periodically drops abandoned sessions.
#[instrument(skip(registry))]
pub fn spawn_reaper(
    registry: SessionRegistry,
    interval: std::time::Duration,
    idle_for: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    info!("Starting session reaper");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            registry.reap_idle(idle_for).await;
        }
    })
}

/// Binds `config`'s address and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
#[instrument(skip(config, registry), fields(addr = %config.bind_address()))]
pub async fn serve(config: &ServerConfig, registry: SessionRegistry) -> anyhow::Result<()> {
    let reaper = config
        .reap_interval()
        .map(|interval| spawn_reaper(registry.clone(), interval, config.session_idle()));

    let app = router(AppState::new(registry));
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(addr = %listener.local_addr()?, "Server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown requested");
        })
        .await?;

    if let Some(reaper) = reaper {
        reaper.abort();
    }
    info!("Server stopped");
    Ok(())
}
