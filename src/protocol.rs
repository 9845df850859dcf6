//! Wire protocol between participants and the server.
//!
//! Every frame is a JSON envelope `{ "type": ..., "data": ... }`.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use strictly_grid::{Rows, Symbol};
use tracing::instrument;

use crate::session::PlayerId;

/// Coordinates carried by a `move` message.
///
/// Kept signed so that negative client input decodes and is rejected by the
/// session rather than failing as malformed JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Target row.
    pub row: i64,
    /// Target column.
    pub col: i64,
}

/// A message sent by a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// The participant is ready to start.
    Ready,
    /// The participant wants to place a mark.
    Move(MoveRequest),
    /// Any other `type`; ignored by the session.
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl ClientMessage {
    /// Decodes an inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the frame is not a JSON envelope, or if a
    /// `move` carries no usable coordinates.
    #[instrument(skip(text), fields(len = text.len()))]
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text)
            .map_err(|e| ProtocolError::new(format!("Invalid envelope: {}", e)))?;

        match envelope.kind.as_str() {
            "ready" => Ok(Self::Ready),
            "move" => {
                let request = serde_json::from_value(envelope.data)
                    .map_err(|e| ProtocolError::new(format!("Invalid move data: {}", e)))?;
                Ok(Self::Move(request))
            }
            _ => Ok(Self::Unknown(envelope.kind)),
        }
    }
}

/// An event sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A participant attached or reattached.
    PlayerJoined {
        /// Who joined.
        player_id: PlayerId,
    },
    /// A participant signalled readiness.
    PlayerReady {
        /// Who is ready.
        player_id: PlayerId,
    },
    /// A participant's connection closed.
    PlayerDisconnected {
        /// Who left.
        player_id: PlayerId,
    },
    /// Private notice of the recipient's symbol.
    GameStart {
        /// The recipient's symbol.
        this_player: Symbol,
    },
    /// Full board snapshot.
    GameUpdate {
        /// Row-major grid.
        board: Rows,
        /// Symbol to move next.
        turn: Symbol,
    },
    /// The match ended. `winner` is `None` on a draw.
    GameOver {
        /// Winning symbol.
        winner: Option<Symbol>,
    },
}

impl ServerEvent {
    /// The `type` tag of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlayerJoined { .. } => "player_joined",
            Self::PlayerReady { .. } => "player_ready",
            Self::PlayerDisconnected { .. } => "player_disconnected",
            Self::GameStart { .. } => "game_start",
            Self::GameUpdate { .. } => "game_update",
            Self::GameOver { .. } => "game_over",
        }
    }

    /// Encodes the event as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if serialization fails.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self)
            .map_err(|e| ProtocolError::new(format!("Failed to encode {}: {}", self.kind(), e)))
    }
}

/// Protocol error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Protocol error: {} at {}:{}", message, file, line)]
pub struct ProtocolError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ProtocolError {
    /// Creates a new protocol error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
