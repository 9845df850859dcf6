//! Participants of a session.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use strictly_grid::Symbol;

use crate::session::PlayerConnection;

/// Unique identifier for a player, supplied by the caller.
pub type PlayerId = String;

/// Presence and readiness of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlayerStatus {
    /// Attached, not yet ready.
    Connected,
    /// Attached and waiting for the match to start.
    Ready,
    /// Connection closed; the slot is kept for reattachment.
    Disconnected,
}

/// A player occupying one of the two slots.
#[derive(Debug, Clone, Getters)]
pub struct Player {
    /// Player's unique ID.
    id: PlayerId,
    /// Fixed by join order.
    symbol: Symbol,
    /// Presence and readiness.
    status: PlayerStatus,
    #[getter(skip)]
    connection: PlayerConnection,
}

impl Player {
    pub(crate) fn new(id: PlayerId, symbol: Symbol, connection: PlayerConnection) -> Self {
        Self {
            id,
            symbol,
            status: PlayerStatus::Connected,
            connection,
        }
    }

    /// The currently bound connection.
    pub fn connection(&self) -> &PlayerConnection {
        &self.connection
    }

    /// Whether this player has a live connection.
    pub fn is_attached(&self) -> bool {
        self.status != PlayerStatus::Disconnected
    }

    /// Whether this player has signalled readiness.
    pub fn is_ready(&self) -> bool {
        self.status == PlayerStatus::Ready
    }

    pub(crate) fn set_status(&mut self, status: PlayerStatus) {
        self.status = status;
    }

    pub(crate) fn rebind(&mut self, connection: PlayerConnection) {
        self.connection = connection;
        self.status = PlayerStatus::Connected;
    }
}
