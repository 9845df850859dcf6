//! Outbound connection handles and broadcast results.

use std::sync::atomic::{AtomicU64, Ordering};

use derive_more::{Display, Error};
use tokio::sync::mpsc;
use tracing::instrument;

use crate::protocol::ServerEvent;
use crate::session::PlayerId;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one physical connection.
///
/// A player who reconnects gets a new id, which lets the session tell a stale
/// socket closing apart from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("conn-{_0}")]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Sending half of a participant's outbound queue.
///
/// Events are queued in order and drained by a single writer, so each
/// recipient sees events in the order the session emitted them.
#[derive(Debug, Clone)]
pub struct PlayerConnection {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl PlayerConnection {
    /// Creates a connection and the receiver its writer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection = Self {
            id: ConnectionId::next(),
            sender,
        };
        (connection, receiver)
    }

    /// This connection's id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues `event` for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if the receiving side has gone away.
    #[instrument(skip(self, event), fields(connection = %self.id, event = event.kind()))]
    pub fn send(&self, event: ServerEvent) -> Result<(), DeliveryError> {
        self.sender.send(event).map_err(|_| DeliveryError {
            connection: self.id,
        })
    }
}

/// The connection's receiver is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("connection {connection} is closed")]
pub struct DeliveryError {
    /// The failed connection.
    pub connection: ConnectionId,
}

/// Per-recipient result of a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    delivered: Vec<PlayerId>,
    failed: Vec<(PlayerId, DeliveryError)>,
}

impl BroadcastReport {
    pub(crate) fn record(&mut self, player_id: &str, result: Result<(), DeliveryError>) {
        match result {
            Ok(()) => self.delivered.push(player_id.to_string()),
            Err(e) => self.failed.push((player_id.to_string(), e)),
        }
    }

    /// Players the event was queued for.
    pub fn delivered(&self) -> &[PlayerId] {
        &self.delivered
    }

    /// Players whose connection rejected the event.
    pub fn failed(&self) -> &[(PlayerId, DeliveryError)] {
        &self.failed
    }

    /// Whether every attempted delivery succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
