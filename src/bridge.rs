//! Bridges one WebSocket to a game session.
//!
//! Each socket gets a writer task that drains the player's outbound queue and
//! a receive loop that feeds decoded messages to the session under its lock.

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, close_code};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::protocol::ClientMessage;
use crate::registry::SessionRegistry;
use crate::session::{PlayerConnection, PlayerId, SessionId};

fn normal_close(reason: &'static str) -> Message {
    Message::Close(Some(CloseFrame {
        code: close_code::NORMAL,
        reason: Utf8Bytes::from_static(reason),
    }))
}

/// Runs a participant's connection until the socket closes.
///
/// Unknown sessions and full sessions get a normal close frame and nothing
/// else.
#[instrument(skip(socket, registry))]
pub async fn run_connection(
    mut socket: WebSocket,
    registry: SessionRegistry,
    game_id: SessionId,
    player_id: PlayerId,
) {
    let Some(session) = registry.get(&game_id).await else {
        info!("Connection for unknown session, closing");
        if let Err(e) = socket.send(normal_close("unknown game")).await {
            debug!(error = %e, "Close frame not delivered");
        }
        return;
    };

    let (mut sink, mut stream) = socket.split();
    let (connection, mut outbound) = PlayerConnection::channel();
    let connection_id = connection.id();

    let writer = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let text = match event.encode() {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Dropping unencodable event");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text.into())).await {
                debug!(error = %e, "Socket write failed, stopping writer");
                return;
            }
        }
        // Queue closed: the session refused or dropped this connection.
        if let Err(e) = sink.send(normal_close("session closed")).await {
            debug!(error = %e, "Close frame not delivered");
        }
    });

    let attached = session.lock().await.attach(player_id.clone(), connection);
    if let Err(e) = attached {
        warn!(error = %e, "Attach rejected");
        // The rejected connection was dropped, so the writer closes the socket.
        if let Err(e) = writer.await {
            debug!(error = %e, "Writer task ended abnormally");
        }
        return;
    }

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match ClientMessage::decode(text.as_str()) {
                Ok(message) => session.lock().await.handle_message(&player_id, message),
                Err(e) => debug!(error = %e, "Ignoring malformed message"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "Socket read failed");
                break;
            }
        }
    }

    session
        .lock()
        .await
        .connection_closed(&player_id, connection_id);
    writer.abort();
    info!("Connection closed");
}
