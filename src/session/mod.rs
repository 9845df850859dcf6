//! Game session engine.
//!
//! A [`GameSession`] owns one board and two player slots. Slot X belongs to
//! the first identifier that ever attached and slot O to the second; the
//! assignment never changes for the life of the session. All mutation goes
//! through `&mut self`, so callers serialize access by holding the session
//! behind a lock (see [`crate::SharedSession`]).

mod connection;
mod player;

pub use connection::{BroadcastReport, ConnectionId, DeliveryError, PlayerConnection};
pub use player::{Player, PlayerId, PlayerStatus};

use std::sync::Arc;
use std::time::{Duration, Instant};

use derive_more::{Display, Error};
use strictly_grid::{Board, Evaluation, Position, PositionError, Symbol};
use tracing::{debug, error, info, instrument, warn};

use crate::protocol::{ClientMessage, ServerEvent};
use crate::stats::StatsRecorder;

/// Unique identifier for a game session.
pub type SessionId = String;

/// Coarse lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionPhase {
    /// Fewer than two players have joined.
    Waiting,
    /// Both slots are filled, not everyone is ready.
    ReadyPending,
    /// A match is being played.
    InProgress,
    /// The last match ended; both players must ready up again.
    Finished,
}

/// Why a move was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MoveRejection {
    /// No match is in progress.
    #[display("game not in progress")]
    NotStarted,
    /// The mover holds no slot in this session.
    #[display("player not in session")]
    UnknownPlayer,
    /// Coordinates outside the grid.
    #[display("{_0}")]
    OffBoard(PositionError),
    /// It is the other symbol's turn.
    #[display("not your turn, waiting for {turn}")]
    NotYourTurn {
        /// Symbol whose turn it is.
        turn: Symbol,
    },
    /// The cell already holds a mark.
    #[display("cell {_0} is occupied")]
    Occupied(Position),
}

/// Result of [`GameSession::handle_move`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing changed.
    Ignored(MoveRejection),
    /// The mark was placed and play passes to `next`.
    Continued {
        /// Symbol to move next.
        next: Symbol,
    },
    /// The mark completed a line.
    Won {
        /// Winning symbol.
        winner: Symbol,
        /// Identifier credited with the win.
        player_id: PlayerId,
    },
    /// The mark filled the board without a line.
    Draw,
}

impl MoveOutcome {
    /// Whether the move changed the board.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, MoveOutcome::Ignored(_))
    }
}

/// Errors returned by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    /// Both slots belong to other identifiers.
    #[display("session {session_id} already has two players, rejected {player_id}")]
    SessionFull {
        /// Session that refused the player.
        session_id: SessionId,
        /// Identifier that was refused.
        player_id: PlayerId,
    },
}

/// A two-player match and its participants.
#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    board: Board,
    player_x: Option<Player>,
    player_o: Option<Player>,
    turn: Symbol,
    started: bool,
    last_outcome: Option<Evaluation>,
    last_activity: Instant,
    stats: Arc<dyn StatsRecorder>,
}

impl GameSession {
    /// Creates an empty session.
    #[instrument(skip(stats))]
    pub fn new(id: SessionId, stats: Arc<dyn StatsRecorder>) -> Self {
        info!(session_id = %id, "Creating new game session");
        Self {
            id,
            board: Board::new(),
            player_x: None,
            player_o: None,
            turn: Symbol::X,
            started: false,
            last_outcome: None,
            last_activity: Instant::now(),
            stats,
        }
    }

    /// Session ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Symbol allowed to move.
    pub fn turn(&self) -> Symbol {
        self.turn
    }

    /// Whether a match is in progress.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Result of the most recently finished match, cleared when a new one starts.
    pub fn last_outcome(&self) -> Option<Evaluation> {
        self.last_outcome
    }

    /// Time since anything happened in this session.
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        if self.started {
            SessionPhase::InProgress
        } else if self.last_outcome.is_some() {
            SessionPhase::Finished
        } else if self.player_count() == 2 {
            SessionPhase::ReadyPending
        } else {
            SessionPhase::Waiting
        }
    }

    /// Players in join order (X first).
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.player_x.iter().chain(self.player_o.iter())
    }

    /// Number of filled slots, connected or not.
    pub fn player_count(&self) -> usize {
        self.players().count()
    }

    /// Number of players with a live connection.
    pub fn connected_count(&self) -> usize {
        self.players().filter(|p| p.is_attached()).count()
    }

    /// Looks up a player by identifier.
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players().find(|p| p.id() == player_id)
    }

    /// The player holding `symbol`'s slot.
    pub fn slot(&self, symbol: Symbol) -> Option<&Player> {
        match symbol {
            Symbol::X => self.player_x.as_ref(),
            Symbol::O => self.player_o.as_ref(),
        }
    }

    /// Symbol assigned to `player_id`, if they hold a slot.
    pub fn symbol_of(&self, player_id: &str) -> Option<Symbol> {
        self.player(player_id).map(|p| *p.symbol())
    }

    fn slot_mut(&mut self, symbol: Symbol) -> &mut Option<Player> {
        match symbol {
            Symbol::X => &mut self.player_x,
            Symbol::O => &mut self.player_o,
        }
    }

    fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.player_x
            .iter_mut()
            .chain(self.player_o.iter_mut())
            .find(|p| p.id() == player_id)
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Full board and turn, as sent after every accepted move.
    pub fn snapshot(&self) -> ServerEvent {
        ServerEvent::GameUpdate {
            board: self.board.rows(),
            turn: self.turn,
        }
    }

    /// Attaches `player_id` through `connection`.
    ///
    /// A known identifier is treated as a reconnect: the new connection
    /// replaces the old one and the slot is kept. If a match is in progress
    /// the reconnecting player privately receives its symbol and a snapshot
    /// before the join is announced.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SessionFull`] for a third distinct identifier.
    #[instrument(skip(self, connection), fields(session_id = %self.id))]
    pub fn attach(
        &mut self,
        player_id: PlayerId,
        connection: PlayerConnection,
    ) -> Result<Symbol, SessionError> {
        let (symbol, reconnecting) = match self.symbol_of(&player_id) {
            Some(symbol) => (symbol, true),
            None if self.player_x.is_none() => (Symbol::X, false),
            None if self.player_o.is_none() => (Symbol::O, false),
            None => {
                warn!(player_id = %player_id, "Session already has 2 players");
                return Err(SessionError::SessionFull {
                    session_id: self.id.clone(),
                    player_id,
                });
            }
        };

        if let Some(player) = self.player_mut(&player_id) {
            player.rebind(connection);
            info!(player_id = %player_id, %symbol, "Player reattached");
        } else {
            *self.slot_mut(symbol) = Some(Player::new(player_id.clone(), symbol, connection));
            info!(player_id = %player_id, %symbol, "Player joined");
        }
        self.touch();

        if reconnecting && self.started {
            debug!(player_id = %player_id, "Resynchronizing reconnected player");
            self.send_to(symbol, ServerEvent::GameStart {
                this_player: symbol,
            });
            self.send_to(symbol, self.snapshot());
        }

        self.broadcast(ServerEvent::PlayerJoined {
            player_id: player_id.clone(),
        });
        self.attempt_start();
        Ok(symbol)
    }

    /// Marks `player_id` as ready and tries to start the match.
    ///
    /// Returns `false` if the player is unknown.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn mark_ready(&mut self, player_id: &str) -> bool {
        let Some(player) = self.player_mut(player_id) else {
            debug!("Ready from unknown player");
            return false;
        };
        player.set_status(PlayerStatus::Ready);
        self.touch();
        info!("Player ready");

        self.broadcast(ServerEvent::PlayerReady {
            player_id: player_id.to_string(),
        });
        self.attempt_start();
        true
    }

    /// Starts a match if both slots are filled and both players are ready.
    ///
    /// A match already in progress is never restarted.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn attempt_start(&mut self) -> bool {
        if self.started {
            return false;
        }
        let both_ready = matches!(
            (&self.player_x, &self.player_o),
            (Some(x), Some(o)) if x.is_ready() && o.is_ready()
        );
        if !both_ready {
            debug!(phase = %self.phase(), "Not starting yet");
            return false;
        }

        self.board = Board::new();
        self.turn = Symbol::X;
        self.started = true;
        self.last_outcome = None;
        info!("Match started");

        for symbol in [Symbol::X, Symbol::O] {
            self.send_to(symbol, ServerEvent::GameStart {
                this_player: symbol,
            });
        }
        true
    }

    /// Applies a move from `player_id` at `(row, col)`.
    ///
    /// Invalid moves change nothing and send nothing; the reason is returned
    /// for the caller's benefit only.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn handle_move(&mut self, player_id: &str, row: i64, col: i64) -> MoveOutcome {
        let outcome = self.try_move(player_id, row, col);
        match &outcome {
            MoveOutcome::Ignored(reason) => debug!(%reason, "Move ignored"),
            accepted => info!(outcome = ?accepted, "Move accepted"),
        }
        outcome
    }

    fn try_move(&mut self, player_id: &str, row: i64, col: i64) -> MoveOutcome {
        if !self.started {
            return MoveOutcome::Ignored(MoveRejection::NotStarted);
        }
        let Some(symbol) = self.symbol_of(player_id) else {
            return MoveOutcome::Ignored(MoveRejection::UnknownPlayer);
        };
        let pos = match Position::from_coords(row, col) {
            Ok(pos) => pos,
            Err(e) => return MoveOutcome::Ignored(MoveRejection::OffBoard(e)),
        };
        if self.turn != symbol {
            return MoveOutcome::Ignored(MoveRejection::NotYourTurn { turn: self.turn });
        }
        if !self.board.is_empty(pos) {
            return MoveOutcome::Ignored(MoveRejection::Occupied(pos));
        }

        self.board.place(pos, symbol);
        self.touch();

        match self.board.evaluate() {
            Evaluation::Win(winner) => {
                self.broadcast(self.snapshot());
                self.broadcast(ServerEvent::GameOver {
                    winner: Some(winner),
                });

                let winner_id = self
                    .slot(winner)
                    .map_or_else(|| player_id.to_string(), |p| p.id().clone());
                if let Err(e) = self.stats.record_win(&winner_id) {
                    error!(player_id = %winner_id, error = %e, "Failed to record win");
                }

                self.finish(Evaluation::Win(winner));
                MoveOutcome::Won {
                    winner,
                    player_id: winner_id,
                }
            }
            Evaluation::Draw => {
                self.broadcast(self.snapshot());
                self.broadcast(ServerEvent::GameOver { winner: None });
                self.finish(Evaluation::Draw);
                MoveOutcome::Draw
            }
            Evaluation::InProgress => {
                self.turn = self.turn.opponent();
                self.broadcast(self.snapshot());
                MoveOutcome::Continued { next: self.turn }
            }
        }
    }

    /// Ends the match. Readiness is cleared so both players must ready up
    /// again for a rematch.
    fn finish(&mut self, outcome: Evaluation) {
        self.started = false;
        self.last_outcome = Some(outcome);
        for player in self.player_x.iter_mut().chain(self.player_o.iter_mut()) {
            if player.is_ready() {
                player.set_status(PlayerStatus::Connected);
            }
        }
        info!(session_id = %self.id, ?outcome, board = %self.board.display(), "Match finished");
    }

    /// Marks `player_id` as disconnected.
    ///
    /// The slot, symbol and any running match are untouched.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn handle_disconnect(&mut self, player_id: &str) -> bool {
        let Some(player) = self.player_mut(player_id) else {
            debug!("Disconnect from unknown player");
            return false;
        };
        player.set_status(PlayerStatus::Disconnected);
        self.touch();
        info!("Player disconnected");

        self.broadcast(ServerEvent::PlayerDisconnected {
            player_id: player_id.to_string(),
        });
        true
    }

    /// Handles the close of `connection` for `player_id`.
    ///
    /// Ignored when the player has since reattached on another connection.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn connection_closed(&mut self, player_id: &str, connection: ConnectionId) -> bool {
        match self.player(player_id) {
            Some(player) if player.connection().id() == connection => {
                self.handle_disconnect(player_id)
            }
            Some(_) => {
                debug!(%connection, "Stale connection closed after reattach");
                false
            }
            None => false,
        }
    }

    /// Dispatches a decoded client message.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn handle_message(&mut self, player_id: &str, message: ClientMessage) {
        match message {
            ClientMessage::Ready => {
                self.mark_ready(player_id);
            }
            ClientMessage::Move(request) => {
                self.handle_move(player_id, request.row, request.col);
            }
            ClientMessage::Unknown(kind) => {
                debug!(kind = %kind, "Ignoring unknown message type");
            }
        }
    }

    /// Sends `event` to every attached player.
    ///
    /// Each delivery is independent; a failure is logged and recorded in the
    /// report while the remaining players still receive the event.
    #[instrument(skip(self, event), fields(session_id = %self.id, event = event.kind()))]
    pub fn broadcast(&self, event: ServerEvent) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for player in self.players().filter(|p| p.is_attached()) {
            let result = player.connection().send(event.clone());
            if let Err(e) = &result {
                warn!(player_id = %player.id(), error = %e, "Failed to deliver event");
            }
            report.record(player.id(), result);
        }
        debug!(
            delivered = report.delivered().len(),
            failed = report.failed().len(),
            "Broadcast complete"
        );
        report
    }

    fn send_to(&self, symbol: Symbol, event: ServerEvent) {
        let Some(player) = self.slot(symbol) else {
            return;
        };
        if !player.is_attached() {
            return;
        }
        if let Err(e) = player.connection().send(event) {
            warn!(player_id = %player.id(), error = %e, "Failed to deliver private event");
        }
    }
}
