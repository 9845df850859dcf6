//! Tests for the game session state machine.

mod common;

use std::sync::Arc;

use common::{FailingStats, drain, join, joined, new_session, start_event, started_session};
use strictly_duel::{
    Cell, ClientMessage, Evaluation, GameSession, MoveOutcome, MoveRejection, MoveRequest,
    PlayerConnection, PlayerStatus, Position, PositionError, ServerEvent, SessionError,
    SessionPhase, Symbol,
};

fn cell(session: &GameSession, row: usize, col: usize) -> Cell {
    session.board().get(Position::new(row, col).unwrap())
}

#[test]
fn test_join_order_assigns_symbols() {
    let (mut session, _stats) = new_session();
    let _alice = join(&mut session, "alice");
    assert_eq!(session.phase(), SessionPhase::Waiting);
    let _bob = join(&mut session, "bob");

    assert_eq!(session.symbol_of("alice"), Some(Symbol::X));
    assert_eq!(session.symbol_of("bob"), Some(Symbol::O));
    assert_eq!(session.phase(), SessionPhase::ReadyPending);
    assert!(!session.is_started());
}

#[test]
fn test_both_ready_starts_match() {
    let (mut session, _stats) = new_session();
    let mut alice = join(&mut session, "alice");
    let mut bob = join(&mut session, "bob");

    assert!(session.mark_ready("alice"));
    assert!(!session.is_started());
    assert!(session.mark_ready("bob"));

    assert_eq!(session.phase(), SessionPhase::InProgress);
    assert_eq!(session.turn(), Symbol::X);
    assert_eq!(session.board().occupied(), 0);

    let ready = |id: &str| ServerEvent::PlayerReady {
        player_id: id.to_string(),
    };
    assert_eq!(
        drain(&mut alice),
        vec![
            joined("alice"),
            joined("bob"),
            ready("alice"),
            ready("bob"),
            start_event(Symbol::X),
        ]
    );
    assert_eq!(
        drain(&mut bob),
        vec![joined("bob"), ready("alice"), ready("bob"), start_event(Symbol::O)]
    );
}

#[test]
fn test_ready_from_unknown_player_is_noop() {
    let (mut session, _stats) = new_session();
    let mut alice = join(&mut session, "alice");
    drain(&mut alice);

    assert!(!session.mark_ready("mallory"));
    assert!(drain(&mut alice).is_empty());
}

#[test]
fn test_alice_wins_on_diagonal() {
    let (mut session, stats, mut alice, mut bob) = started_session();

    let outcome = session.handle_move("alice", 0, 0);
    assert_eq!(outcome, MoveOutcome::Continued { next: Symbol::O });
    assert_eq!(cell(&session, 0, 0), Cell::Occupied(Symbol::X));
    assert_eq!(session.turn(), Symbol::O);
    assert!(matches!(
        drain(&mut bob).as_slice(),
        [ServerEvent::GameUpdate { turn: Symbol::O, .. }]
    ));

    // Occupied cell: nothing changes, nothing is sent.
    drain(&mut alice);
    let outcome = session.handle_move("bob", 0, 0);
    let occupied = Position::new(0, 0).unwrap();
    assert_eq!(outcome, MoveOutcome::Ignored(MoveRejection::Occupied(occupied)));
    assert_eq!(session.turn(), Symbol::O);
    assert!(drain(&mut alice).is_empty());
    assert!(drain(&mut bob).is_empty());

    assert!(!session.handle_move("alice", 1, 1).is_accepted());
    assert!(session.handle_move("bob", 0, 1).is_accepted());
    assert!(session.handle_move("alice", 1, 1).is_accepted());
    assert!(session.handle_move("bob", 2, 0).is_accepted());
    drain(&mut alice);
    drain(&mut bob);

    let outcome = session.handle_move("alice", 2, 2);
    assert_eq!(
        outcome,
        MoveOutcome::Won {
            winner: Symbol::X,
            player_id: "alice".to_string(),
        }
    );

    let events = drain(&mut bob);
    assert_eq!(events.len(), 2);
    match &events[0] {
        ServerEvent::GameUpdate { board, .. } => {
            assert_eq!(board[2][2], Cell::Occupied(Symbol::X));
        }
        other => panic!("expected game_update, got {other:?}"),
    }
    assert_eq!(
        events[1],
        ServerEvent::GameOver {
            winner: Some(Symbol::X)
        }
    );
    assert_eq!(drain(&mut alice), events);

    assert_eq!(stats.calls(), vec!["alice".to_string()]);
    assert!(!session.is_started());
    assert_eq!(session.phase(), SessionPhase::Finished);
    assert_eq!(session.last_outcome(), Some(Evaluation::Win(Symbol::X)));

    // The finished board accepts nothing more.
    assert_eq!(
        session.handle_move("bob", 1, 0),
        MoveOutcome::Ignored(MoveRejection::NotStarted)
    );
    assert_eq!(stats.calls().len(), 1);
}

#[test]
fn test_full_board_without_line_is_draw() {
    let (mut session, stats, mut alice, _bob) = started_session();

    // X O X
    // X O O
    // O X X
    let moves = [
        ("alice", 0, 0),
        ("bob", 0, 1),
        ("alice", 0, 2),
        ("bob", 1, 1),
        ("alice", 1, 0),
        ("bob", 1, 2),
        ("alice", 2, 1),
        ("bob", 2, 0),
    ];
    for (player, row, col) in moves {
        assert!(
            matches!(session.handle_move(player, row, col), MoveOutcome::Continued { .. }),
            "{player} at ({row}, {col})"
        );
    }
    drain(&mut alice);

    assert_eq!(session.handle_move("alice", 2, 2), MoveOutcome::Draw);
    let events = drain(&mut alice);
    assert!(matches!(events[0], ServerEvent::GameUpdate { .. }));
    assert_eq!(events[1], ServerEvent::GameOver { winner: None });
    assert!(stats.calls().is_empty());
    assert_eq!(session.last_outcome(), Some(Evaluation::Draw));
    assert!(!session.is_started());
}

#[test]
fn test_wrong_turn_is_ignored() {
    let (mut session, _stats, mut alice, mut bob) = started_session();

    let outcome = session.handle_move("bob", 1, 1);
    assert_eq!(
        outcome,
        MoveOutcome::Ignored(MoveRejection::NotYourTurn { turn: Symbol::X })
    );
    assert_eq!(session.board().occupied(), 0);
    assert!(drain(&mut alice).is_empty());
    assert!(drain(&mut bob).is_empty());
}

#[test]
fn test_move_before_start_is_ignored() {
    let (mut session, _stats) = new_session();
    let _alice = join(&mut session, "alice");
    let _bob = join(&mut session, "bob");

    assert_eq!(
        session.handle_move("alice", 0, 0),
        MoveOutcome::Ignored(MoveRejection::NotStarted)
    );
    assert_eq!(session.board().occupied(), 0);
}

#[test]
fn test_off_board_coordinates_are_ignored() {
    let (mut session, _stats, mut alice, _bob) = started_session();

    assert_eq!(
        session.handle_move("alice", 3, 0),
        MoveOutcome::Ignored(MoveRejection::OffBoard(PositionError { row: 3, col: 0 }))
    );
    assert_eq!(
        session.handle_move("alice", 0, -1),
        MoveOutcome::Ignored(MoveRejection::OffBoard(PositionError { row: 0, col: -1 }))
    );
    assert_eq!(session.turn(), Symbol::X);
    assert!(drain(&mut alice).is_empty());
}

#[test]
fn test_unknown_player_move_is_ignored() {
    let (mut session, _stats, _alice, _bob) = started_session();
    assert_eq!(
        session.handle_move("mallory", 0, 0),
        MoveOutcome::Ignored(MoveRejection::UnknownPlayer)
    );
}

#[test]
fn test_third_player_is_rejected() {
    let (mut session, _stats) = new_session();
    let mut alice = join(&mut session, "alice");
    let _bob = join(&mut session, "bob");
    drain(&mut alice);

    let (connection, _rx) = PlayerConnection::channel();
    let err = session
        .attach("carol".to_string(), connection)
        .unwrap_err();
    assert_eq!(
        err,
        SessionError::SessionFull {
            session_id: "test-session".to_string(),
            player_id: "carol".to_string(),
        }
    );
    assert_eq!(session.player_count(), 2);
    assert!(session.player("carol").is_none());
    assert!(drain(&mut alice).is_empty());
}

#[test]
fn test_symbols_survive_disconnect_and_reconnect() {
    let (mut session, _stats) = new_session();
    let _alice = join(&mut session, "alice");
    let _bob = join(&mut session, "bob");

    assert!(session.handle_disconnect("alice"));
    assert!(session.handle_disconnect("bob"));
    let _bob = join(&mut session, "bob");
    let _alice = join(&mut session, "alice");

    assert_eq!(session.symbol_of("alice"), Some(Symbol::X));
    assert_eq!(session.symbol_of("bob"), Some(Symbol::O));
    assert_eq!(session.player_count(), 2);
}

#[test]
fn test_reconnect_mid_match_resynchronizes() {
    let (mut session, _stats, _alice, mut bob) = started_session();
    assert!(session.handle_move("alice", 1, 1).is_accepted());
    session.handle_disconnect("alice");
    drain(&mut bob);

    let mut alice = join(&mut session, "alice");

    let events = drain(&mut alice);
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], start_event(Symbol::X));
    assert_eq!(events[1], session.snapshot());
    match &events[1] {
        ServerEvent::GameUpdate { board, turn } => {
            assert_eq!(board[1][1], Cell::Occupied(Symbol::X));
            assert_eq!(*turn, Symbol::O);
        }
        other => panic!("expected game_update, got {other:?}"),
    }
    assert_eq!(events[2], joined("alice"));

    assert_eq!(drain(&mut bob), vec![joined("alice")]);
    assert!(session.is_started());
    assert_eq!(session.board().occupied(), 1);
}

#[test]
fn test_disconnect_mid_match_keeps_game_running() {
    let (mut session, _stats, _alice, mut bob) = started_session();
    assert!(session.handle_move("alice", 0, 0).is_accepted());
    drain(&mut bob);

    assert!(session.handle_disconnect("alice"));
    assert_eq!(
        drain(&mut bob),
        vec![ServerEvent::PlayerDisconnected {
            player_id: "alice".to_string()
        }]
    );
    assert_eq!(
        session.player("alice").map(|p| *p.status()),
        Some(PlayerStatus::Disconnected)
    );
    assert!(session.is_started());

    assert_eq!(
        session.handle_move("bob", 2, 2),
        MoveOutcome::Continued { next: Symbol::X }
    );
    let events = drain(&mut bob);
    assert!(matches!(events.as_slice(), [ServerEvent::GameUpdate { turn: Symbol::X, .. }]));
}

#[test]
fn test_stale_connection_close_is_ignored() {
    let (mut session, _stats) = new_session();
    let (old, _old_rx) = PlayerConnection::channel();
    let old_id = old.id();
    session.attach("alice".to_string(), old).unwrap();
    let _alice = join(&mut session, "alice");

    assert!(!session.connection_closed("alice", old_id));
    assert_eq!(
        session.player("alice").map(|p| *p.status()),
        Some(PlayerStatus::Connected)
    );

    let current = session.player("alice").unwrap().connection().id();
    assert!(session.connection_closed("alice", current));
    assert_eq!(session.connected_count(), 0);
}

#[test]
fn test_broadcast_isolates_failed_connection() {
    let (mut session, _stats) = new_session();
    let alice = join(&mut session, "alice");
    let mut bob = join(&mut session, "bob");
    drain(&mut bob);
    drop(alice);

    let event = ServerEvent::GameOver { winner: None };
    let report = session.broadcast(event.clone());

    assert!(!report.is_clean());
    assert_eq!(report.delivered(), ["bob".to_string()]);
    assert_eq!(report.failed().len(), 1);
    assert_eq!(report.failed()[0].0, "alice");
    assert_eq!(drain(&mut bob), vec![event]);
}

#[test]
fn test_broadcast_skips_disconnected_players() {
    let (mut session, _stats) = new_session();
    let _alice = join(&mut session, "alice");
    let _bob = join(&mut session, "bob");
    session.handle_disconnect("alice");

    let report = session.broadcast(ServerEvent::GameOver { winner: None });
    assert!(report.is_clean());
    assert_eq!(report.delivered(), ["bob".to_string()]);
}

#[test]
fn test_rematch_requires_fresh_readiness() {
    let (mut session, stats, mut alice, _bob) = started_session();
    for (player, row, col) in [
        ("alice", 0, 0),
        ("bob", 1, 0),
        ("alice", 0, 1),
        ("bob", 1, 1),
        ("alice", 0, 2),
    ] {
        session.handle_move(player, row, col);
    }
    assert_eq!(stats.calls(), vec!["alice".to_string()]);
    assert!(session.players().all(|p| *p.status() == PlayerStatus::Connected));

    assert!(session.mark_ready("bob"));
    assert!(!session.is_started());
    assert_eq!(session.phase(), SessionPhase::Finished);

    drain(&mut alice);
    assert!(session.mark_ready("alice"));
    assert!(session.is_started());
    assert_eq!(session.board().occupied(), 0);
    assert_eq!(session.turn(), Symbol::X);
    assert_eq!(session.last_outcome(), None);
    assert_eq!(drain(&mut alice).last(), Some(&start_event(Symbol::X)));
}

#[test]
fn test_ready_mid_match_does_not_restart() {
    let (mut session, _stats, _alice, _bob) = started_session();
    assert!(session.handle_move("alice", 0, 0).is_accepted());

    assert!(session.mark_ready("alice"));
    assert!(session.is_started());
    assert_eq!(session.board().occupied(), 1);
    assert_eq!(session.turn(), Symbol::O);
}

#[test]
fn test_handle_message_dispatch() {
    let (mut session, _stats) = new_session();
    let _alice = join(&mut session, "alice");
    let _bob = join(&mut session, "bob");

    session.handle_message("alice", ClientMessage::Unknown("chat".to_string()));
    session.handle_message("alice", ClientMessage::Ready);
    session.handle_message("bob", ClientMessage::Ready);
    assert!(session.is_started());

    session.handle_message("alice", ClientMessage::Move(MoveRequest { row: 1, col: 2 }));
    assert_eq!(cell(&session, 1, 2), Cell::Occupied(Symbol::X));
}

#[test]
fn test_win_finishes_even_when_stats_fail() {
    let mut session = GameSession::new("failing-stats".to_string(), Arc::new(FailingStats));
    let mut alice = join(&mut session, "alice");
    let mut bob = join(&mut session, "bob");
    session.mark_ready("alice");
    session.mark_ready("bob");
    drain(&mut alice);
    drain(&mut bob);

    for (player, row, col) in [
        ("alice", 0, 0),
        ("bob", 0, 1),
        ("alice", 1, 1),
        ("bob", 0, 2),
    ] {
        assert!(session.handle_move(player, row, col).is_accepted());
    }
    let outcome = session.handle_move("alice", 2, 2);

    assert_eq!(
        outcome,
        MoveOutcome::Won {
            winner: Symbol::X,
            player_id: "alice".to_string(),
        }
    );
    assert!(!session.is_started());
    assert_eq!(session.last_outcome(), Some(Evaluation::Win(Symbol::X)));
    let game_over = ServerEvent::GameOver {
        winner: Some(Symbol::X),
    };
    assert_eq!(drain(&mut bob).last(), Some(&game_over));
    assert_eq!(drain(&mut alice).last(), Some(&game_over));
}
