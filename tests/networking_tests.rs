//! Networking Tests
//!
//! Server variant wired to a live orchestrator: validated moves travel through
//! the command queue and come back out as broadcast messages.

use crossbeam_channel::{bounded, Receiver};
use kungfu_chess::core::GameSettings;
use kungfu_chess::game::{BoardLayout, EventBus, GameContext, ManualClock, Orchestrator};
use kungfu_chess::networking::{Broadcaster, Recipient, ServerGame};
use shared::{ClientMessage, GameStatus, PlayerColor, ServerMessage};
use std::sync::Arc;

fn server_setup() -> (
    Orchestrator<ManualClock>,
    ManualClock,
    ServerGame,
    Receiver<ServerMessage>,
) {
    let bus = Arc::new(EventBus::new());
    let settings = GameSettings::default();
    let ctx = GameContext::from_layout(&BoardLayout::standard(), &settings, Arc::clone(&bus), 0)
        .expect("standard layout");
    let clock = ManualClock::new(0);
    let orch = Orchestrator::new(ctx, clock.clone(), &settings);

    let server = ServerGame::new(orch.sender());
    let (outbox, inbox) = bounded(64);
    Broadcaster::attach(&bus, outbox, server.session());
    (orch, clock, server, inbox)
}

#[test]
fn test_validated_move_is_broadcast() {
    let (mut orch, clock, mut server, inbox) = server_setup();
    let (white, _) = server.join(orch.context());
    let (_, started) = server.join(orch.context());
    assert!(started
        .iter()
        .any(|out| out.to == Recipient::Everyone
            && matches!(out.message, ServerMessage::GameStarted { .. })));
    orch.start();

    let replies = server.handle_message(
        orch.context(),
        &white,
        ClientMessage::Move {
            piece_id: "PW4".to_string(),
            from: (6, 3),
            to: (5, 3),
        },
        orch.now_ms(),
    );
    assert!(replies.is_empty(), "accepted moves get no direct reply");

    clock.set(16);
    orch.tick();

    let sent: Vec<ServerMessage> = inbox.try_iter().collect();
    assert!(sent.contains(&ServerMessage::MoveExecuted {
        piece_id: "PW4".to_string(),
        from: (6, 3),
        to: (5, 3),
        player: PlayerColor::White,
    }));
}

#[test]
fn test_opponent_piece_rejected_with_error_message() {
    let (orch, _clock, mut server, inbox) = server_setup();
    let (white, _) = server.join(orch.context());
    server.join(orch.context());

    let replies = server.handle_message(
        orch.context(),
        &white,
        ClientMessage::Move {
            piece_id: "PB1".to_string(),
            from: (1, 0),
            to: (2, 0),
        },
        0,
    );
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].to, Recipient::Player(white));
    assert_eq!(
        replies[0].message,
        ServerMessage::error("You can only move your own pieces")
    );
    assert!(inbox.try_recv().is_err());
}

#[test]
fn test_state_request_reflects_session() {
    let (orch, _clock, mut server, _inbox) = server_setup();
    let (white, _) = server.join(orch.context());

    let replies = server.handle_message(orch.context(), &white, ClientMessage::GetState, 0);
    match &replies[0].message {
        ServerMessage::GameState {
            pieces,
            game_status,
            current_turn,
            winner,
        } => {
            assert_eq!(pieces.len(), 32);
            assert_eq!(*game_status, GameStatus::Waiting);
            assert_eq!(*current_turn, PlayerColor::White);
            assert!(winner.is_none());
        }
        other => panic!("expected game_state, got {:?}", other),
    }
}

#[test]
fn test_client_message_wire_round_trip() {
    let raw = r#"{"type":"capture","piece_id":"QW1","from":[7,3],"to":[1,3]}"#;
    let decoded: ClientMessage = serde_json::from_str(raw).expect("valid message");
    assert_eq!(
        decoded,
        ClientMessage::Capture {
            piece_id: "QW1".to_string(),
            from: (7, 3),
            to: (1, 3),
        }
    );
}

#[test]
fn test_session_thread_forwards_messages_to_game_thread() {
    //! Sessions only forward raw messages; validation runs on the thread that
    //! owns the orchestrator, between ticks
    let (mut orch, clock, mut server, inbox) = server_setup();
    let (white, _) = server.join(orch.context());
    server.join(orch.context());
    orch.start();

    let (to_game, from_sessions) = bounded::<(String, ClientMessage)>(8);
    let session = std::thread::spawn(move || {
        to_game
            .send((
                white,
                ClientMessage::Move {
                    piece_id: "PW2".to_string(),
                    from: (6, 1),
                    to: (5, 1),
                },
            ))
            .expect("game thread alive");
    });
    session.join().expect("session thread");

    for (player, message) in from_sessions.try_iter() {
        let replies = server.handle_message(orch.context(), &player, message, orch.now_ms());
        assert!(replies.is_empty());
    }
    clock.set(16);
    orch.tick();

    let sent: Vec<ServerMessage> = inbox.try_iter().collect();
    assert!(sent.iter().any(|message| matches!(
        message,
        ServerMessage::MoveExecuted { piece_id, to: (5, 1), .. } if piece_id == "PW2"
    )));
}
