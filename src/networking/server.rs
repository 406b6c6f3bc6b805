//! Headless server variant
//!
//! [`ServerGame`] is the validating collaborator between player sessions and
//! the engine: it seats two players, checks each requested move against the
//! authoritative [`GameContext`] and only then pushes a [`Command`] into the
//! orchestrator's queue. It never mutates piece state itself.
//!
//! # Threading
//!
//! The `&GameContext` every validating call takes is only reachable through
//! [`Orchestrator::context`](crate::game::Orchestrator::context), so
//! [`ServerGame::join`], [`ServerGame::handle_message`] and
//! [`ServerGame::validate_move`] run on the orchestrator thread, between
//! ticks. Session threads forward raw [`ClientMessage`]s to that thread and
//! never hold game state themselves; the only state they share is the
//! [`SessionState`] behind its lock.
//!
//! [`Broadcaster`] is an event-bus observer that turns engine events into
//! outgoing [`ServerMessage`]s. It hands them to a channel with `try_send` so a
//! slow transport never stalls the tick loop.

use crate::game::command::{Command, CommandKind};
use crate::game::context::GameContext;
use crate::game::event_bus::{handler, EventBus};
use crate::game::events::{Event, EventType};
use crate::game::orchestrator::CommandSender;
use crate::game::types::{Cell, Millis, PieceId, Side};
use crossbeam_channel::{Sender, TrySendError};
use parking_lot::RwLock;
use shared::{ClientMessage, GameStatus, PieceView, PlayerColor, Position, ServerMessage};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Why a requested move never reached the engine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MoveRejection {
    #[error("Game is not in progress")]
    NotInProgress,

    #[error("Unknown player '{0}'")]
    UnknownPlayer(String),

    #[error("You can only move your own pieces")]
    NotYourPiece,

    #[error("Piece {0} not found")]
    PieceNotFound(String),

    #[error("Piece {piece_id} is at {actual:?}, not {claimed:?}")]
    OriginMismatch {
        piece_id: String,
        actual: Position,
        claimed: Position,
    },

    #[error("Invalid destination position: {0:?}")]
    OutOfBounds(Position),

    #[error("Cannot capture own piece at {0:?}")]
    OwnPieceAtDestination(Position),

    #[error("Server is busy, try again")]
    QueueFull,

    #[error("Game loop has stopped")]
    QueueClosed,
}

/// Who an outgoing message is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Player(String),
    Everyone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub to: Recipient,
    pub message: ServerMessage,
}

impl Outgoing {
    fn player(id: &str, message: ServerMessage) -> Self {
        Self {
            to: Recipient::Player(id.to_string()),
            message,
        }
    }

    fn everyone(message: ServerMessage) -> Self {
        Self {
            to: Recipient::Everyone,
            message,
        }
    }
}

/// Session state shared between [`ServerGame`] and [`Broadcaster`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub status: GameStatus,
    pub current_turn: PlayerColor,
    pub winner: Option<PlayerColor>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: GameStatus::Waiting,
            current_turn: PlayerColor::White,
            winner: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub color: PlayerColor,
}

pub fn color_of(side: Side) -> PlayerColor {
    match side {
        Side::White => PlayerColor::White,
        Side::Black => PlayerColor::Black,
    }
}

pub fn side_of(color: PlayerColor) -> Side {
    match color {
        PlayerColor::White => Side::White,
        PlayerColor::Black => Side::Black,
    }
}

/// Seating, validation and command submission for one game
///
/// Lives on the orchestrator thread next to the [`GameContext`] it validates
/// against.
pub struct ServerGame {
    players: Vec<Player>,
    joined: u32,
    session: Arc<RwLock<SessionState>>,
    commands: CommandSender,
}

impl ServerGame {
    pub fn new(commands: CommandSender) -> Self {
        Self {
            players: Vec::new(),
            joined: 0,
            session: Arc::new(RwLock::new(SessionState::default())),
            commands,
        }
    }

    /// Handle for observers that update the session from engine events
    pub fn session(&self) -> Arc<RwLock<SessionState>> {
        Arc::clone(&self.session)
    }

    pub fn status(&self) -> GameStatus {
        self.session.read().status
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Seat a newly connected player
    ///
    /// The first two players get white and black; the second one starts the
    /// game. Anyone after that is turned away.
    pub fn join(&mut self, ctx: &GameContext) -> (String, Vec<Outgoing>) {
        self.joined += 1;
        let player_id = format!("player_{}", self.joined);

        let color = match self.players.as_slice() {
            [] => PlayerColor::White,
            [first] => first.color.opponent(),
            _ => {
                warn!("[SERVER] Rejecting {}: game is full", player_id);
                let reply = Outgoing::player(
                    &player_id,
                    ServerMessage::error("Game is full. Only 2 players allowed."),
                );
                return (player_id, vec![reply]);
            }
        };

        info!("[SERVER] {} joined as {:?}", player_id, color);
        self.players.push(Player {
            id: player_id.clone(),
            color,
        });

        let mut out = vec![Outgoing::player(
            &player_id,
            ServerMessage::Welcome {
                player_id: player_id.clone(),
                color,
                message: format!("Welcome! You are playing as {}", color_name(color)),
            },
        )];

        if self.players.len() == 2 {
            out.extend(self.start(ctx));
        }
        (player_id, out)
    }

    /// Drop a disconnected player; a running game pauses
    pub fn leave(&mut self, player_id: &str) -> Vec<Outgoing> {
        let before = self.players.len();
        self.players.retain(|p| p.id != player_id);
        if self.players.len() == before {
            return Vec::new();
        }
        info!("[SERVER] {} left", player_id);

        let mut session = self.session.write();
        if session.status == GameStatus::Playing && !self.players.is_empty() {
            session.status = GameStatus::Waiting;
            return vec![Outgoing::everyone(ServerMessage::PlayerDisconnected {
                message: "Other player disconnected. Game paused.".to_string(),
            })];
        }
        Vec::new()
    }

    fn start(&mut self, ctx: &GameContext) -> Vec<Outgoing> {
        {
            let mut session = self.session.write();
            session.status = GameStatus::Playing;
            session.current_turn = PlayerColor::White;
            session.winner = None;
        }
        info!("[SERVER] Both players seated, starting game");
        vec![
            Outgoing::everyone(ServerMessage::GameStarted {
                message: "Real-time chess game started! Both players can move anytime - no turns!"
                    .to_string(),
            }),
            Outgoing::everyone(self.game_state(ctx)),
        ]
    }

    /// Dispatch one client message
    ///
    /// Call between ticks on the orchestrator thread; `ctx` must be the
    /// orchestrator's own context.
    pub fn handle_message(
        &mut self,
        ctx: &GameContext,
        player_id: &str,
        message: ClientMessage,
        now: Millis,
    ) -> Vec<Outgoing> {
        let (kind, piece_id, from, to) = match message {
            ClientMessage::GetState => {
                return vec![Outgoing::player(player_id, self.game_state(ctx))];
            }
            ClientMessage::Move { piece_id, from, to } => (CommandKind::Move, piece_id, from, to),
            ClientMessage::Capture { piece_id, from, to } => {
                (CommandKind::Capture, piece_id, from, to)
            }
        };

        match self.submit_move(ctx, player_id, kind, &piece_id, from, to, now) {
            Ok(()) => Vec::new(),
            Err(rejection) => {
                warn!("[SERVER] Move from {} rejected: {}", player_id, rejection);
                vec![Outgoing::player(
                    player_id,
                    ServerMessage::error(rejection.to_string()),
                )]
            }
        }
    }

    /// Validate a move and enqueue it for the next tick
    #[allow(clippy::too_many_arguments)]
    pub fn submit_move(
        &self,
        ctx: &GameContext,
        player_id: &str,
        kind: CommandKind,
        piece_id: &str,
        from: Position,
        to: Position,
        now: Millis,
    ) -> Result<(), MoveRejection> {
        self.validate_move(ctx, player_id, piece_id, from, to)?;

        let cmd = Command::new(now, piece_id, kind, vec![Cell::from(from), Cell::from(to)]);
        match self.commands.try_send(cmd) {
            Ok(()) => {
                info!("[SERVER] Queued {} {:?} -> {:?}", piece_id, from, to);
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(MoveRejection::QueueFull),
            Err(TrySendError::Disconnected(_)) => Err(MoveRejection::QueueClosed),
        }
    }

    /// Checks a move must pass before it reaches the engine
    pub fn validate_move(
        &self,
        ctx: &GameContext,
        player_id: &str,
        piece_id: &str,
        from: Position,
        to: Position,
    ) -> Result<(), MoveRejection> {
        if self.status() != GameStatus::Playing {
            return Err(MoveRejection::NotInProgress);
        }
        let player = self
            .player(player_id)
            .ok_or_else(|| MoveRejection::UnknownPlayer(player_id.to_string()))?;
        let side = side_of(player.color);

        match PieceId::parse(piece_id) {
            Some(id) if id.side() == side => {}
            _ => return Err(MoveRejection::NotYourPiece),
        }

        let piece = ctx
            .piece(piece_id)
            .ok_or_else(|| MoveRejection::PieceNotFound(piece_id.to_string()))?;

        let actual: Position = piece.current_cell().into();
        if actual != from {
            return Err(MoveRejection::OriginMismatch {
                piece_id: piece_id.to_string(),
                actual,
                claimed: from,
            });
        }

        let target = Cell::from(to);
        if !ctx.board().contains(target) {
            return Err(MoveRejection::OutOfBounds(to));
        }
        if ctx
            .occupancy()
            .at(target)
            .iter()
            .any(|other| other.as_str() != piece_id && other.side() == side)
        {
            return Err(MoveRejection::OwnPieceAtDestination(to));
        }
        Ok(())
    }

    /// Snapshot of every live piece
    pub fn game_state(&self, ctx: &GameContext) -> ServerMessage {
        let mut pieces: Vec<PieceView> = ctx
            .pieces()
            .map(|piece| PieceView {
                id: piece.id.as_str().to_string(),
                position: piece.current_cell().into(),
                kind: piece.kind().code().to_string(),
                color: piece.side().code().to_string(),
            })
            .collect();
        pieces.sort_by(|a, b| a.id.cmp(&b.id));

        let session = self.session.read();
        ServerMessage::GameState {
            pieces,
            current_turn: session.current_turn,
            game_status: session.status,
            winner: session.winner,
        }
    }
}

fn color_name(color: PlayerColor) -> &'static str {
    match color {
        PlayerColor::White => "white",
        PlayerColor::Black => "black",
    }
}

/// Event-bus observer feeding outgoing messages to the transport
pub struct Broadcaster {
    outbox: Sender<ServerMessage>,
    session: Arc<RwLock<SessionState>>,
}

impl Broadcaster {
    pub fn new(outbox: Sender<ServerMessage>, session: Arc<RwLock<SessionState>>) -> Self {
        Self { outbox, session }
    }

    /// Subscribe a broadcaster to every event it translates
    pub fn attach(
        bus: &EventBus,
        outbox: Sender<ServerMessage>,
        session: Arc<RwLock<SessionState>>,
    ) -> Arc<Broadcaster> {
        let broadcaster = Arc::new(Broadcaster::new(outbox, session));
        for kind in [
            EventType::PieceMoved,
            EventType::PieceCaptured,
            EventType::TurnChanged,
            EventType::GameEnded,
        ] {
            let b = Arc::clone(&broadcaster);
            bus.subscribe(kind, handler(move |event| b.on_event(event)));
        }
        broadcaster
    }

    pub fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        match self.translate(event) {
            Some(message) => self.deliver(message),
            None => Ok(()),
        }
    }

    /// Outgoing message for an event, updating the shared session on the way
    pub fn translate(&self, event: &Event) -> Option<ServerMessage> {
        match event.kind {
            EventType::PieceMoved => {
                let piece = PieceId::parse(event.str("piece")?)?;
                Some(ServerMessage::MoveExecuted {
                    piece_id: piece.as_str().to_string(),
                    from: event.cell("from")?.into(),
                    to: event.cell("to")?.into(),
                    player: color_of(piece.side()),
                })
            }
            EventType::PieceCaptured => {
                let winner = PieceId::parse(event.str("captured_by")?)?;
                Some(ServerMessage::CaptureExecuted {
                    piece_id: winner.as_str().to_string(),
                    from: event.cell("from_position")?.into(),
                    to: event.cell("position")?.into(),
                    player: color_of(winner.side()),
                    captured: event.str("piece_type")?.to_string(),
                })
            }
            EventType::TurnChanged => {
                let color = match event.str("current_player")? {
                    "white" => PlayerColor::White,
                    "black" => PlayerColor::Black,
                    _ => return None,
                };
                self.session.write().current_turn = color;
                None
            }
            EventType::GameEnded => {
                let winner = match event.str("winner") {
                    Some("White") => Some(PlayerColor::White),
                    Some("Black") => Some(PlayerColor::Black),
                    _ => None,
                };
                {
                    let mut session = self.session.write();
                    session.status = GameStatus::Finished;
                    session.winner = winner;
                }
                let message = event.str("result").unwrap_or("Game over").to_string();
                Some(ServerMessage::GameOver { winner, message })
            }
            EventType::GameStarted => None,
        }
    }

    fn deliver(&self, message: ServerMessage) -> anyhow::Result<()> {
        match self.outbox.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(dropped)) => {
                warn!("[SERVER] Outbox full, dropping {:?}", dropped);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => {
                anyhow::bail!("transport outbox is closed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::GameSettings;
    use crate::game::layout::BoardLayout;
    use crossbeam_channel::{bounded, Receiver};

    fn setup() -> (ServerGame, GameContext, Receiver<Command>) {
        let (tx, rx) = bounded(4);
        let layout = BoardLayout::standard();
        let ctx = GameContext::from_layout(
            &layout,
            &GameSettings::default(),
            Arc::new(EventBus::new()),
            0,
        )
        .unwrap();
        (ServerGame::new(tx), ctx, rx)
    }

    fn seated() -> (ServerGame, GameContext, Receiver<Command>) {
        let (mut server, ctx, rx) = setup();
        server.join(&ctx);
        server.join(&ctx);
        (server, ctx, rx)
    }

    #[test]
    fn test_two_players_seated_third_rejected() {
        let (mut server, ctx, _rx) = setup();

        let (first, out) = server.join(&ctx);
        assert_eq!(first, "player_1");
        assert!(matches!(
            &out[0].message,
            ServerMessage::Welcome { color: PlayerColor::White, .. }
        ));
        assert_eq!(server.status(), GameStatus::Waiting);

        let (_, out) = server.join(&ctx);
        assert_eq!(out.len(), 3, "welcome, game_started and game_state");
        assert!(matches!(&out[1].message, ServerMessage::GameStarted { .. }));
        assert!(matches!(
            &out[2].message,
            ServerMessage::GameState { pieces, game_status: GameStatus::Playing, .. } if pieces.len() == 32
        ));

        let (third, out) = server.join(&ctx);
        assert_eq!(out[0].to, Recipient::Player(third));
        assert_eq!(
            out[0].message,
            ServerMessage::error("Game is full. Only 2 players allowed.")
        );
        assert_eq!(server.players().len(), 2);
    }

    #[test]
    fn test_valid_move_is_enqueued() {
        let (mut server, ctx, rx) = seated();
        let out = server.handle_message(
            &ctx,
            "player_1",
            ClientMessage::Move {
                piece_id: "PW5".to_string(),
                from: (6, 4),
                to: (5, 4),
            },
            250,
        );
        assert!(out.is_empty());

        let cmd = rx.try_recv().unwrap();
        assert_eq!(cmd.piece_id, "PW5");
        assert_eq!(cmd.kind, CommandKind::Move);
        assert_eq!(cmd.timestamp, 250);
        assert_eq!(cmd.params, vec![Cell::new(6, 4), Cell::new(5, 4)]);
    }

    #[test]
    fn test_rejections() {
        let (server, ctx, rx) = seated();

        assert_eq!(
            server.validate_move(&ctx, "player_1", "PB1", (1, 0), (2, 0)),
            Err(MoveRejection::NotYourPiece)
        );
        assert_eq!(
            server.validate_move(&ctx, "player_2", "PB9", (1, 0), (2, 0)),
            Err(MoveRejection::PieceNotFound("PB9".to_string()))
        );
        assert!(matches!(
            server.validate_move(&ctx, "player_1", "PW1", (5, 0), (4, 0)),
            Err(MoveRejection::OriginMismatch { actual: (6, 0), .. })
        ));
        assert_eq!(
            server.validate_move(&ctx, "player_1", "RW1", (7, 0), (8, 0)),
            Err(MoveRejection::OutOfBounds((8, 0)))
        );
        assert_eq!(
            server.validate_move(&ctx, "player_1", "RW1", (7, 0), (6, 0)),
            Err(MoveRejection::OwnPieceAtDestination((6, 0)))
        );
        assert!(rx.try_recv().is_err(), "nothing reaches the queue");
    }

    #[test]
    fn test_move_before_start_gets_error_reply() {
        let (mut server, ctx, _rx) = setup();
        let (id, _) = server.join(&ctx);

        let out = server.handle_message(
            &ctx,
            &id,
            ClientMessage::Move {
                piece_id: "PW1".to_string(),
                from: (6, 0),
                to: (5, 0),
            },
            0,
        );
        assert_eq!(out, vec![Outgoing::player(&id, ServerMessage::error("Game is not in progress"))]);
    }

    #[test]
    fn test_leave_pauses_running_game() {
        let (mut server, _ctx, _rx) = seated();
        let out = server.leave("player_2");
        assert_eq!(out.len(), 1);
        assert_eq!(server.status(), GameStatus::Waiting);
        assert!(server.leave("player_9").is_empty());
    }

    #[test]
    fn test_broadcaster_translates_events() {
        let (tx, rx) = bounded(8);
        let session = Arc::new(RwLock::new(SessionState::default()));
        let bus = EventBus::new();
        Broadcaster::attach(&bus, tx, Arc::clone(&session));

        let rook = PieceId::parse("RW1").unwrap();
        let pawn = PieceId::parse("PB3").unwrap();
        bus.publish(&Event::piece_moved(&rook, Cell::new(7, 0), Cell::new(3, 0), "move", 10));
        bus.publish(&Event::turn_changed(&pawn, 12));
        bus.publish(&Event::piece_captured(&pawn, &rook, Cell::new(7, 0), Cell::new(3, 0), 20));
        bus.publish(&Event::game_ended(Some(Side::White), 30).with("result", "White wins!"));

        let sent: Vec<ServerMessage> = rx.try_iter().collect();
        assert_eq!(sent.len(), 3);
        assert_eq!(
            sent[0],
            ServerMessage::MoveExecuted {
                piece_id: "RW1".to_string(),
                from: (7, 0),
                to: (3, 0),
                player: PlayerColor::White,
            }
        );
        assert!(matches!(&sent[1], ServerMessage::CaptureExecuted { captured, .. } if captured == "PB3"));
        assert!(matches!(
            &sent[2],
            ServerMessage::GameOver { winner: Some(PlayerColor::White), .. }
        ));

        let session = session.read();
        assert_eq!(session.status, GameStatus::Finished);
        assert_eq!(session.current_turn, PlayerColor::Black);
    }

    #[test]
    fn test_full_outbox_does_not_fail_publisher() {
        let (tx, rx) = bounded(1);
        let broadcaster = Broadcaster::new(tx, Arc::new(RwLock::new(SessionState::default())));
        let rook = PieceId::parse("RW1").unwrap();
        let moved = Event::piece_moved(&rook, Cell::new(7, 0), Cell::new(6, 0), "move", 0);

        assert!(broadcaster.on_event(&moved).is_ok());
        assert!(broadcaster.on_event(&moved).is_ok(), "dropped, not an error");
        drop(rx);
        assert!(broadcaster.on_event(&moved).is_err());
    }
}
