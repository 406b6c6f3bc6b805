use serde::{Deserialize, Serialize};

/// Board position on the wire: `[row, col]`
pub type Position = (i32, i32);

/// Side a connected player controls
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    White,
    Black,
}

impl PlayerColor {
    /// Single-letter side code used inside piece ids (`W` / `B`)
    pub fn side_code(self) -> char {
        match self {
            PlayerColor::White => 'W',
            PlayerColor::Black => 'B',
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            PlayerColor::White => PlayerColor::Black,
            PlayerColor::Black => PlayerColor::White,
        }
    }
}

/// Lifecycle of a served game
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Waiting,
    Playing,
    Finished,
}

/// One piece inside a `game_state` snapshot
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PieceView {
    pub id: String,
    pub position: Position,
    #[serde(rename = "type")]
    pub kind: String,
    pub color: String,
}

/// Client → Server
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Move {
        piece_id: String,
        from: Position,
        to: Position,
    },
    Capture {
        piece_id: String,
        from: Position,
        to: Position,
    },
    GetState,
}

/// Server → Client
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        player_id: String,
        color: PlayerColor,
        message: String,
    },
    GameStarted {
        message: String,
    },
    GameState {
        pieces: Vec<PieceView>,
        current_turn: PlayerColor,
        game_status: GameStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winner: Option<PlayerColor>,
    },
    MoveExecuted {
        piece_id: String,
        from: Position,
        to: Position,
        player: PlayerColor,
    },
    CaptureExecuted {
        piece_id: String,
        from: Position,
        to: Position,
        player: PlayerColor,
        captured: String,
    },
    GameOver {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winner: Option<PlayerColor>,
        message: String,
    },
    PlayerDisconnected {
        message: String,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
