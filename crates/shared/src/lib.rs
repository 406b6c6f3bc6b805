//! Wire types shared between the engine's server variant and transports.

pub mod protocol;

pub use protocol::{ClientMessage, GameStatus, PieceView, PlayerColor, Position, ServerMessage};
