//! Error types for game module
//!
//! Construction-time errors are fatal and refuse to start a game from malformed
//! board data. Everything that can happen while the game runs (rejected
//! commands, missing assets) is recovered locally and only logged.

use crate::game::types::{Cell, PieceKind, Side};

/// Structural invariant violations detected while building a game
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// One side has no king on the initial board
    #[error("Missing {side:?} king in initial placement")]
    MissingKing { side: Side },

    /// One side has more than one king
    #[error("{side:?} has {count} kings, expected exactly one")]
    DuplicateKing { side: Side, count: usize },

    /// Two pieces of the same side start on the same cell
    #[error("Pieces {first} and {second} of the same side share cell {cell}")]
    SameSideOverlap {
        first: String,
        second: String,
        cell: Cell,
    },

    /// Two live pieces claim the same id
    #[error("Duplicate piece id: {id}")]
    DuplicatePieceId { id: String },

    /// Piece code does not encode a known kind and side
    #[error("Invalid piece code '{code}'")]
    InvalidPieceCode { code: String },

    /// Initial cell lies outside the board
    #[error("Piece {id} placed outside the board at {cell}")]
    OutOfBounds { id: String, cell: Cell },

    /// Physics profile can't drive a state machine
    #[error("Invalid physics profile for {kind:?}: {message}")]
    InvalidProfile { kind: PieceKind, message: String },

    /// Layout grid is empty or ragged
    #[error("Invalid board layout: {message}")]
    InvalidLayout { message: String },
}

/// Result type alias for game construction
pub type GameResult<T> = Result<T, GameError>;

/// A piece's state machine refusing a command
///
/// The pipeline treats every variant as a no-op: logged and dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// Transition names a state the machine does not have
    #[error("Unknown target state '{state}'")]
    UnknownState { state: String },

    /// Current state has no transition for this command type
    #[error("Command '{command}' not accepted in state '{state}'")]
    NotAccepted { command: String, state: String },

    /// Command is missing its cell parameters
    #[error("Command '{command}' needs {expected} cell parameter(s), got {actual}")]
    MissingParams {
        command: String,
        expected: usize,
        actual: usize,
    },

    /// Destination is off the board
    #[error("Destination {cell} is outside the board")]
    OutOfBounds { cell: Cell },

    /// Delta is not part of this piece's move table
    #[error("{kind:?} cannot move by ({d_row}, {d_col})")]
    IllegalDelta {
        kind: PieceKind,
        d_row: i32,
        d_col: i32,
    },

    /// Destination already holds a piece of the same side
    #[error("Cannot capture own piece at {cell}")]
    OwnPieceAtDestination { cell: Cell },

    /// Move-only pattern aimed at a cell held by an enemy
    #[error("Move-only pattern cannot enter occupied cell {cell}")]
    DestinationOccupied { cell: Cell },

    /// Capture-only pattern used without an enemy on the destination
    #[error("Capture-only move to {cell} has no target")]
    NoCaptureTarget { cell: Cell },

    /// Idle command naming a cell other than the one the piece stands on
    #[error("Idle must stay at {at}, not {requested}")]
    IdleElsewhere { at: Cell, requested: Cell },
}

/// Result type alias for state machine operations
pub type StateResult<T> = Result<T, StateError>;

/// Presentation asset failures, never fatal to game state
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    /// No sprite set registered for this kind/side/state
    #[error("No sprites for {kind:?} {side:?} in state '{state}'")]
    MissingSprites {
        kind: PieceKind,
        side: Side,
        state: String,
    },

    /// Loader failed for another reason
    #[error("Asset load failed: {message}")]
    LoadFailed { message: String },
}
