//! Pieces and the factory that builds their state machines

use crate::core::settings::GameSettings;
use crate::game::error::{GameError, GameResult};
use crate::game::state_machine::StateMachine;
use crate::game::types::{Cell, Millis, PieceId, PieceKind, Side};

/// A live piece: identity plus its current behaviour
#[derive(Debug, Clone)]
pub struct Piece {
    pub id: PieceId,
    pub machine: StateMachine,
}

impl Piece {
    pub fn new(id: PieceId, machine: StateMachine) -> Self {
        Self { id, machine }
    }

    pub fn kind(&self) -> PieceKind {
        self.id.kind()
    }

    pub fn side(&self) -> Side {
        self.id.side()
    }

    /// Position read from the active physics
    pub fn current_cell(&self) -> Cell {
        self.machine.current_cell()
    }

    pub fn update(&mut self, now: Millis) -> bool {
        self.machine.update(now)
    }
}

/// Builds state machines from the configured physics table
#[derive(Debug, Clone)]
pub struct PieceFactory {
    settings: GameSettings,
}

impl PieceFactory {
    pub fn new(settings: GameSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Standard machine for a kind/side, idle at `at` since `now`
    pub fn machine(&self, kind: PieceKind, side: Side, at: Cell, now: Millis) -> GameResult<StateMachine> {
        let profile = self.settings.profile(kind);
        if !(profile.speed_cells_per_sec.is_finite() && profile.speed_cells_per_sec > 0.0) {
            return Err(GameError::InvalidProfile {
                kind,
                message: format!("speed must be positive, got {}", profile.speed_cells_per_sec),
            });
        }
        Ok(StateMachine::standard(
            kind,
            side,
            self.settings.board,
            profile,
            at,
            now,
        ))
    }

    /// A piece placed at `at` on a board of the configured size
    pub fn piece(&self, id: PieceId, at: Cell, now: Millis) -> GameResult<Piece> {
        if !self.settings.board.contains(at) {
            return Err(GameError::OutOfBounds {
                id: id.to_string(),
                cell: at,
            });
        }
        let machine = self.machine(id.kind(), id.side(), at, now)?;
        Ok(Piece::new(id, machine))
    }
}
