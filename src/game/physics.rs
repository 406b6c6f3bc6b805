//! Physics strategies: how a piece's position evolves while in a state
//!
//! Each state of a piece's state machine binds exactly one [`Physics`] value.
//! The set of strategies is closed:
//!
//! - **Idle** - stationary, never finishes
//! - **Move** - linear travel from one cell to another at a fixed speed
//! - **KnightJump** - like Move, but the piece only *really* occupies its
//!   landing cell; every cell on the way is just passed over
//! - **Jump** - in-place hop with a fixed airtime
//! - **Rest** - stationary cooldown with a fixed duration
//!
//! The start timestamp of the active physics doubles as the piece's "arrival"
//! time for collision tie-breaking: the most recently initiated action wins.

use crate::game::types::{Cell, Millis};

/// Strategy selector used by state definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicsKind {
    Idle,
    Move,
    KnightJump,
    Jump,
    Rest,
}

/// Linear travel between two cells
#[derive(Debug, Clone, PartialEq)]
pub struct Travel {
    from: Cell,
    to: Cell,
    start_ms: Millis,
    duration_ms: Millis,
    cell: Cell,
    finished: bool,
}

impl Travel {
    fn new(from: Cell, to: Cell, start_ms: Millis, speed_cells_per_sec: f64) -> Self {
        Self {
            from,
            to,
            start_ms,
            duration_ms: travel_duration_ms(from, to, speed_cells_per_sec),
            cell: from,
            finished: from == to,
        }
    }

    fn update(&mut self, now: Millis) -> bool {
        if self.finished {
            return true;
        }
        let elapsed = now.saturating_sub(self.start_ms);
        if elapsed >= self.duration_ms {
            self.cell = self.to;
            self.finished = true;
            return true;
        }
        let t = elapsed as f64 / self.duration_ms as f64;
        let (dr, dc) = self.from.delta_to(self.to);
        let row = f64::from(self.from.row) + f64::from(dr) * t;
        let col = f64::from(self.from.col) + f64::from(dc) * t;
        self.cell = Cell::new(row.round() as i32, col.round() as i32);
        false
    }
}

/// Stationary phase with a fixed duration (jump airtime, rest cooldown)
#[derive(Debug, Clone, PartialEq)]
pub struct Timed {
    cell: Cell,
    start_ms: Millis,
    duration_ms: Millis,
    finished: bool,
}

impl Timed {
    fn new(cell: Cell, start_ms: Millis, duration_ms: Millis) -> Self {
        Self {
            cell,
            start_ms,
            duration_ms,
            finished: false,
        }
    }

    fn update(&mut self, now: Millis) -> bool {
        if !self.finished && now.saturating_sub(self.start_ms) >= self.duration_ms {
            self.finished = true;
        }
        self.finished
    }
}

/// Active physics of one piece
#[derive(Debug, Clone, PartialEq)]
pub enum Physics {
    Idle { cell: Cell, start_ms: Millis },
    Move(Travel),
    KnightJump(Travel),
    Jump(Timed),
    Rest(Timed),
}

impl Physics {
    pub fn idle(cell: Cell, start_ms: Millis) -> Self {
        Physics::Idle { cell, start_ms }
    }

    pub fn travel(from: Cell, to: Cell, start_ms: Millis, speed_cells_per_sec: f64) -> Self {
        Physics::Move(Travel::new(from, to, start_ms, speed_cells_per_sec))
    }

    pub fn knight_jump(from: Cell, to: Cell, start_ms: Millis, speed_cells_per_sec: f64) -> Self {
        Physics::KnightJump(Travel::new(from, to, start_ms, speed_cells_per_sec))
    }

    pub fn jump(cell: Cell, start_ms: Millis, duration_ms: Millis) -> Self {
        Physics::Jump(Timed::new(cell, start_ms, duration_ms))
    }

    pub fn rest(cell: Cell, start_ms: Millis, duration_ms: Millis) -> Self {
        Physics::Rest(Timed::new(cell, start_ms, duration_ms))
    }

    pub fn kind(&self) -> PhysicsKind {
        match self {
            Physics::Idle { .. } => PhysicsKind::Idle,
            Physics::Move(_) => PhysicsKind::Move,
            Physics::KnightJump(_) => PhysicsKind::KnightJump,
            Physics::Jump(_) => PhysicsKind::Jump,
            Physics::Rest(_) => PhysicsKind::Rest,
        }
    }

    /// Advance to `now`; returns `true` once the phase has completed
    pub fn update(&mut self, now: Millis) -> bool {
        match self {
            Physics::Idle { .. } => false,
            Physics::Move(travel) | Physics::KnightJump(travel) => travel.update(now),
            Physics::Jump(timed) | Physics::Rest(timed) => timed.update(now),
        }
    }

    /// Authoritative position
    pub fn current_cell(&self) -> Cell {
        match self {
            Physics::Idle { cell, .. } => *cell,
            Physics::Move(travel) | Physics::KnightJump(travel) => travel.cell,
            Physics::Jump(timed) | Physics::Rest(timed) => timed.cell,
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            Physics::Idle { .. } => false,
            Physics::Move(travel) | Physics::KnightJump(travel) => travel.finished,
            Physics::Jump(timed) | Physics::Rest(timed) => timed.finished,
        }
    }

    /// When the current action was initiated
    pub fn start_ms(&self) -> Millis {
        match self {
            Physics::Idle { start_ms, .. } => *start_ms,
            Physics::Move(travel) | Physics::KnightJump(travel) => travel.start_ms,
            Physics::Jump(timed) | Physics::Rest(timed) => timed.start_ms,
        }
    }

    /// When the current phase completes; `None` for idle
    pub fn end_ms(&self) -> Option<Millis> {
        match self {
            Physics::Idle { .. } => None,
            Physics::Move(travel) | Physics::KnightJump(travel) => {
                Some(travel.start_ms + travel.duration_ms)
            }
            Physics::Jump(timed) | Physics::Rest(timed) => Some(timed.start_ms + timed.duration_ms),
        }
    }

    /// Destination cell of a travelling piece
    pub fn target(&self) -> Option<Cell> {
        match self {
            Physics::Move(travel) | Physics::KnightJump(travel) => Some(travel.to),
            _ => None,
        }
    }

    /// Whether the piece stands on the cell it is meant to end up on
    ///
    /// Only a knight jump can be "not at landing": its intermediate cells are
    /// for rendering and occupancy only.
    pub fn is_at_landing_cell(&self) -> bool {
        match self {
            Physics::KnightJump(travel) => travel.cell == travel.to,
            _ => true,
        }
    }

    /// A knight in flight over a cell that isn't its landing cell
    pub fn is_passing_through(&self) -> bool {
        !self.is_at_landing_cell()
    }
}

/// Travel time between two cells at `speed` cells/sec, at least 1ms
fn travel_duration_ms(from: Cell, to: Cell, speed_cells_per_sec: f64) -> Millis {
    if from == to {
        return 0;
    }
    let secs = from.distance(to) / speed_cells_per_sec;
    ((secs * 1000.0).ceil() as Millis).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_never_finishes() {
        let mut physics = Physics::idle(Cell::new(3, 3), 100);
        assert!(!physics.update(1_000_000));
        assert_eq!(physics.current_cell(), Cell::new(3, 3));
        assert_eq!(physics.start_ms(), 100);
        assert_eq!(physics.end_ms(), None);
    }

    #[test]
    fn test_move_interpolates_and_finishes() {
        //! 4 cells at 2 cells/sec takes 2000ms; halfway is 2 cells along
        let mut physics = Physics::travel(Cell::new(6, 0), Cell::new(2, 0), 1_000, 2.0);
        assert_eq!(physics.end_ms(), Some(3_000));

        assert!(!physics.update(1_000));
        assert_eq!(physics.current_cell(), Cell::new(6, 0));

        assert!(!physics.update(2_000));
        assert_eq!(physics.current_cell(), Cell::new(4, 0));

        assert!(physics.update(3_000));
        assert_eq!(physics.current_cell(), Cell::new(2, 0));
        assert!(physics.is_finished());
    }

    #[test]
    fn test_update_before_start_stays_put() {
        let mut physics = Physics::travel(Cell::new(1, 1), Cell::new(1, 5), 5_000, 1.0);
        assert!(!physics.update(10));
        assert_eq!(physics.current_cell(), Cell::new(1, 1));
    }

    #[test]
    fn test_knight_passes_through_until_landing() {
        let mut physics = Physics::knight_jump(Cell::new(7, 1), Cell::new(5, 2), 0, 1.0);
        assert!(physics.is_passing_through(), "takeoff cell is not the landing cell");

        let end = physics.end_ms().unwrap();
        physics.update(end / 2);
        assert_ne!(physics.current_cell(), Cell::new(5, 2));
        assert!(!physics.is_at_landing_cell());

        physics.update(end);
        assert_eq!(physics.current_cell(), Cell::new(5, 2));
        assert!(physics.is_at_landing_cell());
    }

    #[test]
    fn test_non_knight_always_at_landing() {
        let physics = Physics::travel(Cell::new(0, 0), Cell::new(0, 7), 0, 1.0);
        assert!(physics.is_at_landing_cell());
        assert!(Physics::jump(Cell::new(2, 2), 0, 500).is_at_landing_cell());
    }

    #[test]
    fn test_rest_finishes_after_duration() {
        let mut physics = Physics::rest(Cell::new(4, 4), 200, 300);
        assert!(!physics.update(499));
        assert!(physics.update(500));
        assert_eq!(physics.kind(), PhysicsKind::Rest);
    }
}
