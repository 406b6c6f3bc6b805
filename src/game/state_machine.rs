//! Per-piece state machine
//!
//! Each piece owns one [`StateMachine`]. A machine holds a fixed set of named
//! states; each state binds a [`PhysicsKind`], two capability flags and its
//! outgoing transitions. Transitions fire either because the active physics
//! finished (time-driven) or because a [`Command`] targets the piece.
//!
//! # Standard state graph
//!
//! ```text
//! Idle --move/capture--> Move --done--> LongRest --done--> Idle
//! Idle --jump--> Jump --done--> ShortRest --done--> Idle
//! ```
//!
//! | State     | can_capture | can_be_captured |
//! |-----------|-------------|-----------------|
//! | Idle      | no          | yes             |
//! | Move      | yes         | yes             |
//! | Jump      | yes         | no              |
//! | LongRest  | no          | yes             |
//! | ShortRest | no          | yes             |
//!
//! Knights bind [`PhysicsKind::KnightJump`] to their move state.

use crate::core::settings::PhysicsProfile;
use crate::game::command::{Command, CommandKind};
use crate::game::error::{StateError, StateResult};
use crate::game::moves::{MoveTable, MoveTag};
use crate::game::occupancy::OccupancyIndex;
use crate::game::physics::{Physics, PhysicsKind};
use crate::game::types::{BoardSize, Cell, Millis, PieceKind, Side};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::warn;

/// Name of a state in a piece's machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateName {
    Idle,
    Move,
    Jump,
    LongRest,
    ShortRest,
}

impl StateName {
    pub fn as_str(self) -> &'static str {
        match self {
            StateName::Idle => "idle",
            StateName::Move => "move",
            StateName::Jump => "jump",
            StateName::LongRest => "long_rest",
            StateName::ShortRest => "short_rest",
        }
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Definition of one state
#[derive(Debug, Clone, PartialEq)]
pub struct StateDef {
    pub name: StateName,
    pub physics: PhysicsKind,
    pub can_capture: bool,
    pub can_be_captured: bool,
    /// Length of a timed phase (jump airtime, rest cooldown)
    pub duration_ms: Millis,
    /// Where to go once the physics reports completion
    pub on_done: Option<StateName>,
    /// Command-driven transitions
    pub transitions: HashMap<CommandKind, StateName>,
}

impl StateDef {
    fn new(name: StateName, physics: PhysicsKind, can_capture: bool, can_be_captured: bool) -> Self {
        Self {
            name,
            physics,
            can_capture,
            can_be_captured,
            duration_ms: 0,
            on_done: None,
            transitions: HashMap::new(),
        }
    }

    fn lasting(mut self, duration_ms: Millis) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    fn then(mut self, next: StateName) -> Self {
        self.on_done = Some(next);
        self
    }

    fn on(mut self, kind: CommandKind, next: StateName) -> Self {
        self.transitions.insert(kind, next);
        self
    }
}

/// The standard five-state graph for a piece kind
pub fn standard_states(kind: PieceKind, profile: &PhysicsProfile) -> Vec<StateDef> {
    let travel = if kind == PieceKind::Knight {
        PhysicsKind::KnightJump
    } else {
        PhysicsKind::Move
    };

    vec![
        StateDef::new(StateName::Idle, PhysicsKind::Idle, false, true)
            .on(CommandKind::Move, StateName::Move)
            .on(CommandKind::Capture, StateName::Move)
            .on(CommandKind::Jump, StateName::Jump)
            .on(CommandKind::Idle, StateName::Idle),
        StateDef::new(StateName::Move, travel, true, true).then(StateName::LongRest),
        StateDef::new(StateName::Jump, PhysicsKind::Jump, true, false)
            .lasting(profile.jump_duration_ms)
            .then(StateName::ShortRest),
        StateDef::new(StateName::LongRest, PhysicsKind::Rest, false, true)
            .lasting(profile.long_rest_ms)
            .then(StateName::Idle),
        StateDef::new(StateName::ShortRest, PhysicsKind::Rest, false, true)
            .lasting(profile.short_rest_ms)
            .then(StateName::Idle),
    ]
}

/// Behaviour of a single piece
#[derive(Debug, Clone)]
pub struct StateMachine {
    kind: PieceKind,
    side: Side,
    board: BoardSize,
    speed_cells_per_sec: f64,
    moves: MoveTable,
    states: BTreeMap<StateName, StateDef>,
    current: StateName,
    physics: Physics,
}

impl StateMachine {
    /// Machine built from explicit state definitions, idle at `at` since `now`
    pub fn new(
        kind: PieceKind,
        side: Side,
        board: BoardSize,
        speed_cells_per_sec: f64,
        states: Vec<StateDef>,
        at: Cell,
        now: Millis,
    ) -> Self {
        Self {
            kind,
            side,
            board,
            speed_cells_per_sec,
            moves: MoveTable::for_kind(kind, side, board),
            states: states.into_iter().map(|def| (def.name, def)).collect(),
            current: StateName::Idle,
            physics: Physics::idle(at, now),
        }
    }

    /// Machine with the standard state graph for `kind`
    pub fn standard(
        kind: PieceKind,
        side: Side,
        board: BoardSize,
        profile: &PhysicsProfile,
        at: Cell,
        now: Millis,
    ) -> Self {
        Self::new(
            kind,
            side,
            board,
            profile.speed_cells_per_sec,
            standard_states(kind, profile),
            at,
            now,
        )
    }

    /// Advance physics to `now`, following time-driven transitions
    ///
    /// Returns whether at least one transition happened. A long gap between
    /// updates can chain several phases (move → rest → idle); each follow-up
    /// phase starts when the previous one ended, not at `now`.
    pub fn update(&mut self, now: Millis) -> bool {
        let mut transitioned = false;
        for _ in 0..=self.states.len() {
            if !self.physics.update(now) {
                break;
            }
            let Some(next) = self.states.get(&self.current).and_then(|def| def.on_done) else {
                break;
            };
            let Some(next_def) = self.states.get(&next) else {
                warn!(
                    "[STATE] {:?} {:?} has no state '{}' to finish into",
                    self.side, self.kind, next
                );
                break;
            };
            let start = self.physics.end_ms().unwrap_or(now);
            self.physics = stationary_physics(next_def, self.physics.current_cell(), start);
            self.current = next;
            transitioned = true;
        }
        transitioned
    }

    /// Apply a command aimed at this piece
    ///
    /// On error the machine is left untouched.
    pub fn on_command(&mut self, cmd: &Command, occupancy: &OccupancyIndex) -> StateResult<()> {
        let current = self
            .states
            .get(&self.current)
            .ok_or_else(|| StateError::UnknownState {
                state: self.current.to_string(),
            })?;
        let target = current
            .transitions
            .get(&cmd.kind)
            .copied()
            .ok_or_else(|| StateError::NotAccepted {
                command: cmd.kind.to_string(),
                state: self.current.to_string(),
            })?;
        let target_def = self
            .states
            .get(&target)
            .ok_or_else(|| StateError::UnknownState {
                state: target.to_string(),
            })?;

        let at = self.physics.current_cell();
        let physics = match target_def.physics {
            PhysicsKind::Move | PhysicsKind::KnightJump => {
                let (_, to) = cmd.endpoints().ok_or_else(|| StateError::MissingParams {
                    command: cmd.kind.to_string(),
                    expected: 2,
                    actual: cmd.params.len(),
                })?;
                self.check_destination(at, to, occupancy)?;
                if target_def.physics == PhysicsKind::KnightJump {
                    Physics::knight_jump(at, to, cmd.timestamp, self.speed_cells_per_sec)
                } else {
                    Physics::travel(at, to, cmd.timestamp, self.speed_cells_per_sec)
                }
            }
            // Idles in place; only `reset` may seat a piece elsewhere
            PhysicsKind::Idle => match cmd.params.first().copied() {
                Some(requested) if requested != at => {
                    return Err(StateError::IdleElsewhere { at, requested });
                }
                _ => Physics::idle(at, cmd.timestamp),
            },
            PhysicsKind::Jump | PhysicsKind::Rest => stationary_physics(target_def, at, cmd.timestamp),
        };

        self.physics = physics;
        self.current = target;
        Ok(())
    }

    fn check_destination(&self, from: Cell, to: Cell, occupancy: &OccupancyIndex) -> StateResult<()> {
        if !self.board.contains(to) {
            return Err(StateError::OutOfBounds { cell: to });
        }
        let (d_row, d_col) = from.delta_to(to);
        let tag = self
            .moves
            .tag((d_row, d_col))
            .ok_or(StateError::IllegalDelta {
                kind: self.kind,
                d_row,
                d_col,
            })?;
        if occupancy.has_side_at(to, self.side) {
            return Err(StateError::OwnPieceAtDestination { cell: to });
        }
        let enemy_present = occupancy.has_side_at(to, self.side.opponent());
        match tag {
            MoveTag::CaptureOnly if !enemy_present => Err(StateError::NoCaptureTarget { cell: to }),
            MoveTag::MoveOnly if enemy_present => Err(StateError::DestinationOccupied { cell: to }),
            _ => Ok(()),
        }
    }

    /// Force the machine back to idle at the command's cell and time
    pub fn reset(&mut self, cmd: &Command) {
        let at = cmd
            .params
            .first()
            .copied()
            .unwrap_or_else(|| self.physics.current_cell());
        self.current = StateName::Idle;
        self.physics = Physics::idle(at, cmd.timestamp);
    }

    pub fn current_cell(&self) -> Cell {
        self.physics.current_cell()
    }

    pub fn can_capture(&self) -> bool {
        self.states
            .get(&self.current)
            .is_some_and(|def| def.can_capture)
    }

    pub fn can_be_captured(&self) -> bool {
        self.states
            .get(&self.current)
            .map_or(true, |def| def.can_be_captured)
    }

    pub fn is_finished(&self) -> bool {
        self.physics.is_finished()
    }

    pub fn is_at_landing_cell(&self) -> bool {
        self.physics.is_at_landing_cell()
    }

    pub fn is_passing_through(&self) -> bool {
        self.physics.is_passing_through()
    }

    /// Start of the current action, used as arrival time in collisions
    pub fn start_ms(&self) -> Millis {
        self.physics.start_ms()
    }

    pub fn state(&self) -> StateName {
        self.current
    }

    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    pub fn moves(&self) -> &MoveTable {
        &self.moves
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn side(&self) -> Side {
        self.side
    }
}

/// Physics for a state entered without a destination
fn stationary_physics(def: &StateDef, at: Cell, start: Millis) -> Physics {
    match def.physics {
        PhysicsKind::Jump => Physics::jump(at, start, def.duration_ms),
        PhysicsKind::Rest => Physics::rest(at, start, def.duration_ms),
        PhysicsKind::Idle | PhysicsKind::Move | PhysicsKind::KnightJump => Physics::idle(at, start),
    }
}
