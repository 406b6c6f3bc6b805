//! Real-time chess engine
//!
//! There are no turns: every piece can be commanded at any time and moves over
//! the board in real time. A single orchestrator thread owns all game state
//! and advances it one tick at a time.
//!
//! # Module Organization
//!
//! - `types` - cells, sides, piece kinds and ids
//! - `physics` - how a piece's position evolves during a state
//! - `moves` - per-kind move tables
//! - `state_machine` - per-piece states with capture flags and transitions
//! - `piece` - pieces and the factory that builds their state machines
//! - `occupancy` - cell → pieces index, rebuilt every tick
//! - `context` - [`GameContext`], the owner of every live piece
//! - `command` / `pipeline` - inbound commands and how they are applied
//! - `collision` - capture resolution on contested cells
//! - `promotion` - pawn → queen identity swap
//! - `events` / `event_bus` - domain events and their fan-out
//! - `orchestrator` - the tick loop gluing everything together
//! - `resources` - move history, score and game-over observers
//! - `layout` / `assets` / `clock` - startup data and injected collaborators
//!
//! # Tick Ordering
//!
//! 1. Advance physics
//! 2. Presentation fixups for promoted queens
//! 3. Rebuild occupancy
//! 4. Drain the command queue through the pipeline
//! 5. Resolve collisions
//! 6. Promotions
//! 7. Win check

pub mod assets;
pub mod clock;
pub mod collision;
pub mod command;
pub mod context;
pub mod error;
pub mod event_bus;
pub mod events;
pub mod layout;
pub mod moves;
pub mod occupancy;
pub mod orchestrator;
pub mod physics;
pub mod piece;
pub mod pipeline;
pub mod promotion;
pub mod resources;
pub mod state_machine;
pub mod types;

pub use clock::{GameClock, ManualClock, MonotonicClock};
pub use command::{Command, CommandKind};
pub use context::GameContext;
pub use error::{AssetError, GameError, GameResult, StateError, StateResult};
pub use event_bus::EventBus;
pub use events::{Event, EventType};
pub use layout::BoardLayout;
pub use orchestrator::{CommandSender, Orchestrator, TickReport};
pub use types::{BoardSize, Cell, Millis, PieceId, PieceKind, Side};
