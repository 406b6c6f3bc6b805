//! Core module - ambient infrastructure shared by the engine and the binary
//!
//! - [`error`] - [`CoreError`] for settings persistence and validation
//! - [`settings`] - [`GameSettings`] with JSON persistence and per-kind physics
//! - [`logging`] - `tracing` subscriber setup for binaries and tools

pub mod error;
pub mod logging;
pub mod settings;

pub use error::{CoreError, CoreResult};
pub use logging::init_tracing;
pub use settings::{default_settings_path, GameSettings, PhysicsProfile};
