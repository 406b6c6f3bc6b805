//! Networking module - headless server variant
//!
//! The transport itself is left to the embedding application. This module
//! provides the pieces that sit between a transport and the engine:
//!
//! - [`ServerGame`] seats players, validates moves and enqueues commands
//! - [`Broadcaster`] turns engine events into [`shared::ServerMessage`]s

pub mod server;

pub use server::{
    color_of, side_of, Broadcaster, MoveRejection, Outgoing, Player, Recipient, ServerGame,
    SessionState,
};
