//! Game resources - observer state and the end-of-game record
//!
//! # Resource Categories
//!
//! ## Game History
//! - [`MoveTracker`] - Move history subscribed to the event bus
//! - [`ScoreTracker`] - Captured pieces and point totals
//!
//! ## Game Status
//! - [`GameOverState`] - Win/abandon conditions
//!
//! Trackers are shared as `Arc<parking_lot::Mutex<_>>`: the bus calls them on
//! the orchestrator thread while a UI or the CLI reads them elsewhere.

pub mod game_over;
pub mod history;
pub mod score;

pub use game_over::GameOverState;
pub use history::MoveTracker;
pub use score::ScoreTracker;
