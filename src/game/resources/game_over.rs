//! Game over state tracking
//!
//! The engine has a single win condition: a king is captured. There are no
//! checks, mates or clocks; the loop notices fewer than two live kings after
//! collision resolution and ends the game.
//!
//! # State Transitions
//!
//! ```text
//! Playing → WhiteWon / BlackWon / KingsTraded / Abandoned
//! ```
//!
//! All non-Playing states are terminal. `Playing` is the orchestrator's
//! *Running* state; every other value is *Ended*.

use crate::game::types::Side;

/// The game's end state
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy)]
pub enum GameOverState {
    /// Game is still in progress
    #[default]
    Playing,

    /// Black's king was captured
    WhiteWon,

    /// White's king was captured
    BlackWon,

    /// Both kings fell in the same tick
    KingsTraded,

    /// Explicit exit while both kings were still alive
    Abandoned,
}

impl GameOverState {
    /// Outcome from which kings are still on the board
    ///
    /// Returns `Playing` while both survive.
    pub fn from_surviving_kings(white_alive: bool, black_alive: bool) -> Self {
        match (white_alive, black_alive) {
            (true, true) => GameOverState::Playing,
            (true, false) => GameOverState::WhiteWon,
            (false, true) => GameOverState::BlackWon,
            (false, false) => GameOverState::KingsTraded,
        }
    }

    /// Returns `true` for any non-Playing state
    pub fn is_game_over(&self) -> bool {
        !matches!(self, GameOverState::Playing)
    }

    /// Human-readable result
    pub fn message(&self) -> &str {
        match self {
            GameOverState::Playing => "Game in progress",
            GameOverState::WhiteWon => "White wins!",
            GameOverState::BlackWon => "Black wins!",
            GameOverState::KingsTraded => "Both kings captured - no winner",
            GameOverState::Abandoned => "Game abandoned",
        }
    }

    /// The winning side, if there is one
    pub fn winner(&self) -> Option<Side> {
        match self {
            GameOverState::WhiteWon => Some(Side::White),
            GameOverState::BlackWon => Some(Side::Black),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_over_state_default() {
        //! Verifies GameOverState defaults to Playing
        let state = GameOverState::default();
        assert_eq!(state, GameOverState::Playing);
        assert!(!state.is_game_over());
        assert_eq!(state.winner(), None);
    }

    #[test]
    fn test_from_surviving_kings() {
        assert_eq!(GameOverState::from_surviving_kings(true, true), GameOverState::Playing);
        assert_eq!(
            GameOverState::from_surviving_kings(true, false).winner(),
            Some(Side::White)
        );
        assert_eq!(
            GameOverState::from_surviving_kings(false, true).winner(),
            Some(Side::Black)
        );
        assert_eq!(
            GameOverState::from_surviving_kings(false, false),
            GameOverState::KingsTraded
        );
    }

    #[test]
    fn test_abandoned_has_no_winner() {
        //! Exit before a king falls ends the game without a winner
        let state = GameOverState::Abandoned;
        assert!(state.is_game_over());
        assert_eq!(state.winner(), None);
        assert_eq!(state.message(), "Game abandoned");
    }
}
