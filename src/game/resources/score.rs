//! Score tracking observer
//!
//! Tracks the pieces captured by each side and the points they are worth.
//! Subscribes to `PIECE_CAPTURED`, `GAME_STARTED` and `GAME_ENDED`.
//!
//! # Piece Values
//!
//! - Pawn: 1
//! - Knight/Bishop: 3
//! - Rook: 5
//! - Queen: 9
//! - King: 0 (capturing it ends the game instead)
//!
//! # Score Difference
//!
//! Positive difference means White is ahead, negative means Black is ahead.

use crate::game::event_bus::{handler, EventBus};
use crate::game::events::{Event, EventType};
use crate::game::types::{PieceId, PieceKind, Side};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Captured pieces and scores for both sides
#[derive(Default, Debug, Clone, PartialEq)]
pub struct ScoreTracker {
    /// Black pieces that White has captured
    pub white_captured: Vec<String>,
    /// White pieces that Black has captured
    pub black_captured: Vec<String>,
    white_score: u32,
    black_score: u32,
}

impl ScoreTracker {
    /// Create a tracker and subscribe it to `bus`
    pub fn attach(bus: &EventBus) -> Arc<Mutex<ScoreTracker>> {
        let tracker = Arc::new(Mutex::new(ScoreTracker::default()));

        let on_capture = Arc::clone(&tracker);
        bus.subscribe(
            EventType::PieceCaptured,
            handler(move |event| {
                on_capture.lock().on_piece_captured(event);
                Ok(())
            }),
        );
        let on_start = Arc::clone(&tracker);
        bus.subscribe(
            EventType::GameStarted,
            handler(move |_| {
                on_start.lock().reset();
                Ok(())
            }),
        );
        let on_end = Arc::clone(&tracker);
        bus.subscribe(
            EventType::GameEnded,
            handler(move |_| {
                on_end.lock().log_final_score();
                Ok(())
            }),
        );

        tracker
    }

    /// Credit the capturing side for a `PIECE_CAPTURED` event
    ///
    /// Events without a parseable captured id are ignored.
    pub fn on_piece_captured(&mut self, event: &Event) {
        let Some(captured) = event.str("piece_type").and_then(PieceId::parse) else {
            return;
        };
        self.add_capture(captured.side(), captured.kind(), captured.as_str());
        info!(
            "[SCORE] {} captured (+{}), White {} - {} Black",
            captured,
            captured.kind().value(),
            self.white_score,
            self.black_score
        );
    }

    /// Record a capture of a `captured_side` piece
    pub fn add_capture(&mut self, captured_side: Side, kind: PieceKind, id: &str) {
        match captured_side {
            // If white piece was captured, black gets credit
            Side::White => {
                self.black_score += kind.value();
                self.black_captured.push(id.to_string());
            }
            // If black piece was captured, white gets credit
            Side::Black => {
                self.white_score += kind.value();
                self.white_captured.push(id.to_string());
            }
        }
    }

    /// Clear all captures (new game)
    pub fn reset(&mut self) {
        *self = ScoreTracker::default();
    }

    /// `(white, black)`
    pub fn scores(&self) -> (u32, u32) {
        (self.white_score, self.black_score)
    }

    pub fn score_difference(&self) -> i64 {
        i64::from(self.white_score) - i64::from(self.black_score)
    }

    /// Side ahead on points, `None` when tied
    pub fn leader(&self) -> Option<Side> {
        match self.score_difference() {
            d if d > 0 => Some(Side::White),
            d if d < 0 => Some(Side::Black),
            _ => None,
        }
    }

    /// Number of pieces `side` has captured
    pub fn capture_count(&self, side: Side) -> usize {
        self.captured_by(side).len()
    }

    pub fn captured_by(&self, side: Side) -> &[String] {
        match side {
            Side::White => &self.white_captured,
            Side::Black => &self.black_captured,
        }
    }

    /// Captures by `side` grouped by kind
    pub fn counts_by_kind(&self, side: Side) -> BTreeMap<PieceKind, usize> {
        let mut counts = BTreeMap::new();
        for id in self.captured_by(side) {
            if let Some(parsed) = PieceId::parse(id) {
                *counts.entry(parsed.kind()).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn log_final_score(&self) {
        let leader = self.leader().map_or("Tie", Side::name);
        info!(
            "[SCORE] Final score - White: {} Black: {} ({})",
            self.white_score, self.black_score, leader
        );
        info!(
            "[SCORE] White captured: [{}], Black captured: [{}]",
            self.white_captured.join(", "),
            self.black_captured.join(", ")
        );
    }
}
