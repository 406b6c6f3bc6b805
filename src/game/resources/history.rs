//! Move history observer
//!
//! Records every `PIECE_MOVED` and `PIECE_CAPTURED` event as a readable line,
//! plus per-side `(MM:SS, notation)` lists for a move table display.
//! `GAME_STARTED` clears the history.

use crate::game::event_bus::{handler, EventBus};
use crate::game::events::{Event, EventType};
use crate::game::types::{Cell, Millis, PieceId, Side};
use parking_lot::Mutex;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

const GAME_STARTED_MARKER: &str = "=== GAME STARTED ===";

/// Stand-in for a missing cell in a malformed payload
const ORIGIN: Cell = Cell::new(0, 0);

/// Move history for both sides
#[derive(Debug, Clone, PartialEq)]
pub struct MoveTracker {
    rows: i32,
    moves: Vec<String>,
    white_moves: Vec<(String, String)>,
    black_moves: Vec<(String, String)>,
}

impl MoveTracker {
    /// Tracker for a board with `rows` ranks (used for algebraic notation)
    pub fn new(rows: i32) -> Self {
        Self {
            rows,
            moves: Vec::new(),
            white_moves: Vec::new(),
            black_moves: Vec::new(),
        }
    }

    /// Create a tracker and subscribe it to `bus`
    pub fn attach(bus: &EventBus, rows: i32) -> Arc<Mutex<MoveTracker>> {
        let tracker = Arc::new(Mutex::new(MoveTracker::new(rows)));

        let on_move = Arc::clone(&tracker);
        bus.subscribe(
            EventType::PieceMoved,
            handler(move |event| {
                on_move.lock().on_piece_moved(event);
                Ok(())
            }),
        );
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
                on_start.lock().on_game_started();
                Ok(())
            }),
        );

        tracker
    }

    pub fn on_piece_moved(&mut self, event: &Event) {
        let Some(piece) = event.str("piece").and_then(PieceId::parse) else {
            return;
        };
        let from = event.cell("from").unwrap_or(ORIGIN);
        let to = event.cell("to").unwrap_or(ORIGIN);

        let notation = if event.is_promotion() {
            format!(
                "{}-Pawn promotes to {} at {}",
                piece.side().code(),
                piece.kind().name(),
                to.to_algebraic(self.rows)
            )
        } else {
            self.notation(&piece, from, to)
        };

        self.moves.push(format!(
            "{}: {} -> {} [{}ms]",
            piece, from, to, event.game_time_ms
        ));
        self.side_moves_mut(piece.side())
            .push((format_clock(event.game_time_ms), notation));
    }

    pub fn on_piece_captured(&mut self, event: &Event) {
        let Some(by) = event.str("captured_by").and_then(PieceId::parse) else {
            return;
        };
        let captured = event.str("piece_type").unwrap_or("?");
        let from = event.cell("from_position").unwrap_or(ORIGIN);
        let at = event.cell("position").unwrap_or(ORIGIN);

        let notation = self.notation(&by, from, at).replace(" to ", " captures at ");
        self.moves.push(format!(
            "CAPTURE: {} captured by {} at {} [{}ms]",
            captured, by, at, event.game_time_ms
        ));
        self.side_moves_mut(by.side())
            .push((format_clock(event.game_time_ms), notation));
    }

    pub fn on_game_started(&mut self) {
        self.moves.clear();
        self.white_moves.clear();
        self.black_moves.clear();
        self.moves.push(GAME_STARTED_MARKER.to_string());
    }

    /// "W-Pawn e2 to e4", or "White Pawn stays at e2" for a null move
    fn notation(&self, piece: &PieceId, from: Cell, to: Cell) -> String {
        let from_sq = from.to_algebraic(self.rows);
        if from == to {
            return format!(
                "{} {} stays at {}",
                piece.side().name(),
                piece.kind().name(),
                from_sq
            );
        }
        format!(
            "{}-{} {} to {}",
            piece.side().code(),
            piece.kind().name(),
            from_sq,
            to.to_algebraic(self.rows)
        )
    }

    fn side_moves_mut(&mut self, side: Side) -> &mut Vec<(String, String)> {
        match side {
            Side::White => &mut self.white_moves,
            Side::Black => &mut self.black_moves,
        }
    }

    /// Last `count` `(time, notation)` entries for `side`
    pub fn last_moves(&self, side: Side, count: usize) -> &[(String, String)] {
        let moves = match side {
            Side::White => &self.white_moves,
            Side::Black => &self.black_moves,
        };
        &moves[moves.len().saturating_sub(count)..]
    }

    /// Full history, markers included
    pub fn history(&self) -> &[String] {
        &self.moves
    }

    /// Recorded moves and captures, markers excluded
    pub fn move_count(&self) -> usize {
        self.moves.iter().filter(|line| !line.starts_with('=')).count()
    }

    /// Numbered history as text
    pub fn render(&self) -> String {
        let mut out = String::from("KungFu Chess Move History\n");
        out.push_str(&"=".repeat(40));
        out.push('\n');
        for (i, line) in self.moves.iter().enumerate() {
            let _ = writeln!(out, "{:3}. {}", i + 1, line);
        }
        out
    }

    pub fn export_to(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.render())
    }
}

/// `MM:SS` since game start
fn format_clock(game_time_ms: Millis) -> String {
    let total_seconds = game_time_ms / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
