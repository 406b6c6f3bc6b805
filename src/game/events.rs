//! Domain events published on the [`EventBus`](crate::game::event_bus::EventBus)
//!
//! An event is a type tag plus a free-form JSON object payload, stamped with
//! the wall-clock time it was created and the game time it describes. Payload
//! keys follow the wire shapes observers already understand:
//!
//! | Event            | Payload keys                                                |
//! |------------------|-------------------------------------------------------------|
//! | `PIECE_MOVED`    | `piece`, `from`, `to`, `command_type` (+ `promotion`, `old_piece_id`) |
//! | `PIECE_CAPTURED` | `piece_type` (captured id), `captured_by`, `from_position`, `position` |
//! | `GAME_STARTED`   | -                                                           |
//! | `GAME_ENDED`     | `winner` (side name or null), `result`                      |
//! | `TURN_CHANGED`   | `current_player`, `move_piece`                              |
//!
//! Every payload also carries `game_time_ms`.

use crate::game::types::{Cell, Millis, PieceId, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Kind of domain event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    PieceMoved,
    PieceCaptured,
    GameStarted,
    GameEnded,
    TurnChanged,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::PieceMoved => "PIECE_MOVED",
            EventType::PieceCaptured => "PIECE_CAPTURED",
            EventType::GameStarted => "GAME_STARTED",
            EventType::GameEnded => "GAME_ENDED",
            EventType::TurnChanged => "TURN_CHANGED",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published notification of a game-state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventType,
    pub data: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
    pub game_time_ms: Millis,
}

impl Event {
    /// Empty event of `kind` at `game_time_ms`
    pub fn new(kind: EventType, game_time_ms: Millis) -> Self {
        let mut data = Map::new();
        data.insert("game_time_ms".to_string(), json!(game_time_ms));
        Self {
            kind,
            data,
            timestamp: Utc::now(),
            game_time_ms,
        }
    }

    /// Add a payload entry
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn piece_moved(piece: &PieceId, from: Cell, to: Cell, command_type: &str, at: Millis) -> Self {
        Event::new(EventType::PieceMoved, at)
            .with("piece", piece.as_str())
            .with("from", cell_value(from))
            .with("to", cell_value(to))
            .with("command_type", command_type)
    }

    /// `PIECE_MOVED` flagged as a promotion: same cell, new identity
    pub fn promotion(old_id: &PieceId, new_id: &PieceId, cell: Cell, at: Millis) -> Self {
        Event::piece_moved(new_id, cell, cell, "promotion", at)
            .with("promotion", true)
            .with("old_piece_id", old_id.as_str())
    }

    pub fn piece_captured(
        captured: &PieceId,
        captured_by: &PieceId,
        from_position: Cell,
        position: Cell,
        at: Millis,
    ) -> Self {
        Event::new(EventType::PieceCaptured, at)
            .with("piece_type", captured.as_str())
            .with("captured_by", captured_by.as_str())
            .with("from_position", cell_value(from_position))
            .with("position", cell_value(position))
    }

    pub fn game_started(at: Millis) -> Self {
        Event::new(EventType::GameStarted, at)
    }

    pub fn game_ended(winner: Option<Side>, at: Millis) -> Self {
        Event::new(EventType::GameEnded, at).with("winner", winner.map(Side::name))
    }

    pub fn turn_changed(mover: &PieceId, at: Millis) -> Self {
        Event::new(EventType::TurnChanged, at)
            .with("current_player", mover.side().name().to_lowercase())
            .with("move_piece", mover.as_str())
    }

    /// String payload entry
    pub fn str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Cell payload entry stored as `[row, col]`
    pub fn cell(&self, key: &str) -> Option<Cell> {
        self.data
            .get(key)
            .and_then(|value| serde_json::from_value::<Cell>(value.clone()).ok())
    }

    pub fn flag(&self, key: &str) -> bool {
        self.data.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn is_promotion(&self) -> bool {
        self.kind == EventType::PieceMoved && self.flag("promotion")
    }
}

fn cell_value(cell: Cell) -> Value {
    json!([cell.row, cell.col])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> PieceId {
        PieceId::parse(raw).unwrap()
    }

    #[test]
    fn test_piece_moved_payload() {
        let event = Event::piece_moved(&id("PW1"), Cell::new(6, 4), Cell::new(5, 4), "move", 1_200);

        assert_eq!(event.kind, EventType::PieceMoved);
        assert_eq!(event.str("piece"), Some("PW1"));
        assert_eq!(event.cell("from"), Some(Cell::new(6, 4)));
        assert_eq!(event.cell("to"), Some(Cell::new(5, 4)));
        assert_eq!(event.data["game_time_ms"], json!(1_200));
        assert!(!event.is_promotion());
    }

    #[test]
    fn test_capture_payload_keys() {
        let event = Event::piece_captured(
            &id("PW2"),
            &id("PB2"),
            Cell::new(3, 4),
            Cell::new(4, 4),
            50,
        );
        assert_eq!(event.str("piece_type"), Some("PW2"));
        assert_eq!(event.str("captured_by"), Some("PB2"));
        assert_eq!(event.cell("from_position"), Some(Cell::new(3, 4)));
        assert_eq!(event.cell("position"), Some(Cell::new(4, 4)));
    }

    #[test]
    fn test_promotion_marker() {
        let event = Event::promotion(&id("PW1"), &id("QW_1"), Cell::new(0, 3), 0);
        assert!(event.is_promotion());
        assert_eq!(event.str("old_piece_id"), Some("PW1"));
        assert_eq!(event.str("piece"), Some("QW_1"));
        assert_eq!(event.cell("from"), event.cell("to"));
    }

    #[test]
    fn test_game_ended_without_winner_is_null() {
        let event = Event::game_ended(None, 10);
        assert_eq!(event.data["winner"], Value::Null);
        let event = Event::game_ended(Some(Side::Black), 10);
        assert_eq!(event.str("winner"), Some("Black"));
    }

    #[test]
    fn test_event_type_wire_names() {
        assert_eq!(
            serde_json::to_value(EventType::TurnChanged).unwrap(),
            json!("TURN_CHANGED")
        );
        assert_eq!(EventType::PieceCaptured.to_string(), "PIECE_CAPTURED");
    }
}
