//! Commands: timestamped intents produced by input collaborators
//!
//! A [`Command`] is immutable once issued and is consumed exactly once by the
//! command pipeline. Producers (keyboard threads, network sessions, script
//! replays) never touch piece state; they only push commands into the bounded
//! input queue.

use crate::game::types::{Cell, Millis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Command type
///
/// Serialized as its lowercase name. Unrecognised names are preserved in
/// [`CommandKind::Other`] so a state machine can reject them explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommandKind {
    Move,
    Capture,
    Jump,
    Idle,
    Exit,
    Other(String),
}

impl CommandKind {
    pub fn as_str(&self) -> &str {
        match self {
            CommandKind::Move => "move",
            CommandKind::Capture => "capture",
            CommandKind::Jump => "jump",
            CommandKind::Idle => "idle",
            CommandKind::Exit => "exit",
            CommandKind::Other(name) => name,
        }
    }

    /// Commands that carry `[from, to]` and relocate a piece
    pub fn is_relocation(&self) -> bool {
        matches!(self, CommandKind::Move | CommandKind::Capture)
    }
}

impl From<String> for CommandKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "move" => CommandKind::Move,
            "capture" => CommandKind::Capture,
            "jump" => CommandKind::Jump,
            "idle" => CommandKind::Idle,
            "exit" => CommandKind::Exit,
            _ => CommandKind::Other(value),
        }
    }
}

impl From<&str> for CommandKind {
    fn from(value: &str) -> Self {
        CommandKind::from(value.to_string())
    }
}

impl From<CommandKind> for String {
    fn from(kind: CommandKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamped request to act on a named piece
///
/// `params` holds 0, 1 or 2 cells depending on the type: moves carry
/// `[from, to]`, idle/reset carries `[cell]`, jump carries `[cell]` or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub timestamp: Millis,
    pub piece_id: String,
    #[serde(rename = "type")]
    pub kind: CommandKind,
    #[serde(default)]
    pub params: Vec<Cell>,
}

impl Command {
    pub fn new(
        timestamp: Millis,
        piece_id: impl Into<String>,
        kind: CommandKind,
        params: Vec<Cell>,
    ) -> Self {
        Self {
            timestamp,
            piece_id: piece_id.into(),
            kind,
            params,
        }
    }

    /// `move [from, to]`
    pub fn relocate(timestamp: Millis, piece_id: impl Into<String>, from: Cell, to: Cell) -> Self {
        Self::new(timestamp, piece_id, CommandKind::Move, vec![from, to])
    }

    /// `jump [cell]`
    pub fn jump(timestamp: Millis, piece_id: impl Into<String>, at: Cell) -> Self {
        Self::new(timestamp, piece_id, CommandKind::Jump, vec![at])
    }

    /// `idle [cell]`: idle in place at `cell`; `reset` uses it to seat a piece
    pub fn idle(timestamp: Millis, piece_id: impl Into<String>, at: Cell) -> Self {
        Self::new(timestamp, piece_id, CommandKind::Idle, vec![at])
    }

    /// The loop-terminating control command
    pub fn exit(timestamp: Millis) -> Self {
        Self::new(timestamp, String::new(), CommandKind::Exit, Vec::new())
    }

    /// `(from, to)` when the command carries two cells
    pub fn endpoints(&self) -> Option<(Cell, Cell)> {
        match self.params.as_slice() {
            [from, to, ..] => Some((*from, *to)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_json_shape() {
        let raw = r#"{"timestamp":1500,"piece_id":"PW1","type":"move","params":[[1,3],[0,3]]}"#;
        let cmd: Command = serde_json::from_str(raw).expect("valid command");

        assert_eq!(cmd.timestamp, 1500);
        assert_eq!(cmd.kind, CommandKind::Move);
        assert_eq!(cmd.endpoints(), Some((Cell::new(1, 3), Cell::new(0, 3))));
    }

    #[test]
    fn test_unknown_kind_is_preserved() {
        let raw = r#"{"timestamp":0,"piece_id":"RW1","type":"teleport"}"#;
        let cmd: Command = serde_json::from_str(raw).expect("valid command");

        assert_eq!(cmd.kind, CommandKind::Other("teleport".to_string()));
        assert!(cmd.params.is_empty());
        assert_eq!(cmd.endpoints(), None);
    }

    #[test]
    fn test_exit_has_no_target() {
        let cmd = Command::exit(42);
        assert_eq!(cmd.kind, CommandKind::Exit);
        assert!(cmd.piece_id.is_empty());
    }

    #[test]
    fn test_kind_serializes_as_name() {
        let value = serde_json::to_value(Command::jump(5, "NB1", Cell::new(0, 1))).unwrap();
        assert_eq!(value["type"], "jump");
        assert_eq!(value["params"], serde_json::json!([[0, 1]]));
    }
}
