//! Command pipeline: routes one command to its piece and announces the result
//!
//! The pipeline never fails. Unknown ids and commands a state machine refuses
//! are logged at debug level and dropped without an event; everything else
//! is reported through the event bus:
//!
//! - a relocation the machine accepted publishes `PIECE_MOVED` (towards the
//!   requested target) followed by `TURN_CHANGED`, unless its delta is a
//!   capture-only pattern, in which case the collision resolver announces
//!   the outcome instead
//! - any other command that changed the piece's cell publishes `PIECE_MOVED`
//!   with the actual cells
//!
//! A pawn that accepted a plain move is checked for promotion at its actual
//! cell, which may differ from the requested target.

use crate::game::command::{Command, CommandKind};
use crate::game::context::GameContext;
use crate::game::error::StateError;
use crate::game::events::Event;
use crate::game::promotion::check_promotion;
use crate::game::types::{Millis, PieceKind};
use tracing::debug;

/// What happened to a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// No live piece has this id
    UnknownPiece,
    /// The piece's state machine refused the command
    Rejected(StateError),
    /// The command was applied
    Applied,
}

/// Feed one command through the pipeline
pub fn process_command(ctx: &mut GameContext, cmd: &Command, now: Millis) -> CommandOutcome {
    let Some(piece) = ctx.piece(&cmd.piece_id) else {
        debug!("[PIPELINE] Unknown piece id '{}', dropping {}", cmd.piece_id, cmd.kind);
        return CommandOutcome::UnknownPiece;
    };
    let id = piece.id.clone();
    let old_cell = piece.current_cell();
    let old_state = piece.machine.state();
    let capture_pattern = match cmd.endpoints() {
        Some((from, to)) if cmd.kind.is_relocation() => {
            piece.machine.moves().is_capture_pattern(from.delta_to(to))
        }
        _ => false,
    };

    ctx.record_origin(&id, old_cell);

    match ctx.apply_command(id.as_str(), cmd) {
        Some(Ok(())) => {}
        Some(Err(e)) => {
            debug!("[PIPELINE] {} rejected {}: {}", id, cmd.kind, e);
            return CommandOutcome::Rejected(e);
        }
        None => return CommandOutcome::UnknownPiece,
    }

    let Some(piece) = ctx.piece(id.as_str()) else {
        return CommandOutcome::Applied;
    };
    let new_cell = piece.current_cell();
    let new_state = piece.machine.state();

    let started_travel =
        cmd.kind.is_relocation() && (new_cell != old_cell || new_state != old_state);
    match cmd.endpoints() {
        Some((_, target)) if started_travel => {
            if capture_pattern {
                debug!(
                    "[PIPELINE] {} heading for capture at {}, leaving announcement to collisions",
                    id, target
                );
            } else {
                ctx.publish(&Event::piece_moved(&id, old_cell, target, cmd.kind.as_str(), now));
                ctx.publish(&Event::turn_changed(&id, now));
            }
        }
        _ if new_cell != old_cell => {
            ctx.publish(&Event::piece_moved(&id, old_cell, new_cell, cmd.kind.as_str(), now));
        }
        _ => {}
    }

    if id.kind() == PieceKind::Pawn && cmd.kind == CommandKind::Move {
        check_promotion(ctx, id.as_str(), now);
    }

    CommandOutcome::Applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::GameSettings;
    use crate::game::event_bus::{handler, EventBus};
    use crate::game::events::EventType;
    use crate::game::layout::BoardLayout;
    use crate::game::types::Cell;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn setup(layout: &str) -> (GameContext, Arc<Mutex<Vec<Event>>>) {
        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in [EventType::PieceMoved, EventType::TurnChanged, EventType::PieceCaptured] {
            let sink = Arc::clone(&seen);
            bus.subscribe(
                kind,
                handler(move |event| {
                    sink.lock().push(event.clone());
                    Ok(())
                }),
            );
        }
        let layout = BoardLayout::parse_csv(layout).unwrap();
        let ctx = GameContext::from_layout(&layout, &GameSettings::default(), bus, 0).unwrap();
        (ctx, seen)
    }

    #[test]
    fn test_unknown_piece_is_silent() {
        let (mut ctx, seen) = setup("KB,,\n,,\nKW,,");
        let cmd = Command::relocate(10, "ZZ9", Cell::new(0, 0), Cell::new(1, 0));

        assert_eq!(process_command(&mut ctx, &cmd, 10), CommandOutcome::UnknownPiece);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_accepted_move_publishes_moved_and_turn() {
        let (mut ctx, seen) = setup("KB,,\n,,\nKW,,");
        let cmd = Command::relocate(10, "KW1", Cell::new(2, 0), Cell::new(1, 0));

        assert_eq!(process_command(&mut ctx, &cmd, 10), CommandOutcome::Applied);
        let events = seen.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventType::PieceMoved);
        assert_eq!(events[0].cell("to"), Some(Cell::new(1, 0)));
        assert_eq!(events[1].kind, EventType::TurnChanged);
        assert_eq!(events[1].str("current_player"), Some("white"));
    }

    #[test]
    fn test_capture_pattern_defers_announcement() {
        let (mut ctx, seen) = setup("KB,,\n,,PB\nKW,PW,");
        let cmd = Command::relocate(10, "PW1", Cell::new(2, 1), Cell::new(1, 2));

        assert_eq!(process_command(&mut ctx, &cmd, 10), CommandOutcome::Applied);
        assert!(seen.lock().is_empty(), "resolver announces the capture");
    }

    #[test]
    fn test_rejected_command_publishes_nothing() {
        let (mut ctx, seen) = setup("KB,,\n,,\nKW,RW,");
        let cmd = Command::relocate(10, "RW1", Cell::new(2, 1), Cell::new(2, 0));

        assert!(matches!(
            process_command(&mut ctx, &cmd, 10),
            CommandOutcome::Rejected(StateError::OwnPieceAtDestination { .. })
        ));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_idle_elsewhere_is_rejected_without_events() {
        let (mut ctx, seen) = setup("KB,,\n,,\nKW,,");
        let cmd = Command::idle(10, "KB1", Cell::new(0, 2));

        assert!(matches!(
            process_command(&mut ctx, &cmd, 10),
            CommandOutcome::Rejected(StateError::IdleElsewhere { .. })
        ));
        assert_eq!(ctx.piece("KB1").map(|p| p.current_cell()), Some(Cell::new(0, 0)));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_idle_in_place_is_silent() {
        let (mut ctx, seen) = setup("KB,,\n,,\nKW,,");
        let cmd = Command::idle(10, "KB1", Cell::new(0, 0));

        assert_eq!(process_command(&mut ctx, &cmd, 10), CommandOutcome::Applied);
        assert!(seen.lock().is_empty());
    }
}
