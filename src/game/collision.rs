//! Collision resolution
//!
//! Runs once per tick after every piece has been advanced and the queue
//! drained. The occupancy index is rebuilt first, so commands applied during
//! the drain are seen. Each cell holding two or more pieces is settled on its
//! own:
//!
//! 1. **Attackers** are occupants whose state can capture. A knight that is
//!    only passing over the cell is left out of the cell entirely.
//! 2. The **winner** is the attacker whose current action started last. With
//!    no attacker, the most recent arrival among the occupants that aren't
//!    passing through wins; a cell holding only passing knights is skipped.
//! 3. Every other occupant that can be captured, isn't passing through and
//!    belongs to the winner's opponent is **captured**: removed from the game
//!    with a `PIECE_CAPTURED` event.
//!
//! Same-side and uncapturable occupants are left alone even when co-located.
//! Equal start times go to the lexicographically smallest id so the outcome
//! never depends on iteration order.

use crate::game::context::GameContext;
use crate::game::events::Event;
use crate::game::types::{Cell, Millis, PieceId};
use std::cmp::{Ordering, Reverse};
use tracing::{debug, info};

/// One capture performed during resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub captured: PieceId,
    pub captured_by: PieceId,
    pub cell: Cell,
}

/// Occupant facts needed to settle a cell
#[derive(Debug, Clone)]
struct Occupant {
    id: PieceId,
    start_ms: Millis,
    can_capture: bool,
    can_be_captured: bool,
    passing_through: bool,
}

/// Settle every contested cell; returns the captures in the order performed
///
/// The occupancy index is rebuilt before and after, so it reflects current
/// positions going in and only lists survivors coming out.
pub fn resolve_collisions(ctx: &mut GameContext, now: Millis) -> Vec<Capture> {
    ctx.rebuild_occupancy();
    let contested: Vec<(Cell, Vec<PieceId>)> = ctx
        .occupancy()
        .contested()
        .map(|(cell, ids)| (cell, ids.to_vec()))
        .collect();

    let mut captures = Vec::new();
    for (cell, ids) in contested {
        let occupants: Vec<Occupant> = ids
            .iter()
            .filter_map(|id| {
                let machine = &ctx.piece(id.as_str())?.machine;
                Some(Occupant {
                    id: id.clone(),
                    start_ms: machine.start_ms(),
                    can_capture: machine.can_capture(),
                    can_be_captured: machine.can_be_captured(),
                    passing_through: machine.is_passing_through(),
                })
            })
            .collect();

        let Some(winner) = pick_winner(&occupants) else {
            debug!("[COLLISION] Only passing knights at {}, skipping", cell);
            continue;
        };

        for victim in capturable(&occupants, winner) {
            if ctx.remove(victim.id.as_str()).is_none() {
                continue;
            }
            let from = ctx.origin_of(winner.id.as_str()).unwrap_or(cell);
            info!(
                "[COLLISION] {} captured {} at {} (from {})",
                winner.id, victim.id, cell, from
            );
            ctx.publish(&Event::piece_captured(&victim.id, &winner.id, from, cell, now));
            captures.push(Capture {
                captured: victim.id.clone(),
                captured_by: winner.id.clone(),
                cell,
            });
        }
    }

    ctx.rebuild_occupancy();
    captures
}

/// Winner of a contested cell, `None` when nothing there can take part
fn pick_winner(occupants: &[Occupant]) -> Option<&Occupant> {
    let present = || occupants.iter().filter(|o| !o.passing_through);

    if present().any(|o| o.can_capture) {
        present().filter(|o| o.can_capture).max_by(|a, b| latest_first(a, b))
    } else {
        present().max_by(|a, b| latest_first(a, b))
    }
}

/// Later start wins; on a tie the smaller id ranks higher
fn latest_first(a: &Occupant, b: &Occupant) -> Ordering {
    (a.start_ms, Reverse(&a.id)).cmp(&(b.start_ms, Reverse(&b.id)))
}

fn capturable<'a>(occupants: &'a [Occupant], winner: &'a Occupant) -> impl Iterator<Item = &'a Occupant> {
    occupants.iter().filter(move |o| {
        o.id != winner.id
            && o.can_be_captured
            && !o.passing_through
            && o.id.side() != winner.id.side()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GameSettings;
    use crate::game::command::Command;
    use crate::game::event_bus::EventBus;
    use crate::game::layout::BoardLayout;
    use std::sync::Arc;

    fn occupant(id: &str, start_ms: Millis, can_capture: bool) -> Occupant {
        Occupant {
            id: PieceId::parse(id).unwrap(),
            start_ms,
            can_capture,
            can_be_captured: true,
            passing_through: false,
        }
    }

    #[test]
    fn test_attacker_beats_later_idle_piece() {
        let occupants = vec![occupant("RW1", 100, true), occupant("PB1", 500, false)];
        assert_eq!(pick_winner(&occupants).unwrap().id.as_str(), "RW1");
    }

    #[test]
    fn test_latest_attacker_wins() {
        let occupants = vec![occupant("RW1", 100, true), occupant("QB1", 300, true)];
        assert_eq!(pick_winner(&occupants).unwrap().id.as_str(), "QB1");
    }

    #[test]
    fn test_tie_goes_to_smallest_id() {
        let occupants = vec![occupant("RW1", 100, true), occupant("BB1", 100, true)];
        assert_eq!(pick_winner(&occupants).unwrap().id.as_str(), "BB1");

        let reversed = vec![occupant("BB1", 100, true), occupant("RW1", 100, true)];
        assert_eq!(pick_winner(&reversed).unwrap().id.as_str(), "BB1");
    }

    #[test]
    fn test_passing_knight_is_ignored() {
        let mut knight = occupant("NW1", 900, true);
        knight.passing_through = true;
        let occupants = vec![knight.clone(), occupant("PB1", 100, false)];

        let winner = pick_winner(&occupants).unwrap();
        assert_eq!(winner.id.as_str(), "PB1");
        assert_eq!(capturable(&occupants, winner).count(), 0);

        assert!(pick_winner(&[knight]).is_none(), "only passing knights: no winner");
    }

    #[test]
    fn test_same_side_and_airborne_survive() {
        let mut airborne = occupant("PB2", 50, false);
        airborne.can_be_captured = false;
        let occupants = vec![
            occupant("QW1", 400, true),
            occupant("RW1", 10, false),
            airborne,
            occupant("NB1", 20, false),
        ];

        let winner = pick_winner(&occupants).unwrap();
        let victims: Vec<_> = capturable(&occupants, winner)
            .map(|o| o.id.as_str())
            .collect();
        assert_eq!(victims, vec!["NB1"]);
    }

    #[test]
    fn test_resolution_sees_positions_changed_since_last_rebuild() {
        //! A piece seated after the index was last rebuilt still takes part
        //! in the same resolution pass
        let layout = BoardLayout::parse_csv("KB,,\n,,\nKW,RW,").unwrap();
        let mut ctx =
            GameContext::from_layout(&layout, &GameSettings::default(), Arc::new(EventBus::new()), 0)
                .unwrap();
        ctx.rebuild_occupancy();

        ctx.piece_mut("RW1")
            .unwrap()
            .machine
            .reset(&Command::idle(500, "RW1", Cell::new(0, 0)));

        let captures = resolve_collisions(&mut ctx, 500);
        assert_eq!(
            captures,
            vec![Capture {
                captured: PieceId::parse("KB1").unwrap(),
                captured_by: PieceId::parse("RW1").unwrap(),
                cell: Cell::new(0, 0),
            }]
        );
        assert_eq!(ctx.occupancy().at(Cell::new(0, 0)).len(), 1);
    }
}
