//! Move tables: relative deltas each piece kind may travel by
//!
//! A move table is a flat map from `(d_row, d_col)` to a [`MoveTag`]. There is
//! no line-of-sight check: sliders list every distance up to the board size
//! and blocking is settled physically by the collision resolver instead.
//!
//! # Tags
//!
//! - [`MoveTag::Any`] - move or capture
//! - [`MoveTag::MoveOnly`] - destination must hold no enemy (pawn push)
//! - [`MoveTag::CaptureOnly`] - destination must hold an enemy (pawn diagonal)

use crate::game::types::{BoardSize, PieceKind, Side};
use std::collections::HashMap;

/// What a delta may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTag {
    Any,
    MoveOnly,
    CaptureOnly,
}

const KING_STEPS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const KNIGHT_STEPS: [(i32, i32); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const ORTHOGONAL: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const DIAGONAL: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// Deltas a piece of one kind and side may use
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveTable {
    entries: HashMap<(i32, i32), MoveTag>,
}

impl MoveTable {
    /// Table for a piece kind on a board of the given size
    ///
    /// Pawn tables depend on the side because pawns only advance forward.
    pub fn for_kind(kind: PieceKind, side: Side, board: BoardSize) -> Self {
        let reach = board.rows.max(board.cols) - 1;
        let mut table = MoveTable::default();
        match kind {
            PieceKind::King => table.insert_all(&KING_STEPS, MoveTag::Any),
            PieceKind::Knight => table.insert_all(&KNIGHT_STEPS, MoveTag::Any),
            PieceKind::Rook => table.insert_rays(&ORTHOGONAL, reach),
            PieceKind::Bishop => table.insert_rays(&DIAGONAL, reach),
            PieceKind::Queen => {
                table.insert_rays(&ORTHOGONAL, reach);
                table.insert_rays(&DIAGONAL, reach);
            }
            PieceKind::Pawn => {
                let fwd = side.forward();
                table.entries.insert((fwd, 0), MoveTag::MoveOnly);
                table.entries.insert((fwd, -1), MoveTag::CaptureOnly);
                table.entries.insert((fwd, 1), MoveTag::CaptureOnly);
            }
        }
        table
    }

    fn insert_all(&mut self, deltas: &[(i32, i32)], tag: MoveTag) {
        for delta in deltas {
            self.entries.insert(*delta, tag);
        }
    }

    fn insert_rays(&mut self, directions: &[(i32, i32)], reach: i32) {
        for (dr, dc) in directions {
            for step in 1..=reach {
                self.entries.insert((dr * step, dc * step), MoveTag::Any);
            }
        }
    }

    /// Tag for a delta, `None` when the delta isn't allowed
    pub fn tag(&self, delta: (i32, i32)) -> Option<MoveTag> {
        self.entries.get(&delta).copied()
    }

    /// Whether the delta is a capture pattern
    pub fn is_capture_pattern(&self, delta: (i32, i32)) -> bool {
        self.tag(delta) == Some(MoveTag::CaptureOnly)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pawn_table_depends_on_side() {
        let white = MoveTable::for_kind(PieceKind::Pawn, Side::White, BoardSize::STANDARD);
        assert_eq!(white.tag((-1, 0)), Some(MoveTag::MoveOnly));
        assert_eq!(white.tag((-1, 1)), Some(MoveTag::CaptureOnly));
        assert_eq!(white.tag((1, 0)), None, "white pawns never retreat");

        let black = MoveTable::for_kind(PieceKind::Pawn, Side::Black, BoardSize::STANDARD);
        assert_eq!(black.tag((1, 0)), Some(MoveTag::MoveOnly));
        assert!(black.is_capture_pattern((1, -1)));
    }

    #[test]
    fn test_sliders_reach_board_edge() {
        let rook = MoveTable::for_kind(PieceKind::Rook, Side::White, BoardSize::STANDARD);
        assert_eq!(rook.len(), 28);
        assert_eq!(rook.tag((0, 7)), Some(MoveTag::Any));
        assert_eq!(rook.tag((1, 1)), None);

        let queen = MoveTable::for_kind(PieceKind::Queen, Side::Black, BoardSize::STANDARD);
        assert_eq!(queen.len(), 56);
        assert_eq!(queen.tag((-7, -7)), Some(MoveTag::Any));
    }

    #[test]
    fn test_knight_and_king_steps() {
        let knight = MoveTable::for_kind(PieceKind::Knight, Side::White, BoardSize::STANDARD);
        assert_eq!(knight.len(), 8);
        assert!(knight.tag((2, 1)).is_some());
        assert!(knight.tag((2, 2)).is_none());

        let king = MoveTable::for_kind(PieceKind::King, Side::White, BoardSize::STANDARD);
        assert_eq!(king.len(), 8);
        assert!(king.tag((0, 0)).is_none(), "standing still isn't a move");
    }

    #[test]
    fn test_larger_board_extends_rays() {
        let board = BoardSize { rows: 10, cols: 12 };
        let bishop = MoveTable::for_kind(PieceKind::Bishop, Side::White, board);
        assert_eq!(bishop.tag((11, 11)), Some(MoveTag::Any));
    }
}
