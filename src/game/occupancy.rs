//! Occupancy index: cell → pieces currently standing there
//!
//! Derived data. The index is rebuilt from the piece collection once per tick
//! (and again before collision resolution) and never edited in place, so it
//! can't drift from the authoritative piece positions.

use crate::game::types::{Cell, PieceId, Side};
use std::collections::BTreeMap;

/// Cell-ordered occupancy snapshot
///
/// Cells iterate in `(row, col)` order and occupants keep the order they were
/// inserted in, so resolution over the index is deterministic.
#[derive(Debug, Clone, Default)]
pub struct OccupancyIndex {
    cells: BTreeMap<Cell, Vec<PieceId>>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with a fresh snapshot
    pub fn rebuild<'a, I>(&mut self, pieces: I)
    where
        I: IntoIterator<Item = (&'a PieceId, Cell)>,
    {
        self.cells.clear();
        for (id, cell) in pieces {
            self.cells.entry(cell).or_default().push(id.clone());
        }
    }

    /// Occupants of a cell, empty when nobody is there
    pub fn at(&self, cell: Cell) -> &[PieceId] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any piece of `side` stands on `cell`
    pub fn has_side_at(&self, cell: Cell, side: Side) -> bool {
        self.at(cell).iter().any(|id| id.side() == side)
    }

    /// Cells holding two or more pieces, in cell order
    pub fn contested(&self) -> impl Iterator<Item = (Cell, &[PieceId])> {
        self.cells
            .iter()
            .filter(|(_, ids)| ids.len() >= 2)
            .map(|(cell, ids)| (*cell, ids.as_slice()))
    }

    /// Cell of a piece, if indexed
    pub fn cell_of(&self, id: &str) -> Option<Cell> {
        self.cells
            .iter()
            .find(|(_, ids)| ids.iter().any(|other| other.as_str() == id))
            .map(|(cell, _)| *cell)
    }

    /// Every indexed piece id
    pub fn ids(&self) -> impl Iterator<Item = &PieceId> {
        self.cells.values().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, &[PieceId])> {
        self.cells.iter().map(|(cell, ids)| (*cell, ids.as_slice()))
    }

    /// Number of indexed pieces
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
