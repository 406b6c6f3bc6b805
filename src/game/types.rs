//! Type definitions for the real-time engine
//!
//! Provides newtype patterns for board cells, sides, piece kinds and piece
//! identities so that ids, coordinates and timestamps can't be mixed up.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Game time in milliseconds since the game clock started
pub type Millis = u64;

/// Board cell `(row, col)`, serialized as `[row, col]`
///
/// Row 0 is the top of the board (Black's back rank on the standard layout).
/// Coordinates are signed so that out-of-bounds requests coming from input
/// collaborators can be represented and rejected instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Self {
        Cell { row, col }
    }

    /// Delta from `self` to `other` as `(d_row, d_col)`
    pub fn delta_to(self, other: Cell) -> (i32, i32) {
        (other.row - self.row, other.col - self.col)
    }

    /// Offset this cell by a delta
    pub fn offset(self, (dr, dc): (i32, i32)) -> Cell {
        Cell::new(self.row + dr, self.col + dc)
    }

    /// Euclidean distance in cells
    pub fn distance(self, other: Cell) -> f64 {
        let (dr, dc) = self.delta_to(other);
        f64::from(dr * dr + dc * dc).sqrt()
    }

    /// Algebraic notation for a board with `rows` ranks, e.g. `(7, 4)` → `e1` on 8x8
    ///
    /// Columns beyond `z` fall back to the numeric form `(r,c)`.
    pub fn to_algebraic(self, rows: i32) -> String {
        if (0..26).contains(&self.col) && self.row >= 0 && self.row < rows {
            let file = (b'a' + self.col as u8) as char;
            format!("{}{}", file, rows - self.row)
        } else {
            format!("({},{})", self.row, self.col)
        }
    }
}

impl From<(i32, i32)> for Cell {
    fn from((row, col): (i32, i32)) -> Self {
        Cell::new(row, col)
    }
}

impl From<Cell> for (i32, i32) {
    fn from(cell: Cell) -> Self {
        (cell.row, cell.col)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Board dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSize {
    pub rows: i32,
    pub cols: i32,
}

impl BoardSize {
    pub const STANDARD: BoardSize = BoardSize { rows: 8, cols: 8 };

    pub fn contains(&self, cell: Cell) -> bool {
        (0..self.rows).contains(&cell.row) && (0..self.cols).contains(&cell.col)
    }

    /// Row on which pawns of `side` promote
    pub fn promotion_row(&self, side: Side) -> i32 {
        match side {
            Side::White => 0,
            Side::Black => self.rows - 1,
        }
    }
}

impl Default for BoardSize {
    fn default() -> Self {
        BoardSize::STANDARD
    }
}

/// Owning side of a piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn from_code(c: char) -> Option<Self> {
        match c {
            'W' => Some(Side::White),
            'B' => Some(Side::Black),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Side::White => 'W',
            Side::Black => 'B',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Row direction a pawn of this side advances in
    pub fn forward(self) -> i32 {
        match self {
            Side::White => -1,
            Side::Black => 1,
        }
    }
}

/// Kind of piece, encoded as the first letter of a piece id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::King,
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Pawn,
    ];

    pub fn from_code(c: char) -> Option<Self> {
        match c {
            'K' => Some(PieceKind::King),
            'Q' => Some(PieceKind::Queen),
            'R' => Some(PieceKind::Rook),
            'B' => Some(PieceKind::Bishop),
            'N' => Some(PieceKind::Knight),
            'P' => Some(PieceKind::Pawn),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            PieceKind::King => 'K',
            PieceKind::Queen => 'Q',
            PieceKind::Rook => 'R',
            PieceKind::Bishop => 'B',
            PieceKind::Knight => 'N',
            PieceKind::Pawn => 'P',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PieceKind::King => "King",
            PieceKind::Queen => "Queen",
            PieceKind::Rook => "Rook",
            PieceKind::Bishop => "Bishop",
            PieceKind::Knight => "Knight",
            PieceKind::Pawn => "Pawn",
        }
    }

    /// Point value awarded for capturing this kind
    ///
    /// King is worth 0: capturing it ends the game instead.
    pub fn value(self) -> u32 {
        match self {
            PieceKind::Pawn => 1,
            PieceKind::Knight | PieceKind::Bishop => 3,
            PieceKind::Rook => 5,
            PieceKind::Queen => 9,
            PieceKind::King => 0,
        }
    }
}

/// Identity of a live piece, e.g. `PW3` or `QB_1`
///
/// The first character encodes the kind, the second the side; the rest is a
/// disambiguator. Equality, ordering and hashing only look at the raw string so
/// that lookups by `&str` work directly.
#[derive(Debug, Clone)]
pub struct PieceId {
    raw: String,
    kind: PieceKind,
    side: Side,
}

impl PieceId {
    /// Parse an id; returns `None` when the kind or side letter is unknown
    pub fn parse(raw: &str) -> Option<Self> {
        let mut chars = raw.chars();
        let kind = PieceKind::from_code(chars.next()?)?;
        let side = Side::from_code(chars.next()?)?;
        Some(PieceId {
            raw: raw.to_string(),
            kind,
            side,
        })
    }

    /// Id for a queen minted by promotion: `Q<side>_<n>`
    pub fn promoted_queen(side: Side, n: u32) -> Self {
        PieceId {
            raw: format!("Q{}_{}", side.code(), n),
            kind: PieceKind::Queen,
            side,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_king(&self) -> bool {
        self.kind == PieceKind::King
    }
}

impl PartialEq for PieceId {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for PieceId {}

impl Hash for PieceId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl PartialOrd for PieceId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PieceId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl Borrow<str> for PieceId {
    fn borrow(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
