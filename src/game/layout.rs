//! Initial board layouts
//!
//! A layout is a CSV grid of two-letter piece codes (`RB`, `PW`, ...). Empty
//! fields are empty cells. Ids are minted per code in row-major order, so the
//! first white pawn read becomes `PW1`, the next `PW2`, and so on.
//!
//! Parsing only checks the grid itself. Game rules on the placement (kings
//! present, no same-side overlap) are enforced when a
//! [`GameContext`](crate::game::context::GameContext) is built from it.

use crate::game::error::{GameError, GameResult};
use crate::game::types::{BoardSize, Cell, PieceId};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Standard opening position, Black on top
pub const STANDARD_LAYOUT: &str = "\
RB,NB,BB,QB,KB,BB,NB,RB
PB,PB,PB,PB,PB,PB,PB,PB
,,,,,,,
,,,,,,,
,,,,,,,
,,,,,,,
PW,PW,PW,PW,PW,PW,PW,PW
RW,NW,BW,QW,KW,BW,NW,RW
";

/// Board size plus initial piece placements
#[derive(Debug, Clone, PartialEq)]
pub struct BoardLayout {
    pub board: BoardSize,
    pub placements: Vec<(PieceId, Cell)>,
}

impl BoardLayout {
    /// Empty board of the given size
    pub fn empty(board: BoardSize) -> Self {
        Self {
            board,
            placements: Vec::new(),
        }
    }

    pub fn standard() -> Self {
        // The constant is a well-formed 8x8 grid
        Self::parse_csv(STANDARD_LAYOUT).unwrap_or_else(|_| Self::empty(BoardSize::STANDARD))
    }

    /// Parse a CSV grid
    pub fn parse_csv(text: &str) -> GameResult<Self> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        if rows.is_empty() {
            return Err(GameError::InvalidLayout {
                message: "layout has no rows".to_string(),
            });
        }

        let mut counters: HashMap<String, u32> = HashMap::new();
        let mut placements = Vec::new();
        let mut cols = None;

        for (r, line) in rows.iter().enumerate() {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            match cols {
                None => cols = Some(fields.len()),
                Some(expected) if expected != fields.len() => {
                    return Err(GameError::InvalidLayout {
                        message: format!(
                            "row {} has {} columns, expected {}",
                            r,
                            fields.len(),
                            expected
                        ),
                    });
                }
                Some(_) => {}
            }

            for (c, code) in fields.iter().enumerate() {
                if code.is_empty() {
                    continue;
                }
                if code.chars().count() != 2 {
                    return Err(GameError::InvalidPieceCode {
                        code: code.to_string(),
                    });
                }
                let n = counters.entry(code.to_string()).or_insert(0);
                *n += 1;
                let id = PieceId::parse(&format!("{}{}", code, n)).ok_or_else(|| {
                    GameError::InvalidPieceCode {
                        code: code.to_string(),
                    }
                })?;
                placements.push((id, Cell::new(r as i32, c as i32)));
            }
        }

        Ok(Self {
            board: BoardSize {
                rows: rows.len() as i32,
                cols: cols.unwrap_or(0) as i32,
            },
            placements,
        })
    }

    pub fn load(path: &Path) -> GameResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| GameError::InvalidLayout {
            message: format!("cannot read {:?}: {}", path, e),
        })?;
        Self::parse_csv(&text)
    }

    /// Add a piece by id; unknown codes are rejected
    pub fn with_piece(mut self, id: &str, cell: Cell) -> GameResult<Self> {
        let id = PieceId::parse(id).ok_or_else(|| GameError::InvalidPieceCode {
            code: id.to_string(),
        })?;
        self.placements.push((id, cell));
        Ok(self)
    }

    /// Drop a piece by id
    pub fn without_piece(mut self, id: &str) -> Self {
        self.placements.retain(|(placed, _)| placed.as_str() != id);
        self
    }
}
