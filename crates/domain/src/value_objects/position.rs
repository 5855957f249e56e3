//! Grid cell coordinates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A cell on the room grid.
///
/// Rows and columns are signed so that movement deltas and out-of-range
/// client input can be represented before bounds checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const ORIGIN: Position = Position { row: 0, col: 0 };

    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Occupancy key, `"row,col"`.
    pub fn key(&self) -> String {
        format!("{},{}", self.row, self.col)
    }

    /// Whether the cell lies on a `grid_size` × `grid_size` grid.
    pub fn in_bounds(&self, grid_size: i32) -> bool {
        (0..grid_size).contains(&self.row) && (0..grid_size).contains(&self.col)
    }

    /// Manhattan distance, `|Δrow| + |Δcol|`.
    pub fn manhattan(&self, other: &Position) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

impl FromStr for Position {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, col) = s
            .split_once(',')
            .ok_or_else(|| DomainError::parse(format!("expected \"row,col\", got {s:?}")))?;
        let row = row
            .trim()
            .parse()
            .map_err(|_| DomainError::parse(format!("invalid row in {s:?}")))?;
        let col = col
            .trim()
            .parse()
            .map_err(|_| DomainError::parse(format!("invalid column in {s:?}")))?;
        Ok(Self { row, col })
    }
}
