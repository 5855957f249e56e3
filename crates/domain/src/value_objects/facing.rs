//! Avatar facing direction.

use serde::{Deserialize, Serialize};

use super::Position;

/// Which of the four isometric sprites an avatar shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacingDirection {
    FrontLeft,
    #[default]
    FrontRight,
    BackLeft,
    BackRight,
}

impl FacingDirection {
    /// Classify the raw delta from `origin` to `dest`.
    ///
    /// The table is not a geometric projection: single-row diagonal moves
    /// face differently from longer ones, and a few quadrants collapse onto
    /// the same sprite. Clients depend on this exact mapping.
    pub fn from_move(origin: Position, dest: Position) -> Self {
        let dx = dest.row - origin.row;
        let dy = dest.col - origin.col;

        match (dx, dy) {
            (0, 0) => Self::FrontRight,
            (dx, 0) if dx > 0 => Self::FrontRight,
            (_, 0) => Self::BackLeft,
            (0, dy) if dy > 0 => Self::FrontLeft,
            (0, _) => Self::FrontRight,
            (1, dy) if dy > 0 => Self::FrontLeft,
            (dx, dy) if dx > 0 && dy > 0 => Self::FrontRight,
            (dx, dy) if dx < 0 && dy > 0 => Self::FrontLeft,
            (dx, dy) if dx < 0 && dy < 0 => Self::BackLeft,
            (1, _) => Self::FrontRight,
            _ => Self::BackRight,
        }
    }
}
