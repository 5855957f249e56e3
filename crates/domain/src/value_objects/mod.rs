//! Value objects - Immutable objects defined by their attributes

mod facing;
mod position;

pub use facing::FacingDirection;
pub use position::Position;
