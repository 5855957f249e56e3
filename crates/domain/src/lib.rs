//! Plaza domain types.
//!
//! Rooms are fixed square grids holding up to [`ROOM_LIMIT`] avatars. Every
//! mutation goes through [`RoomData`]'s mutators so the user index and the
//! occupancy set stay consistent with the user list.

pub mod entities;
pub mod error;
pub mod ids;
pub mod pathfinding;
pub mod value_objects;

pub use entities::{Client, ClientUpdate, RoomData, User, GRID_SIZE, ROOM_LIMIT};
pub use error::DomainError;
pub use ids::{RoomId, UserId, ROOM_ID_SEPARATOR};
pub use pathfinding::find_path;
pub use value_objects::{FacingDirection, Position};
