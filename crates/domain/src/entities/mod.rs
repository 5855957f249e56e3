//! Domain entities - Core business objects with identity

mod client;
mod room;
mod user;

pub use client::{Client, ClientUpdate};
pub use room::{RoomData, GRID_SIZE, ROOM_LIMIT};
pub use user::User;
