//! Use cases - user story orchestration over the ports.

pub mod room;

pub use room::{RoomContext, RoomError, RoomSettings, RoomUseCases};
