//! User entity - an avatar standing inside a room

use serde::{Deserialize, Serialize};

use crate::value_objects::{FacingDirection, Position};
use crate::{RoomId, UserId};

/// An avatar inside exactly one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: UserId,
    pub user_name: String,
    pub room_id: RoomId,
    pub position: Position,
    pub direction: FacingDirection,
    pub is_typing: bool,
}

impl User {
    pub fn new(
        user_id: UserId,
        user_name: impl Into<String>,
        room_id: RoomId,
        position: Position,
    ) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            room_id,
            position,
            direction: FacingDirection::default(),
            is_typing: false,
        }
    }
}
