//! Client entity - per-connection metadata

use serde::{Deserialize, Serialize};

use crate::{RoomId, UserId};

/// Connection-scoped record used to find the room to clean up on disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: UserId,
    #[serde(default)]
    pub room_id: Option<RoomId>,
    #[serde(default)]
    pub user_name: String,
}

impl Client {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            room_id: None,
            user_name: String::new(),
        }
    }

    /// Merge a partial update. Fields left as `None` in the update are kept.
    pub fn apply(&mut self, update: ClientUpdate) {
        if let Some(room_id) = update.room_id {
            self.room_id = room_id;
        }
        if let Some(user_name) = update.user_name {
            self.user_name = user_name;
        }
    }
}

/// Partial client fields for `update_client`.
///
/// `room_id: Some(None)` clears the room; `None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientUpdate {
    pub room_id: Option<Option<RoomId>>,
    pub user_name: Option<String>,
}

impl ClientUpdate {
    pub fn joined(room_id: RoomId, user_name: impl Into<String>) -> Self {
        Self {
            room_id: Some(Some(room_id)),
            user_name: Some(user_name.into()),
        }
    }

    pub fn left_room() -> Self {
        Self {
            room_id: Some(None),
            user_name: None,
        }
    }
}
