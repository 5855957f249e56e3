//! Remove a user from a room.

use std::sync::Arc;

use plaza_domain::{RoomId, UserId};

use super::{RoomContext, RoomError};

/// What removing a user did to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Room or user was not there; nothing changed.
    Absent,
    /// User removed, room still has members (or is the default room).
    Left,
    /// User removed and the emptied room was deleted.
    RoomClosed,
}

/// Remove user use case.
///
/// Swap-removes the user, deletes the room when it empties (the default room
/// is kept), and publishes the new scene when the room survives. Idempotent.
pub struct RemoveUser {
    ctx: Arc<RoomContext>,
}

impl RemoveUser {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    pub async fn execute(&self, user_id: &UserId, room_id: &RoomId) -> Result<Removal, RoomError> {
        let guard = self.ctx.locks.lock(room_id).await;

        let Some(mut room) = self.ctx.store.get_room(room_id).await? else {
            tracing::debug!(room_id = %room_id, user_id = %user_id, "Room already gone");
            return Ok(Removal::Absent);
        };

        if room.swap_remove_user(user_id).is_none() {
            tracing::debug!(room_id = %room_id, user_id = %user_id, "User not in room");
            return Ok(Removal::Absent);
        }

        if room.is_empty() && *room_id != self.ctx.settings.default_room {
            self.ctx.store.delete_room(room_id).await?;
            drop(guard);
            self.ctx.locks.forget(room_id);
            tracing::info!(room_id = %room_id, "Room emptied and closed");
            return Ok(Removal::RoomClosed);
        }

        self.ctx.store.update_room(room_id, &room).await?;
        self.ctx.publisher.scene(room_id, &room).await?;
        drop(guard);

        tracing::info!(
            room_id = %room_id,
            user_id = %user_id,
            remaining = room.len(),
            "User left room"
        );
        Ok(Removal::Left)
    }
}
