//! Join an existing room (or open one under that id).

use std::sync::Arc;

use plaza_domain::{ClientUpdate, RoomData, RoomId, User, UserId};

use super::{LeaveRoom, RoomContext, RoomError};

/// Join room use case.
///
/// Leaves the joiner's current room, then places them on a random free cell.
/// A full room is left untouched and reported as [`RoomError::RoomFull`].
pub struct JoinRoom {
    ctx: Arc<RoomContext>,
    leave_room: Arc<LeaveRoom>,
}

impl JoinRoom {
    pub fn new(ctx: Arc<RoomContext>, leave_room: Arc<LeaveRoom>) -> Self {
        Self { ctx, leave_room }
    }

    /// Returns the room's user list after the join.
    pub async fn execute(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        user_name: &str,
    ) -> Result<Vec<User>, RoomError> {
        self.leave_room.execute(user_id).await?;

        let settings = &self.ctx.settings;
        let _guard = self.ctx.locks.lock(room_id).await;

        let (mut room, is_new) = match self.ctx.store.get_room(room_id).await? {
            Some(room) => (room, false),
            None => {
                tracing::info!(room_id = %room_id, "Room not found, opening it");
                (RoomData::new(room_id.room_name()), true)
            }
        };

        if room.len() >= settings.room_limit {
            tracing::info!(room_id = %room_id, user_id = %user_id, "Room full, join refused");
            return Err(RoomError::RoomFull {
                room_id: room_id.clone(),
                limit: settings.room_limit,
            });
        }

        let random = &self.ctx.random;
        let position = room
            .pick_free_cell(settings.grid_size, |n| random.gen_range(0, n - 1))
            .ok_or_else(|| RoomError::RoomFull {
                room_id: room_id.clone(),
                limit: settings.room_limit,
            })?;

        room.push_user(User::new(
            user_id.clone(),
            user_name,
            room_id.clone(),
            position,
        ))?;

        if is_new {
            self.ctx.store.create_room(room_id, &room).await?;
        } else {
            self.ctx.store.update_room(room_id, &room).await?;
        }
        self.ctx
            .update_client(user_id, ClientUpdate::joined(room_id.clone(), user_name))
            .await?;
        self.ctx.publisher.scene(room_id, &room).await?;

        tracing::info!(
            room_id = %room_id,
            user_id = %user_id,
            position = %position,
            "User joined room"
        );
        Ok(room.users().to_vec())
    }
}
