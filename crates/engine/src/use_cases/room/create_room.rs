//! Create a room and place its creator in it.

use std::sync::Arc;

use plaza_domain::{ClientUpdate, Position, RoomData, RoomId, User, UserId};

use crate::infrastructure::room_locks::RoomGuard;

use super::{LeaveRoom, RoomContext, RoomError};

/// Largest random room id suffix.
const MAX_ROOM_SUFFIX: i32 = 999_999;

/// Create room use case.
///
/// Runs in two phases so a caller can subscribe to the new room before its
/// first scene goes out: [`CreateRoom::claim`] leaves the creator's current
/// room and reserves a fresh `name#suffix` id, then [`CreateRoom::complete`]
/// stores the room with the creator standing at the origin.
pub struct CreateRoom {
    ctx: Arc<RoomContext>,
    leave_room: Arc<LeaveRoom>,
}

/// A reserved room id, locked until the claim is completed or dropped.
pub struct RoomClaim {
    room_id: RoomId,
    room_name: String,
    _guard: RoomGuard,
}

impl RoomClaim {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }
}

impl CreateRoom {
    pub fn new(ctx: Arc<RoomContext>, leave_room: Arc<LeaveRoom>) -> Self {
        Self { ctx, leave_room }
    }

    /// Leave the current room and reserve an unused id for `room_name`.
    pub async fn claim(&self, room_name: &str, user_id: &UserId) -> Result<RoomClaim, RoomError> {
        self.leave_room.execute(user_id).await?;

        loop {
            let suffix = self.ctx.random.gen_range(0, MAX_ROOM_SUFFIX);
            let room_id = RoomId::compose(room_name, suffix);
            let guard = self.ctx.locks.lock(&room_id).await;
            if self.ctx.store.get_room(&room_id).await?.is_none() {
                return Ok(RoomClaim {
                    room_id,
                    room_name: room_name.to_string(),
                    _guard: guard,
                });
            }
            tracing::debug!(room_id = %room_id, "Room id taken, drawing another");
        }
    }

    /// Store the claimed room with its creator and publish the first scene.
    /// Returns the room's user list.
    pub async fn complete(
        &self,
        claim: RoomClaim,
        user_id: &UserId,
        user_name: &str,
    ) -> Result<Vec<User>, RoomError> {
        let room_id = &claim.room_id;

        let mut room = RoomData::new(&claim.room_name);
        room.push_user(User::new(
            user_id.clone(),
            user_name,
            room_id.clone(),
            Position::ORIGIN,
        ))?;

        self.ctx.store.create_room(room_id, &room).await?;
        self.ctx
            .update_client(user_id, ClientUpdate::joined(room_id.clone(), user_name))
            .await?;
        self.ctx.publisher.scene(room_id, &room).await?;

        tracing::info!(room_id = %room_id, user_id = %user_id, "Room created");
        Ok(room.users().to_vec())
    }
}
