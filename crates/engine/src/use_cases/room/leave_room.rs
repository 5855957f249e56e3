//! Leave whatever room the client is in.

use std::sync::Arc;

use plaza_domain::{ClientUpdate, UserId};

use super::{Removal, RemoveUser, RoomContext, RoomError};

/// Leave room use case.
///
/// Clears the client's room and removes its user from that room. Used both
/// for an explicit `leaveRoom` and for disconnect cleanup.
pub struct LeaveRoom {
    ctx: Arc<RoomContext>,
    remove_user: Arc<RemoveUser>,
}

impl LeaveRoom {
    pub fn new(ctx: Arc<RoomContext>, remove_user: Arc<RemoveUser>) -> Self {
        Self { ctx, remove_user }
    }

    pub async fn execute(&self, user_id: &UserId) -> Result<Removal, RoomError> {
        let Some(room_id) = self.ctx.current_room(user_id).await? else {
            return Ok(Removal::Absent);
        };

        self.ctx
            .update_client(user_id, ClientUpdate::left_room())
            .await?;
        self.remove_user.execute(user_id, &room_id).await
    }
}
