//! Toggle a user's typing indicator.

use std::sync::Arc;

use plaza_domain::{DomainError, RoomId, UserId};

use super::{RoomContext, RoomError};

pub struct UpdateTyping {
    ctx: Arc<RoomContext>,
}

impl UpdateTyping {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    /// Returns whether the flag changed. Unchanged flags are neither stored
    /// nor published.
    pub async fn execute(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        is_typing: bool,
    ) -> Result<bool, RoomError> {
        let _guard = self.ctx.locks.lock(room_id).await;

        let mut room = self
            .ctx
            .store
            .get_room(room_id)
            .await?
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;

        let changed = room
            .set_typing(user_id, is_typing)
            .map_err(|e| match e {
                DomainError::NotFound { .. } => RoomError::UserNotFound {
                    room_id: room_id.clone(),
                    user_id: user_id.clone(),
                },
                other => other.into(),
            })?;

        if changed {
            self.ctx.store.update_room(room_id, &room).await?;
            self.ctx.publisher.scene(room_id, &room).await?;
        }
        Ok(changed)
    }
}
