//! Relay a chat line to everyone in a room.

use std::sync::Arc;

use plaza_domain::{RoomId, UserId};
use plaza_shared::ServerMessage;

use super::{RoomContext, RoomError};

/// Broadcast message use case.
///
/// The text is cut to the configured character limit and attributed to the
/// sender's display name from their client record.
pub struct BroadcastMessage {
    ctx: Arc<RoomContext>,
}

impl BroadcastMessage {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        room_id: &RoomId,
        from: &UserId,
        text: &str,
    ) -> Result<(), RoomError> {
        let msg = truncate_chars(text, self.ctx.settings.max_message_chars);

        let sender_name = match self.ctx.store.get_client(from).await? {
            Some(client) => client.user_name,
            None => {
                tracing::warn!(user_id = %from, room_id = %room_id, "Chat sender has no client record");
                String::new()
            }
        };

        self.ctx
            .publisher
            .publish(room_id, &ServerMessage::chat(msg, sender_name))
            .await?;
        Ok(())
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
