use super::*;

use plaza_shared::{ChatRequest, UpdateTypingRequest};

pub(super) async fn handle_chat(state: &WsState, session: &Session, req: ChatRequest) {
    if !session.owns(&req.from, "broadcastMessage") {
        return;
    }

    if let Err(e) = state
        .app
        .use_cases
        .room
        .broadcast_message
        .execute(&req.room_id, &req.from, &req.msg)
        .await
    {
        tracing::error!(user_id = %req.from, room_id = %req.room_id, error = %e, "Failed to broadcast chat");
    }
}

pub(super) async fn handle_typing(state: &WsState, session: &Session, req: UpdateTypingRequest) {
    if !session.owns(&req.user_id, "updateTyping") {
        return;
    }

    match state
        .app
        .use_cases
        .room
        .update_typing
        .execute(&req.room_id, &req.user_id, req.is_typing)
        .await
    {
        Ok(changed) => {
            tracing::trace!(user_id = %req.user_id, is_typing = req.is_typing, changed, "Typing updated");
        }
        Err(e) => {
            tracing::warn!(user_id = %req.user_id, room_id = %req.room_id, error = %e, "Failed to update typing");
        }
    }
}
