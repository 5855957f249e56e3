use super::*;

use plaza_shared::{JoinRoomRequest, LeaveRoomRequest, NewRoomRequest};

use crate::use_cases::RoomError;

pub(super) async fn handle_new_room(state: &WsState, session: &mut Session, req: NewRoomRequest) {
    let room = &state.app.use_cases.room;
    let user_id = session.user_id().clone();

    state.movements.cancel(&user_id);
    session.unfollow();

    let claim = match room.create_room.claim(&req.room_name, &user_id).await {
        Ok(claim) => claim,
        Err(e) => {
            tracing::error!(user_id = %user_id, room_name = %req.room_name, error = %e, "Failed to create room");
            set_connection_room(state, &user_id, None).await;
            return;
        }
    };
    let room_id = claim.room_id().clone();

    // Listen while the id is still locked so joins right after creation are relayed
    subscribe(state, session, &room_id).await;

    let users = match room.create_room.complete(claim, &user_id, &req.user_name).await {
        Ok(users) => users,
        Err(e) => {
            tracing::error!(user_id = %user_id, room_id = %room_id, error = %e, "Failed to create room");
            session.unfollow();
            set_connection_room(state, &user_id, None).await;
            return;
        }
    };

    // Sent directly as well so the scene is ordered before `setUserId`
    set_connection_room(state, &user_id, Some(room_id.clone())).await;
    session.send(&ServerMessage::scene(room_id.clone(), users));
    session.send(&ServerMessage::user_id(user_id.clone()));

    tracing::info!(user_id = %user_id, room_id = %room_id, "Room created");
}

pub(super) async fn handle_join_room(state: &WsState, session: &mut Session, req: JoinRoomRequest) {
    let room = &state.app.use_cases.room;
    let user_id = session.user_id().clone();
    let room_id = req.room_id;

    state.movements.cancel(&user_id);

    // Listen first so no scene published after the join is missed
    subscribe(state, session, &room_id).await;

    match room
        .join_room
        .execute(&room_id, &user_id, &req.user_name)
        .await
    {
        Ok(users) => {
            set_connection_room(state, &user_id, Some(room_id.clone())).await;
            session.send(&ServerMessage::scene(room_id.clone(), users));
            session.send(&ServerMessage::user_id(user_id.clone()));
            tracing::info!(user_id = %user_id, room_id = %room_id, "Joined room");
        }
        Err(RoomError::RoomFull { limit, .. }) => {
            tracing::info!(user_id = %user_id, room_id = %room_id, limit, "Room is full");
            session.unfollow();
            set_connection_room(state, &user_id, None).await;
        }
        Err(e) => {
            tracing::error!(user_id = %user_id, room_id = %room_id, error = %e, "Failed to join room");
            session.unfollow();
            set_connection_room(state, &user_id, None).await;
        }
    }
}

pub(super) async fn handle_leave_room(state: &WsState, session: &mut Session, req: LeaveRoomRequest) {
    if !session.owns(&req.user_id, "leaveRoom") {
        return;
    }
    let user_id = req.user_id;

    state.movements.cancel(&user_id);
    session.unfollow();

    match state.app.use_cases.room.leave_room.execute(&user_id).await {
        Ok(removal) => {
            tracing::info!(user_id = %user_id, outcome = ?removal, "Left room");
        }
        Err(e) => {
            tracing::error!(user_id = %user_id, error = %e, "Failed to leave room");
        }
    }
    set_connection_room(state, &user_id, None).await;
}

async fn subscribe(state: &WsState, session: &mut Session, room_id: &RoomId) {
    match state.app.bus.subscribe(room_id).await {
        Ok(events) => session.follow(room_id.clone(), events),
        Err(e) => {
            tracing::error!(room_id = %room_id, error = %e, "Failed to subscribe to room");
            session.unfollow();
        }
    }
}

async fn set_connection_room(state: &WsState, user_id: &UserId, room_id: Option<RoomId>) {
    if let Err(e) = state.connections.set_room(user_id, room_id).await {
        tracing::warn!(user_id = %user_id, error = %e, "Connection vanished while switching rooms");
    }
}
