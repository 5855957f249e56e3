//! WebSocket handling for room clients.
//!
//! Each socket gets three tasks: the read loop below, a writer that owns the
//! socket sink, and a relay that copies the current room's bus payloads into
//! the writer's channel. Moves run as separate tasks under [`MovementTracker`].

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
};
use futures_util::stream::BoxStream;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

mod ws_chat;
mod ws_movement;
mod ws_room;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod ws_integration_tests;

use plaza_domain::{Client, RoomId, UserId};
use plaza_shared::{ClientMessage, ServerMessage};

use super::connections::{ConnectionInfo, ConnectionManager};
use crate::app::App;
use crate::use_cases::room::MovementTracker;

/// Buffer size for per-connection message channel.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

/// How long teardown waits for the writer to flush and close the socket.
const WRITER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Combined state for WebSocket handlers.
pub struct WsState {
    pub app: Arc<App>,
    pub connections: Arc<ConnectionManager>,
    pub movements: Arc<MovementTracker>,
}

impl WsState {
    pub fn new(app: Arc<App>) -> Self {
        let connections = Arc::new(ConnectionManager::new(app.config.ws_connection_limit));
        Self {
            app,
            connections,
            movements: Arc::new(MovementTracker::new()),
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<WsState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, addr.ip(), state))
}

/// Per-connection state owned by the read loop.
pub(crate) struct Session {
    connection_id: Uuid,
    user_id: UserId,
    tx: mpsc::Sender<String>,
    writer: JoinHandle<()>,
    room_id: Option<RoomId>,
    relay: Option<JoinHandle<()>>,
}

impl Session {
    fn new(
        connection_id: Uuid,
        user_id: UserId,
        tx: mpsc::Sender<String>,
        writer: JoinHandle<()>,
    ) -> Self {
        Self {
            connection_id,
            user_id,
            tx,
            writer,
            room_id: None,
            relay: None,
        }
    }

    pub(crate) fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Whether a payload's actor id is this connection's own user.
    pub(crate) fn owns(&self, claimed: &UserId, event: &str) -> bool {
        if claimed == &self.user_id {
            return true;
        }
        tracing::warn!(
            connection_id = %self.connection_id,
            user_id = %self.user_id,
            claimed = %claimed,
            event,
            "Payload actor does not match connection, dropping"
        );
        false
    }

    /// Push a message to this connection only.
    pub(crate) fn send(&self, message: &ServerMessage) {
        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(connection_id = %self.connection_id, error = %e, "Failed to serialize message");
                return;
            }
        };
        if self.tx.try_send(payload).is_err() {
            tracing::warn!(
                connection_id = %self.connection_id,
                "Failed to send message, channel full or closed"
            );
        }
    }

    /// Relay `events` to the socket, replacing any previous room's relay.
    pub(crate) fn follow(&mut self, room_id: RoomId, mut events: BoxStream<'static, String>) {
        self.unfollow();

        let tx = self.tx.clone();
        let connection_id = self.connection_id;
        let relayed_room = room_id.clone();
        self.relay = Some(tokio::spawn(async move {
            while let Some(payload) = events.next().await {
                if tx.send(payload).await.is_err() {
                    break;
                }
            }
            tracing::debug!(connection_id = %connection_id, room_id = %relayed_room, "Room relay stopped");
        }));
        self.room_id = Some(room_id);
    }

    /// Stop relaying room events.
    pub(crate) fn unfollow(&mut self) {
        if let Some(relay) = self.relay.take() {
            relay.abort();
        }
        if let Some(room_id) = self.room_id.take() {
            tracing::debug!(connection_id = %self.connection_id, room_id = %room_id, "Stopped following room");
        }
    }

    /// Release everything the connection holds, in order: leave the room,
    /// close the socket, delete the client record. Consumes the session so
    /// it can only run once.
    async fn close(mut self, state: &WsState) {
        let room = &state.app.use_cases.room;

        state.movements.cancel(&self.user_id);
        self.unfollow();

        if let Err(e) = room.leave_room.execute(&self.user_id).await {
            tracing::error!(user_id = %self.user_id, error = %e, "Failed to remove user on disconnect");
        }

        // The writer closes the sink once the last sender is gone
        let Session {
            connection_id,
            user_id,
            tx,
            writer,
            ..
        } = self;
        drop(tx);
        if tokio::time::timeout(WRITER_SHUTDOWN_TIMEOUT, writer)
            .await
            .is_err()
        {
            tracing::warn!(connection_id = %connection_id, "Writer did not stop in time");
        }

        if let Err(e) = state.app.store.delete_client(&user_id).await {
            tracing::error!(user_id = %user_id, error = %e, "Failed to delete client record");
        }
        if let Some(info) = state.connections.unregister(&user_id).await {
            tracing::debug!(connection_id = %connection_id, last_room = ?info.room_id, "Session closed");
        }
    }
}

/// Handle an individual WebSocket connection.
async fn handle_socket(mut socket: WebSocket, ip: IpAddr, state: Arc<WsState>) {
    if let Err(e) = state.connections.try_acquire_ip(ip) {
        tracing::warn!(ip = %ip, error = %e, "Rejecting WebSocket connection");
        let frame = CloseFrame {
            code: close_code::POLICY,
            reason: e.to_string().into(),
        };
        let _ = socket.send(Message::Close(Some(frame))).await;
        return;
    }

    let connection_id = Uuid::new_v4();
    let user_id = UserId::new(state.app.random.gen_uuid().to_string());

    if let Err(e) = state.app.store.add_client(&Client::new(user_id.clone())).await {
        tracing::error!(connection_id = %connection_id, error = %e, "Failed to create client record");
        let frame = CloseFrame {
            code: close_code::ERROR,
            reason: "client registration failed".into(),
        };
        let _ = socket.send(Message::Close(Some(frame))).await;
        state.connections.release_ip(ip);
        return;
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(CONNECTION_CHANNEL_BUFFER);

    let connections = state
        .connections
        .register(ConnectionInfo {
            connection_id,
            user_id: user_id.clone(),
            room_id: None,
            ip,
        })
        .await;

    tracing::info!(connection_id = %connection_id, user_id = %user_id, ip = %ip, connections, "WebSocket connection established");

    // Single owner of the sink; ends when every sender is gone
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    let mut session = Session::new(connection_id, user_id, tx, writer);

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match ClientMessage::decode(text.as_str()) {
                Ok(msg) => handle_message(msg, &state, &mut session).await,
                Err(e) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "Dropping undecodable frame");
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Clean up
    session.close(&state).await;
    state.connections.release_ip(ip);

    tracing::info!(connection_id = %connection_id, "WebSocket connection terminated");
}

/// Dispatch a decoded client message to its handler.
async fn handle_message(msg: ClientMessage, state: &WsState, session: &mut Session) {
    tracing::debug!(user_id = %session.user_id(), event = msg.event_name(), "Client message");
    match msg {
        ClientMessage::NewRoom(req) => ws_room::handle_new_room(state, session, req).await,
        ClientMessage::JoinRoom(req) => ws_room::handle_join_room(state, session, req).await,
        ClientMessage::LeaveRoom(req) => ws_room::handle_leave_room(state, session, req).await,
        ClientMessage::UpdatePosition(req) => {
            ws_movement::handle_update_position(state, session, req)
        }
        ClientMessage::BroadcastMessage(req) => ws_chat::handle_chat(state, session, req).await,
        ClientMessage::UpdateTyping(req) => ws_chat::handle_typing(state, session, req).await,
    }
}
