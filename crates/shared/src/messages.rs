//! WebSocket message types for browser-engine communication
//!
//! Every frame is a JSON envelope `{"event": <name>, "data": <payload>}`.
//! Inbound frames decode into [`ClientMessage`]; outbound frames are
//! [`ServerMessage`]s and are also what the fan-out bus carries.
//!
//! ## Versioning Policy
//!
//! - New events can be added (unknown inbound events are reported, not fatal)
//! - Renaming an event or a payload field is a breaking change

use plaza_domain::{RoomId, User, UserId};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// =============================================================================
// Client Messages (browser → engine)
// =============================================================================

/// Raw inbound envelope, before the payload is interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// Create a room and join it as its first user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoomRequest {
    pub user_name: String,
    pub room_name: String,
}

/// Join an existing room by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub room_id: RoomId,
    pub user_name: String,
}

/// Send a chat line to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub from: UserId,
    pub room_id: RoomId,
    pub msg: String,
}

/// Walk to a destination cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePositionRequest {
    pub user_id: UserId,
    pub room_id: RoomId,
    /// `"row,col"`
    pub dest: String,
}

/// Toggle the typing indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTypingRequest {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub is_typing: bool,
}

/// Leave the current room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoomRequest {
    pub user_id: UserId,
}

/// Messages from the browser to the engine, one variant per event name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    NewRoom(NewRoomRequest),
    JoinRoom(JoinRoomRequest),
    BroadcastMessage(ChatRequest),
    UpdatePosition(UpdatePositionRequest),
    UpdateTyping(UpdateTypingRequest),
    LeaveRoom(LeaveRoomRequest),
}

/// Why an inbound frame could not be turned into a [`ClientMessage`].
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    MalformedFrame(#[source] serde_json::Error),
    #[error("malformed payload for {event}: {source}")]
    MalformedPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown event: {0}")]
    UnknownEvent(String),
}

impl ClientMessage {
    /// Event name as it appears on the wire.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::NewRoom(_) => "newRoom",
            Self::JoinRoom(_) => "joinRoom",
            Self::BroadcastMessage(_) => "broadcastMessage",
            Self::UpdatePosition(_) => "updatePosition",
            Self::UpdateTyping(_) => "updateTyping",
            Self::LeaveRoom(_) => "leaveRoom",
        }
    }

    /// Decode one text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(ProtocolError::MalformedFrame)?;
        Self::from_envelope(envelope)
    }

    /// Interpret an envelope's payload by its event name.
    pub fn from_envelope(envelope: Envelope) -> Result<Self, ProtocolError> {
        let Envelope { event, data } = envelope;
        match event.as_str() {
            "newRoom" => payload(&event, data).map(Self::NewRoom),
            "joinRoom" => payload(&event, data).map(Self::JoinRoom),
            "broadcastMessage" => payload(&event, data).map(Self::BroadcastMessage),
            "updatePosition" => payload(&event, data).map(Self::UpdatePosition),
            "updateTyping" => payload(&event, data).map(Self::UpdateTyping),
            "leaveRoom" => payload(&event, data).map(Self::LeaveRoom),
            _ => Err(ProtocolError::UnknownEvent(event)),
        }
    }
}

fn payload<T: DeserializeOwned>(event: &str, data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|source| ProtocolError::MalformedPayload {
        event: event.to_string(),
        source,
    })
}

// =============================================================================
// Server Messages (engine → browser)
// =============================================================================

/// Full user list of a room after a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneUpdate {
    pub room_id: RoomId,
    pub users: Vec<User>,
}

/// Tells a connection which user id it was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUserId {
    pub user_id: UserId,
}

/// A chat line as delivered to room members. `from` is the display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBroadcast {
    pub msg: String,
    pub from: String,
}

/// Messages from the engine to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    UpdateScene(SceneUpdate),
    SetUserId(SetUserId),
    BroadcastMessage(ChatBroadcast),
}

impl ServerMessage {
    pub fn scene(room_id: RoomId, users: Vec<User>) -> Self {
        Self::UpdateScene(SceneUpdate { room_id, users })
    }

    pub fn user_id(user_id: UserId) -> Self {
        Self::SetUserId(SetUserId { user_id })
    }

    pub fn chat(msg: impl Into<String>, from: impl Into<String>) -> Self {
        Self::BroadcastMessage(ChatBroadcast {
            msg: msg.into(),
            from: from.into(),
        })
    }
}
