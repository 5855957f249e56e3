//! Plaza Protocol - Shared types for the engine and its clients
//!
//! - WebSocket envelopes (`ClientMessage`, `ServerMessage`)
//! - HTTP response bodies
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, thiserror and the domain
//! 2. **No business logic** - Pure data types and serialization

pub mod messages;
pub mod responses;

pub use messages::{
    ChatBroadcast, ChatRequest, ClientMessage, Envelope, JoinRoomRequest, LeaveRoomRequest,
    NewRoomRequest, ProtocolError, SceneUpdate, ServerMessage, SetUserId, UpdatePositionRequest,
    UpdateTypingRequest,
};
pub use responses::{RoomListResponse, RoomSummary};
