//! HTTP response bodies.

use plaza_domain::RoomId;
use serde::{Deserialize, Serialize};

/// One entry of the room directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub room_name: String,
    /// Rooms carry no description yet; always empty.
    #[serde(default)]
    pub room_desc: String,
    pub total_conns: usize,
    pub is_protected: bool,
}

/// Body of `GET /api/v1/rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListResponse {
    pub rooms: Vec<RoomSummary>,
}
