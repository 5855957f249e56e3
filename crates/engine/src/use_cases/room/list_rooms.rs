//! Room directory for the HTTP API.

use std::sync::Arc;

use plaza_shared::RoomSummary;

use super::{RoomContext, RoomError};

pub struct ListRooms {
    ctx: Arc<RoomContext>,
}

impl ListRooms {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    /// Up to `limit` rooms, most populated first.
    pub async fn execute(&self, limit: usize) -> Result<Vec<RoomSummary>, RoomError> {
        let rooms = self.ctx.store.list_rooms(limit).await?;
        Ok(rooms
            .into_iter()
            .map(|(room_id, room)| RoomSummary {
                room_id,
                room_name: room.name().to_string(),
                room_desc: String::new(),
                total_conns: room.len(),
                is_protected: room.is_protected(),
            })
            .collect())
    }
}
