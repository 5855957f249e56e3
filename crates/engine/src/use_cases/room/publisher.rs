//! Serializes server messages onto a room's bus channel.

use std::sync::Arc;

use plaza_domain::{RoomData, RoomId};
use plaza_shared::ServerMessage;

use crate::infrastructure::ports::{BusError, EventBus};

#[derive(Clone)]
pub struct RoomPublisher {
    bus: Arc<dyn EventBus>,
}

impl RoomPublisher {
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }

    pub async fn publish(&self, room_id: &RoomId, message: &ServerMessage) -> Result<(), BusError> {
        let payload = serde_json::to_string(message)
            .map_err(|e| BusError::Serialization(e.to_string()))?;
        self.bus.publish(room_id, payload).await
    }

    /// Publish the room's full user list.
    pub async fn scene(&self, room_id: &RoomId, room: &RoomData) -> Result<(), BusError> {
        let message = ServerMessage::scene(room_id.clone(), room.users().to_vec());
        self.publish(room_id, &message).await
    }
}
