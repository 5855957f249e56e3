//! Redis pub/sub [`EventBus`].

use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use plaza_domain::RoomId;

use crate::infrastructure::ports::{BusError, EventBus};

/// Publishes on the room id channel; each subscription opens its own
/// pub/sub connection, closed when the stream is dropped.
pub struct RedisEventBus {
    client: redis::Client,
    conn: ConnectionManager,
}

impl RedisEventBus {
    pub fn new(client: redis::Client, conn: ConnectionManager) -> Self {
        Self { client, conn }
    }
}

#[async_trait]
impl EventBus for RedisEventBus {
    async fn publish(&self, room_id: &RoomId, payload: String) -> Result<(), BusError> {
        let mut conn = self.conn.clone();
        let receivers: usize = conn
            .publish(room_id.as_str(), payload)
            .await
            .map_err(|e| BusError::Publish {
                channel: room_id.to_string(),
                message: e.to_string(),
            })?;
        tracing::trace!(room_id = %room_id, receivers, "Published room event");
        Ok(())
    }

    async fn subscribe(&self, room_id: &RoomId) -> Result<BoxStream<'static, String>, BusError> {
        let subscribe_error = |e: redis::RedisError| BusError::Subscribe {
            channel: room_id.to_string(),
            message: e.to_string(),
        };

        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(subscribe_error)?;
        pubsub
            .subscribe(room_id.as_str())
            .await
            .map_err(subscribe_error)?;

        let room_id = room_id.clone();
        let events = pubsub.into_on_message().filter_map(move |msg| {
            let payload = msg.get_payload::<String>();
            let room_id = room_id.clone();
            async move {
                match payload {
                    Ok(payload) => Some(payload),
                    Err(e) => {
                        tracing::warn!(room_id = %room_id, error = %e, "Dropping non-text room event");
                        None
                    }
                }
            }
        });

        Ok(events.boxed())
    }
}
