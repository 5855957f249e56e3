//! In-process event bus.
//!
//! One `tokio::sync::broadcast` channel per room, created on first subscribe
//! and dropped once a publish finds nobody listening. Slow receivers that
//! fall behind skip payloads (`RecvError::Lagged`) and log how many.

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};

use plaza_domain::RoomId;

use crate::infrastructure::ports::{BusError, EventBus};

/// Capacity of each room channel.
const CHANNEL_CAPACITY: usize = 256;

/// Broadcast-backed [`EventBus`].
#[derive(Default)]
pub struct MemoryEventBus {
    channels: DashMap<RoomId, broadcast::Sender<String>>,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live subscriptions for a room.
    #[cfg(test)]
    pub fn subscriber_count(&self, room_id: &RoomId) -> usize {
        self.channels
            .get(room_id)
            .map_or(0, |sender| sender.receiver_count())
    }

    #[cfg(test)]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, room_id: &RoomId, payload: String) -> Result<(), BusError> {
        let delivered = match self.channels.get(room_id) {
            Some(sender) => sender.send(payload).ok(),
            None => None,
        };

        match delivered {
            Some(receivers) => {
                tracing::trace!(room_id = %room_id, receivers, "Published room event");
            }
            None => {
                // Nobody listening; forget the channel if it is still unused
                self.channels
                    .remove_if(room_id, |_, sender| sender.receiver_count() == 0);
                tracing::trace!(room_id = %room_id, "No subscribers for room event");
            }
        }
        Ok(())
    }

    async fn subscribe(&self, room_id: &RoomId) -> Result<BoxStream<'static, String>, BusError> {
        let receiver = self
            .channels
            .entry(room_id.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();

        let room_id = room_id.clone();
        let events = stream::unfold(receiver, move |mut receiver| {
            let room_id = room_id.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(payload) => return Some((payload, receiver)),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(
                                room_id = %room_id,
                                skipped,
                                "Subscriber lagged, skipping room events"
                            );
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
        });

        Ok(events.boxed())
    }
}
