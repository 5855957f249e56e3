//! Event fan-out port.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use plaza_domain::RoomId;

use super::BusError;

/// Per-room publish/subscribe channel carrying serialized server messages.
///
/// Subscribers only see payloads published after they subscribed. Payloads
/// from a single publisher arrive in publish order; nothing is guaranteed
/// across publishers, and a subscriber that falls too far behind skips ahead.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishing to a room nobody listens to is not an error.
    async fn publish(&self, room_id: &RoomId, payload: String) -> Result<(), BusError>;

    /// Stream of payloads for `room_id`. Dropping the stream unsubscribes.
    async fn subscribe(&self, room_id: &RoomId) -> Result<BoxStream<'static, String>, BusError>;
}
