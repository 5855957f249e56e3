//! Room session use cases.
//!
//! Every operation that changes a room follows the same shape: take the room
//! lock, read the record, mutate it through the `RoomData` mutators, write it
//! back, publish the new scene, release the lock. Publishing under the lock
//! keeps each room's scene updates in the same order as its state changes.

mod broadcast_message;
mod create_room;
mod join_room;
mod leave_room;
mod list_rooms;
mod movement_tracker;
mod publisher;
mod remove_user;
mod update_position;
mod update_typing;

#[cfg(test)]
pub(crate) mod test_support;

pub use broadcast_message::BroadcastMessage;
pub use create_room::{CreateRoom, RoomClaim};
pub use join_room::JoinRoom;
pub use leave_room::LeaveRoom;
pub use list_rooms::ListRooms;
pub use movement_tracker::MovementTracker;
pub use publisher::RoomPublisher;
pub use remove_user::{Removal, RemoveUser};
pub use update_position::{parse_destination, MoveOutcome, UpdatePosition};
pub use update_typing::UpdateTyping;

use std::sync::Arc;
use std::time::Duration;

use plaza_domain::{ClientUpdate, DomainError, RoomId, UserId, GRID_SIZE, ROOM_LIMIT};

use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::ports::{BusError, EventBus, RandomPort, RoomStore, StoreError};
use crate::infrastructure::room_locks::RoomLocks;

/// Longest chat line relayed, in characters.
pub const MAX_MESSAGE_CHARS: usize = 60;

/// Tunables shared by the room use cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSettings {
    pub grid_size: i32,
    pub room_limit: usize,
    pub step_delay: Duration,
    pub max_message_chars: usize,
    /// Never deleted when it empties.
    pub default_room: RoomId,
}

impl RoomSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            step_delay: config.move_step_delay,
            default_room: config.welcome_room_id(),
            ..Self::default()
        }
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            room_limit: ROOM_LIMIT,
            step_delay: Duration::from_millis(180),
            max_message_chars: MAX_MESSAGE_CHARS,
            default_room: RoomId::compose("welcome", 0),
        }
    }
}

/// Dependencies shared by every room use case.
pub struct RoomContext {
    pub store: Arc<dyn RoomStore>,
    pub publisher: RoomPublisher,
    pub random: Arc<dyn RandomPort>,
    pub locks: Arc<RoomLocks>,
    pub settings: RoomSettings,
}

impl RoomContext {
    pub fn new(
        store: Arc<dyn RoomStore>,
        bus: Arc<dyn EventBus>,
        random: Arc<dyn RandomPort>,
        locks: Arc<RoomLocks>,
        settings: RoomSettings,
    ) -> Self {
        Self {
            store,
            publisher: RoomPublisher::new(bus),
            random,
            locks,
            settings,
        }
    }

    /// Update a client record, tolerating clients that are already gone.
    async fn update_client(&self, user_id: &UserId, update: ClientUpdate) -> Result<(), RoomError> {
        match self.store.update_client(user_id, update).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::warn!(user_id = %user_id, "No client record to update");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The room the client is currently recorded in, if any.
    async fn current_room(&self, user_id: &UserId) -> Result<Option<RoomId>, RoomError> {
        let client = self.store.get_client(user_id).await?;
        Ok(client.and_then(|c| c.room_id))
    }
}

/// Container for room use cases.
pub struct RoomUseCases {
    pub create_room: Arc<CreateRoom>,
    pub join_room: Arc<JoinRoom>,
    pub remove_user: Arc<RemoveUser>,
    pub leave_room: Arc<LeaveRoom>,
    pub update_position: Arc<UpdatePosition>,
    pub update_typing: Arc<UpdateTyping>,
    pub broadcast_message: Arc<BroadcastMessage>,
    pub list_rooms: Arc<ListRooms>,
}

impl RoomUseCases {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        let remove_user = Arc::new(RemoveUser::new(ctx.clone()));
        let leave_room = Arc::new(LeaveRoom::new(ctx.clone(), remove_user.clone()));
        Self {
            create_room: Arc::new(CreateRoom::new(ctx.clone(), leave_room.clone())),
            join_room: Arc::new(JoinRoom::new(ctx.clone(), leave_room.clone())),
            remove_user,
            leave_room,
            update_position: Arc::new(UpdatePosition::new(ctx.clone())),
            update_typing: Arc::new(UpdateTyping::new(ctx.clone())),
            broadcast_message: Arc::new(BroadcastMessage::new(ctx.clone())),
            list_rooms: Arc::new(ListRooms::new(ctx)),
        }
    }
}

/// Errors surfaced by room use cases.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),
    #[error("User {user_id} is not in room {room_id}")]
    UserNotFound { room_id: RoomId, user_id: UserId },
    #[error("Room {room_id} is full ({limit} users)")]
    RoomFull { room_id: RoomId, limit: usize },
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Bus(#[from] BusError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}
