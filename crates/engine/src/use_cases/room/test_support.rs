//! Shared fixtures for room use case tests.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{BoxStream, StreamExt};
use plaza_domain::{Client, ClientUpdate, Position, RoomData, RoomId, User, UserId};
use plaza_shared::{SceneUpdate, ServerMessage};

use crate::infrastructure::memory_bus::MemoryEventBus;
use crate::infrastructure::memory_store::MemoryRoomStore;
use crate::infrastructure::ports::{EventBus, RandomPort, RoomStore};
use crate::infrastructure::random::SystemRandom;
use crate::infrastructure::room_locks::RoomLocks;

use super::{RoomContext, RoomSettings, RoomUseCases};

pub(crate) type Events = BoxStream<'static, String>;

/// Room use cases wired to in-memory adapters.
pub(crate) struct TestRooms {
    pub(crate) store: Arc<MemoryRoomStore>,
    pub(crate) bus: Arc<MemoryEventBus>,
    pub(crate) ctx: Arc<RoomContext>,
    pub(crate) use_cases: RoomUseCases,
}

impl TestRooms {
    pub(crate) fn new() -> Self {
        Self::with(Arc::new(SystemRandom::new()), RoomSettings::default())
    }

    pub(crate) fn with_random(random: Arc<dyn RandomPort>) -> Self {
        Self::with(random, RoomSettings::default())
    }

    pub(crate) fn with(random: Arc<dyn RandomPort>, settings: RoomSettings) -> Self {
        let store = Arc::new(MemoryRoomStore::new());
        let bus = Arc::new(MemoryEventBus::new());
        let ctx = Arc::new(RoomContext::new(
            store.clone(),
            bus.clone(),
            random,
            Arc::new(RoomLocks::new()),
            settings,
        ));
        let use_cases = RoomUseCases::new(ctx.clone());
        Self {
            store,
            bus,
            ctx,
            use_cases,
        }
    }

    pub(crate) async fn add_client(&self, id: &str) -> UserId {
        let user_id = UserId::new(id);
        self.store.add_client(&Client::new(user_id.clone())).await.unwrap();
        user_id
    }

    /// Store a room holding `users` (`(id, row, col)`), with matching client records.
    pub(crate) async fn seed_room(&self, room_id: &str, users: &[(&str, i32, i32)]) -> RoomId {
        let room_id = RoomId::new(room_id);
        let mut room = RoomData::new(room_id.room_name());
        for (id, row, col) in users {
            let user_id = self.add_client(id).await;
            self.store
                .update_client(&user_id, ClientUpdate::joined(room_id.clone(), *id))
                .await
                .unwrap();
            room.push_user(User::new(user_id, *id, room_id.clone(), Position::new(*row, *col)))
                .unwrap();
        }
        self.store.create_room(&room_id, &room).await.unwrap();
        room_id
    }

    /// Claim and complete a new room in one go.
    pub(crate) async fn create_room(
        &self,
        room_name: &str,
        user_id: &UserId,
        user_name: &str,
    ) -> (RoomId, Vec<User>) {
        let create = &self.use_cases.create_room;
        let claim = create.claim(room_name, user_id).await.unwrap();
        let room_id = claim.room_id().clone();
        let users = create.complete(claim, user_id, user_name).await.unwrap();
        (room_id, users)
    }

    pub(crate) async fn room(&self, room_id: &RoomId) -> Option<RoomData> {
        self.store.get_room(room_id).await.unwrap()
    }

    pub(crate) async fn client(&self, user_id: &UserId) -> Option<Client> {
        self.store.get_client(user_id).await.unwrap()
    }

    pub(crate) async fn subscribe(&self, room_id: &RoomId) -> Events {
        self.bus.subscribe(room_id).await.unwrap()
    }

    pub(crate) async fn next_message(&self, events: &mut Events) -> ServerMessage {
        let payload = tokio::time::timeout(Duration::from_secs(1), events.next())
            .await
            .expect("timed out waiting for a room event")
            .expect("room event stream ended");
        serde_json::from_str(&payload).unwrap()
    }

    pub(crate) async fn next_scene(&self, events: &mut Events) -> SceneUpdate {
        match self.next_message(events).await {
            ServerMessage::UpdateScene(scene) => scene,
            other => panic!("expected updateScene, got {other:?}"),
        }
    }
}
