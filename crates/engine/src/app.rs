//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    config::EngineConfig,
    memory_bus::MemoryEventBus,
    memory_store::MemoryRoomStore,
    ports::{EventBus, RandomPort, RoomStore, StoreError},
    random::SystemRandom,
    redis::{self as redis_backend, RedisEventBus, RedisRoomStore},
    room_locks::RoomLocks,
    timeout_store::TimeoutRoomStore,
};
use crate::use_cases::{RoomContext, RoomSettings, RoomUseCases};

/// Main application state.
///
/// Holds the ports and the use cases built on them.
/// Passed to HTTP/WebSocket handlers via Axum state.
pub struct App {
    pub use_cases: UseCases,
    pub store: Arc<dyn RoomStore>,
    pub bus: Arc<dyn EventBus>,
    pub random: Arc<dyn RandomPort>,
    pub config: EngineConfig,
}

/// Container for all use cases.
pub struct UseCases {
    pub room: RoomUseCases,
}

impl App {
    pub fn new(
        store: Arc<dyn RoomStore>,
        bus: Arc<dyn EventBus>,
        random: Arc<dyn RandomPort>,
        config: EngineConfig,
    ) -> Self {
        let ctx = Arc::new(RoomContext::new(
            store.clone(),
            bus.clone(),
            random.clone(),
            Arc::new(RoomLocks::new()),
            RoomSettings::from_config(&config),
        ));

        Self {
            use_cases: UseCases {
                room: RoomUseCases::new(ctx),
            },
            store,
            bus,
            random,
            config,
        }
    }

    /// Single-process wiring: in-memory store behind the timeout wrapper,
    /// in-process bus, system randomness.
    pub fn in_memory(config: EngineConfig) -> Self {
        let store = Arc::new(TimeoutRoomStore::new(
            Arc::new(MemoryRoomStore::new()),
            config.store_timeout,
        ));
        Self::new(
            store,
            Arc::new(MemoryEventBus::new()),
            Arc::new(SystemRandom::new()),
            config,
        )
    }

    /// Wire the backend `config` asks for: Redis when a URL is set,
    /// in-process adapters otherwise. An unreachable Redis is an error.
    pub async fn connect(config: EngineConfig) -> Result<Self, StoreError> {
        match config.redis_url.clone() {
            Some(url) => Self::redis(&url, config).await,
            None => Ok(Self::in_memory(config)),
        }
    }

    /// Multi-process wiring: Redis store behind the timeout wrapper, Redis
    /// pub/sub bus, system randomness.
    pub async fn redis(url: &str, config: EngineConfig) -> Result<Self, StoreError> {
        let (client, conn) = redis_backend::connect(url, config.store_timeout).await?;
        let store = Arc::new(TimeoutRoomStore::new(
            Arc::new(RedisRoomStore::new(conn.clone())),
            config.store_timeout,
        ));
        Ok(Self::new(
            store,
            Arc::new(RedisEventBus::new(client, conn)),
            Arc::new(SystemRandom::new()),
            config,
        ))
    }

    /// Make sure the welcome room exists. Failure here is fatal at startup.
    pub async fn init(&self) -> Result<(), StoreError> {
        let room_id = self.config.welcome_room_id();
        self.store
            .ensure_default_room(&room_id, &self.config.welcome_room_name)
            .await
    }
}
