//! Store wrapper that bounds every call with a timeout.
//!
//! Wraps any RoomStore implementation. A call that has not finished when the
//! timeout elapses fails with `StoreError::Timeout`; nothing is retried.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use plaza_domain::{Client, ClientUpdate, RoomData, RoomId, UserId};

use crate::infrastructure::ports::{RoomStore, StoreError};

/// Default bound for a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Wrapper that adds a per-call deadline to any room store
pub struct TimeoutRoomStore {
    inner: Arc<dyn RoomStore>,
    timeout: Duration,
}

impl TimeoutRoomStore {
    pub fn new(inner: Arc<dyn RoomStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T, Fut>(&self, operation: &'static str, call: Fut) -> Result<T, StoreError>
    where
        Fut: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::error!(
                    operation = operation,
                    timeout_ms = timeout_ms,
                    "Store call timed out"
                );
                Err(StoreError::Timeout {
                    operation,
                    timeout_ms,
                })
            }
        }
    }
}

#[async_trait]
impl RoomStore for TimeoutRoomStore {
    async fn create_room(&self, room_id: &RoomId, room: &RoomData) -> Result<(), StoreError> {
        self.bounded("create_room", self.inner.create_room(room_id, room))
            .await
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Option<RoomData>, StoreError> {
        self.bounded("get_room", self.inner.get_room(room_id)).await
    }

    async fn update_room(&self, room_id: &RoomId, room: &RoomData) -> Result<(), StoreError> {
        self.bounded("update_room", self.inner.update_room(room_id, room))
            .await
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<(), StoreError> {
        self.bounded("delete_room", self.inner.delete_room(room_id))
            .await
    }

    async fn list_rooms(&self, limit: usize) -> Result<Vec<(RoomId, RoomData)>, StoreError> {
        self.bounded("list_rooms", self.inner.list_rooms(limit)).await
    }

    async fn ensure_default_room(&self, room_id: &RoomId, name: &str) -> Result<(), StoreError> {
        self.bounded(
            "ensure_default_room",
            self.inner.ensure_default_room(room_id, name),
        )
        .await
    }

    async fn add_client(&self, client: &Client) -> Result<(), StoreError> {
        self.bounded("add_client", self.inner.add_client(client)).await
    }

    async fn get_client(&self, client_id: &UserId) -> Result<Option<Client>, StoreError> {
        self.bounded("get_client", self.inner.get_client(client_id))
            .await
    }

    async fn update_client(
        &self,
        client_id: &UserId,
        update: ClientUpdate,
    ) -> Result<(), StoreError> {
        self.bounded("update_client", self.inner.update_client(client_id, update))
            .await
    }

    async fn delete_client(&self, client_id: &UserId) -> Result<(), StoreError> {
        self.bounded("delete_client", self.inner.delete_client(client_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_store::MemoryRoomStore;
    use crate::infrastructure::ports::MockRoomStore;

    /// Delegates to an in-memory store, stalling room reads.
    struct StallingStore {
        inner: MemoryRoomStore,
        stall: Duration,
    }

    #[async_trait]
    impl RoomStore for StallingStore {
        async fn create_room(&self, room_id: &RoomId, room: &RoomData) -> Result<(), StoreError> {
            self.inner.create_room(room_id, room).await
        }

        async fn get_room(&self, room_id: &RoomId) -> Result<Option<RoomData>, StoreError> {
            tokio::time::sleep(self.stall).await;
            self.inner.get_room(room_id).await
        }

        async fn update_room(&self, room_id: &RoomId, room: &RoomData) -> Result<(), StoreError> {
            self.inner.update_room(room_id, room).await
        }

        async fn delete_room(&self, room_id: &RoomId) -> Result<(), StoreError> {
            self.inner.delete_room(room_id).await
        }

        async fn list_rooms(&self, limit: usize) -> Result<Vec<(RoomId, RoomData)>, StoreError> {
            self.inner.list_rooms(limit).await
        }

        async fn ensure_default_room(
            &self,
            room_id: &RoomId,
            name: &str,
        ) -> Result<(), StoreError> {
            self.inner.ensure_default_room(room_id, name).await
        }

        async fn add_client(&self, client: &Client) -> Result<(), StoreError> {
            self.inner.add_client(client).await
        }

        async fn get_client(&self, client_id: &UserId) -> Result<Option<Client>, StoreError> {
            self.inner.get_client(client_id).await
        }

        async fn update_client(
            &self,
            client_id: &UserId,
            update: ClientUpdate,
        ) -> Result<(), StoreError> {
            self.inner.update_client(client_id, update).await
        }

        async fn delete_client(&self, client_id: &UserId) -> Result<(), StoreError> {
            self.inner.delete_client(client_id).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let inner = Arc::new(StallingStore {
            inner: MemoryRoomStore::new(),
            stall: Duration::from_secs(30),
        });
        let store = TimeoutRoomStore::new(inner, DEFAULT_STORE_TIMEOUT);

        let err = store.get_room(&RoomId::new("lobby#1")).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::Timeout {
                operation: "get_room",
                timeout_ms: 10_000
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn call_within_deadline_passes_through() {
        let inner = Arc::new(StallingStore {
            inner: MemoryRoomStore::new(),
            stall: Duration::from_secs(2),
        });
        let id = RoomId::new("lobby#1");
        inner
            .create_room(&id, &RoomData::new("lobby"))
            .await
            .unwrap();
        let store = TimeoutRoomStore::new(inner, DEFAULT_STORE_TIMEOUT);

        let room = store.get_room(&id).await.unwrap();

        assert_eq!(room.map(|r| r.name().to_string()), Some("lobby".into()));
    }

    #[tokio::test]
    async fn inner_errors_are_not_retried() {
        let mut inner = MockRoomStore::new();
        inner
            .expect_delete_room()
            .times(1)
            .returning(|_| Err(StoreError::unavailable("delete_room", "connection reset")));
        let store = TimeoutRoomStore::new(Arc::new(inner), DEFAULT_STORE_TIMEOUT);

        let err = store.delete_room(&RoomId::new("lobby#1")).await.unwrap_err();

        assert!(matches!(err, StoreError::Unavailable { .. }));
    }
}
