//! In-memory room store for single-process deployments and tests.
//!
//! Records are kept as serialized JSON strings, the same whole-record blobs a
//! shared key-value store would hold, so the adapter exercises the encode and
//! decode paths on every call and never hands out shared references.

use async_trait::async_trait;
use dashmap::DashMap;

use plaza_domain::{Client, ClientUpdate, RoomData, RoomId, UserId};

use crate::infrastructure::blob::{decode, encode, most_populated};
use crate::infrastructure::ports::{RoomStore, StoreError};

/// DashMap-backed [`RoomStore`].
#[derive(Default)]
pub struct MemoryRoomStore {
    rooms: DashMap<RoomId, String>,
    clients: DashMap<UserId, String>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    #[cfg(test)]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn create_room(&self, room_id: &RoomId, room: &RoomData) -> Result<(), StoreError> {
        let json = encode(room)?;
        self.rooms.insert(room_id.clone(), json);
        tracing::debug!(room_id = %room_id, "Room created");
        Ok(())
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Option<RoomData>, StoreError> {
        // Clone out so no shard lock is held while decoding
        let json = self.rooms.get(room_id).map(|entry| entry.value().clone());
        json.as_deref().map(decode).transpose()
    }

    async fn update_room(&self, room_id: &RoomId, room: &RoomData) -> Result<(), StoreError> {
        let json = encode(room)?;
        self.rooms.insert(room_id.clone(), json);
        Ok(())
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<(), StoreError> {
        if self.rooms.remove(room_id).is_some() {
            tracing::debug!(room_id = %room_id, "Room deleted");
        }
        Ok(())
    }

    async fn list_rooms(&self, limit: usize) -> Result<Vec<(RoomId, RoomData)>, StoreError> {
        let snapshot: Vec<(RoomId, String)> = self
            .rooms
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        Ok(most_populated(snapshot, limit))
    }

    async fn ensure_default_room(&self, room_id: &RoomId, name: &str) -> Result<(), StoreError> {
        if self.rooms.contains_key(room_id) {
            return Ok(());
        }
        let json = encode(&RoomData::new(name))?;
        self.rooms.entry(room_id.clone()).or_insert(json);
        tracing::info!(room_id = %room_id, "Default room ready");
        Ok(())
    }

    async fn add_client(&self, client: &Client) -> Result<(), StoreError> {
        if self.clients.contains_key(&client.id) {
            tracing::warn!(client_id = %client.id, "Client already registered, keeping existing record");
            return Ok(());
        }
        let json = encode(client)?;
        self.clients.entry(client.id.clone()).or_insert(json);
        Ok(())
    }

    async fn get_client(&self, client_id: &UserId) -> Result<Option<Client>, StoreError> {
        let json = self.clients.get(client_id).map(|entry| entry.value().clone());
        json.as_deref().map(decode).transpose()
    }

    async fn update_client(
        &self,
        client_id: &UserId,
        update: ClientUpdate,
    ) -> Result<(), StoreError> {
        let mut client = self
            .get_client(client_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Client", client_id))?;
        client.apply(update);
        let json = encode(&client)?;
        self.clients.insert(client_id.clone(), json);
        Ok(())
    }

    async fn delete_client(&self, client_id: &UserId) -> Result<(), StoreError> {
        self.clients.remove(client_id);
        Ok(())
    }
}
