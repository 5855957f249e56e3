//! Redis-backed [`RoomStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use plaza_domain::{Client, ClientUpdate, RoomData, RoomId, UserId};

use crate::infrastructure::blob::{decode, encode, most_populated};
use crate::infrastructure::ports::{RoomStore, StoreError};

/// Hash of room id -> room JSON.
pub(super) const ROOMS_KEY: &str = "rooms";
/// Hash of client id -> client JSON.
pub(super) const CLIENTS_KEY: &str = "clients";

/// Room and client records in two Redis hashes.
///
/// Every call is a single command except `update_client`, which reads,
/// merges and writes back. Writes are blind overwrites, as with the
/// in-memory store.
#[derive(Clone)]
pub struct RedisRoomStore {
    conn: ConnectionManager,
}

impl RedisRoomStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

fn unavailable(operation: &'static str) -> impl FnOnce(redis::RedisError) -> StoreError {
    move |e| StoreError::unavailable(operation, e)
}

#[async_trait]
impl RoomStore for RedisRoomStore {
    async fn create_room(&self, room_id: &RoomId, room: &RoomData) -> Result<(), StoreError> {
        let json = encode(room)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(ROOMS_KEY, room_id.as_str(), json)
            .await
            .map_err(unavailable("create_room"))?;
        tracing::debug!(room_id = %room_id, "Room created");
        Ok(())
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Option<RoomData>, StoreError> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn
            .hget(ROOMS_KEY, room_id.as_str())
            .await
            .map_err(unavailable("get_room"))?;
        json.as_deref().map(decode).transpose()
    }

    async fn update_room(&self, room_id: &RoomId, room: &RoomData) -> Result<(), StoreError> {
        let json = encode(room)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(ROOMS_KEY, room_id.as_str(), json)
            .await
            .map_err(unavailable("update_room"))?;
        Ok(())
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let removed: usize = conn
            .hdel(ROOMS_KEY, room_id.as_str())
            .await
            .map_err(unavailable("delete_room"))?;
        if removed > 0 {
            tracing::debug!(room_id = %room_id, "Room deleted");
        }
        Ok(())
    }

    async fn list_rooms(&self, limit: usize) -> Result<Vec<(RoomId, RoomData)>, StoreError> {
        let mut conn = self.conn.clone();
        let rows: HashMap<String, String> = conn
            .hgetall(ROOMS_KEY)
            .await
            .map_err(unavailable("list_rooms"))?;
        Ok(most_populated(
            rows.into_iter().map(|(id, json)| (RoomId::new(id), json)),
            limit,
        ))
    }

    async fn ensure_default_room(&self, room_id: &RoomId, name: &str) -> Result<(), StoreError> {
        let json = encode(&RoomData::new(name))?;
        let mut conn = self.conn.clone();
        let created: bool = conn
            .hset_nx(ROOMS_KEY, room_id.as_str(), json)
            .await
            .map_err(unavailable("ensure_default_room"))?;
        if created {
            tracing::info!(room_id = %room_id, "Default room ready");
        }
        Ok(())
    }

    async fn add_client(&self, client: &Client) -> Result<(), StoreError> {
        let json = encode(client)?;
        let mut conn = self.conn.clone();
        let added: bool = conn
            .hset_nx(CLIENTS_KEY, client.id.as_str(), json)
            .await
            .map_err(unavailable("add_client"))?;
        if !added {
            tracing::warn!(client_id = %client.id, "Client already registered, keeping existing record");
        }
        Ok(())
    }

    async fn get_client(&self, client_id: &UserId) -> Result<Option<Client>, StoreError> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn
            .hget(CLIENTS_KEY, client_id.as_str())
            .await
            .map_err(unavailable("get_client"))?;
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
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(CLIENTS_KEY, client_id.as_str(), json)
            .await
            .map_err(unavailable("update_client"))?;
        Ok(())
    }

    async fn delete_client(&self, client_id: &UserId) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .hdel(CLIENTS_KEY, client_id.as_str())
            .await
            .map_err(unavailable("delete_client"))?;
        Ok(())
    }
}
