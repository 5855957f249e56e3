//! Room and client state port.

use async_trait::async_trait;
use plaza_domain::{Client, ClientUpdate, RoomData, RoomId, UserId};

use super::StoreError;

/// Whole-record store for rooms and per-connection clients.
///
/// Records are read and written as complete blobs. There is no field-level
/// update and no compare-and-swap: `update_room` overwrites whatever is there,
/// so callers serialize their read-modify-write sequences per room.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomStore: Send + Sync {
    // Rooms
    async fn create_room(&self, room_id: &RoomId, room: &RoomData) -> Result<(), StoreError>;
    async fn get_room(&self, room_id: &RoomId) -> Result<Option<RoomData>, StoreError>;
    async fn update_room(&self, room_id: &RoomId, room: &RoomData) -> Result<(), StoreError>;
    async fn delete_room(&self, room_id: &RoomId) -> Result<(), StoreError>;

    /// Most populated rooms first, at most `limit`.
    async fn list_rooms(&self, limit: usize) -> Result<Vec<(RoomId, RoomData)>, StoreError>;

    /// Create an empty room named `name` under `room_id` unless one exists.
    async fn ensure_default_room(&self, room_id: &RoomId, name: &str) -> Result<(), StoreError>;

    // Clients
    /// Insert-if-absent; an existing record with the same id is left alone.
    async fn add_client(&self, client: &Client) -> Result<(), StoreError>;
    async fn get_client(&self, client_id: &UserId) -> Result<Option<Client>, StoreError>;
    async fn update_client(
        &self,
        client_id: &UserId,
        update: ClientUpdate,
    ) -> Result<(), StoreError>;
    async fn delete_client(&self, client_id: &UserId) -> Result<(), StoreError>;
}
