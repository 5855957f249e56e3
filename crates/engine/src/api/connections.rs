//! Connection management for WebSocket clients.
//!
//! Tracks connected clients, the room each one follows, and how many
//! connections every source address holds.

use std::collections::HashMap;
use std::net::IpAddr;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use plaza_domain::{RoomId, UserId};

/// Information about a connected client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Unique ID for this socket
    pub connection_id: Uuid,
    /// User id handed to the client in `setUserId`
    pub user_id: UserId,
    /// Room whose scene the connection currently follows
    pub room_id: Option<RoomId>,
    pub ip: IpAddr,
}

/// Manages all active WebSocket connections.
pub struct ConnectionManager {
    connections: RwLock<HashMap<UserId, ConnectionInfo>>,
    per_ip: DashMap<IpAddr, usize>,
    ip_limit: Option<usize>,
}

impl ConnectionManager {
    /// `ip_limit` caps concurrent connections per source address.
    pub fn new(ip_limit: Option<usize>) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            per_ip: DashMap::new(),
            ip_limit,
        }
    }

    /// Take a connection slot for `ip`, failing once the cap is reached.
    pub fn try_acquire_ip(&self, ip: IpAddr) -> Result<(), ConnectionError> {
        let mut count = self.per_ip.entry(ip).or_insert(0);
        if let Some(limit) = self.ip_limit {
            if *count >= limit {
                return Err(ConnectionError::TooManyConnections { ip, limit });
            }
        }
        *count += 1;
        Ok(())
    }

    /// Give back a slot taken by [`ConnectionManager::try_acquire_ip`].
    pub fn release_ip(&self, ip: IpAddr) {
        if let Entry::Occupied(mut entry) = self.per_ip.entry(ip) {
            if *entry.get() <= 1 {
                entry.remove();
            } else {
                *entry.get_mut() -= 1;
            }
        }
    }

    #[cfg(test)]
    pub fn ip_connections(&self, ip: &IpAddr) -> usize {
        self.per_ip.get(ip).map(|count| *count).unwrap_or(0)
    }

    /// Register a new connection. Returns how many are now registered.
    pub async fn register(&self, info: ConnectionInfo) -> usize {
        let user_id = info.user_id.clone();
        let connection_id = info.connection_id;
        let mut connections = self.connections.write().await;
        if connections.insert(user_id.clone(), info).is_some() {
            tracing::warn!(user_id = %user_id, "Replaced an existing connection with the same user id");
        }
        tracing::debug!(connection_id = %connection_id, user_id = %user_id, "Connection registered");
        connections.len()
    }

    /// Unregister a connection, returning what was tracked for it.
    pub async fn unregister(&self, user_id: &UserId) -> Option<ConnectionInfo> {
        let mut connections = self.connections.write().await;
        let removed = connections.remove(user_id);
        if let Some(info) = &removed {
            tracing::debug!(connection_id = %info.connection_id, user_id = %user_id, "Connection unregistered");
        }
        removed
    }

    #[cfg(test)]
    pub async fn get(&self, user_id: &UserId) -> Option<ConnectionInfo> {
        self.connections.read().await.get(user_id).cloned()
    }

    /// Record the room a connection now follows.
    pub async fn set_room(
        &self,
        user_id: &UserId,
        room_id: Option<RoomId>,
    ) -> Result<(), ConnectionError> {
        let mut connections = self.connections.write().await;
        match connections.get_mut(user_id) {
            Some(info) => {
                info.room_id = room_id;
                Ok(())
            }
            None => Err(ConnectionError::NotFound),
        }
    }

    #[cfg(test)]
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

/// Connection management errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Connection not found")]
    NotFound,
    #[error("Too many connections from {ip} (limit {limit})")]
    TooManyConnections { ip: IpAddr, limit: usize },
}
