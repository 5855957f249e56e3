//! Per-room mutual exclusion for read-modify-write sequences.
//!
//! The store only offers whole-record overwrite, so two handlers that read the
//! same room and write it back would lose one update. Every room mutation
//! runs while holding that room's lock instead. Locks for different rooms
//! never block each other.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use plaza_domain::RoomId;

/// Held while a room is being mutated. Dropping it releases the room.
pub type RoomGuard = OwnedMutexGuard<()>;

/// Lazily created async mutex per room id.
#[derive(Default)]
pub struct RoomLocks {
    locks: DashMap<RoomId, Arc<Mutex<()>>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `room_id`.
    pub async fn lock(&self, room_id: &RoomId) -> RoomGuard {
        let lock = self.locks.entry(room_id.clone()).or_default().clone();
        lock.lock_owned().await
    }

    /// Drop the entry for a deleted room.
    ///
    /// Must be called after the caller's own guard is released; the entry is
    /// kept while anyone else holds or waits on it.
    pub fn forget(&self, room_id: &RoomId) {
        self.locks
            .remove_if(room_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_room_is_exclusive() {
        let locks = Arc::new(RoomLocks::new());
        let room = RoomId::new("lobby#1");
        let guard = locks.lock(&room).await;

        let contender = {
            let locks = locks.clone();
            let room = room.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&room).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_rooms_do_not_block() {
        let locks = RoomLocks::new();
        let _lobby = locks.lock(&RoomId::new("lobby#1")).await;
        let garden = tokio::time::timeout(
            Duration::from_secs(1),
            locks.lock(&RoomId::new("garden#2")),
        )
        .await;
        assert!(garden.is_ok());
    }

    #[tokio::test]
    async fn forget_keeps_held_locks() {
        let locks = RoomLocks::new();
        let room = RoomId::new("lobby#1");

        let guard = locks.lock(&room).await;
        locks.forget(&room);
        assert_eq!(locks.len(), 1);

        drop(guard);
        locks.forget(&room);
        assert!(locks.is_empty());
    }
}
