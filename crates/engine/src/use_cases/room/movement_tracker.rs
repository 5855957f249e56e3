//! In-flight movement tasks, one per user.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use plaza_domain::UserId;

struct ActiveMove {
    id: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Tracks the walk each user is currently making.
///
/// Starting a move cancels the user's previous one and waits for it to stop
/// before the new walk reads the room, so two walks of the same user never
/// interleave their steps.
#[derive(Default)]
pub struct MovementTracker {
    moves: DashMap<UserId, ActiveMove>,
    next_id: AtomicU64,
}

impl MovementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `walk` as the user's current move, preempting any earlier one.
    pub fn start<F, Fut>(self: &Arc<Self>, user_id: UserId, walk: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let previous = self.moves.remove(&user_id).map(|(_, active)| {
            active.cancel.cancel();
            active.handle
        });

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let walk = walk(cancel.clone());
        let tracker = Arc::clone(self);
        let owner = user_id.clone();

        let handle = tokio::spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            walk.await;
            tracker.finish(&owner, id);
        });

        self.moves.insert(user_id, ActiveMove { id, cancel, handle });
    }

    /// Cancel the user's move, if any. Returns whether one was running.
    pub fn cancel(&self, user_id: &UserId) -> bool {
        match self.moves.remove(user_id) {
            Some((_, active)) => {
                active.cancel.cancel();
                !active.handle.is_finished()
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn is_moving(&self, user_id: &UserId) -> bool {
        self.moves
            .get(user_id)
            .is_some_and(|active| !active.handle.is_finished())
    }

    #[cfg(test)]
    pub fn active_count(&self) -> usize {
        self.moves
            .iter()
            .filter(|entry| !entry.value().handle.is_finished())
            .count()
    }

    fn finish(&self, user_id: &UserId, id: u64) {
        self.moves.remove_if(user_id, |_, active| active.id == id);
    }
}
