//! Random implementations.

use crate::infrastructure::ports::RandomPort;
use uuid::Uuid;

/// System random - uses real randomness.
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        use rand::Rng;
        rand::thread_rng().gen_range(min..=max)
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Fixed random for testing.
#[cfg(test)]
pub struct FixedRandom(pub i32);

#[cfg(test)]
impl RandomPort for FixedRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        self.0.clamp(min, max)
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::nil()
    }
}

/// Scripted random for testing.
///
/// `gen_range` replays the queued values in order (clamped to the requested
/// range) and then falls back to `min`; `gen_uuid` counts up from 1.
#[cfg(test)]
pub struct SequenceRandom {
    values: std::sync::Mutex<std::collections::VecDeque<i32>>,
    next_uuid: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl SequenceRandom {
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            values: std::sync::Mutex::new(values.into_iter().collect()),
            next_uuid: std::sync::atomic::AtomicU64::new(1),
        }
    }
}

#[cfg(test)]
impl RandomPort for SequenceRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        let next = self.values.lock().unwrap().pop_front();
        next.map_or(min, |value| value.clamp(min, max))
    }

    fn gen_uuid(&self) -> Uuid {
        let n = self
            .next_uuid
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Uuid::from_u128(u128::from(n))
    }
}
