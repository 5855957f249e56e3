//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Room and client state (in-memory, or Redis hashes shared across processes)
//! - Event fan-out (in-process broadcast, or Redis pub/sub across processes)
//! - Randomness (for testing)

mod error;
mod external;
mod repos;
mod testing;

pub use error::{BusError, StoreError};
pub use external::EventBus;
pub use repos::RoomStore;
pub use testing::RandomPort;

#[cfg(test)]
pub use external::MockEventBus;
#[cfg(test)]
pub use repos::MockRoomStore;
#[cfg(test)]
pub use testing::MockRandomPort;
