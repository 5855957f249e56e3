//! Infrastructure layer - ports and the adapters behind them.

mod blob;
pub mod config;
pub mod memory_bus;
pub mod memory_store;
pub mod ports;
pub mod random;
pub mod redis;
pub mod room_locks;
pub mod timeout_store;
