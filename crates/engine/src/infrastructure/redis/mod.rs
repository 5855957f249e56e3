//! Redis adapters for running several engine processes against shared state.
//!
//! Rooms and clients live in two Redis hashes of JSON blobs; room events go
//! over Redis pub/sub with one channel per room id, so a scene published by
//! any process reaches every subscribed connection on every process.

mod bus;
mod store;


use std::time::Duration;

use redis::aio::ConnectionManager;

use super::ports::StoreError;

pub use bus::RedisEventBus;
pub use store::RedisRoomStore;

/// Open a client for `url` and a managed connection, verified with `PING`.
///
/// Gives up after `timeout`; callers treat failure as fatal.
pub async fn connect(
    url: &str,
    timeout: Duration,
) -> Result<(redis::Client, ConnectionManager), StoreError> {
    let client = redis::Client::open(url).map_err(|e| StoreError::unavailable("connect", e))?;

    let handshake = async {
        let mut conn = client.get_connection_manager().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok::<_, redis::RedisError>(conn)
    };

    match tokio::time::timeout(timeout, handshake).await {
        Ok(Ok(conn)) => {
            tracing::info!("Redis connection established");
            Ok((client, conn))
        }
        Ok(Err(e)) => Err(StoreError::unavailable("connect", e)),
        Err(_) => Err(StoreError::Timeout {
            operation: "connect",
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
