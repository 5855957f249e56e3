//! Whole-record JSON blobs shared by the store adapters.

use serde::{de::DeserializeOwned, Serialize};

use plaza_domain::{RoomData, RoomId};

use super::ports::StoreError;

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(StoreError::serialization)
}

pub(crate) fn decode<T: DeserializeOwned>(json: &str) -> Result<T, StoreError> {
    serde_json::from_str(json).map_err(StoreError::serialization)
}

/// Decode raw `(id, json)` rows, skipping undecodable ones, and keep the
/// `limit` most populated rooms (ties by id).
pub(crate) fn most_populated(
    rows: impl IntoIterator<Item = (RoomId, String)>,
    limit: usize,
) -> Vec<(RoomId, RoomData)> {
    let mut rooms: Vec<(RoomId, RoomData)> = rows
        .into_iter()
        .filter_map(|(room_id, json)| match decode::<RoomData>(&json) {
            Ok(room) => Some((room_id, room)),
            Err(e) => {
                tracing::warn!(room_id = %room_id, error = %e, "Skipping undecodable room");
                None
            }
        })
        .collect();

    rooms.sort_by(|(a_id, a), (b_id, b)| b.len().cmp(&a.len()).then_with(|| a_id.cmp(b_id)));
    rooms.truncate(limit);
    rooms
}
