use super::*;

use plaza_shared::UpdatePositionRequest;

use crate::use_cases::room::{parse_destination, MoveOutcome};

/// Start walking toward `req.dest`. Returns at once; the walk runs as a
/// tracked task that a later move, a leave or a disconnect cancels.
pub(super) fn handle_update_position(state: &WsState, session: &Session, req: UpdatePositionRequest) {
    if !session.owns(&req.user_id, "updatePosition") {
        return;
    }

    let update_position = state.app.use_cases.room.update_position.clone();
    let dest = match parse_destination(&req.dest, update_position.grid_size()) {
        Ok(dest) => dest,
        Err(e) => {
            tracing::warn!(user_id = %req.user_id, dest = %req.dest, error = %e, "Ignoring move");
            return;
        }
    };

    let UpdatePositionRequest {
        user_id, room_id, ..
    } = req;

    state.movements.start(user_id.clone(), move |cancel| async move {
        match update_position
            .execute(&room_id, &user_id, dest, cancel)
            .await
        {
            Ok(MoveOutcome::NoPath) => {
                tracing::debug!(user_id = %user_id, room_id = %room_id, dest = %dest, "No path to destination");
            }
            Ok(outcome) => {
                tracing::debug!(user_id = %user_id, room_id = %room_id, outcome = ?outcome, "Move finished");
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, room_id = %room_id, error = %e, "Move failed");
            }
        }
    });
}
