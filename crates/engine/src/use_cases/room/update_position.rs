//! Walk a user to a destination cell, one animated step at a time.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use plaza_domain::{find_path, DomainError, FacingDirection, Position, RoomId, UserId};

use super::{RoomContext, RoomError};

/// How a move ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Destination is where the user already stands.
    Unchanged,
    /// No route to the destination at the time the move started.
    NoPath,
    /// Every step was taken.
    Completed { steps: usize },
    /// Cancelled, or the user left the room mid-walk.
    Interrupted { steps: usize },
    /// The next cell was taken by someone else mid-walk.
    Blocked { steps: usize },
}

/// Parse a `"row,col"` destination and check it lies on the grid.
pub fn parse_destination(raw: &str, grid_size: i32) -> Result<Position, RoomError> {
    let position: Position = raw
        .parse()
        .map_err(|e: DomainError| RoomError::InvalidDestination(e.to_string()))?;
    if !position.in_bounds(grid_size) {
        return Err(RoomError::InvalidDestination(format!(
            "{position} is off the {grid_size}x{grid_size} grid"
        )));
    }
    Ok(position)
}

enum Step {
    Moved,
    Blocked,
    MoverGone,
}

/// Update position use case.
///
/// The route is planned once against the occupancy at the start of the move.
/// Each step then runs as its own locked read-modify-write, so other users
/// can act between steps; a step whose cell has been taken in the meantime
/// ends the walk. The lock is never held across the step delay.
pub struct UpdatePosition {
    ctx: Arc<RoomContext>,
}

impl UpdatePosition {
    pub fn new(ctx: Arc<RoomContext>) -> Self {
        Self { ctx }
    }

    /// Side length of the grid destinations are checked against.
    pub fn grid_size(&self) -> i32 {
        self.ctx.settings.grid_size
    }

    pub async fn execute(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        dest: Position,
        cancel: CancellationToken,
    ) -> Result<MoveOutcome, RoomError> {
        let grid_size = self.ctx.settings.grid_size;
        if !dest.in_bounds(grid_size) {
            return Err(RoomError::InvalidDestination(dest.to_string()));
        }

        let Some((start, path)) = self.plan(room_id, user_id, dest).await? else {
            return Ok(MoveOutcome::Unchanged);
        };
        if path.is_empty() {
            tracing::debug!(room_id = %room_id, user_id = %user_id, from = %start, to = %dest, "No path");
            return Ok(MoveOutcome::NoPath);
        }

        // Facing comes from the whole move, not the individual step
        let direction = FacingDirection::from_move(start, dest);
        let mut steps = 0;

        for (i, cell) in path.iter().enumerate() {
            if cancel.is_cancelled() {
                return Ok(MoveOutcome::Interrupted { steps });
            }

            match self.step(room_id, user_id, *cell, direction).await? {
                Step::Moved => steps += 1,
                Step::Blocked => {
                    tracing::debug!(room_id = %room_id, user_id = %user_id, cell = %cell, "Path blocked");
                    return Ok(MoveOutcome::Blocked { steps });
                }
                Step::MoverGone => return Ok(MoveOutcome::Interrupted { steps }),
            }

            if i + 1 < path.len() {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(MoveOutcome::Interrupted { steps }),
                    _ = tokio::time::sleep(self.ctx.settings.step_delay) => {}
                }
            }
        }

        Ok(MoveOutcome::Completed { steps })
    }

    /// Current cell and route, or `None` when already at `dest`.
    async fn plan(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        dest: Position,
    ) -> Result<Option<(Position, Vec<Position>)>, RoomError> {
        let _guard = self.ctx.locks.lock(room_id).await;

        let room = self
            .ctx
            .store
            .get_room(room_id)
            .await?
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;
        let start = room
            .user(user_id)
            .ok_or_else(|| RoomError::UserNotFound {
                room_id: room_id.clone(),
                user_id: user_id.clone(),
            })?
            .position;

        if start == dest {
            return Ok(None);
        }

        let path = find_path(
            start,
            dest,
            self.ctx.settings.grid_size,
            &room.occupied_positions(),
        );
        Ok(Some((start, path)))
    }

    async fn step(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        cell: Position,
        direction: FacingDirection,
    ) -> Result<Step, RoomError> {
        let _guard = self.ctx.locks.lock(room_id).await;

        let Some(mut room) = self.ctx.store.get_room(room_id).await? else {
            return Ok(Step::MoverGone);
        };
        let Some(current) = room.user(user_id).map(|u| u.position) else {
            return Ok(Step::MoverGone);
        };

        let adjacent = (cell.row - current.row).abs() <= 1 && (cell.col - current.col).abs() <= 1;
        if !adjacent || room.is_occupied(&cell) {
            return Ok(Step::Blocked);
        }

        room.move_user(user_id, cell, direction)?;
        self.ctx.store.update_room(room_id, &room).await?;
        self.ctx.publisher.scene(room_id, &room).await?;
        Ok(Step::Moved)
    }
}
