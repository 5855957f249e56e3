//! Room entity - the authoritative record of who stands where

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{FacingDirection, Position};
use crate::UserId;

use super::User;

/// Rows and columns of every room grid.
pub const GRID_SIZE: i32 = 10;

/// Maximum users per room.
pub const ROOM_LIMIT: usize = 10;

/// A room's full state, stored and replaced as one record.
///
/// Invariants (enforced by the mutators, checked by [`RoomData::check_invariants`]):
/// - `user_index[u.user_id] == i` iff `users[i] == u`
/// - `occupied_cells` holds exactly one `"row,col"` key per user position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomData {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password_hash: Option<String>,
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    occupied_cells: BTreeSet<String>,
    #[serde(default)]
    user_index: BTreeMap<UserId, usize>,
}

impl RoomData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password_hash: None,
            users: Vec::new(),
            occupied_cells: BTreeSet::new(),
            user_index: BTreeMap::new(),
        }
    }

    /// Attach an already-hashed password. Hashing happens upstream.
    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn is_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn occupied_cells(&self) -> &BTreeSet<String> {
        &self.occupied_cells
    }

    /// Occupied cells as positions, for the pathfinder.
    pub fn occupied_positions(&self) -> HashSet<Position> {
        self.occupied_cells
            .iter()
            .filter_map(|key| key.parse().ok())
            .collect()
    }

    pub fn is_occupied(&self, position: &Position) -> bool {
        self.occupied_cells.contains(&position.key())
    }

    pub fn index_of(&self, user_id: &UserId) -> Option<usize> {
        self.user_index.get(user_id).copied()
    }

    pub fn user(&self, user_id: &UserId) -> Option<&User> {
        self.index_of(user_id).and_then(|idx| self.users.get(idx))
    }

    pub fn contains_user(&self, user_id: &UserId) -> bool {
        self.user_index.contains_key(user_id)
    }

    // =========================================================================
    // Mutators
    // =========================================================================

    /// Append a user, returning its slot.
    pub fn push_user(&mut self, user: User) -> Result<usize, DomainError> {
        if self.contains_user(&user.user_id) {
            return Err(DomainError::constraint(format!(
                "user {} is already in room {}",
                user.user_id, self.name
            )));
        }
        if self.is_occupied(&user.position) {
            return Err(DomainError::constraint(format!(
                "cell {} is already occupied",
                user.position
            )));
        }

        let idx = self.users.len();
        self.occupied_cells.insert(user.position.key());
        self.user_index.insert(user.user_id.clone(), idx);
        self.users.push(user);
        Ok(idx)
    }

    /// Remove a user in O(1) by moving the last user into the freed slot.
    ///
    /// Returns `None` when the user isn't in the room.
    pub fn swap_remove_user(&mut self, user_id: &UserId) -> Option<User> {
        let idx = self.user_index.remove(user_id)?;
        if idx >= self.users.len() {
            return None;
        }

        let removed = self.users.swap_remove(idx);
        self.occupied_cells.remove(&removed.position.key());

        if let Some(moved) = self.users.get(idx) {
            self.user_index.insert(moved.user_id.clone(), idx);
        }

        Some(removed)
    }

    /// Step a user onto `to`, turning them to `direction`.
    pub fn move_user(
        &mut self,
        user_id: &UserId,
        to: Position,
        direction: FacingDirection,
    ) -> Result<(), DomainError> {
        let idx = self
            .index_of(user_id)
            .ok_or_else(|| DomainError::not_found("User", user_id.as_str()))?;
        let from = self.users[idx].position;

        if from != to {
            if self.is_occupied(&to) {
                return Err(DomainError::constraint(format!("cell {to} is occupied")));
            }
            self.occupied_cells.remove(&from.key());
            self.occupied_cells.insert(to.key());
        }

        let user = &mut self.users[idx];
        user.position = to;
        user.direction = direction;
        Ok(())
    }

    /// Set the typing flag. Returns whether it changed.
    pub fn set_typing(&mut self, user_id: &UserId, is_typing: bool) -> Result<bool, DomainError> {
        let idx = self
            .index_of(user_id)
            .ok_or_else(|| DomainError::not_found("User", user_id.as_str()))?;
        let user = &mut self.users[idx];
        if user.is_typing == is_typing {
            return Ok(false);
        }
        user.is_typing = is_typing;
        Ok(true)
    }

    /// Pick a free cell by rejection sampling.
    ///
    /// `gen(n)` must return a uniform value in `0..n`. Returns `None` when
    /// every cell of the grid is taken.
    pub fn pick_free_cell(
        &self,
        grid_size: i32,
        mut gen: impl FnMut(i32) -> i32,
    ) -> Option<Position> {
        let capacity = usize::try_from(grid_size.max(0)).unwrap_or(0).pow(2);
        if self.occupied_cells.len() >= capacity {
            return None;
        }

        loop {
            let candidate = Position::new(gen(grid_size), gen(grid_size));
            if candidate.in_bounds(grid_size) && !self.is_occupied(&candidate) {
                return Some(candidate);
            }
        }
    }

    /// Verify the index and occupancy invariants.
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        if self.user_index.len() != self.users.len() {
            return Err(DomainError::constraint(format!(
                "index has {} entries for {} users",
                self.user_index.len(),
                self.users.len()
            )));
        }

        for (idx, user) in self.users.iter().enumerate() {
            if self.user_index.get(&user.user_id) != Some(&idx) {
                return Err(DomainError::constraint(format!(
                    "index for {} does not point at slot {idx}",
                    user.user_id
                )));
            }
        }

        let keys: BTreeSet<String> = self.users.iter().map(|u| u.position.key()).collect();
        if keys.len() != self.users.len() {
            return Err(DomainError::constraint("two users share a cell"));
        }
        if keys != self.occupied_cells {
            return Err(DomainError::constraint(format!(
                "occupied cells {:?} do not match user positions {:?}",
                self.occupied_cells, keys
            )));
        }

        Ok(())
    }
}
