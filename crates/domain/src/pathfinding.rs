//! Grid pathfinding for avatar movement.
//!
//! A* over a square grid with 8-directional moves of uniform cost 1, guided
//! by the Manhattan distance. Manhattan overestimates diagonal travel, so the
//! search is greedy rather than optimal: it favours expanding few nodes over
//! guaranteeing the shortest route. Results are deterministic:
//!
//! - the open list is ordered by `f = g + h` with a *stable* sort, so among
//!   equal `f` the node inserted first is expanded first;
//! - neighbours are inserted in [`NEIGHBOR_OFFSETS`] order.
//!
//! Equal-cost alternatives are therefore resolved by insertion order, not by
//! any canonical geometric rule.

use std::collections::HashSet;

use crate::value_objects::Position;

/// Expansion order: up, down, left, right, then the four diagonals.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

#[derive(Debug, Clone, Copy)]
struct Node {
    g: i32,
    h: i32,
    f: i32,
    parent: Option<usize>,
    visited: bool,
}

/// Find a route from `start` to `goal`.
///
/// Returns the cells to step through in order, excluding `start` and
/// including `goal`. The result is empty when `start == goal`, when either
/// end lies off the grid, or when `goal` cannot be reached.
///
/// Every cell in `occupied` is blocked except `start` itself, so a mover's
/// own cell never prevents departure. An occupied goal is unreachable.
pub fn find_path(
    start: Position,
    goal: Position,
    grid_size: i32,
    occupied: &HashSet<Position>,
) -> Vec<Position> {
    if start == goal || !start.in_bounds(grid_size) || !goal.in_bounds(grid_size) {
        return Vec::new();
    }

    let size = grid_size as usize;
    let index = |p: Position| p.row as usize * size + p.col as usize;
    let position = |i: usize| Position::new((i / size) as i32, (i % size) as i32);

    let mut nodes: Vec<Node> = (0..size * size)
        .map(|i| Node {
            g: i32::MAX,
            h: position(i).manhattan(&goal),
            f: 0,
            parent: None,
            visited: false,
        })
        .collect();

    let start_idx = index(start);
    let goal_idx = index(goal);
    nodes[start_idx].g = 0;
    nodes[start_idx].f = nodes[start_idx].h;

    let mut open: Vec<usize> = vec![start_idx];

    while !open.is_empty() {
        // Stable: equal f keeps insertion order
        open.sort_by_key(|&i| nodes[i].f);
        let current = open.remove(0);
        nodes[current].visited = true;

        if current == goal_idx {
            return reconstruct(&nodes, current, position);
        }

        let here = position(current);
        for (dr, dc) in NEIGHBOR_OFFSETS {
            let next = Position::new(here.row + dr, here.col + dc);
            if !next.in_bounds(grid_size) || occupied.contains(&next) {
                continue;
            }

            let next_idx = index(next);
            if nodes[next_idx].visited {
                continue;
            }

            let g = nodes[current].g + 1;
            if g < nodes[next_idx].g {
                let node = &mut nodes[next_idx];
                node.g = g;
                node.f = g + node.h;
                node.parent = Some(current);

                if !open.contains(&next_idx) {
                    open.push(next_idx);
                }
            }
        }
    }

    Vec::new()
}

fn reconstruct(nodes: &[Node], end: usize, position: impl Fn(usize) -> Position) -> Vec<Position> {
    let mut path = Vec::new();
    let mut cursor = Some(end);
    while let Some(i) = cursor {
        path.push(position(i));
        cursor = nodes[i].parent;
    }
    path.reverse();
    // Drop the start cell
    path.remove(0);
    path
}
