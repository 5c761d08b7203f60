//! Shortest path from a passenger's cell to the front row
//!
//! A* over the 4-connected grid with unit step cost. Obstacles and pipes
//! always block; occupied cells block too, except the start cell. The goal
//! is any cell of the target row that is free (or is the start itself).

use std::collections::{HashMap, HashSet};

use super::grid::GridModel;
use super::priority_queue::PriorityQueue;
use super::types::GridCoord;

/// Row distance to the target row. Admissible and consistent, since one
/// step changes the row by at most one.
pub fn row_heuristic(y: i32, target_row: i32) -> u32 {
    y.abs_diff(target_row)
}

/// Find a shortest path from `start` to any cell in `target_row`.
///
/// Returns the full path including `start`, or `None` when no cell of the
/// target row can be reached under the current occupancy.
pub fn find_path(grid: &GridModel, start: GridCoord, target_row: i32) -> Option<Vec<GridCoord>> {
    if start.y == target_row {
        return Some(vec![start]);
    }

    let mut open = PriorityQueue::with_capacity(grid.len());
    let mut closed: HashSet<GridCoord> = HashSet::new();
    let mut came_from: HashMap<GridCoord, GridCoord> = HashMap::new();
    let mut g_score: HashMap<GridCoord, u32> = HashMap::new();

    g_score.insert(start, 0);
    open.enqueue(start, i64::from(row_heuristic(start.y, target_row)));

    while let Some(current) = open.dequeue() {
        // Stale duplicate entry
        if !closed.insert(current) {
            continue;
        }

        if current.y == target_row
            && grid.is_statically_walkable(current)
            && (!grid.is_occupied(current) || current == start)
        {
            return Some(reconstruct_path(&came_from, current, start));
        }

        let current_g = g_score.get(&current).copied().unwrap_or(u32::MAX);

        for neighbor in current.neighbors() {
            if !grid.in_bounds(neighbor) || !grid.is_statically_walkable(neighbor) {
                continue;
            }
            if grid.is_occupied(neighbor) && neighbor != start {
                continue;
            }
            if closed.contains(&neighbor) {
                continue;
            }

            let tentative_g = current_g.saturating_add(1);
            let better = g_score
                .get(&neighbor)
                .map_or(true, |&known| tentative_g < known);

            if better {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative_g);
                let f = tentative_g + row_heuristic(neighbor.y, target_row);
                open.enqueue(neighbor, i64::from(f));
            }
        }
    }

    None
}

fn reconstruct_path(
    came_from: &HashMap<GridCoord, GridCoord>,
    goal: GridCoord,
    start: GridCoord,
) -> Vec<GridCoord> {
    let mut path = vec![goal];
    let mut node = goal;
    while node != start {
        match came_from.get(&node) {
            Some(&previous) => {
                node = previous;
                path.push(node);
            }
            None => break,
        }
    }
    path.reverse();
    path
}
