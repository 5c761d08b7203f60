//! Static walkability graph for level analysis
//!
//! Builds a petgraph graph of every walkable cell, ignoring occupancy, and
//! answers "could this cell ever reach the front row?". Used when a level is
//! validated; the live game uses `pathfinding::find_path` instead.

use petgraph::algo::astar;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use super::grid::GridModel;
use super::pathfinding::row_heuristic;
use super::types::GridCoord;

/// Undirected graph of statically walkable cells
#[derive(Default)]
pub struct GridGraph {
    /// The underlying petgraph graph; edges carry their step cost
    graph: UnGraph<GridCoord, u32>,

    /// Maps cell coordinates to their node indices in the graph
    coord_to_node: HashMap<GridCoord, NodeIndex>,

    /// The exit row of the grid the graph was built from
    front_row: i32,
}

impl GridGraph {
    /// Build the graph from the grid's static cell types
    pub fn from_grid(grid: &GridModel) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut coord_to_node = HashMap::new();

        for cell in grid.cells() {
            if cell.cell_type.is_statically_walkable() {
                let node = graph.add_node(cell.coord);
                coord_to_node.insert(cell.coord, node);
            }
        }

        // Only +x and +y so each edge is added once
        for (&coord, &node) in &coord_to_node {
            for neighbor in [coord.offset(1, 0), coord.offset(0, 1)] {
                if let Some(&other) = coord_to_node.get(&neighbor) {
                    graph.add_edge(node, other, 1);
                }
            }
        }

        Self {
            graph,
            coord_to_node,
            front_row: grid.front_row(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of steps from `start` to the nearest front row cell on an
    /// empty board, or `None` if walls cut it off
    pub fn steps_to_front(&self, start: GridCoord) -> Option<u32> {
        let start_node = self.coord_to_node.get(&start)?;
        let front_row = self.front_row;

        let (cost, _) = astar(
            &self.graph,
            *start_node,
            |node| self.graph[node].y == front_row,
            |edge| *edge.weight(),
            |node| row_heuristic(self.graph[node].y, front_row),
        )?;

        Some(cost)
    }

    /// The subset of `cells` that can never reach the front row
    pub fn stranded<'a>(&self, cells: impl IntoIterator<Item = &'a GridCoord>) -> Vec<GridCoord> {
        cells
            .into_iter()
            .filter(|coord| self.steps_to_front(**coord).is_none())
            .copied()
            .collect()
    }
}
