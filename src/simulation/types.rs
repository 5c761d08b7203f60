//! Core types for the bus jam simulation
//!
//! These are standalone types that don't depend on any engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimId(pub usize);

/// A wrapper type for passenger IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassengerId(pub SimId);

/// A wrapper type for vehicle IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub SimId);

/// A wrapper type for pipe IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipeId(pub SimId);

/// Handle returned by the scheduler for a pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Contents of a single grid cell as authored in the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    #[default]
    Empty,
    ColorPassenger,
    HiddenColorPassenger,
    Obstacle,
    Pipe,
}

impl CellType {
    /// Obstacles and pipes block movement regardless of occupancy
    pub fn is_statically_walkable(self) -> bool {
        !matches!(self, CellType::Obstacle | CellType::Pipe)
    }

    /// Whether the level spawns a passenger directly on this cell
    pub fn spawns_passenger(self) -> bool {
        matches!(
            self,
            CellType::ColorPassenger | CellType::HiddenColorPassenger
        )
    }
}

/// Opaque color key used to match passengers with vehicles.
/// Only exact equality matters to the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorKey(pub String);

/// Neutral color returned by forgiving accessors
pub const NEUTRAL_COLOR: &str = "white";

impl ColorKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn neutral() -> Self {
        Self::new(NEUTRAL_COLOR)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Single character used by the console map
    pub fn glyph(&self) -> char {
        self.0.chars().next().unwrap_or('?')
    }
}

impl Default for ColorKey {
    fn default() -> Self {
        Self::neutral()
    }
}

impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColorKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Integer grid coordinate. `y` grows toward the front row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

/// 4-connected neighbour offsets, in the order the search expands them
pub const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

impl GridCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn neighbors(self) -> impl Iterator<Item = GridCoord> {
        NEIGHBOR_OFFSETS
            .into_iter()
            .map(move |(dx, dy)| self.offset(dx, dy))
    }

    pub fn manhattan_distance(self, other: GridCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Direction a pipe faces; the dispensed passenger appears in the
/// neighbouring cell on that side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Toward the front row (+y)
    #[default]
    North,
    East,
    South,
    West,
}

impl Orientation {
    pub fn offset(self) -> (i32, i32) {
        match self {
            Orientation::North => (0, 1),
            Orientation::East => (1, 0),
            Orientation::South => (0, -1),
            Orientation::West => (-1, 0),
        }
    }
}

/// Number of slots in the waiting line
pub const WAITING_LINE_CAPACITY: usize = 5;

/// How many vehicles are in the visible queue at once
pub const DEFAULT_VISIBLE_VEHICLES: usize = 2;

/// Seats per vehicle when the level does not say otherwise
pub const DEFAULT_VEHICLE_CAPACITY: usize = 3;

/// Delay before a pipe shows its next passenger, in seconds
pub const PIPE_RELEASE_DELAY: f32 = 0.3;

/// Time a full vehicle takes to drive off, in seconds
pub const VEHICLE_DEPARTURE_TIME: f32 = 1.0;

/// Delay between the game ending and the outcome screen, in seconds
pub const OUTCOME_SCREEN_DELAY: f32 = 1.5;

/// Level countdown when the level does not say otherwise, in seconds
pub const DEFAULT_COUNTDOWN: f32 = 90.0;

/// World size of a cell when the level does not say otherwise
pub const DEFAULT_CELL_SIZE: f32 = 2.0;
