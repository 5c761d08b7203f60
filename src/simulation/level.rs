//! Level definitions for the bus jam simulation
//!
//! A level is plain data: grid size, a row-major list of cell types with a
//! parallel list of colors, pipe pools and the vehicle setup. Levels are
//! loaded from JSON and validated before a session is built from them.

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

use super::grid::{remap_row_major, GridModel};
use super::grid_graph::GridGraph;
use super::types::{
    CellType, ColorKey, GridCoord, Orientation, DEFAULT_CELL_SIZE, DEFAULT_COUNTDOWN,
    DEFAULT_VEHICLE_CAPACITY, DEFAULT_VISIBLE_VEHICLES,
};

/// Malformed level data. Reported at load time, never mid-game.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LevelError {
    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },

    #[error("grid of {width}x{height} cells is too large")]
    GridTooLarge { width: usize, height: usize },

    #[error("expected {expected} cells for the grid, got {got}")]
    CellCountMismatch { expected: usize, got: usize },

    #[error("expected {expected} cell colors for the grid, got {got}")]
    ColorCountMismatch { expected: usize, got: usize },

    #[error("countdown must be positive, got {0}")]
    InvalidCountdown(f32),

    #[error("pipe config at {0} is outside the grid")]
    PipeOutOfBounds(GridCoord),

    #[error("pipe config at {0} is not on a pipe cell")]
    PipeNotOnPipeCell(GridCoord),

    #[error("pipe cell {0} has no pipe config")]
    MissingPipeConfig(GridCoord),

    #[error("pipe cell {0} is configured more than once")]
    DuplicatePipe(GridCoord),

    #[error("pipe at {coord} has a pool of {pool_size} but {colors} colors")]
    PipeColorMismatch {
        coord: GridCoord,
        pool_size: usize,
        colors: usize,
    },

    #[error("pipe at {pipe} dispenses onto {output}, which is not an empty cell inside the grid")]
    InvalidPipeOutput { pipe: GridCoord, output: GridCoord },

    #[error("more than one pipe dispenses onto {0}")]
    SharedPipeOutput(GridCoord),

    #[error("vehicle capacity must be at least 1")]
    ZeroVehicleCapacity,

    #[error("at least one vehicle must be visible")]
    ZeroVisibleVehicles,
}

/// A pipe and the passengers it dispenses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeConfig {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub orientation: Orientation,
    pub pool_size: usize,
    /// One color per pool slot, in dispense order
    pub colors: Vec<ColorKey>,
}

impl PipeConfig {
    pub fn coord(&self) -> GridCoord {
        GridCoord::new(self.x, self.y)
    }

    pub fn output_cell(&self) -> GridCoord {
        let (dx, dy) = self.orientation.offset();
        self.coord().offset(dx, dy)
    }
}

/// Vehicle setup. An empty color list means one vehicle per `capacity`
/// passengers of each color, in shuffled order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    #[serde(default = "default_vehicle_capacity")]
    pub capacity: usize,
    #[serde(default = "default_visible_vehicles")]
    pub visible_count: usize,
    #[serde(default)]
    pub colors: Vec<ColorKey>,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_VEHICLE_CAPACITY,
            visible_count: DEFAULT_VISIBLE_VEHICLES,
            colors: Vec::new(),
        }
    }
}

fn default_vehicle_capacity() -> usize {
    DEFAULT_VEHICLE_CAPACITY
}

fn default_visible_vehicles() -> usize {
    DEFAULT_VISIBLE_VEHICLES
}

fn default_cell_size() -> f32 {
    DEFAULT_CELL_SIZE
}

fn default_countdown() -> f32 {
    DEFAULT_COUNTDOWN
}

/// Seats of one color fall short of the passengers of that color
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatShortfall {
    pub color: ColorKey,
    pub passengers: usize,
    pub seats: usize,
}

/// Findings that do not stop a level from loading but are worth a warning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelReport {
    pub passenger_count: usize,
    /// Passenger cells that cannot reach the front row even on an empty board
    pub stranded: Vec<GridCoord>,
    pub seat_shortfalls: Vec<SeatShortfall>,
    /// Colors whose passenger count is not a multiple of the vehicle
    /// capacity; their last vehicle never fills up
    pub uneven_colors: Vec<ColorKey>,
}

impl LevelReport {
    pub fn is_clean(&self) -> bool {
        self.stranded.is_empty() && self.seat_shortfalls.is_empty() && self.uneven_colors.is_empty()
    }
}

/// A complete level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    #[serde(default)]
    pub name: String,
    pub width: usize,
    pub height: usize,
    /// World size of a cell; only used for positioning
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    #[serde(default = "default_countdown")]
    pub countdown_secs: f32,
    /// Row-major: index = y * width + x
    pub cells: Vec<CellType>,
    /// Parallel to `cells`; only read for passenger cells
    pub cell_colors: Vec<ColorKey>,
    #[serde(default)]
    pub pipes: Vec<PipeConfig>,
    #[serde(default)]
    pub vehicles: VehicleConfig,
}

impl LevelDefinition {
    /// An empty level of the given size
    pub fn new(name: impl Into<String>, width: usize, height: usize) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            cell_size: DEFAULT_CELL_SIZE,
            countdown_secs: DEFAULT_COUNTDOWN,
            cells: vec![CellType::Empty; width * height],
            cell_colors: vec![ColorKey::neutral(); width * height],
            pipes: Vec::new(),
            vehicles: VehicleConfig::default(),
        }
    }

    /// Parse a level from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse level JSON")
    }

    /// Load a level from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read level file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid level file {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize level")
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        if coord.x < 0 || coord.y < 0 {
            return None;
        }
        let (x, y) = (coord.x as usize, coord.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    pub fn get_cell(&self, coord: GridCoord) -> CellType {
        self.index(coord)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or_default()
    }

    pub fn set_cell(&mut self, coord: GridCoord, cell_type: CellType) {
        if let Some(cell) = self.index(coord).and_then(|index| self.cells.get_mut(index)) {
            *cell = cell_type;
        }
    }

    pub fn get_cell_color(&self, coord: GridCoord) -> ColorKey {
        self.index(coord)
            .and_then(|index| self.cell_colors.get(index).cloned())
            .unwrap_or_default()
    }

    pub fn set_cell_color(&mut self, coord: GridCoord, color: ColorKey) {
        if let Some(cell) = self.index(coord).and_then(|index| self.cell_colors.get_mut(index)) {
            *cell = color;
        }
    }

    /// Change the grid size, keeping cells by coordinate
    pub fn resize(&mut self, width: usize, height: usize) {
        self.cells = remap_row_major(&self.cells, self.width, width, height, CellType::Empty);
        self.cell_colors = remap_row_major(
            &self.cell_colors,
            self.width,
            width,
            height,
            ColorKey::neutral(),
        );
        self.width = width;
        self.height = height;
    }

    /// World-space (x, z) centre of a cell, with the grid centred on the
    /// origin
    pub fn cell_center(&self, coord: GridCoord) -> (f32, f32) {
        let cs = self.cell_size;
        let origin_x = -((self.width as f32 - 1.0) * cs * 0.5);
        let origin_z = -((self.height as f32 - 1.0) * cs * 0.5);
        (
            origin_x + coord.x as f32 * cs,
            origin_z + coord.y as f32 * cs,
        )
    }

    /// Build the static grid (cell types only, no occupants)
    pub fn build_grid(&self) -> GridModel {
        GridModel::from_cell_types(self.width, self.height, &self.cells)
    }

    /// Coordinates of every passenger cell, row by row
    pub fn passenger_cells(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).filter_map(move |x| {
                let coord = GridCoord::new(x as i32, y as i32);
                self.get_cell(coord).spawns_passenger().then_some(coord)
            })
        })
    }

    /// How many passengers of each color the level holds, pipes included
    pub fn passenger_color_counts(&self) -> BTreeMap<ColorKey, usize> {
        let mut counts = BTreeMap::new();
        for coord in self.passenger_cells() {
            *counts.entry(self.get_cell_color(coord)).or_insert(0) += 1;
        }
        for pipe in &self.pipes {
            for color in pipe.colors.iter().take(pipe.pool_size) {
                *counts.entry(color.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn passenger_count(&self) -> usize {
        self.passenger_color_counts().values().sum()
    }

    /// Vehicle colors in queue order. Explicit colors are used as-is;
    /// otherwise they are generated from the passenger colors and shuffled.
    pub fn vehicle_colors<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ColorKey> {
        if !self.vehicles.colors.is_empty() {
            return self.vehicles.colors.clone();
        }
        let capacity = self.vehicles.capacity.max(1);
        let mut colors: Vec<ColorKey> = self
            .passenger_color_counts()
            .into_iter()
            .flat_map(|(color, count)| std::iter::repeat(color).take(count.div_ceil(capacity)))
            .collect();
        colors.shuffle(rng);
        colors
    }

    /// Check the level for malformed data and collect soft findings
    pub fn validate(&self) -> Result<LevelReport, LevelError> {
        if self.width == 0 || self.height == 0 {
            return Err(LevelError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        let expected = self
            .width
            .checked_mul(self.height)
            .ok_or(LevelError::GridTooLarge {
                width: self.width,
                height: self.height,
            })?;
        if self.cells.len() != expected {
            return Err(LevelError::CellCountMismatch {
                expected,
                got: self.cells.len(),
            });
        }
        if self.cell_colors.len() != expected {
            return Err(LevelError::ColorCountMismatch {
                expected,
                got: self.cell_colors.len(),
            });
        }
        if !(self.countdown_secs > 0.0) {
            return Err(LevelError::InvalidCountdown(self.countdown_secs));
        }
        if self.vehicles.capacity == 0 {
            return Err(LevelError::ZeroVehicleCapacity);
        }
        if self.vehicles.visible_count == 0 {
            return Err(LevelError::ZeroVisibleVehicles);
        }

        self.validate_pipes()?;

        Ok(self.report())
    }

    fn validate_pipes(&self) -> Result<(), LevelError> {
        let mut configured = HashSet::new();
        let mut outputs = HashSet::new();

        for pipe in &self.pipes {
            let coord = pipe.coord();
            if self.index(coord).is_none() {
                return Err(LevelError::PipeOutOfBounds(coord));
            }
            if self.get_cell(coord) != CellType::Pipe {
                return Err(LevelError::PipeNotOnPipeCell(coord));
            }
            if !configured.insert(coord) {
                return Err(LevelError::DuplicatePipe(coord));
            }
            if pipe.colors.len() != pipe.pool_size {
                return Err(LevelError::PipeColorMismatch {
                    coord,
                    pool_size: pipe.pool_size,
                    colors: pipe.colors.len(),
                });
            }
            let output = pipe.output_cell();
            if self.index(output).is_none() || self.get_cell(output) != CellType::Empty {
                return Err(LevelError::InvalidPipeOutput {
                    pipe: coord,
                    output,
                });
            }
            if !outputs.insert(output) {
                return Err(LevelError::SharedPipeOutput(output));
            }
        }

        for y in 0..self.height {
            for x in 0..self.width {
                let coord = GridCoord::new(x as i32, y as i32);
                if self.get_cell(coord) == CellType::Pipe && !configured.contains(&coord) {
                    return Err(LevelError::MissingPipeConfig(coord));
                }
            }
        }
        Ok(())
    }

    fn report(&self) -> LevelReport {
        let graph = GridGraph::from_grid(&self.build_grid());

        let mut starts: Vec<GridCoord> = self.passenger_cells().collect();
        starts.extend(
            self.pipes
                .iter()
                .filter(|pipe| pipe.pool_size > 0)
                .map(PipeConfig::output_cell),
        );
        let stranded = graph.stranded(&starts);

        let counts = self.passenger_color_counts();
        let capacity = self.vehicles.capacity;

        let mut seat_shortfalls = Vec::new();
        if !self.vehicles.colors.is_empty() {
            for (color, &passengers) in &counts {
                let vehicles = self.vehicles.colors.iter().filter(|c| *c == color).count();
                let seats = vehicles * capacity;
                if seats < passengers {
                    seat_shortfalls.push(SeatShortfall {
                        color: color.clone(),
                        passengers,
                        seats,
                    });
                }
            }
        }

        let uneven_colors = counts
            .iter()
            .filter(|(_, count)| capacity > 0 && **count % capacity != 0)
            .map(|(color, _)| color.clone())
            .collect();

        LevelReport {
            passenger_count: counts.values().sum(),
            stranded,
            seat_shortfalls,
            uneven_colors,
        }
    }

    /// A small built-in level with obstacles, a hidden passenger and a pipe
    pub fn demo() -> Self {
        use CellType::{
            ColorPassenger as C, Empty as E, HiddenColorPassenger as H, Obstacle as O, Pipe as P,
        };

        // Front row (y = 5) first
        let layout: [[(CellType, &str); 5]; 6] = [
            [(E, ""), (E, ""), (E, ""), (E, ""), (E, "")],
            [(C, "red"), (C, "blue"), (E, ""), (C, "green"), (C, "yellow")],
            [(C, "blue"), (O, ""), (C, "red"), (O, ""), (C, "green")],
            [(C, "yellow"), (C, "green"), (H, "blue"), (C, "red"), (E, "")],
            [(O, ""), (E, ""), (C, "yellow"), (E, ""), (P, "")],
            [(E, ""), (E, ""), (E, ""), (E, ""), (E, "")],
        ];

        let height = layout.len();
        let mut level = Self::new("Demo", 5, height);
        for (row, cells) in layout.iter().enumerate() {
            let y = (height - 1 - row) as i32;
            for (x, (cell_type, color)) in cells.iter().enumerate() {
                let coord = GridCoord::new(x as i32, y);
                level.set_cell(coord, *cell_type);
                if !color.is_empty() {
                    level.set_cell_color(coord, ColorKey::new(*color));
                }
            }
        }

        level.pipes.push(PipeConfig {
            x: 4,
            y: 1,
            orientation: Orientation::North,
            pool_size: 3,
            colors: vec![ColorKey::new("yellow"); 3],
        });

        level
    }
}
