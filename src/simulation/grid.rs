//! Grid model for the bus jam simulation
//!
//! Owns the authored cell types and the live occupancy of every cell.
//! Accessors are forgiving: reads outside the grid return `Empty` and
//! writes outside the grid are ignored.

use super::types::{CellType, GridCoord, PassengerId};

/// A single cell of the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    pub coord: GridCoord,
    pub cell_type: CellType,
    /// The passenger currently standing on this cell (if any)
    pub occupant: Option<PassengerId>,
}

impl GridCell {
    pub fn new(coord: GridCoord, cell_type: CellType) -> Self {
        Self {
            coord,
            cell_type,
            occupant: None,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }
}

/// Row-major grid of cells. Index = y * width + x.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridModel {
    width: usize,
    height: usize,
    cells: Vec<GridCell>,
}

impl GridModel {
    /// Create an empty grid
    pub fn new(width: usize, height: usize) -> Self {
        let cells = (0..width * height)
            .map(|index| GridCell::new(coord_of(index, width), CellType::Empty))
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    /// Create a grid from a row-major list of cell types.
    /// Missing entries are padded with `Empty`; extra entries are dropped.
    pub fn from_cell_types(width: usize, height: usize, types: &[CellType]) -> Self {
        let mut grid = Self::new(width, height);
        for (cell, cell_type) in grid.cells.iter_mut().zip(types) {
            cell.cell_type = *cell_type;
        }
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells (always width * height)
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The exit row passengers must reach
    pub fn front_row(&self) -> i32 {
        self.height as i32 - 1
    }

    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(coord.y as usize * self.width + coord.x as usize)
        } else {
            None
        }
    }

    pub fn cell_at(&self, coord: GridCoord) -> Option<&GridCell> {
        self.index(coord).map(|index| &self.cells[index])
    }

    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.cells.iter()
    }

    pub fn get_cell(&self, coord: GridCoord) -> CellType {
        self.cell_at(coord)
            .map(|cell| cell.cell_type)
            .unwrap_or_default()
    }

    pub fn set_cell(&mut self, coord: GridCoord, cell_type: CellType) {
        if let Some(index) = self.index(coord) {
            self.cells[index].cell_type = cell_type;
        }
    }

    /// Static walkability ignores occupancy. Out-of-range cells read as
    /// `Empty` and are therefore walkable; callers bound-check first.
    pub fn is_statically_walkable(&self, coord: GridCoord) -> bool {
        self.get_cell(coord).is_statically_walkable()
    }

    pub fn is_occupied(&self, coord: GridCoord) -> bool {
        self.occupant(coord).is_some()
    }

    pub fn occupant(&self, coord: GridCoord) -> Option<PassengerId> {
        self.cell_at(coord).and_then(|cell| cell.occupant)
    }

    /// Place a passenger on a cell. Returns false if the cell is outside the
    /// grid or already holds someone else.
    pub fn set_occupant(&mut self, coord: GridCoord, passenger: PassengerId) -> bool {
        let Some(index) = self.index(coord) else {
            return false;
        };
        match self.cells[index].occupant {
            Some(current) if current != passenger => false,
            _ => {
                self.cells[index].occupant = Some(passenger);
                true
            }
        }
    }

    /// Clear a cell and return whoever was standing on it
    pub fn clear_occupant(&mut self, coord: GridCoord) -> Option<PassengerId> {
        let index = self.index(coord)?;
        self.cells[index].occupant.take()
    }

    /// Resize the grid, keeping every cell whose coordinate still fits.
    /// Cells are remapped by (x, y) so rows stay aligned when the width
    /// changes.
    pub fn resize(&mut self, width: usize, height: usize) {
        let blank = GridCell::new(GridCoord::default(), CellType::Empty);
        let mut cells = remap_row_major(&self.cells, self.width, width, height, blank);
        for (index, cell) in cells.iter_mut().enumerate() {
            cell.coord = coord_of(index, width);
        }
        self.cells = cells;
        self.width = width;
        self.height = height;
    }
}

fn coord_of(index: usize, width: usize) -> GridCoord {
    GridCoord::new((index % width) as i32, (index / width) as i32)
}

/// Copy a row-major array into a new shape by coordinate, filling cells that
/// did not exist before with `fill`
pub fn remap_row_major<T: Clone>(
    old: &[T],
    old_width: usize,
    new_width: usize,
    new_height: usize,
    fill: T,
) -> Vec<T> {
    let mut out = Vec::with_capacity(new_width * new_height);
    for y in 0..new_height {
        for x in 0..new_width {
            let value = if x < old_width {
                old.get(y * old_width + x).cloned()
            } else {
                None
            };
            out.push(value.unwrap_or_else(|| fill.clone()));
        }
    }
    out
}
