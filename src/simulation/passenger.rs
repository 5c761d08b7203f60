//! Passenger state for the bus jam simulation
//!
//! Standalone implementation that doesn't depend on any engine.

use super::types::{ColorKey, GridCoord, PassengerId, PipeId, VehicleId};

/// Which container currently owns a passenger.
/// A passenger has exactly one location at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassengerLocation {
    /// Standing on a grid cell
    Grid(GridCoord),
    /// Waiting inside a pipe's pool, not yet dispensed
    PipePool(PipeId),
    /// Sitting in a waiting line slot
    WaitingSlot(usize),
    /// Boarded onto a vehicle
    Boarded(VehicleId),
}

/// A passenger in the simulation
#[derive(Debug, Clone)]
pub struct Passenger {
    pub id: PassengerId,
    pub color: ColorKey,
    pub location: PassengerLocation,
    /// Color stays hidden until the passenger first becomes reachable
    pub color_hidden: bool,
    pub reachable: bool,
    /// Last computed path (start..goal); `None` if unreachable
    pub path: Option<Vec<GridCoord>>,
    pub interactable: bool,
    /// Set while an external movement animation is playing
    pub moving: bool,
    /// The pipe this passenger was dispensed from (if any)
    pub origin_pipe: Option<PipeId>,
}

impl Passenger {
    pub fn new(id: PassengerId, color: ColorKey, location: PassengerLocation) -> Self {
        Self {
            id,
            color,
            location,
            color_hidden: false,
            reachable: false,
            path: None,
            interactable: true,
            moving: false,
            origin_pipe: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.color_hidden = true;
        self
    }

    pub fn grid_coord(&self) -> Option<GridCoord> {
        match self.location {
            PassengerLocation::Grid(coord) => Some(coord),
            _ => None,
        }
    }

    pub fn is_on_grid(&self) -> bool {
        self.grid_coord().is_some()
    }

    pub fn is_boarded(&self) -> bool {
        matches!(self.location, PassengerLocation::Boarded(_))
    }

    /// Whether a click on this passenger would be accepted right now
    pub fn is_clickable(&self) -> bool {
        self.is_on_grid() && self.interactable && self.reachable && !self.moving
    }

    /// The color the player is allowed to see
    pub fn visible_color(&self) -> Option<&ColorKey> {
        if self.color_hidden {
            None
        } else {
            Some(&self.color)
        }
    }

    /// Store a freshly computed path.
    ///
    /// Returns `(reachability_changed, color_revealed)`.
    pub fn apply_path(&mut self, path: Option<Vec<GridCoord>>) -> (bool, bool) {
        let reachable = path.as_ref().is_some_and(|p| !p.is_empty());
        let changed = reachable != self.reachable;
        self.reachable = reachable;
        self.path = path;

        let revealed = reachable && self.color_hidden;
        if revealed {
            self.color_hidden = false;
        }
        (changed, revealed)
    }

    /// Leave the grid; reachability no longer applies
    pub fn clear_reachability(&mut self) {
        self.reachable = false;
        self.path = None;
    }
}
