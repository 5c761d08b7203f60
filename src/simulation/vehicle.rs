//! Vehicle logic for the bus jam simulation
//!
//! Standalone implementation that doesn't depend on any engine.

use super::types::{ColorKey, PassengerId, VehicleId};

/// Lifecycle of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleState {
    /// Offstage, waiting for a spot in the visible queue
    Pooled,
    /// In the visible queue; the front one accepts passengers
    Visible,
    /// Full and driving away
    Departing,
}

/// Result of a boarding attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardOutcome {
    /// Passenger boarded and there is room left
    Boarded,
    /// Passenger boarded and took the last seat
    Filled,
    /// Vehicle was already full
    Rejected,
}

/// A vehicle in the bus jam simulation
#[derive(Debug, Clone)]
pub struct SimVehicle {
    pub id: VehicleId,
    pub color: ColorKey,
    pub capacity: usize,
    pub passengers: Vec<PassengerId>,
    pub state: VehicleState,
}

impl SimVehicle {
    pub fn new(id: VehicleId, color: ColorKey, capacity: usize) -> Self {
        Self {
            id,
            color,
            capacity,
            passengers: Vec::with_capacity(capacity),
            state: VehicleState::Pooled,
        }
    }

    pub fn occupancy(&self) -> usize {
        self.passengers.len()
    }

    pub fn is_full(&self) -> bool {
        self.passengers.len() >= self.capacity
    }

    pub fn free_seats(&self) -> usize {
        self.capacity.saturating_sub(self.passengers.len())
    }

    /// Only exact color equality lets a passenger board
    pub fn accepts_color(&self, color: &ColorKey) -> bool {
        self.color == *color
    }

    /// Seat a passenger if there is room
    pub fn try_board(&mut self, passenger: PassengerId) -> BoardOutcome {
        if self.is_full() {
            return BoardOutcome::Rejected;
        }
        self.passengers.push(passenger);
        if self.is_full() {
            BoardOutcome::Filled
        } else {
            BoardOutcome::Boarded
        }
    }
}
