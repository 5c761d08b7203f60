//! Vehicle queue management for the bus jam simulation
//!
//! This module keeps the sliding window of visible vehicles backed by an
//! offstage pool, and matches waiting passengers onto the front vehicle.

use log::debug;
use std::collections::VecDeque;

use super::types::{ColorKey, PassengerId, VehicleId};
use super::vehicle::{BoardOutcome, SimVehicle, VehicleState};
use super::waiting_line::{SlotShift, WaitingLine};

/// What a boarding pass over the waiting line did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardingReport {
    /// (vehicle, passenger, slot the passenger left)
    pub boarded: Vec<(VehicleId, PassengerId, usize)>,
    /// The front vehicle, if this pass filled it
    pub filled: Option<VehicleId>,
    /// Slot moves made by the compaction after boarding
    pub shifts: Vec<SlotShift>,
}

impl BoardingReport {
    pub fn is_empty(&self) -> bool {
        self.boarded.is_empty()
    }
}

/// What happened when a departing vehicle left
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureReport {
    pub departed: VehicleId,
    /// Pooled vehicle that joined the tail of the visible queue
    pub promoted: Option<VehicleId>,
    /// Visible queue after the reflow, front first
    pub order: Vec<VehicleId>,
}

/// Ordered vehicles: a visible window in front of an offstage pool
#[derive(Debug, Clone)]
pub struct VehicleQueue {
    /// Every vehicle not yet departed, in pool order
    vehicles: Vec<SimVehicle>,
    /// Visible vehicles, front first
    visible: VecDeque<VehicleId>,
    visible_count: usize,
}

impl VehicleQueue {
    /// Take ownership of the pool and show the first `visible_count` vehicles
    pub fn new(vehicles: Vec<SimVehicle>, visible_count: usize) -> Self {
        let mut queue = Self {
            vehicles,
            visible: VecDeque::with_capacity(visible_count),
            visible_count,
        };
        while queue.visible.len() < queue.visible_count && queue.promote_next().is_some() {}
        queue
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    pub fn get(&self, id: VehicleId) -> Option<&SimVehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    fn get_mut(&mut self, id: VehicleId) -> Option<&mut SimVehicle> {
        self.vehicles.iter_mut().find(|v| v.id == id)
    }

    /// The only vehicle that accepts passengers
    pub fn front_vehicle(&self) -> Option<&SimVehicle> {
        self.visible.front().and_then(|id| self.get(*id))
    }

    /// Visible vehicles, front first
    pub fn visible_vehicles(&self) -> impl Iterator<Item = &SimVehicle> + '_ {
        self.visible.iter().filter_map(|id| self.get(*id))
    }

    pub fn visible_order(&self) -> Vec<VehicleId> {
        self.visible.iter().copied().collect()
    }

    /// Vehicles still offstage
    pub fn pooled_count(&self) -> usize {
        self.vehicles
            .iter()
            .filter(|v| v.state == VehicleState::Pooled)
            .count()
    }

    /// Vehicles that have not departed yet
    pub fn remaining_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Free seats of a given color across all remaining vehicles
    pub fn seats_for(&self, color: &ColorKey) -> usize {
        self.vehicles
            .iter()
            .filter(|v| v.accepts_color(color))
            .map(SimVehicle::free_seats)
            .sum()
    }

    /// Seat a passenger on a specific vehicle
    pub fn try_board(&mut self, id: VehicleId, passenger: PassengerId) -> BoardOutcome {
        match self.get_mut(id) {
            Some(vehicle) => vehicle.try_board(passenger),
            None => BoardOutcome::Rejected,
        }
    }

    /// Walk the waiting line front to back and board every passenger whose
    /// color matches the front vehicle, stopping once it is full. Compacts
    /// the line if anyone boarded.
    pub fn process_boarding<F>(&mut self, line: &mut WaitingLine, color_of: F) -> BoardingReport
    where
        F: Fn(PassengerId) -> Option<ColorKey>,
    {
        let mut report = BoardingReport::default();

        let Some(front_id) = self.visible.front().copied() else {
            return report;
        };

        let waiting: Vec<(usize, PassengerId)> = line.occupied().collect();
        for (slot, passenger) in waiting {
            let Some(front) = self.get_mut(front_id) else {
                break;
            };
            if front.state != VehicleState::Visible || front.is_full() {
                break;
            }
            let Some(color) = color_of(passenger) else {
                continue;
            };
            if !front.accepts_color(&color) {
                continue;
            }

            match front.try_board(passenger) {
                BoardOutcome::Rejected => break,
                outcome => {
                    line.remove_at(slot);
                    report.boarded.push((front_id, passenger, slot));
                    debug!("Passenger {:?} boarded vehicle {:?}", passenger.0, front_id.0);
                    if outcome == BoardOutcome::Filled {
                        report.filled = Some(front_id);
                        break;
                    }
                }
            }
        }

        if !report.is_empty() {
            report.shifts = line.compact();
        }

        report
    }

    /// Mark a full vehicle as driving off. Returns false if it was not
    /// visible.
    pub fn begin_departure(&mut self, id: VehicleId) -> bool {
        match self.get_mut(id) {
            Some(vehicle) if vehicle.state == VehicleState::Visible => {
                vehicle.state = VehicleState::Departing;
                true
            }
            _ => false,
        }
    }

    /// The vehicle finished driving off: drop it, bring the next pooled
    /// vehicle in at the tail and reflow the queue. Unknown or non-departing
    /// vehicles are ignored.
    pub fn complete_departure(&mut self, id: VehicleId) -> Option<DepartureReport> {
        let index = self
            .vehicles
            .iter()
            .position(|v| v.id == id && v.state == VehicleState::Departing)?;

        self.vehicles.remove(index);
        self.visible.retain(|visible_id| *visible_id != id);

        let promoted = if self.visible.len() < self.visible_count {
            self.promote_next()
        } else {
            None
        };

        Some(DepartureReport {
            departed: id,
            promoted,
            order: self.visible_order(),
        })
    }

    /// Move the first pooled vehicle to the tail of the visible queue
    fn promote_next(&mut self) -> Option<VehicleId> {
        let vehicle = self
            .vehicles
            .iter_mut()
            .find(|v| v.state == VehicleState::Pooled)?;
        vehicle.state = VehicleState::Visible;
        self.visible.push_back(vehicle.id);
        Some(vehicle.id)
    }
}
