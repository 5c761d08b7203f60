//! Pipe dispenser logic for the bus jam simulation
//!
//! A pipe owns an ordered pool of passengers and shows them one at a time on
//! the cell it faces. Only the front passenger is ever on the grid.

use super::types::{GridCoord, Orientation, PassengerId, PipeId};

/// A pipe and its pool of pending passengers
#[derive(Debug, Clone)]
pub struct PipeDispenser {
    pub id: PipeId,
    pub coord: GridCoord,
    pub orientation: Orientation,
    /// Pool slots in dispense order; `None` once consumed
    pool: Vec<Option<PassengerId>>,
    /// Lowest slot that has not been consumed
    front_index: usize,
    /// A delayed release is scheduled and has not fired yet
    release_pending: bool,
}

impl PipeDispenser {
    pub fn new(
        id: PipeId,
        coord: GridCoord,
        orientation: Orientation,
        pool: Vec<PassengerId>,
    ) -> Self {
        Self {
            id,
            coord,
            orientation,
            pool: pool.into_iter().map(Some).collect(),
            front_index: 0,
            release_pending: false,
        }
    }

    /// The cell dispensed passengers stand on
    pub fn output_cell(&self) -> GridCoord {
        let (dx, dy) = self.orientation.offset();
        self.coord.offset(dx, dy)
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn front_index(&self) -> usize {
        self.front_index
    }

    /// The passenger at the front of the pool (if any remain)
    pub fn front(&self) -> Option<PassengerId> {
        self.pool.get(self.front_index).copied().flatten()
    }

    /// Passengers not yet consumed, including the front one
    pub fn remaining(&self) -> usize {
        self.pool.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn contains(&self, passenger: PassengerId) -> bool {
        self.pool.contains(&Some(passenger))
    }

    pub fn is_release_pending(&self) -> bool {
        self.release_pending
    }

    /// Mark a passenger consumed and advance the front past empty slots.
    /// Returns false if the passenger is not in this pool.
    pub fn consume(&mut self, passenger: PassengerId) -> bool {
        let Some(slot) = self.pool.iter().position(|p| *p == Some(passenger)) else {
            return false;
        };
        self.pool[slot] = None;
        while self.front_index < self.pool.len() && self.pool[self.front_index].is_none() {
            self.front_index += 1;
        }
        true
    }

    /// Claim the single pending-release slot. Returns false when a release
    /// is already scheduled.
    pub fn begin_release(&mut self) -> bool {
        if self.release_pending {
            return false;
        }
        self.release_pending = true;
        true
    }

    /// Give up a scheduled release without showing anyone
    pub fn cancel_release(&mut self) {
        self.release_pending = false;
    }

    /// The delayed release fired; returns the passenger to show next
    pub fn finish_release(&mut self) -> Option<PassengerId> {
        self.release_pending = false;
        self.front()
    }
}
