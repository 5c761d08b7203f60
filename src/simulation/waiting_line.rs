//! Waiting line between the grid and the vehicles
//!
//! A fixed number of slots. Removing a passenger from the middle leaves a
//! gap until `compact` packs everyone to the left again.

use thiserror::Error;

use super::types::PassengerId;

/// Every slot of the waiting line is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("waiting line is full ({capacity} slots)")]
pub struct CapacityExceeded {
    pub capacity: usize,
}

/// A passenger that moved to a new slot during compaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotShift {
    pub passenger: PassengerId,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingLine {
    slots: Vec<Option<PassengerId>>,
}

impl WaitingLine {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn get(&self, slot: usize) -> Option<PassengerId> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn slots(&self) -> &[Option<PassengerId>] {
        &self.slots
    }

    pub fn slot_of(&self, passenger: PassengerId) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == Some(passenger))
    }

    /// Occupied slots front to back
    pub fn occupied(&self) -> impl Iterator<Item = (usize, PassengerId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, passenger)| passenger.map(|p| (slot, p)))
    }

    /// Put a passenger in the first empty slot
    pub fn try_add(&mut self, passenger: PassengerId) -> Result<usize, CapacityExceeded> {
        let capacity = self.capacity();
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(CapacityExceeded { capacity })?;
        self.slots[slot] = Some(passenger);
        Ok(slot)
    }

    /// Empty a slot and return whoever was in it
    pub fn remove_at(&mut self, slot: usize) -> Option<PassengerId> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    /// Left-pack the occupied slots, keeping their relative order.
    /// Returns the passengers that changed slot.
    pub fn compact(&mut self) -> Vec<SlotShift> {
        let occupants: Vec<(usize, PassengerId)> = self.occupied().collect();
        self.slots.iter_mut().for_each(|slot| *slot = None);

        let mut shifts = Vec::new();
        for (to, (from, passenger)) in occupants.into_iter().enumerate() {
            self.slots[to] = Some(passenger);
            if from != to {
                shifts.push(SlotShift {
                    passenger,
                    from,
                    to,
                });
            }
        }
        shifts
    }
}
