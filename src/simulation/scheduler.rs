//! One-shot timers for delayed simulation actions
//!
//! Timers are ordered by fire time, then by the order they were scheduled.
//! Each fires exactly once; cancelled timers never fire.

use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, HashMap};

use super::game_state::GamePhase;
use super::types::{PipeId, TimerId, VehicleId};

/// Something the session should do when a timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledAction {
    /// Show the pipe's next passenger
    ReleasePipe(PipeId),
    /// A full vehicle has finished driving away
    VehicleDeparted(VehicleId),
    /// Time to show the win/lose screen
    ShowOutcome(GamePhase),
}

type TimerKey = (OrderedFloat<f32>, u64);

#[derive(Debug, Default)]
pub struct Scheduler {
    now: f32,
    next_seq: u64,
    queue: BTreeMap<TimerKey, (TimerId, ScheduledAction)>,
    keys: HashMap<TimerId, TimerKey>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulation time the scheduler has advanced to
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Number of timers that have not fired or been cancelled
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn schedule(&mut self, delay_secs: f32, action: ScheduledAction) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = TimerId(seq);
        let key = (OrderedFloat(self.now + delay_secs.max(0.0)), seq);
        self.queue.insert(key, (id, action));
        self.keys.insert(id, key);
        id
    }

    /// Returns false if the timer already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.keys.remove(&id) {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    /// Move time forward and collect every action that is now due, in
    /// firing order
    pub fn advance(&mut self, delta_secs: f32) -> Vec<ScheduledAction> {
        self.now += delta_secs.max(0.0);

        let mut due = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            if entry.key().0 > OrderedFloat(self.now) {
                break;
            }
            let (id, action) = entry.remove();
            self.keys.remove(&id);
            due.push(action);
        }
        due
    }
}
