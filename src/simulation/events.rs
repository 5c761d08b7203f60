//! Events emitted by a session for the presentation layer
//!
//! The session never talks to a renderer directly. It queues these and the
//! caller drains them after each input.

use super::game_state::GamePhase;
use super::types::{ColorKey, GridCoord, PassengerId, PipeId, VehicleId};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A passenger on the grid became reachable or unreachable
    ReachabilityChanged {
        passenger: PassengerId,
        reachable: bool,
        path: Option<Vec<GridCoord>>,
    },
    /// A hidden passenger showed its color
    ColorRevealed {
        passenger: PassengerId,
        color: ColorKey,
    },
    /// A pipe put its next passenger on the grid
    PassengerDispensed {
        pipe: PipeId,
        passenger: PassengerId,
        coord: GridCoord,
    },
    /// A clicked passenger left the grid for a waiting slot
    MovedToWaitingSlot { passenger: PassengerId, slot: usize },
    /// Compaction moved a waiting passenger
    WaitingSlotShifted {
        passenger: PassengerId,
        from: usize,
        to: usize,
    },
    PassengerBoarded {
        vehicle: VehicleId,
        passenger: PassengerId,
    },
    VehicleFull { vehicle: VehicleId },
    VehicleDeparted { vehicle: VehicleId },
    /// New visible queue order, front first
    VehicleQueueChanged { order: Vec<VehicleId> },
    PhaseChanged { phase: GamePhase },
    /// Whole seconds left on the countdown
    CountdownChanged { seconds: u32 },
    /// Every passenger stopped accepting clicks
    InteractionRevoked,
    /// The win/lose screen delay elapsed
    OutcomeScreenDue { phase: GamePhase },
}
