//! Standalone bus jam simulation module
//!
//! This module contains all the puzzle logic: grid reachability, pipes, the
//! waiting line, vehicle boarding and the countdown. It runs without any
//! renderer and can be tested from the console.

mod autoplay;
mod events;
mod game_state;
mod grid;
mod grid_graph;
mod level;
mod passenger;
mod pathfinding;
mod pipe;
mod priority_queue;
mod scheduler;
mod session;
mod types;
mod vehicle;
mod vehicle_queue;
mod waiting_line;

// Re-export public types for external use
pub use autoplay::Autoplayer;
pub use events::SessionEvent;
pub use game_state::{format_countdown, GamePhase, GameState, LossReason};
pub use grid::{remap_row_major, GridCell, GridModel};
pub use grid_graph::GridGraph;
pub use level::{
    LevelDefinition, LevelError, LevelReport, PipeConfig, SeatShortfall, VehicleConfig,
};
pub use passenger::{Passenger, PassengerLocation};
pub use pathfinding::{find_path, row_heuristic};
pub use pipe::PipeDispenser;
pub use priority_queue::PriorityQueue;
pub use scheduler::{ScheduledAction, Scheduler};
pub use session::{ClickOutcome, IgnoreReason, Session};
pub use types::{
    CellType, ColorKey, GridCoord, Orientation, PassengerId, PipeId, SimId, TimerId, VehicleId,
    DEFAULT_CELL_SIZE, DEFAULT_COUNTDOWN, DEFAULT_VEHICLE_CAPACITY, DEFAULT_VISIBLE_VEHICLES,
    NEIGHBOR_OFFSETS, NEUTRAL_COLOR, OUTCOME_SCREEN_DELAY, PIPE_RELEASE_DELAY,
    VEHICLE_DEPARTURE_TIME, WAITING_LINE_CAPACITY,
};
pub use vehicle::{BoardOutcome, SimVehicle, VehicleState};
pub use vehicle_queue::{BoardingReport, DepartureReport, VehicleQueue};
pub use waiting_line::{CapacityExceeded, SlotShift, WaitingLine};
