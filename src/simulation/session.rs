//! Level session that ties everything together
//!
//! A `Session` owns one running level: the grid, the passengers, the pipes,
//! the waiting line, the vehicle queue and the clock. Every input (click,
//! tick, animation signal) is processed to completion before it returns.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::events::SessionEvent;
use super::game_state::{format_countdown, GamePhase, GameState, LossReason};
use super::grid::GridModel;
use super::level::{LevelDefinition, LevelError, LevelReport};
use super::passenger::{Passenger, PassengerLocation};
use super::pathfinding::find_path;
use super::pipe::PipeDispenser;
use super::scheduler::{ScheduledAction, Scheduler};
use super::types::{
    CellType, GridCoord, PassengerId, PipeId, SimId, TimerId, VehicleId, OUTCOME_SCREEN_DELAY,
    PIPE_RELEASE_DELAY, VEHICLE_DEPARTURE_TIME, WAITING_LINE_CAPACITY,
};
use super::vehicle::SimVehicle;
use super::vehicle_queue::VehicleQueue;
use super::waiting_line::WaitingLine;

/// Why a click did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    GameOver,
    UnknownPassenger,
    NotInteractable,
    Moving,
    OffGrid,
    Unreachable,
}

/// Result of clicking a passenger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Passenger moved to this waiting slot
    Accepted { slot: usize },
    /// The waiting line was full; the level is lost
    Lost,
    Ignored(IgnoreReason),
}

/// One running level
pub struct Session {
    level_name: String,

    grid: GridModel,

    /// All passengers ever created, boarded ones included
    passengers: BTreeMap<PassengerId, Passenger>,

    pipes: BTreeMap<PipeId, PipeDispenser>,

    waiting_line: WaitingLine,

    vehicles: VehicleQueue,

    scheduler: Scheduler,

    /// Pending pipe release timers, cancelled when the level ends
    release_timers: BTreeMap<PipeId, TimerId>,

    game_state: GameState,

    /// Findings from level validation
    report: LevelReport,

    /// Queued output for the presentation layer
    events: Vec<SessionEvent>,

    /// Last countdown value reported to the presentation layer
    last_countdown_display: u32,

    /// Next ID to assign
    next_id: usize,

    /// Simulation time
    time: f32,
}

impl Session {
    /// Build a session from a level; vehicle order is shuffled with an
    /// unseeded RNG when the level does not list vehicle colors
    pub fn from_level(level: &LevelDefinition) -> Result<Self, LevelError> {
        Self::build(level, &mut rand::rng())
    }

    /// Build a session with a seeded RNG for reproducible vehicle order
    pub fn from_level_with_seed(level: &LevelDefinition, seed: u64) -> Result<Self, LevelError> {
        Self::build(level, &mut StdRng::seed_from_u64(seed))
    }

    fn build<R: Rng + ?Sized>(level: &LevelDefinition, rng: &mut R) -> Result<Self, LevelError> {
        let report = level.validate()?;

        for coord in &report.stranded {
            warn!("Passenger at {} can never reach the front row", coord);
        }
        for shortfall in &report.seat_shortfalls {
            warn!(
                "Only {} seats for {} {} passengers",
                shortfall.seats, shortfall.passengers, shortfall.color
            );
        }
        for color in &report.uneven_colors {
            warn!(
                "{} passengers do not fill whole vehicles of capacity {}",
                color, level.vehicles.capacity
            );
        }

        let game_state = GameState::new(level.countdown_secs);
        let last_countdown_display = game_state.display_seconds();

        let mut session = Self {
            level_name: level.name.clone(),
            grid: level.build_grid(),
            passengers: BTreeMap::new(),
            pipes: BTreeMap::new(),
            waiting_line: WaitingLine::new(WAITING_LINE_CAPACITY),
            vehicles: VehicleQueue::new(Vec::new(), level.vehicles.visible_count),
            scheduler: Scheduler::new(),
            release_timers: BTreeMap::new(),
            game_state,
            report,
            events: Vec::new(),
            last_countdown_display,
            next_id: 0,
            time: 0.0,
        };

        session.spawn_grid_passengers(level);
        session.spawn_pipes(level);

        let vehicles: Vec<SimVehicle> = level
            .vehicle_colors(rng)
            .into_iter()
            .map(|color| {
                let id = VehicleId(session.next_sim_id());
                SimVehicle::new(id, color, level.vehicles.capacity)
            })
            .collect();
        session.vehicles = VehicleQueue::new(vehicles, level.vehicles.visible_count);
        session.events.push(SessionEvent::VehicleQueueChanged {
            order: session.vehicles.visible_order(),
        });

        session.recompute_reachability();

        info!(
            "Loaded level '{}' ({}x{}): {} passengers, {} pipes, {} vehicles",
            session.level_name,
            session.grid.width(),
            session.grid.height(),
            session.passengers.len(),
            session.pipes.len(),
            session.vehicles.remaining_count()
        );

        Ok(session)
    }

    fn next_sim_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }

    fn spawn_grid_passengers(&mut self, level: &LevelDefinition) {
        let cells: Vec<GridCoord> = level.passenger_cells().collect();
        for coord in cells {
            let id = PassengerId(self.next_sim_id());
            let mut passenger =
                Passenger::new(id, level.get_cell_color(coord), PassengerLocation::Grid(coord));
            if level.get_cell(coord) == CellType::HiddenColorPassenger {
                passenger = passenger.hidden();
            }
            if self.grid.set_occupant(coord, id) {
                self.passengers.insert(id, passenger);
            } else {
                warn!("Cell {} is already occupied, skipping passenger", coord);
            }
        }
    }

    fn spawn_pipes(&mut self, level: &LevelDefinition) {
        for config in &level.pipes {
            let pipe_id = PipeId(self.next_sim_id());
            let mut pool = Vec::with_capacity(config.pool_size);

            for color in config.colors.iter().take(config.pool_size) {
                let id = PassengerId(self.next_sim_id());
                let mut passenger =
                    Passenger::new(id, color.clone(), PassengerLocation::PipePool(pipe_id));
                passenger.interactable = false;
                passenger.origin_pipe = Some(pipe_id);
                self.passengers.insert(id, passenger);
                pool.push(id);
            }

            let pipe = PipeDispenser::new(pipe_id, config.coord(), config.orientation, pool);
            self.pipes.insert(pipe_id, pipe);
            self.dispense_front(pipe_id);
        }
    }

    /// Put the pipe's front passenger on its output cell
    fn dispense_front(&mut self, pipe_id: PipeId) -> bool {
        let Some(pipe) = self.pipes.get(&pipe_id) else {
            return false;
        };
        let output = pipe.output_cell();
        let Some(passenger_id) = pipe.front() else {
            return false;
        };

        if !self.grid.set_occupant(output, passenger_id) {
            warn!(
                "Pipe {:?} cannot dispense: {} is blocked",
                pipe_id.0, output
            );
            return false;
        }

        let interactable = !self.game_state.is_over();
        if let Some(passenger) = self.passengers.get_mut(&passenger_id) {
            passenger.location = PassengerLocation::Grid(output);
            passenger.interactable = interactable;
        }

        debug!("Pipe {:?} dispensed passenger {:?} at {}", pipe_id.0, passenger_id.0, output);
        self.events.push(SessionEvent::PassengerDispensed {
            pipe: pipe_id,
            passenger: passenger_id,
            coord: output,
        });
        true
    }

    pub fn level_name(&self) -> &str {
        &self.level_name
    }

    pub fn level_report(&self) -> &LevelReport {
        &self.report
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn waiting_line(&self) -> &WaitingLine {
        &self.waiting_line
    }

    pub fn vehicles(&self) -> &VehicleQueue {
        &self.vehicles
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn phase(&self) -> GamePhase {
        self.game_state.phase
    }

    pub fn loss_reason(&self) -> Option<LossReason> {
        self.game_state.loss_reason
    }

    pub fn countdown(&self) -> f32 {
        self.game_state.countdown
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn passenger(&self, id: PassengerId) -> Option<&Passenger> {
        self.passengers.get(&id)
    }

    pub fn passengers(&self) -> impl Iterator<Item = &Passenger> {
        self.passengers.values()
    }

    pub fn pipe(&self, id: PipeId) -> Option<&PipeDispenser> {
        self.pipes.get(&id)
    }

    pub fn pipes(&self) -> impl Iterator<Item = &PipeDispenser> {
        self.pipes.values()
    }

    /// The passenger standing on a cell (if any)
    pub fn passenger_at(&self, coord: GridCoord) -> Option<&Passenger> {
        self.grid
            .occupant(coord)
            .and_then(|id| self.passengers.get(&id))
    }

    /// Passengers not yet boarded: on the grid, in pipes or waiting
    pub fn outstanding_passengers(&self) -> usize {
        self.passengers.values().filter(|p| !p.is_boarded()).count()
    }

    /// Passengers a click would currently be accepted for, in id order
    pub fn clickable_passengers(&self) -> Vec<PassengerId> {
        if self.game_state.is_over() {
            return Vec::new();
        }
        self.passengers
            .values()
            .filter(|p| p.is_clickable())
            .map(|p| p.id)
            .collect()
    }

    /// Take every event queued since the last call
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Paused -> Running
    pub fn start(&mut self) {
        if self.game_state.start() {
            self.events.push(SessionEvent::PhaseChanged {
                phase: GamePhase::Running,
            });
            self.evaluate_game_state();
        }
    }

    /// Handle a click on a passenger
    pub fn click(&mut self, id: PassengerId) -> ClickOutcome {
        if self.game_state.is_over() {
            return ClickOutcome::Ignored(IgnoreReason::GameOver);
        }

        let Some(passenger) = self.passengers.get(&id) else {
            debug!("Click on unknown passenger {:?}", id.0);
            return ClickOutcome::Ignored(IgnoreReason::UnknownPassenger);
        };
        let Some(coord) = passenger.grid_coord() else {
            return ClickOutcome::Ignored(IgnoreReason::OffGrid);
        };
        if !passenger.interactable {
            return ClickOutcome::Ignored(IgnoreReason::NotInteractable);
        }
        if passenger.moving {
            return ClickOutcome::Ignored(IgnoreReason::Moving);
        }
        let reachable = passenger.reachable;
        let origin_pipe = passenger.origin_pipe;

        self.start();

        if !reachable {
            debug!("Passenger {:?} at {} is not reachable", id.0, coord);
            return ClickOutcome::Ignored(IgnoreReason::Unreachable);
        }

        let slot = match self.waiting_line.try_add(id) {
            Ok(slot) => slot,
            Err(err) => {
                info!("Passenger {:?} clicked but {}", id.0, err);
                self.lose(LossReason::WaitingLineFull);
                return ClickOutcome::Lost;
            }
        };

        self.grid.clear_occupant(coord);
        if let Some(passenger) = self.passengers.get_mut(&id) {
            passenger.location = PassengerLocation::WaitingSlot(slot);
            passenger.interactable = false;
            passenger.clear_reachability();
        }
        debug!("Passenger {:?} left {} for waiting slot {}", id.0, coord, slot);
        self.events.push(SessionEvent::MovedToWaitingSlot {
            passenger: id,
            slot,
        });

        if let Some(pipe_id) = origin_pipe {
            self.consume_from_pipe(pipe_id, id);
        }

        self.recompute_reachability();
        self.process_boarding();
        self.evaluate_game_state();

        ClickOutcome::Accepted { slot }
    }

    fn consume_from_pipe(&mut self, pipe_id: PipeId, passenger: PassengerId) {
        let Some(pipe) = self.pipes.get_mut(&pipe_id) else {
            return;
        };
        if !pipe.consume(passenger) {
            return;
        }
        if pipe.front().is_some() && pipe.begin_release() {
            let timer = self
                .scheduler
                .schedule(PIPE_RELEASE_DELAY, ScheduledAction::ReleasePipe(pipe_id));
            self.release_timers.insert(pipe_id, timer);
        }
    }

    /// Signal from the presentation layer that a passenger's movement
    /// animation started or finished
    pub fn set_passenger_moving(&mut self, id: PassengerId, moving: bool) -> bool {
        match self.passengers.get_mut(&id) {
            Some(passenger) => {
                passenger.moving = moving;
                true
            }
            None => false,
        }
    }

    /// Recompute the path of every passenger on the grid
    pub fn recompute_reachability(&mut self) {
        let front_row = self.grid.front_row();
        for passenger in self.passengers.values_mut() {
            let Some(coord) = passenger.grid_coord() else {
                continue;
            };
            let path = find_path(&self.grid, coord, front_row);
            let (changed, revealed) = passenger.apply_path(path);
            if changed {
                self.events.push(SessionEvent::ReachabilityChanged {
                    passenger: passenger.id,
                    reachable: passenger.reachable,
                    path: passenger.path.clone(),
                });
            }
            if revealed {
                self.events.push(SessionEvent::ColorRevealed {
                    passenger: passenger.id,
                    color: passenger.color.clone(),
                });
            }
        }
    }

    /// Board waiting passengers onto the front vehicle
    pub fn process_boarding(&mut self) {
        if self.game_state.is_over() {
            return;
        }

        let passengers = &self.passengers;
        let report = self
            .vehicles
            .process_boarding(&mut self.waiting_line, |id| {
                passengers.get(&id).map(|p| p.color.clone())
            });

        for (vehicle, passenger_id, _) in &report.boarded {
            if let Some(passenger) = self.passengers.get_mut(passenger_id) {
                passenger.location = PassengerLocation::Boarded(*vehicle);
            }
            self.game_state.record_boarding();
            self.events.push(SessionEvent::PassengerBoarded {
                vehicle: *vehicle,
                passenger: *passenger_id,
            });
        }

        for shift in &report.shifts {
            if let Some(passenger) = self.passengers.get_mut(&shift.passenger) {
                passenger.location = PassengerLocation::WaitingSlot(shift.to);
            }
            self.events.push(SessionEvent::WaitingSlotShifted {
                passenger: shift.passenger,
                from: shift.from,
                to: shift.to,
            });
        }

        if let Some(vehicle) = report.filled {
            debug!("Vehicle {:?} is full", vehicle.0);
            self.events.push(SessionEvent::VehicleFull { vehicle });
            if self.vehicles.begin_departure(vehicle) {
                self.scheduler.schedule(
                    VEHICLE_DEPARTURE_TIME,
                    ScheduledAction::VehicleDeparted(vehicle),
                );
            }
        }
    }

    /// A departing vehicle is gone. Safe to call more than once; later
    /// calls and unknown vehicles are ignored.
    pub fn notify_vehicle_departed(&mut self, id: VehicleId) -> bool {
        let Some(report) = self.vehicles.complete_departure(id) else {
            debug!("Ignoring departure of vehicle {:?}", id.0);
            return false;
        };

        self.game_state.record_departure();
        debug!(
            "Vehicle {:?} departed, promoted {:?}",
            report.departed.0,
            report.promoted.map(|v| v.0)
        );
        self.events.push(SessionEvent::VehicleDeparted { vehicle: id });
        self.events
            .push(SessionEvent::VehicleQueueChanged { order: report.order });

        self.process_boarding();
        self.evaluate_game_state();
        true
    }

    /// Advance the clock: run the countdown, then fire due timers
    pub fn tick(&mut self, delta_secs: f32) {
        // Time never runs backwards
        let delta_secs = delta_secs.max(0.0);
        self.time += delta_secs;

        if self.game_state.update(delta_secs) {
            if self.outstanding_passengers() > 0 {
                self.lose(LossReason::TimeUp);
            } else {
                self.win();
            }
        }

        let display = self.game_state.display_seconds();
        if display != self.last_countdown_display {
            self.last_countdown_display = display;
            self.events
                .push(SessionEvent::CountdownChanged { seconds: display });
        }

        for action in self.scheduler.advance(delta_secs) {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: ScheduledAction) {
        match action {
            ScheduledAction::ReleasePipe(pipe_id) => {
                self.release_timers.remove(&pipe_id);
                let Some(pipe) = self.pipes.get_mut(&pipe_id) else {
                    debug!("Release for missing pipe {:?}", pipe_id.0);
                    return;
                };
                pipe.finish_release();
                if self.game_state.is_over() {
                    return;
                }
                if self.dispense_front(pipe_id) {
                    self.recompute_reachability();
                }
            }
            ScheduledAction::VehicleDeparted(vehicle) => {
                self.notify_vehicle_departed(vehicle);
            }
            ScheduledAction::ShowOutcome(phase) => {
                self.events.push(SessionEvent::OutcomeScreenDue { phase });
            }
        }
    }

    /// Win once nothing is left to board
    fn evaluate_game_state(&mut self) {
        if self.game_state.is_running() && self.outstanding_passengers() == 0 {
            self.win();
        }
    }

    fn win(&mut self) {
        if self.game_state.win() {
            self.cancel_pipe_releases();
            self.events.push(SessionEvent::PhaseChanged {
                phase: GamePhase::Won,
            });
            self.scheduler.schedule(
                OUTCOME_SCREEN_DELAY,
                ScheduledAction::ShowOutcome(GamePhase::Won),
            );
        }
    }

    fn lose(&mut self, reason: LossReason) {
        if !self.game_state.lose(reason) {
            return;
        }
        for passenger in self.passengers.values_mut() {
            passenger.interactable = false;
        }
        self.cancel_pipe_releases();
        self.events.push(SessionEvent::PhaseChanged {
            phase: GamePhase::Lost,
        });
        self.events.push(SessionEvent::InteractionRevoked);
        self.scheduler.schedule(
            OUTCOME_SCREEN_DELAY,
            ScheduledAction::ShowOutcome(GamePhase::Lost),
        );
    }

    /// Drop every pending pipe release; nothing is dispensed once the
    /// level is over
    fn cancel_pipe_releases(&mut self) {
        for (pipe_id, timer) in std::mem::take(&mut self.release_timers) {
            if self.scheduler.cancel(timer) {
                debug!("Cancelled release of pipe {:?}", pipe_id.0);
            }
            if let Some(pipe) = self.pipes.get_mut(&pipe_id) {
                pipe.cancel_release();
            }
        }
    }

    /// Print a summary of the session state
    pub fn print_summary(&self) {
        println!("=== Bus Jam Summary ===");
        println!("Level: {}", self.level_name);
        println!("Time: {:.2}s", self.time);
        println!("{}", self.game_state.summary());
        println!(
            "Outstanding passengers: {} (clickable: {})",
            self.outstanding_passengers(),
            self.clickable_passengers().len()
        );
        println!(
            "Waiting line: {}/{}",
            self.waiting_line.len(),
            self.waiting_line.capacity()
        );

        println!("--- Pipes ---");
        for pipe in self.pipes.values() {
            println!(
                "  Pipe {:?} at {}: remaining={}/{}, release={}",
                pipe.id.0,
                pipe.coord,
                pipe.remaining(),
                pipe.pool_size(),
                if pipe.is_release_pending() {
                    "pending"
                } else {
                    "idle"
                }
            );
        }

        println!("--- Vehicles ---");
        for vehicle in self.vehicles.visible_vehicles() {
            println!(
                "  Vehicle {:?}: color={}, seats={}/{}, state={:?}",
                vehicle.id.0,
                vehicle.color,
                vehicle.occupancy(),
                vehicle.capacity,
                vehicle.state
            );
        }
        println!("  Pooled: {}", self.vehicles.pooled_count());
    }

    /// Render the board, waiting line and vehicle queue as text.
    /// The front row is printed first.
    pub fn map_string(&self) -> String {
        let mut out = String::new();

        for y in (0..self.grid.height() as i32).rev() {
            for x in 0..self.grid.width() as i32 {
                let coord = GridCoord::new(x, y);
                let glyph = match self.passenger_at(coord) {
                    Some(passenger) => match passenger.visible_color() {
                        None => '?',
                        Some(color) if passenger.reachable => color.glyph().to_ascii_uppercase(),
                        Some(color) => color.glyph().to_ascii_lowercase(),
                    },
                    None => match self.grid.get_cell(coord) {
                        CellType::Obstacle => '#',
                        CellType::Pipe => '=',
                        _ => '.',
                    },
                };
                out.push(glyph);
            }
            out.push('\n');
        }

        out.push_str("Waiting: ");
        for slot in self.waiting_line.slots() {
            let glyph = slot
                .and_then(|id| self.passengers.get(&id))
                .map(|p| p.color.glyph().to_ascii_uppercase())
                .unwrap_or(' ');
            let _ = write!(out, "[{}]", glyph);
        }
        out.push('\n');

        out.push_str("Vehicles: ");
        let queue: Vec<String> = self
            .vehicles
            .visible_vehicles()
            .map(|v| format!("{} {}/{}", v.color, v.occupancy(), v.capacity))
            .collect();
        let _ = write!(
            out,
            "{} (+{} pooled)",
            queue.join(" | "),
            self.vehicles.pooled_count()
        );
        out.push('\n');
        let _ = writeln!(out, "Countdown: {}", format_countdown(self.countdown()));

        out
    }

    /// Draw a visual map of the session in the terminal
    pub fn draw_map(&self) {
        println!("\n=== Board (front row on top) ===");
        println!("Legend: UPPER=reachable, lower=blocked, ?=hidden, #=obstacle, ==pipe");
        println!();
        print!("{}", self.map_string());
        println!();
    }
}
