//! Game state tracking for the bus jam puzzle
//!
//! This module tracks the countdown, the phase of the level and how many
//! passengers have boarded, and decides when the level is won or lost.

use log::info;

use super::types::DEFAULT_COUNTDOWN;

/// Phase of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    /// Waiting for the first player action; the countdown is frozen
    Paused,
    /// Countdown active, clicks accepted
    Running,
    /// Every passenger boarded
    Won,
    /// Time ran out or the waiting line overflowed
    Lost,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::Won | GamePhase::Lost)
    }
}

/// Why a level was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossReason {
    TimeUp,
    WaitingLineFull,
}

/// Game state that tracks player progress and the countdown
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: GamePhase,

    /// Seconds left on the countdown
    pub countdown: f32,

    /// Seconds spent in the Running phase
    pub elapsed: f32,

    /// Total passengers that boarded a vehicle
    pub passengers_boarded: usize,

    /// Total vehicles that filled up and left
    pub vehicles_departed: usize,

    /// Set when the level is lost
    pub loss_reason: Option<LossReason>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN)
    }
}

impl GameState {
    /// Create a new game state with the level's countdown
    pub fn new(countdown_secs: f32) -> Self {
        Self {
            phase: GamePhase::Paused,
            countdown: countdown_secs.max(0.0),
            elapsed: 0.0,
            passengers_boarded: 0,
            vehicles_departed: 0,
            loss_reason: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Paused -> Running. Returns true if the phase changed.
    pub fn start(&mut self) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        self.phase = GamePhase::Running;
        info!("Level started with {:.1}s on the clock", self.countdown);
        true
    }

    /// Record a passenger boarding
    pub fn record_boarding(&mut self) {
        self.passengers_boarded += 1;
    }

    /// Record a vehicle leaving
    pub fn record_departure(&mut self) {
        self.vehicles_departed += 1;
    }

    /// Run the countdown. Returns true when it reached zero during this call.
    pub fn update(&mut self, delta_secs: f32) -> bool {
        if !self.is_running() {
            return false;
        }
        let delta_secs = delta_secs.max(0.0);
        self.elapsed += delta_secs;
        if self.countdown <= 0.0 {
            return false;
        }
        self.countdown = (self.countdown - delta_secs).max(0.0);
        self.countdown <= 0.0
    }

    /// Whole seconds left, as shown on the countdown display
    pub fn display_seconds(&self) -> u32 {
        self.countdown.ceil() as u32
    }

    /// Enter Won. Only the first terminal transition counts.
    pub fn win(&mut self) -> bool {
        if self.is_over() {
            return false;
        }
        self.phase = GamePhase::Won;
        info!(
            "Level won: {} passengers boarded, {:.1}s left",
            self.passengers_boarded, self.countdown
        );
        true
    }

    /// Enter Lost. Only the first terminal transition counts.
    pub fn lose(&mut self, reason: LossReason) -> bool {
        if self.is_over() {
            return false;
        }
        self.phase = GamePhase::Lost;
        self.loss_reason = Some(reason);
        info!("Level lost: {:?}", reason);
        true
    }

    /// Get a summary string for display
    pub fn summary(&self) -> String {
        format!(
            "Phase: {:?} | Countdown: {} | Boarded: {} | Vehicles departed: {}",
            self.phase,
            format_countdown(self.countdown),
            self.passengers_boarded,
            self.vehicles_departed
        )
    }
}

/// Format seconds as mm:ss
pub fn format_countdown(secs: f32) -> String {
    let total = secs.max(0.0).floor() as u32;
    format!("{:02}:{:02}", total / 60, total % 60)
}
