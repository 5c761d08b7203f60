//! Game state and scheduler tests
//!
//! Validates the countdown, the win/lose transitions and timer ordering.

use bus_jam::simulation::{
    format_countdown, GamePhase, GameState, LossReason, PipeId, ScheduledAction, Scheduler,
    SimId, VehicleId, DEFAULT_COUNTDOWN,
};

#[test]
fn test_game_state_initialization() {
    let state = GameState::default();
    assert_eq!(state.phase, GamePhase::Paused);
    assert_eq!(state.countdown, DEFAULT_COUNTDOWN);
    assert_eq!(state.passengers_boarded, 0);
    assert_eq!(state.vehicles_departed, 0);
    assert!(state.loss_reason.is_none());
    assert!(!state.is_running());
    assert!(!state.is_over());
}

#[test]
fn test_countdown_frozen_until_started() {
    let mut state = GameState::new(10.0);
    assert!(!state.update(3.0));
    assert_eq!(state.countdown, 10.0);

    assert!(state.start());
    assert!(!state.start(), "start only fires once");
    assert!(!state.update(3.0));
    assert_eq!(state.countdown, 7.0);
    assert_eq!(state.elapsed, 3.0);
}

#[test]
fn test_countdown_reaches_zero_once() {
    let mut state = GameState::new(2.0);
    state.start();

    assert!(!state.update(1.5));
    assert!(state.update(1.0), "crossing zero is reported");
    assert_eq!(state.countdown, 0.0);
    assert!(!state.update(1.0), "but only once");
}

#[test]
fn test_terminal_transitions_happen_once() {
    let mut state = GameState::new(30.0);
    state.start();

    assert!(state.win());
    assert_eq!(state.phase, GamePhase::Won);
    assert!(!state.win());
    assert!(!state.lose(LossReason::TimeUp), "a won game cannot be lost");
    assert_eq!(state.phase, GamePhase::Won);
    assert!(state.loss_reason.is_none());

    let mut state = GameState::new(30.0);
    assert!(state.lose(LossReason::WaitingLineFull));
    assert!(!state.lose(LossReason::TimeUp));
    assert_eq!(state.loss_reason, Some(LossReason::WaitingLineFull));
    assert!(state.is_over());
}

#[test]
fn test_countdown_display() {
    let mut state = GameState::new(61.5);
    assert_eq!(state.display_seconds(), 62);
    state.start();
    state.update(0.25);
    assert_eq!(state.display_seconds(), 62);
    state.update(0.5);
    assert_eq!(state.display_seconds(), 61);

    assert_eq!(format_countdown(90.0), "01:30");
    assert_eq!(format_countdown(5.9), "00:05");
    assert_eq!(format_countdown(-3.0), "00:00");
}

#[test]
fn test_summary_mentions_phase_and_progress() {
    let mut state = GameState::new(45.0);
    state.record_boarding();
    state.record_boarding();
    state.record_departure();

    let summary = state.summary();
    assert!(summary.contains("Paused"), "{}", summary);
    assert!(summary.contains("Boarded: 2"), "{}", summary);
    assert!(summary.contains("Vehicles departed: 1"), "{}", summary);
}

fn pipe(n: usize) -> ScheduledAction {
    ScheduledAction::ReleasePipe(PipeId(SimId(n)))
}

#[test]
fn test_scheduler_fires_in_time_order() {
    let mut scheduler = Scheduler::new();
    scheduler.schedule(1.0, pipe(1));
    scheduler.schedule(0.25, pipe(2));
    scheduler.schedule(0.5, ScheduledAction::VehicleDeparted(VehicleId(SimId(3))));
    assert_eq!(scheduler.pending(), 3);

    assert!(scheduler.advance(0.1).is_empty());
    assert_eq!(
        scheduler.advance(0.5),
        vec![
            pipe(2),
            ScheduledAction::VehicleDeparted(VehicleId(SimId(3)))
        ]
    );
    assert_eq!(scheduler.advance(1.0), vec![pipe(1)]);
    assert!(scheduler.advance(10.0).is_empty(), "timers fire exactly once");
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn test_scheduler_ties_are_fifo() {
    let mut scheduler = Scheduler::new();
    scheduler.schedule(0.5, pipe(1));
    scheduler.schedule(0.5, ScheduledAction::ShowOutcome(GamePhase::Won));
    scheduler.schedule(0.5, pipe(2));

    assert_eq!(
        scheduler.advance(0.5),
        vec![pipe(1), ScheduledAction::ShowOutcome(GamePhase::Won), pipe(2)]
    );
}

#[test]
fn test_scheduler_delay_is_relative_to_now() {
    let mut scheduler = Scheduler::new();
    scheduler.advance(2.0);
    assert_eq!(scheduler.now(), 2.0);

    scheduler.schedule(1.0, pipe(1));
    assert!(scheduler.advance(0.5).is_empty());
    assert_eq!(scheduler.advance(0.5), vec![pipe(1)]);
}

#[test]
fn test_cancelled_timer_never_fires() {
    let mut scheduler = Scheduler::new();
    let keep = scheduler.schedule(0.2, pipe(1));
    let dropped = scheduler.schedule(0.1, pipe(2));

    assert!(scheduler.cancel(dropped));
    assert!(!scheduler.cancel(dropped));
    assert_eq!(scheduler.advance(1.0), vec![pipe(1)]);
    assert!(!scheduler.cancel(keep), "already fired");
}
