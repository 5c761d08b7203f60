//! End-to-end session tests
//!
//! These drive a level through clicks and ticks the way a renderer would and
//! check the resulting state and events.

use bus_jam::simulation::{
    Autoplayer, CellType, ClickOutcome, ColorKey, GamePhase, GridCoord, IgnoreReason,
    LevelDefinition, LossReason, Orientation, PassengerId, PassengerLocation, PipeConfig,
    Session, SessionEvent, OUTCOME_SCREEN_DELAY, VEHICLE_DEPARTURE_TIME,
};

fn passenger(level: &mut LevelDefinition, x: i32, y: i32, color: &str) {
    let coord = GridCoord::new(x, y);
    level.set_cell(coord, CellType::ColorPassenger);
    level.set_cell_color(coord, ColorKey::new(color));
}

fn vehicles(level: &mut LevelDefinition, colors: &[&str], capacity: usize, visible: usize) {
    level.vehicles.colors = colors.iter().map(|c| ColorKey::new(*c)).collect();
    level.vehicles.capacity = capacity;
    level.vehicles.visible_count = visible;
}

fn id_at(session: &Session, x: i32, y: i32) -> PassengerId {
    session
        .passenger_at(GridCoord::new(x, y))
        .map(|p| p.id)
        .expect("passenger on cell")
}

fn count(events: &[SessionEvent], wanted: &SessionEvent) -> usize {
    events.iter().filter(|e| *e == wanted).count()
}

/// One red passenger on a 2x2 grid and a single red seat
fn single_passenger_level() -> LevelDefinition {
    let mut level = LevelDefinition::new("single", 2, 2);
    passenger(&mut level, 0, 0, "red");
    vehicles(&mut level, &["red"], 1, 1);
    level
}

#[test]
fn test_session_starts_paused_with_reachability() {
    let session = Session::from_level_with_seed(&single_passenger_level(), 1).unwrap();
    let id = id_at(&session, 0, 0);
    let passenger = session.passenger(id).unwrap();

    assert_eq!(session.phase(), GamePhase::Paused);
    assert!(passenger.reachable);
    assert_eq!(
        passenger.path,
        Some(vec![GridCoord::new(0, 0), GridCoord::new(0, 1)])
    );
    assert_eq!(session.clickable_passengers(), vec![id]);
    assert_eq!(session.outstanding_passengers(), 1);
}

#[test]
fn test_click_boards_and_wins_once() {
    let mut session = Session::from_level_with_seed(&single_passenger_level(), 1).unwrap();
    let id = id_at(&session, 0, 0);
    session.drain_events();

    assert_eq!(session.click(id), ClickOutcome::Accepted { slot: 0 });
    assert_eq!(session.phase(), GamePhase::Won);
    assert!(session.grid().occupant(GridCoord::new(0, 0)).is_none());
    assert!(matches!(
        session.passenger(id).map(|p| p.location),
        Some(PassengerLocation::Boarded(_))
    ));
    assert!(session.waiting_line().is_empty());

    let events = session.drain_events();
    assert_eq!(
        count(&events, &SessionEvent::MovedToWaitingSlot { passenger: id, slot: 0 }),
        1
    );
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::PassengerBoarded { passenger, .. } if *passenger == id
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::VehicleFull { .. })));

    // Further input changes nothing
    assert_eq!(session.click(id), ClickOutcome::Ignored(IgnoreReason::GameOver));
    session.tick(VEHICLE_DEPARTURE_TIME);
    session.tick(OUTCOME_SCREEN_DELAY);

    let mut all = events;
    all.extend(session.drain_events());
    assert_eq!(
        count(&all, &SessionEvent::PhaseChanged { phase: GamePhase::Won }),
        1
    );
    assert!(all
        .iter()
        .any(|e| matches!(e, SessionEvent::VehicleDeparted { .. })));
    assert_eq!(
        count(&all, &SessionEvent::OutcomeScreenDue { phase: GamePhase::Won }),
        1
    );
    assert_eq!(session.game_state().vehicles_departed, 1);
    assert_eq!(session.phase(), GamePhase::Won);
}

#[test]
fn test_departure_notification_is_idempotent() {
    let mut session = Session::from_level_with_seed(&single_passenger_level(), 1).unwrap();
    let id = id_at(&session, 0, 0);
    let vehicle = session.vehicles().front_vehicle().map(|v| v.id).unwrap();

    session.click(id);
    assert!(session.notify_vehicle_departed(vehicle));
    assert!(!session.notify_vehicle_departed(vehicle));

    // The internal timer fires later and is ignored
    session.tick(VEHICLE_DEPARTURE_TIME + 0.1);
    assert_eq!(session.game_state().vehicles_departed, 1);
}

#[test]
fn test_countdown_only_runs_after_start() {
    let mut level = single_passenger_level();
    level.countdown_secs = 2.0;
    let mut session = Session::from_level_with_seed(&level, 1).unwrap();

    session.tick(5.0);
    assert_eq!(session.phase(), GamePhase::Paused);
    assert_eq!(session.countdown(), 2.0);

    session.start();
    session.drain_events();
    session.tick(1.0);
    assert_eq!(session.countdown(), 1.0);
    assert_eq!(
        session.drain_events(),
        vec![SessionEvent::CountdownChanged { seconds: 1 }]
    );
}

#[test]
fn test_negative_tick_does_not_rewind() {
    let mut level = single_passenger_level();
    level.countdown_secs = 10.0;
    let mut session = Session::from_level_with_seed(&level, 1).unwrap();

    session.start();
    session.tick(-50.0);
    assert_eq!(session.countdown(), 10.0);
    assert_eq!(session.time(), 0.0);
    assert_eq!(session.phase(), GamePhase::Running);

    session.tick(4.0);
    assert_eq!(session.countdown(), 6.0);
}

#[test]
fn test_time_up_loses_and_revokes_interaction() {
    let mut level = LevelDefinition::new("slow", 2, 2);
    passenger(&mut level, 0, 0, "red");
    passenger(&mut level, 1, 0, "red");
    vehicles(&mut level, &["red"], 3, 1);
    level.countdown_secs = 2.0;

    let mut session = Session::from_level_with_seed(&level, 1).unwrap();
    session.start();
    session.tick(1.0);
    session.tick(1.0);

    assert_eq!(session.phase(), GamePhase::Lost);
    assert_eq!(session.loss_reason(), Some(LossReason::TimeUp));
    assert!(session.passengers().all(|p| !p.interactable));
    assert!(session.clickable_passengers().is_empty());

    let id = id_at(&session, 0, 0);
    assert_eq!(session.click(id), ClickOutcome::Ignored(IgnoreReason::GameOver));

    let events = session.drain_events();
    assert_eq!(count(&events, &SessionEvent::InteractionRevoked), 1);
    assert_eq!(
        count(&events, &SessionEvent::PhaseChanged { phase: GamePhase::Lost }),
        1
    );

    session.tick(OUTCOME_SCREEN_DELAY);
    assert_eq!(
        session.drain_events().last(),
        Some(&SessionEvent::OutcomeScreenDue { phase: GamePhase::Lost })
    );
}

#[test]
fn test_full_waiting_line_loses() {
    let mut level = LevelDefinition::new("jam", 6, 2);
    for x in 0..6 {
        passenger(&mut level, x, 0, "green");
    }
    vehicles(&mut level, &["red"], 3, 1);

    let mut session = Session::from_level_with_seed(&level, 1).unwrap();
    for x in 0..5 {
        let id = id_at(&session, x, 0);
        assert_eq!(session.click(id), ClickOutcome::Accepted { slot: x as usize });
    }
    assert!(session.waiting_line().is_full());
    assert_eq!(session.phase(), GamePhase::Running);

    let last = id_at(&session, 5, 0);
    assert_eq!(session.click(last), ClickOutcome::Lost);
    assert_eq!(session.phase(), GamePhase::Lost);
    assert_eq!(session.loss_reason(), Some(LossReason::WaitingLineFull));

    // The overflowing passenger never left the grid
    assert_eq!(
        session.passenger(last).map(|p| p.location),
        Some(PassengerLocation::Grid(GridCoord::new(5, 0)))
    );
    assert_eq!(session.waiting_line().len(), 5);
}

#[test]
fn test_unreachable_and_moving_clicks_are_ignored() {
    let mut level = LevelDefinition::new("column", 1, 3);
    passenger(&mut level, 0, 0, "red");
    passenger(&mut level, 0, 1, "red");
    vehicles(&mut level, &["red"], 2, 1);

    let mut session = Session::from_level_with_seed(&level, 1).unwrap();
    let back = id_at(&session, 0, 0);
    let front = id_at(&session, 0, 1);

    assert_eq!(
        session.click(back),
        ClickOutcome::Ignored(IgnoreReason::Unreachable)
    );
    assert_eq!(session.phase(), GamePhase::Running, "first click starts the clock");
    assert!(session.waiting_line().is_empty());

    assert!(session.set_passenger_moving(front, true));
    assert_eq!(session.click(front), ClickOutcome::Ignored(IgnoreReason::Moving));
    session.set_passenger_moving(front, false);

    assert_eq!(session.click(front), ClickOutcome::Accepted { slot: 0 });
    assert!(session.passenger(back).unwrap().reachable);
    assert_eq!(session.click(back), ClickOutcome::Accepted { slot: 0 });
    assert_eq!(session.phase(), GamePhase::Won);

    assert_eq!(
        session.click(PassengerId(bus_jam::simulation::SimId(999))),
        ClickOutcome::Ignored(IgnoreReason::GameOver)
    );
}

#[test]
fn test_unknown_passenger_is_ignored() {
    let mut session = Session::from_level_with_seed(&single_passenger_level(), 1).unwrap();
    assert_eq!(
        session.click(PassengerId(bus_jam::simulation::SimId(999))),
        ClickOutcome::Ignored(IgnoreReason::UnknownPassenger)
    );
    assert_eq!(session.phase(), GamePhase::Paused);
}

#[test]
fn test_hidden_color_revealed_when_reachable() {
    let mut level = LevelDefinition::new("hidden", 1, 3);
    level.set_cell(GridCoord::new(0, 0), CellType::HiddenColorPassenger);
    level.set_cell_color(GridCoord::new(0, 0), ColorKey::new("blue"));
    passenger(&mut level, 0, 1, "red");
    vehicles(&mut level, &["red", "blue"], 1, 2);

    let mut session = Session::from_level_with_seed(&level, 1).unwrap();
    let hidden = id_at(&session, 0, 0);
    let red = id_at(&session, 0, 1);
    assert!(session.passenger(hidden).unwrap().visible_color().is_none());
    assert!(session.map_string().starts_with(".\nR\n?\n"));
    session.drain_events();

    session.click(red);
    let events = session.drain_events();
    assert!(events.contains(&SessionEvent::ColorRevealed {
        passenger: hidden,
        color: ColorKey::new("blue")
    }));
    assert_eq!(
        session.passenger(hidden).unwrap().visible_color(),
        Some(&ColorKey::new("blue"))
    );

    // Red bus is still driving off, so blue has to wait
    assert_eq!(session.click(hidden), ClickOutcome::Accepted { slot: 0 });
    assert_eq!(session.waiting_line().len(), 1);
    assert_eq!(session.phase(), GamePhase::Running);

    session.tick(VEHICLE_DEPARTURE_TIME);
    assert!(session.waiting_line().is_empty());
    assert_eq!(session.phase(), GamePhase::Won);
    let events = session.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::VehicleQueueChanged { order } if order.len() == 1)));
}

#[test]
fn test_pipe_dispenses_after_delay() {
    let mut level = LevelDefinition::new("pipe", 3, 3);
    level.set_cell(GridCoord::new(1, 0), CellType::Pipe);
    level.pipes.push(PipeConfig {
        x: 1,
        y: 0,
        orientation: Orientation::North,
        pool_size: 2,
        colors: vec![ColorKey::new("red"), ColorKey::new("red")],
    });
    vehicles(&mut level, &["red"], 2, 1);

    let mut session = Session::from_level_with_seed(&level, 1).unwrap();
    let output = GridCoord::new(1, 1);
    let first = id_at(&session, 1, 1);
    let pipe = session.pipes().next().map(|p| p.id).unwrap();
    let second = session.pipe(pipe).and_then(|p| {
        let front = p.front()?;
        assert_eq!(front, first);
        session
            .passengers()
            .find(|q| q.id != front && q.origin_pipe == Some(p.id))
            .map(|q| q.id)
    });
    let second = second.unwrap();

    assert_eq!(session.outstanding_passengers(), 2);
    assert_eq!(
        session.click(second),
        ClickOutcome::Ignored(IgnoreReason::OffGrid)
    );

    assert_eq!(session.click(first), ClickOutcome::Accepted { slot: 0 });
    assert!(session.grid().occupant(output).is_none());
    assert!(session.pipe(pipe).unwrap().is_release_pending());

    session.tick(0.2);
    assert!(session.passenger_at(output).is_none(), "release is delayed");

    session.tick(0.2);
    assert_eq!(session.passenger_at(output).map(|p| p.id), Some(second));
    assert!(session
        .drain_events()
        .contains(&SessionEvent::PassengerDispensed {
            pipe,
            passenger: second,
            coord: output
        }));

    assert_eq!(session.click(second), ClickOutcome::Accepted { slot: 0 });
    assert_eq!(session.pipe(pipe).unwrap().remaining(), 0);
    assert_eq!(session.phase(), GamePhase::Won);
}

#[test]
fn test_level_end_cancels_pending_pipe_release() {
    let mut level = LevelDefinition::new("stuck pipe", 3, 3);
    level.set_cell(GridCoord::new(1, 0), CellType::Pipe);
    level.pipes.push(PipeConfig {
        x: 1,
        y: 0,
        orientation: Orientation::North,
        pool_size: 2,
        colors: vec![ColorKey::new("red"), ColorKey::new("red")],
    });
    vehicles(&mut level, &["blue"], 2, 1);
    level.countdown_secs = 1.0;

    let mut session = Session::from_level_with_seed(&level, 1).unwrap();
    let output = GridCoord::new(1, 1);
    let pipe = session.pipes().next().map(|p| p.id).unwrap();
    let first = id_at(&session, 1, 1);

    assert_eq!(session.click(first), ClickOutcome::Accepted { slot: 0 });
    assert!(session.pipe(pipe).unwrap().is_release_pending());
    session.drain_events();

    // The clock runs out in the same tick the release would have fired
    session.tick(1.0);
    assert_eq!(session.loss_reason(), Some(LossReason::TimeUp));
    assert!(!session.pipe(pipe).unwrap().is_release_pending());
    assert!(session.passenger_at(output).is_none());
    assert_eq!(session.pending_timers(), 1, "only the outcome screen remains");

    session.tick(OUTCOME_SCREEN_DELAY);
    let events = session.drain_events();
    assert!(!events
        .iter()
        .any(|e| matches!(e, SessionEvent::PassengerDispensed { .. })));
    assert!(session.passenger_at(output).is_none());
}

#[test]
fn test_autoplayer_wins_tutorial_level() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/levels/tutorial.json");
    let level = LevelDefinition::load(path).unwrap();
    let mut session = Session::from_level_with_seed(&level, 3).unwrap();
    let mut player = Autoplayer::new_with_seed(3);

    for _ in 0..200 {
        if session.phase().is_terminal() {
            break;
        }
        if let Some(id) = player.choose(&session) {
            assert!(matches!(session.click(id), ClickOutcome::Accepted { .. }));
        }
        session.tick(0.1);
    }

    assert_eq!(session.phase(), GamePhase::Won);
    assert_eq!(session.game_state().passengers_boarded, 6);
    assert_eq!(session.outstanding_passengers(), 0);
}

#[test]
fn test_demo_level_builds() {
    let session = Session::from_level_with_seed(&LevelDefinition::demo(), 42).unwrap();

    assert_eq!(session.passengers().count(), 15);
    assert_eq!(session.pipes().count(), 1);
    assert_eq!(session.vehicles().visible_order().len(), 2);
    assert_eq!(session.vehicles().remaining_count(), 5);
    assert!(session.level_report().is_clean());

    // Front row of the board is empty; the row behind it is all reachable
    for x in [0, 1, 3, 4] {
        let id = id_at(&session, x, 4);
        assert!(session.passenger(id).unwrap().reachable);
    }
    // Pipe front passenger stands above the pipe
    assert!(session.passenger_at(GridCoord::new(4, 2)).is_some());
}
