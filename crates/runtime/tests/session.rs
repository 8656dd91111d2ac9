use std::time::Duration;

use lasertank_core::{
    Direction, GameState, Item, LaserType, Layer, Position, ReplayLog, SoundEffect, TileKind, TurnError,
};
use lasertank_runtime::{
    DisplayEvent, Event, PlayerCommand, Runtime, RuntimeConfig, RuntimeError, ScriptedInput, SoundEvent, Topic,
    TurnEvent,
};

fn instant_config() -> RuntimeConfig {
    RuntimeConfig::default().with_action_delay(Duration::ZERO)
}

fn start(layout: &str) -> Runtime {
    let state = GameState::from_layout(layout).expect("layout should parse");
    Runtime::start(instant_config(), state).expect("runtime should start")
}

#[tokio::test]
async fn move_settles_and_updates_shared_state() {
    let runtime = start(">...\n");
    let handle = runtime.handle();

    let outcome = handle.move_tank(1, 0).await.expect("move should succeed");
    assert!(outcome.moved);
    assert!(!outcome.died);
    assert!(!handle.is_busy());

    let state = handle.snapshot().await;
    assert_eq!(state.tank, Position::new(1, 0, 0));
    assert_eq!(state.score.moves, 1);

    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn turn_events_bracket_each_command() {
    let runtime = start(">...\n");
    let handle = runtime.handle();
    let mut turns = handle.subscribe(Topic::Turn);
    let mut sounds = handle.subscribe(Topic::Sound);

    handle.move_tank(1, 0).await.expect("move should succeed");

    assert_eq!(
        turns.recv().await.expect("started event"),
        Event::Turn(TurnEvent::Started {
            command: lasertank_core::ReplayEntry::Move { dx: 1, dy: 0 }
        })
    );
    let Event::Turn(TurnEvent::Finished { outcome, state_root }) = turns.recv().await.expect("finished event") else {
        panic!("expected a finished event");
    };
    assert!(outcome.moved);
    let state = handle.snapshot().await;
    assert_eq!(state_root, hex::encode(state.state_root()));

    assert_eq!(
        sounds.recv().await.expect("sound event"),
        Event::Sound(SoundEvent {
            sound: SoundEffect::Move
        })
    );

    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn rejected_command_reports_and_leaves_state_alone() {
    let runtime = start(">...\n");
    let handle = runtime.handle();
    let mut turns = handle.subscribe(Topic::Turn);
    let mut display = handle.subscribe(Topic::Display);
    let before = handle.snapshot().await.state_root();

    let err = handle.fire(LaserType::Missile).await.expect_err("no missiles left");
    assert!(matches!(
        err,
        RuntimeError::Turn(TurnError::OutOfAmmo { item: Item::Missile })
    ));
    assert!(err.severity().is_recoverable());

    assert_eq!(
        display.recv().await.expect("message event"),
        Event::Display(DisplayEvent::Message {
            text: Item::Missile.out_of_stock_message().to_owned()
        })
    );
    assert!(matches!(
        turns.recv().await.expect("rejected event"),
        Event::Turn(TurnEvent::Rejected { .. })
    ));
    assert_eq!(handle.snapshot().await.state_root(), before);

    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn undo_and_redo_round_trip_through_the_handle() {
    let runtime = start(">.B.\n");
    let handle = runtime.handle();
    let before = handle.snapshot().await.state_root();

    handle.move_tank(1, 0).await.expect("move should succeed");
    handle.fire(LaserType::Green).await.expect("fire should succeed");
    let after = handle.snapshot().await.state_root();
    assert_ne!(before, after);

    handle.undo().await.expect("undo fire");
    handle.undo().await.expect("undo move");
    assert_eq!(hex::encode(handle.snapshot().await.state_root()), hex::encode(before));

    let err = handle.undo().await.expect_err("history is empty");
    assert!(matches!(err, RuntimeError::Turn(TurnError::History(_))));

    handle.redo().await.expect("redo move");
    handle.redo().await.expect("redo fire");
    assert_eq!(hex::encode(handle.snapshot().await.state_root()), hex::encode(after));

    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn turning_in_place_is_not_a_turn() {
    let runtime = start(">...\n");
    let handle = runtime.handle();

    handle.move_tank(1, 0).await.expect("move should succeed");
    let outcome = handle.turn(Direction::South).await.expect("turn should succeed");
    assert_eq!(outcome, Default::default());

    let state = handle.snapshot().await;
    assert_eq!(state.tank_direction(), Direction::South);
    assert_eq!(state.score.moves, 1);

    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test(start_paused = true)]
async fn abort_stops_a_resolving_turn() {
    let state = GameState::from_layout(">..............................\n").expect("layout should parse");
    let config = RuntimeConfig::default().with_action_delay(Duration::from_millis(50));
    let runtime = Runtime::start(config, state).expect("runtime should start");
    let handle = runtime.handle();
    let mut turns = handle.subscribe(Topic::Turn);

    let firing = tokio::spawn({
        let handle = handle.clone();
        async move { handle.fire(LaserType::Green).await }
    });

    assert!(matches!(
        turns.recv().await.expect("started event"),
        Event::Turn(TurnEvent::Started { .. })
    ));
    assert!(handle.is_busy());
    handle.abort();

    let outcome = firing.await.expect("task should join").expect("fire should succeed");
    assert!(outcome.aborted);
    assert!(outcome.iterations < 30);
    handle.wait_idle().await.expect("worker alive");
    assert_eq!(handle.snapshot().await.arena.glyph_count(), 0);

    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn replay_reproduces_a_recorded_session() {
    let layout = ">.B...\n..#...\n";
    let recording = start(layout);
    let handle = recording.handle();
    handle.move_tank(1, 0).await.expect("move");
    handle.fire(LaserType::Green).await.expect("fire");
    handle.turn(Direction::South).await.expect("turn");
    handle.move_tank(0, 1).await.expect("move south");
    let recorded = handle.snapshot().await;
    recording.shutdown().await.expect("shutdown should succeed");

    let log: ReplayLog = recorded.replay.clone();
    assert_eq!(log.len(), 4);

    let copy = start(layout);
    let outcomes = copy.handle().replay(&log).await.expect("replay should succeed");
    assert_eq!(outcomes.len(), 4);
    let replayed = copy.handle().snapshot().await;
    assert_eq!(hex::encode(replayed.state_root()), hex::encode(recorded.state_root()));
    assert_eq!(replayed.score, recorded.score);

    copy.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test(start_paused = true)]
async fn animation_toggles_frames_on_its_cadence() {
    let runtime = start(">~.\n");
    let handle = runtime.handle();
    let mut display = handle.subscribe(Topic::Display);

    let Event::Display(DisplayEvent::Redraw { cells }) = display.recv().await.expect("redraw event") else {
        panic!("expected a redraw");
    };
    assert!(cells.contains(&Position::new(1, 0, 0)));

    let state = handle.snapshot().await;
    let water = state
        .arena
        .get(Position::new(1, 0, 0), Layer::LowerGround)
        .expect("cell exists");
    assert_eq!(water.kind(), TileKind::Water);
    assert_eq!(water.frame(), 1);

    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn scripted_session_skips_rejected_commands() {
    let runtime = start(">....\n");
    let mut input = ScriptedInput::new([
        PlayerCommand::Move { dx: 1, dy: 0 },
        PlayerCommand::Fire(LaserType::Missile),
        PlayerCommand::Move { dx: 1, dy: 0 },
        PlayerCommand::Undo,
        PlayerCommand::Quit,
        PlayerCommand::Move { dx: 1, dy: 0 },
    ]);

    runtime.run(&mut input).await.expect("session should end cleanly");
    assert_eq!(input.remaining(), 1);

    let state = runtime.handle().snapshot().await;
    assert_eq!(state.tank, Position::new(1, 0, 0));

    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn builder_requires_a_state() {
    let err = Runtime::builder().build().err().expect("no state was given");
    assert!(matches!(err, RuntimeError::MissingState));

    let err = Runtime::builder().layout("?").err().expect("bad glyph");
    assert!(matches!(err, RuntimeError::Arena(_)));
}

#[tokio::test]
async fn oversized_action_delay_is_logged_and_shut_down() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("lasertank=debug")
        .with_test_writer()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let config = RuntimeConfig::default().with_action_delay(Duration::from_secs(u64::MAX));
    let state = GameState::from_layout(">.\n").expect("layout should parse");
    let runtime = Runtime::start(config, state).expect("runtime should start");

    let handle = runtime.handle();
    assert!(!handle.is_busy());
    assert_eq!(handle.snapshot().await.tank, Position::ORIGIN);

    runtime.shutdown().await.expect("shutdown should succeed");
}
