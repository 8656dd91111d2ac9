//! Headless terminal driver.
//!
//! Loads a layout, feeds stdin commands to the runtime and prints turn
//! events. Logging goes to stderr so the board on stdout stays readable.
mod config;
mod input;

use anyhow::{Context, Result};
use lasertank_core::GameState;
use lasertank_runtime::{DisplayEvent, Event, Runtime, RuntimeHandle, Topic, TurnEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use config::CliConfig;
use input::StdinInput;

/// Practice arena used when no level file is configured.
const PRACTICE_LAYOUT: &str = "\
##########
#>..B...F#
#.##.#.#.#
#..*2..b.#
#.k.D..A.#
##########
";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    setup_logging();
    let config = CliConfig::from_env();

    let layout = match &config.level {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read level {}", path.display()))?,
        None => PRACTICE_LAYOUT.to_owned(),
    };
    let state = GameState::from_layout(&layout)
        .context("failed to parse level layout")?
        .with_inventory(config.inventory.clone())
        .with_cheats(config.cheats);

    let runtime = Runtime::start(config.runtime_config(), state)?;
    info!(level = ?config.level, cheats = ?config.cheats, "session started");

    let printer = tokio::spawn(print_events(runtime.handle(), config.json_events));
    let mut input = StdinInput::new(!config.json_events);
    let session = runtime.run(&mut input).await;

    runtime.shutdown().await?;
    printer.abort();
    session?;
    Ok(())
}

/// Setup logging to stderr, `info` unless `RUST_LOG` says otherwise.
fn setup_logging() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn print_events(handle: RuntimeHandle, json: bool) {
    let mut turns = handle.subscribe(Topic::Turn);
    let mut display = handle.subscribe(Topic::Display);
    let mut sounds = handle.subscribe(Topic::Sound);

    loop {
        let received = tokio::select! {
            event = turns.recv() => event,
            event = display.recv() => event,
            event = sounds.recv(), if json => event,
        };
        let event = match received {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event printer fell behind");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        if json {
            match event.to_json() {
                Ok(line) => println!("{line}"),
                Err(err) => warn!(%err, "failed to encode event"),
            }
            continue;
        }
        match event {
            Event::Turn(TurnEvent::Died) => println!("*** the tank was destroyed ***"),
            Event::Turn(TurnEvent::Solved) => println!("*** level solved ***"),
            Event::Turn(TurnEvent::Rejected { reason, .. }) => println!("! {reason}"),
            Event::Turn(TurnEvent::Finished { outcome, .. }) if outcome.aborted => println!("turn aborted"),
            Event::Display(DisplayEvent::Message { text }) => println!("> {text}"),
            _ => {}
        }
    }
}
