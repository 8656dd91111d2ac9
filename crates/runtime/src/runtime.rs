//! High-level runtime orchestrator.
//!
//! The runtime owns background workers, wires up command/event channels, and
//! exposes a builder-based API for clients to drive the game.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use lasertank_core::{ErrorSeverity, GameConfig, GameState};

use crate::api::{InputProvider, PlayerCommand, Result, RuntimeError, RuntimeHandle};
use crate::events::EventBus;
use crate::workers::{AnimationWorker, BusPorts, TurnWorker};

/// Game state shared by the workers. One coarse lock guards every multi-cell update.
pub type SharedState = Arc<Mutex<GameState>>;

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub game_config: GameConfig,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Cadence of the two-frame tile animation.
    pub animation_interval: Duration,
    /// Pause between controller iterations while a turn resolves.
    pub action_delay: Duration,
}

impl RuntimeConfig {
    pub const DEFAULT_ANIMATION_INTERVAL: Duration = Duration::from_millis(200);
    pub const DEFAULT_ACTION_DELAY: Duration = Duration::from_millis(50);

    pub fn with_action_delay(mut self, action_delay: Duration) -> Self {
        self.action_delay = action_delay;
        self
    }

    pub fn with_animation_interval(mut self, animation_interval: Duration) -> Self {
        self.animation_interval = animation_interval;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            game_config: GameConfig::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
            animation_interval: Self::DEFAULT_ANIMATION_INTERVAL,
            action_delay: Self::DEFAULT_ACTION_DELAY,
        }
    }
}

/// Main runtime that orchestrates the game session
///
/// Runtime owns the workers; [`RuntimeHandle`] is the cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    shutdown: watch::Sender<bool>,
    turn_worker: JoinHandle<()>,
    animation_worker: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Starts a runtime over `state` with the given configuration.
    pub fn start(config: RuntimeConfig, state: GameState) -> Result<Runtime> {
        Self::builder().config(config).initial_state(state).build()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Feeds commands from `input` until it runs dry or asks to quit.
    ///
    /// Rejected actions are reported on the event bus and the session goes on;
    /// only fatal failures end it early.
    pub async fn run(&self, input: &mut dyn InputProvider) -> Result<()> {
        loop {
            let snapshot = self.handle.snapshot().await;
            let Some(command) = input.next_command(&snapshot).await? else {
                break;
            };
            let result = match command {
                PlayerCommand::Quit => break,
                PlayerCommand::Undo => self.handle.undo().await,
                PlayerCommand::Redo => self.handle.redo().await,
                other => match other.as_entry() {
                    Some(entry) => self.handle.play(entry).await.map(|_| ()),
                    None => Ok(()),
                },
            };
            if let Err(err) = result {
                if err.severity() == ErrorSeverity::Fatal {
                    return Err(err);
                }
                debug!(target: "lasertank::runtime", ?command, %err, "command not applied");
            }
        }
        info!(target: "lasertank::runtime", "input exhausted");
        Ok(())
    }

    /// Shutdown the runtime gracefully
    pub async fn shutdown(self) -> Result<()> {
        self.handle.abort();
        self.shutdown.send_replace(true);

        self.turn_worker.await.map_err(RuntimeError::WorkerJoin)?;
        self.animation_worker.await.map_err(RuntimeError::WorkerJoin)?;
        Ok(())
    }
}

/// Builder for [`Runtime`].
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    state: Option<GameState>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            state: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Provide initial game state
    pub fn initial_state(mut self, state: GameState) -> Self {
        self.state = Some(state);
        self
    }

    /// Parses `layout` into the initial game state.
    pub fn layout(mut self, layout: &str) -> Result<Self> {
        self.state = Some(GameState::from_layout(layout)?);
        Ok(self)
    }

    /// Build the runtime. Must be called inside a tokio runtime.
    pub fn build(self) -> Result<Runtime> {
        let state = self.state.ok_or(RuntimeError::MissingState)?;
        if state.tank_tile().is_none_or(|tile| !tile.is_tank()) {
            warn!(target: "lasertank::runtime", tank = %state.tank, "initial state has no tank");
        }
        let shared: SharedState = Arc::new(Mutex::new(state));

        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size);
        let (busy_tx, busy_rx) = watch::channel(false);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let bus = EventBus::with_capacity(self.config.event_buffer_size);

        let controller = TurnWorker::controller_for(&self.config.game_config);
        let abort = controller.abort_handle();
        let handle = RuntimeHandle::new(command_tx, bus.clone(), Arc::clone(&shared), abort, busy_rx);

        let turn_worker = TurnWorker::new(
            Arc::clone(&shared),
            controller,
            command_rx,
            bus.clone(),
            busy_tx,
            shutdown_rx.clone(),
            self.config.action_delay,
        );
        let turn_worker = tokio::spawn(async move {
            turn_worker.run().await;
        });

        let animation_worker = AnimationWorker::new(
            shared,
            BusPorts::new(bus),
            self.config.animation_interval,
            shutdown_rx,
        );
        let animation_worker = tokio::spawn(async move {
            animation_worker.run().await;
        });

        info!(
            target: "lasertank::runtime",
            action_delay = ?self.config.action_delay,
            animation_interval = ?self.config.animation_interval,
            "runtime started"
        );

        Ok(Runtime {
            handle,
            shutdown: shutdown_tx,
            turn_worker,
            animation_worker,
        })
    }
}
