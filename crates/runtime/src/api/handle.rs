//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! playing turns, rewinding history or streaming events from specific topics.
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use lasertank_core::{AbortHandle, Direction, GameState, Item, LaserType, ReplayEntry, ReplayLog, TurnOutcome};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::runtime::SharedState;
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
    state: SharedState,
    abort: AbortHandle,
    busy: watch::Receiver<bool>,
}

impl RuntimeHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
        state: SharedState,
        abort: AbortHandle,
        busy: watch::Receiver<bool>,
    ) -> Self {
        Self {
            command_tx,
            event_bus,
            state,
            abort,
            busy,
        }
    }

    /// Plays one recorded command and waits until its turn has settled.
    pub async fn play(&self, entry: ReplayEntry) -> Result<TurnOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Play {
                entry,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Moves the tank by `(dx, dy)`. Magnitude 2 boosts, magnitude 3 uses the magnet.
    pub async fn move_tank(&self, dx: i32, dy: i32) -> Result<TurnOutcome> {
        self.play(ReplayEntry::Move { dx, dy }).await
    }

    pub async fn fire(&self, laser: LaserType) -> Result<TurnOutcome> {
        self.play(ReplayEntry::Fire { laser }).await
    }

    pub async fn fire_range(&self, item: Item) -> Result<TurnOutcome> {
        self.play(ReplayEntry::Range { item }).await
    }

    pub async fn turn(&self, direction: Direction) -> Result<TurnOutcome> {
        self.play(ReplayEntry::Turn { direction }).await
    }

    pub async fn undo(&self) -> Result<()> {
        self.rewind(false).await
    }

    pub async fn redo(&self) -> Result<()> {
        self.rewind(true).await
    }

    async fn rewind(&self, redo: bool) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Rewind {
                redo,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Replays every entry of `log` in order, waiting for each turn to settle.
    ///
    /// Stops at the first rejected entry.
    pub async fn replay(&self, log: &ReplayLog) -> Result<Vec<TurnOutcome>> {
        let mut outcomes = Vec::with_capacity(log.len());
        for &entry in log.entries() {
            outcomes.push(self.play(entry).await?);
        }
        Ok(outcomes)
    }

    /// Copy of the current game state. May observe a turn between iterations.
    pub async fn snapshot(&self) -> GameState {
        self.state.lock().await.clone()
    }

    /// Asks the resolving turn to stop at the next phase boundary.
    pub fn abort(&self) {
        self.abort.abort();
    }

    /// A turn is currently resolving.
    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    /// Resolves once no turn is resolving.
    pub async fn wait_idle(&self) -> Result<()> {
        let mut busy = self.busy.clone();
        busy.wait_for(|busy| !*busy)
            .await
            .map(|_| ())
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Turn` - Turn lifecycle, deaths and solves
    /// - `Topic::Sound` - Sound cues
    /// - `Topic::Display` - Redraw requests and status messages
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
