//! Turn worker that owns the [`TurnController`].
//!
//! Receives commands from [`RuntimeHandle`](crate::RuntimeHandle), begins each
//! action under the shared lock, then iterates the controller one step per
//! lock acquisition so the animation worker and snapshots interleave with a
//! resolving turn. The pacing sleep happens outside the lock.

use std::time::Duration;

use lasertank_core::{GameConfig, Progress, ReplayEntry, TurnController, TurnOutcome};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

use super::ports::BusPorts;
use crate::api::{Result, RuntimeError};
use crate::events::{DisplayEvent, Event, EventBus, TurnEvent};
use crate::runtime::SharedState;

/// Commands that can be sent to the turn worker
pub enum Command {
    /// Begin a game action and resolve it to quiescence.
    Play {
        entry: ReplayEntry,
        reply: oneshot::Sender<Result<TurnOutcome>>,
    },
    /// Step history backwards (`redo == false`) or forwards.
    Rewind {
        redo: bool,
        reply: oneshot::Sender<Result<()>>,
    },
}

pub struct TurnWorker {
    state: SharedState,
    controller: TurnController,
    command_rx: mpsc::Receiver<Command>,
    bus: EventBus,
    ports: BusPorts,
    busy: watch::Sender<bool>,
    shutdown: watch::Receiver<bool>,
    action_delay: Duration,
}

impl TurnWorker {
    pub fn new(
        state: SharedState,
        controller: TurnController,
        command_rx: mpsc::Receiver<Command>,
        bus: EventBus,
        busy: watch::Sender<bool>,
        shutdown: watch::Receiver<bool>,
        action_delay: Duration,
    ) -> Self {
        Self {
            state,
            controller,
            command_rx,
            ports: BusPorts::new(bus.clone()),
            bus,
            busy,
            shutdown,
            action_delay,
        }
    }

    /// Builds the controller the worker drives. Pacing is owned by the worker.
    pub fn controller_for(config: &GameConfig) -> TurnController {
        TurnController::new(config.clone().with_action_delay(Duration::ZERO))
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    self.handle_command(cmd).await;
                }
                _ = self.shutdown.changed() => break,
                else => break,
            }
        }
        debug!(target: "lasertank::runtime", "turn worker stopped");
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Play { entry, reply } => {
                let result = self.play(entry).await;
                if reply.send(result).is_err() {
                    debug!(target: "lasertank::runtime", "Play reply channel closed (caller dropped)");
                }
            }
            Command::Rewind { redo, reply } => {
                let result = self.rewind(redo).await;
                if reply.send(result).is_err() {
                    debug!(target: "lasertank::runtime", "Rewind reply channel closed (caller dropped)");
                }
            }
        }
    }

    async fn play(&mut self, entry: ReplayEntry) -> Result<TurnOutcome> {
        {
            let mut state = self.state.lock().await;
            if let Err(err) = self.controller.begin_command(&mut state, &mut self.ports, entry) {
                debug!(target: "lasertank::runtime", ?entry, %err, "command rejected");
                self.bus.publish(Event::Turn(TurnEvent::Rejected {
                    command: entry,
                    reason: err.to_string(),
                }));
                return Err(err.into());
            }
        }

        self.busy.send_replace(true);
        self.bus.publish(Event::Turn(TurnEvent::Started { command: entry }));
        let resolved = self.resolve().await;
        self.busy.send_replace(false);

        match resolved {
            Ok(outcome) => {
                let state_root = hex::encode(self.state.lock().await.state_root());
                debug!(
                    target: "lasertank::runtime",
                    iterations = outcome.iterations,
                    died = outcome.died,
                    solved = outcome.solved,
                    "turn finished"
                );
                self.bus
                    .publish(Event::Turn(TurnEvent::Finished { outcome, state_root }));
                Ok(outcome)
            }
            Err(err) => {
                warn!(target: "lasertank::runtime", %err, "turn torn down");
                self.bus.publish(Event::Display(DisplayEvent::Message {
                    text: err.to_string(),
                }));
                Err(err)
            }
        }
    }

    async fn resolve(&mut self) -> Result<TurnOutcome> {
        // turning in place never starts a turn
        if !self.controller.is_active() {
            return Ok(TurnOutcome::default());
        }
        loop {
            let progress = {
                let mut state = self.state.lock().await;
                self.controller.iterate(&mut state, &mut self.ports)
            };
            match progress.map_err(RuntimeError::from)? {
                Progress::Finished(outcome) => return Ok(outcome),
                Progress::Running if self.action_delay.is_zero() => tokio::task::yield_now().await,
                Progress::Running => tokio::time::sleep(self.action_delay).await,
            }
        }
    }

    async fn rewind(&mut self, redo: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        if redo {
            self.controller.redo(&mut state, &mut self.ports)?;
        } else {
            self.controller.undo(&mut state, &mut self.ports)?;
        }
        drop(state);
        self.bus.publish(Event::Turn(TurnEvent::Rewound { redo }));
        Ok(())
    }
}
