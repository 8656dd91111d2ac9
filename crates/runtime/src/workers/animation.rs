//! Two-frame tile animation on a fixed cadence.

use std::time::Duration;

use lasertank_core::GamePorts;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace};

use super::ports::BusPorts;
use crate::runtime::SharedState;

/// Flips the frame of every animated tile each tick and publishes a redraw.
///
/// Independent of the turn worker apart from the shared state lock, which it
/// holds only for the toggle itself.
pub struct AnimationWorker {
    state: SharedState,
    ports: BusPorts,
    period: Duration,
    shutdown: watch::Receiver<bool>,
}

impl AnimationWorker {
    pub fn new(state: SharedState, ports: BusPorts, period: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            state,
            ports,
            period,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => self.animate().await,
                _ = self.shutdown.changed() => break,
            }
        }
        debug!(target: "lasertank::runtime", "animation worker stopped");
    }

    async fn animate(&mut self) {
        let dirty = {
            let mut state = self.state.lock().await;
            if state.arena.toggle_animation_frames() == 0 {
                return;
            }
            state.arena.take_dirty()
        };
        trace!(target: "lasertank::runtime", cells = dirty.len(), "animation frame");
        self.ports.redraw(&dirty);
    }
}
