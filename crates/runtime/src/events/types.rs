//! Event payloads for each topic.

use lasertank_core::{Position, ReplayEntry, SoundEffect, TurnOutcome};
use serde::{Deserialize, Serialize};

/// Turn lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnEvent {
    /// A command was accepted and its turn is resolving.
    Started { command: ReplayEntry },

    /// The turn reached quiescence.
    Finished {
        outcome: TurnOutcome,
        /// Hex-encoded state digest after the turn.
        state_root: String,
    },

    /// A command was refused before any state changed.
    Rejected { command: ReplayEntry, reason: String },

    /// The tank was destroyed.
    Died,

    /// The tank reached the flag.
    Solved,

    /// History moved backwards or forwards.
    Rewound { redo: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundEvent {
    pub sound: SoundEffect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayEvent {
    /// Cells to repaint.
    Redraw { cells: Vec<Position> },
    /// Status line text.
    Message { text: String },
}
