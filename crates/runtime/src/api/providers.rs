//! Asynchronous abstraction for sourcing player input.
//!
//! Runtime users plug in [`InputProvider`] implementations so the game can be
//! driven by a terminal, a recorded script, or a test fixture.
use std::collections::VecDeque;

use async_trait::async_trait;
use lasertank_core::{Direction, GameState, Item, LaserType, ReplayEntry};
use serde::{Deserialize, Serialize};

use super::errors::Result;

/// One thing the player asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerCommand {
    Move { dx: i32, dy: i32 },
    Fire(LaserType),
    Range(Item),
    Turn(Direction),
    Undo,
    Redo,
    Quit,
}

impl PlayerCommand {
    /// The replay entry this command would record, if it is a game action.
    pub fn as_entry(self) -> Option<ReplayEntry> {
        match self {
            PlayerCommand::Move { dx, dy } => Some(ReplayEntry::Move { dx, dy }),
            PlayerCommand::Fire(laser) => Some(ReplayEntry::Fire { laser }),
            PlayerCommand::Range(item) => Some(ReplayEntry::Range { item }),
            PlayerCommand::Turn(direction) => Some(ReplayEntry::Turn { direction }),
            PlayerCommand::Undo | PlayerCommand::Redo | PlayerCommand::Quit => None,
        }
    }
}

impl From<ReplayEntry> for PlayerCommand {
    fn from(entry: ReplayEntry) -> Self {
        match entry {
            ReplayEntry::Move { dx, dy } => PlayerCommand::Move { dx, dy },
            ReplayEntry::Fire { laser } => PlayerCommand::Fire(laser),
            ReplayEntry::Range { item } => PlayerCommand::Range(item),
            ReplayEntry::Turn { direction } => PlayerCommand::Turn(direction),
        }
    }
}

/// Trait for providing player commands based on the current game state.
///
/// Returning `Ok(None)` ends the session the same way [`PlayerCommand::Quit`] does.
#[async_trait]
pub trait InputProvider: Send {
    async fn next_command(&mut self, state: &GameState) -> Result<Option<PlayerCommand>>;
}

/// Plays back a fixed list of commands, then ends the session.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    commands: VecDeque<PlayerCommand>,
}

impl ScriptedInput {
    pub fn new(commands: impl IntoIterator<Item = PlayerCommand>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.commands.len()
    }
}

#[async_trait]
impl InputProvider for ScriptedInput {
    async fn next_command(&mut self, _state: &GameState) -> Result<Option<PlayerCommand>> {
        Ok(self.commands.pop_front())
    }
}
