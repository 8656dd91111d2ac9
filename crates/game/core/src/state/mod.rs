//! Mutable world state for one level attempt.

mod inventory;
mod position;

pub use inventory::{Cheats, Inventory, Item, KeyColor, KeyRing, Score};
pub use position::Position;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::arena::{parse_layout, Arena, ArenaError, Cell, Layer};
use crate::direction::Direction;
use crate::engine::LaserType;
use crate::history::{ActionClass, HistoryError, HistoryStatus, UndoEngine};
use crate::tile::{TankForm, Tile};

/// Terminal flags of the attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayStatus {
    pub dead: bool,
    pub solved: bool,
}

/// One accepted player input, kept for replaying a solution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReplayEntry {
    Move { dx: i32, dy: i32 },
    Fire { laser: LaserType },
    Range { item: Item },
    Turn { direction: Direction },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplayLog {
    entries: Vec<ReplayEntry>,
}

impl ReplayLog {
    pub fn push(&mut self, entry: ReplayEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ReplayEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Everything a turn can change on the board, captured for undo.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldSnapshot {
    cells: Vec<Cell>,
    tank: Position,
    keys: KeyRing,
    decays: Vec<Position>,
    replay: ReplayLog,
    status: PlayStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    pub arena: Arena,
    /// Cell holding the tank on the upper-objects layer.
    pub tank: Position,
    pub inventory: Inventory,
    pub score: Score,
    pub cheats: Cheats,
    pub history: UndoEngine,
    pub replay: ReplayLog,
    pub status: PlayStatus,
    /// Thin-ice cells that turn to water once the tank has left them.
    pub decays: Vec<Position>,
}

impl GameState {
    /// Wraps an arena holding exactly one tank.
    pub fn new(arena: Arena) -> Result<Self, ArenaError> {
        let tanks: Vec<_> = arena.tanks().collect();
        let tank = match tanks.as_slice() {
            [] => return Err(ArenaError::MissingTank),
            [single] => *single,
            many => return Err(ArenaError::MultipleTanks { count: many.len() }),
        };
        Ok(Self {
            arena,
            tank,
            inventory: Inventory::new(),
            score: Score::default(),
            cheats: Cheats::empty(),
            history: UndoEngine::new(),
            replay: ReplayLog::default(),
            status: PlayStatus::default(),
            decays: Vec::new(),
        })
    }

    pub fn from_layout(text: &str) -> Result<Self, ArenaError> {
        Self::new(parse_layout(text)?)
    }

    #[must_use]
    pub fn with_inventory(mut self, inventory: Inventory) -> Self {
        self.inventory = inventory;
        self
    }

    #[must_use]
    pub fn with_cheats(mut self, cheats: Cheats) -> Self {
        self.apply_cheats(cheats);
        self
    }

    /// Switches cheats on. The one-shot form cheats change the tank at once
    /// and are not kept in the active set.
    pub fn apply_cheats(&mut self, cheats: Cheats) {
        let forms = Cheats::POWER_MODE | Cheats::DISGUISED;
        self.cheats |= cheats.difference(forms);
        let form = if cheats.contains(Cheats::POWER_MODE) {
            TankForm::Powerful
        } else if cheats.contains(Cheats::DISGUISED) {
            TankForm::Disguised
        } else {
            return;
        };
        if let Some(tank) = self
            .arena
            .get_mut(self.tank, Layer::UpperObjects)
            .filter(|tile| tile.is_tank())
        {
            *tank = tank.with_tank_form(form);
            debug!(target: "lasertank::state", %form, "tank form cheat");
        }
    }

    pub fn tank_tile(&self) -> Option<&Tile> {
        self.arena.get(self.tank, Layer::UpperObjects)
    }

    pub fn tank_direction(&self) -> Direction {
        self.tank_tile().map_or(Direction::None, Tile::direction)
    }

    pub fn is_over(&self) -> bool {
        self.status.dead || self.status.solved
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            cells: self.arena.cells().to_vec(),
            tank: self.tank,
            keys: self.inventory.keys,
            decays: self.decays.clone(),
            replay: self.replay.clone(),
            status: self.status,
        }
    }

    pub fn restore(&mut self, snapshot: WorldSnapshot) {
        self.arena.restore_cells(snapshot.cells);
        self.tank = snapshot.tank;
        self.inventory.keys = snapshot.keys;
        self.decays = snapshot.decays;
        self.replay = snapshot.replay;
        self.status = snapshot.status;
    }

    /// Records the current world before an action of kind `status` mutates it.
    pub fn record_history(&mut self, status: HistoryStatus) {
        let snapshot = self.snapshot();
        self.history.record(snapshot, status);
    }

    /// Rewinds one turn: world, score and spent ammunition.
    pub fn undo(&mut self) -> Result<(), HistoryError> {
        let current = self.snapshot();
        let entry = self.history.step_back(current)?;
        self.restore(entry.snapshot);
        let class = entry.status.class();
        let (moves, shots, others) = class.score_delta();
        self.score.update(-moves, -shots, -others);
        if let ActionClass::Item(item) = class {
            self.inventory.refund(item, self.cheats);
        }
        debug!(target: "lasertank::history", ?class, "undo");
        Ok(())
    }

    /// Re-applies the last undone turn.
    pub fn redo(&mut self) -> Result<(), HistoryError> {
        let current = self.snapshot();
        let entry = self.history.step_forward(current)?;
        self.restore(entry.snapshot);
        let class = entry.status.class();
        let (moves, shots, others) = class.score_delta();
        self.score.update(moves, shots, others);
        if let ActionClass::Item(item) = class {
            self.inventory.consume(item, self.cheats);
        }
        debug!(target: "lasertank::history", ?class, "redo");
        Ok(())
    }

    /// Digest of the board plus tank, keys, ammunition, score and status.
    pub fn state_root(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.arena.digest());
        for coordinate in [self.tank.x, self.tank.y, self.tank.z] {
            hasher.update(coordinate.to_le_bytes());
        }
        for color in [KeyColor::Red, KeyColor::Green, KeyColor::Blue] {
            hasher.update(self.inventory.keys.count(color).to_le_bytes());
        }
        for item in <Item as strum::IntoEnumIterator>::iter() {
            hasher.update(self.inventory.count(item).to_le_bytes());
        }
        for counter in [self.score.moves, self.score.shots, self.score.others] {
            hasher.update(counter.to_le_bytes());
        }
        hasher.update([u8::from(self.status.dead), u8::from(self.status.solved)]);
        hasher.finalize().into()
    }
}
