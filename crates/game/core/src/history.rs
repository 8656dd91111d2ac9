//! Undo and redo of whole turns.
//!
//! Every player action records the world as it was before the turn began,
//! tagged with what kind of action it was. Undo swaps the current world for
//! the recorded one and reverses the score and ammunition; redo mirrors it.

use bitflags::bitflags;

use crate::error::{ErrorSeverity, GameError};
use crate::state::{Item, WorldSnapshot};

bitflags! {
    /// What the recorded action was.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct HistoryStatus: u16 {
        const LASER = 1 << 0;
        const MISSILE = 1 << 1;
        const STUNNER = 1 << 2;
        const BOOST = 1 << 3;
        const MAGNET = 1 << 4;
        const BLUE_LASER = 1 << 5;
        const DISRUPTOR = 1 << 6;
        const BOMB = 1 << 7;
        const HEAT_BOMB = 1 << 8;
        const ICE_BOMB = 1 << 9;
    }
}

impl HistoryStatus {
    pub const fn for_item(item: Item) -> HistoryStatus {
        match item {
            Item::Missile => HistoryStatus::MISSILE,
            Item::Stunner => HistoryStatus::STUNNER,
            Item::Boost => HistoryStatus::BOOST,
            Item::Magnet => HistoryStatus::MAGNET,
            Item::BlueLaser => HistoryStatus::BLUE_LASER,
            Item::Disruptor => HistoryStatus::DISRUPTOR,
            Item::Bomb => HistoryStatus::BOMB,
            Item::HeatBomb => HistoryStatus::HEAT_BOMB,
            Item::IceBomb => HistoryStatus::ICE_BOMB,
        }
    }

    /// Scoring class of a recorded action.
    pub fn class(self) -> ActionClass {
        const ORDER: [Item; Item::COUNT] = [
            Item::Boost,
            Item::Magnet,
            Item::Missile,
            Item::Stunner,
            Item::BlueLaser,
            Item::Disruptor,
            Item::Bomb,
            Item::HeatBomb,
            Item::IceBomb,
        ];
        if let Some(item) = ORDER
            .into_iter()
            .find(|&item| self.contains(HistoryStatus::for_item(item)))
        {
            ActionClass::Item(item)
        } else if self.contains(HistoryStatus::LASER) {
            ActionClass::Shot
        } else {
            ActionClass::Move
        }
    }
}

/// Which score counter an action lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionClass {
    Move,
    Shot,
    Item(Item),
}

impl ActionClass {
    /// Score delta `(moves, shots, others)` of performing the action once.
    pub const fn score_delta(self) -> (i32, i32, i32) {
        match self {
            ActionClass::Move => (1, 0, 0),
            ActionClass::Shot => (0, 1, 0),
            ActionClass::Item(_) => (0, 0, 1),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryEntry {
    pub snapshot: WorldSnapshot,
    pub status: HistoryStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HistoryError {
    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}

impl GameError for HistoryError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NothingToUndo => "HISTORY_NOTHING_TO_UNDO",
            Self::NothingToRedo => "HISTORY_NOTHING_TO_REDO",
        }
    }
}

/// Two stacks of recorded worlds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UndoEngine {
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
}

impl UndoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the world before a new action. Any redo history is discarded.
    pub fn record(&mut self, snapshot: WorldSnapshot, status: HistoryStatus) {
        self.redo.clear();
        self.undo.push(HistoryEntry { snapshot, status });
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn len(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    /// Pops the latest undo entry and stores `current` for redo.
    pub(crate) fn step_back(&mut self, current: WorldSnapshot) -> Result<HistoryEntry, HistoryError> {
        let entry = self.undo.pop().ok_or(HistoryError::NothingToUndo)?;
        self.redo.push(HistoryEntry {
            snapshot: current,
            status: entry.status,
        });
        Ok(entry)
    }

    /// Pops the latest redo entry and stores `current` for undo.
    pub(crate) fn step_forward(&mut self, current: WorldSnapshot) -> Result<HistoryEntry, HistoryError> {
        let entry = self.redo.pop().ok_or(HistoryError::NothingToRedo)?;
        self.undo.push(HistoryEntry {
            snapshot: current,
            status: entry.status,
        });
        Ok(entry)
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_prefers_items_over_laser() {
        let missile = HistoryStatus::LASER | HistoryStatus::MISSILE;
        assert_eq!(missile.class(), ActionClass::Item(Item::Missile));
        assert_eq!(HistoryStatus::LASER.class(), ActionClass::Shot);
        assert_eq!(HistoryStatus::empty().class(), ActionClass::Move);
        assert_eq!(HistoryStatus::BOOST.class(), ActionClass::Item(Item::Boost));
    }

    #[test]
    fn record_discards_redo() {
        let mut history = UndoEngine::new();
        history.record(WorldSnapshot::default(), HistoryStatus::empty());
        history.step_back(WorldSnapshot::default()).unwrap();
        assert!(history.can_redo());
        history.record(WorldSnapshot::default(), HistoryStatus::LASER);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn empty_stacks_report_errors() {
        let mut history = UndoEngine::new();
        assert_eq!(
            history.step_back(WorldSnapshot::default()),
            Err(HistoryError::NothingToUndo)
        );
        assert_eq!(
            history.step_forward(WorldSnapshot::default()),
            Err(HistoryError::NothingToRedo)
        );
    }
}
