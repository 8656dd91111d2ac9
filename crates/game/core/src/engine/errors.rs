//! Error types for the turn controller.

use std::fmt;

use crate::error::{ErrorSeverity, GameError};
use crate::history::HistoryError;
use crate::state::{Item, Position};

/// Controller phase, reported when a turn fails to settle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnPhase {
    Movement,
    Lasers,
    Objects,
    Timers,
    Enemies,
}

impl TurnPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnPhase::Movement => "movement",
            TurnPhase::Lasers => "lasers",
            TurnPhase::Objects => "objects",
            TurnPhase::Timers => "timers",
            TurnPhase::Enemies => "enemies",
        }
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a command was rejected or a turn could not complete.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnError {
    #[error("offset ({dx}, {dy}) is not a legal move")]
    InvalidOffset { dx: i32, dy: i32 },

    #[error("out of {item}")]
    OutOfAmmo { item: Item },

    #[error("{item} cannot be used as a range weapon")]
    NotRangeWeapon { item: Item },

    #[error("nothing movable at {position}")]
    NotMovable { position: Position },

    #[error("the tank is dead")]
    PlayerDead,

    #[error("the level is already solved")]
    LevelSolved,

    #[error("a turn is already resolving")]
    Busy,

    #[error("turn did not settle after {iterations} iterations (last phase: {phase})")]
    IterationLimit { iterations: u32, phase: TurnPhase },

    #[error("invalid arena: {reason}")]
    InvalidArena { reason: String },

    #[error(transparent)]
    History(#[from] HistoryError),
}

impl TurnError {
    pub(crate) fn invalid_arena(reason: impl Into<String>) -> Self {
        Self::InvalidArena {
            reason: reason.into(),
        }
    }
}

impl GameError for TurnError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::OutOfAmmo { .. } | Self::Busy => ErrorSeverity::Recoverable,
            Self::InvalidOffset { .. }
            | Self::NotRangeWeapon { .. }
            | Self::NotMovable { .. }
            | Self::PlayerDead
            | Self::LevelSolved => ErrorSeverity::Validation,
            Self::IterationLimit { .. } => ErrorSeverity::Internal,
            Self::InvalidArena { .. } => ErrorSeverity::Fatal,
            Self::History(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidOffset { .. } => "TURN_INVALID_OFFSET",
            Self::OutOfAmmo { .. } => "TURN_OUT_OF_AMMO",
            Self::NotRangeWeapon { .. } => "TURN_NOT_RANGE_WEAPON",
            Self::NotMovable { .. } => "TURN_NOT_MOVABLE",
            Self::PlayerDead => "TURN_PLAYER_DEAD",
            Self::LevelSolved => "TURN_LEVEL_SOLVED",
            Self::Busy => "TURN_BUSY",
            Self::IterationLimit { .. } => "TURN_ITERATION_LIMIT",
            Self::InvalidArena { .. } => "TURN_INVALID_ARENA",
            Self::History(err) => err.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ammo_exhaustion_is_recoverable() {
        let err = TurnError::OutOfAmmo { item: Item::Missile };
        assert!(err.severity().is_recoverable());
        assert_eq!(err.to_string(), "out of missile");
    }

    #[test]
    fn iteration_limit_names_phase() {
        let err = TurnError::IterationLimit {
            iterations: 50,
            phase: TurnPhase::Objects,
        };
        assert!(err.severity().is_internal());
        assert!(err.to_string().contains("objects"));
    }
}
