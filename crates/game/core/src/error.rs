//! Common error infrastructure for lasertank-core.
//!
//! Shared severity types used by every error enum in the crate.
//! Domain errors (`ArenaError`, `TurnError`, `HistoryError`) live next to the
//! code that raises them.
//!
//! Tile hooks do not return these errors. They return [`HookResult`], whose
//! only failure is [`TurnInterrupt::AlreadyDead`]; the turn controller absorbs
//! it at the turn entry point.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the action was rejected but the session can continue
/// - **Validation**: invalid input that should be rejected without retry
/// - **Internal**: unexpected state inconsistency that requires investigation
/// - **Fatal**: the arena is unusable and the level attempt must end
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error. Examples: out of ammo, controller busy.
    Recoverable,

    /// Validation error. Examples: an offset that is not a legal move.
    Validation,

    /// Internal error. Examples: iteration limit reached.
    Internal,

    /// Fatal error. Examples: arena without a tank.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all lasertank-core errors.
///
/// - All error enums implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Signal raised from inside a turn that stops the remaining controller work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TurnInterrupt {
    /// Game over was requested a second time while the turn was resolving.
    #[error("tank is already dead")]
    AlreadyDead,
}

/// Result type returned by tile hooks and tracker steps.
pub type HookResult<T> = Result<T, TurnInterrupt>;
