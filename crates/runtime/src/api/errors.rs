//! Unified error types surfaced by the runtime API.
//!
//! Wraps worker coordination failures and engine rejections so clients can
//! bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use lasertank_core::{ArenaError, ErrorSeverity, GameError, HistoryError, TurnError};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("turn worker command channel closed")]
    CommandChannelClosed,

    #[error("turn worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires an initial game state before building")]
    MissingState,

    #[error(transparent)]
    Turn(#[from] TurnError),

    #[error(transparent)]
    Arena(#[from] ArenaError),

    #[error("input provider failed: {reason}")]
    Provider { reason: String },
}

impl RuntimeError {
    pub fn provider(reason: impl Into<String>) -> Self {
        Self::Provider {
            reason: reason.into(),
        }
    }

    /// Engine rejections keep their own severity; plumbing failures are fatal.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Turn(err) => err.severity(),
            Self::Arena(err) => err.severity(),
            Self::Provider { .. } => ErrorSeverity::Recoverable,
            Self::CommandChannelClosed
            | Self::ReplyChannelClosed(_)
            | Self::WorkerJoin(_)
            | Self::MissingState => ErrorSeverity::Fatal,
        }
    }
}

impl From<HistoryError> for RuntimeError {
    fn from(err: HistoryError) -> Self {
        Self::Turn(TurnError::History(err))
    }
}
