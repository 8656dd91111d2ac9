//! Deterministic LaserTank rules shared by the runtime and offline tools.
//!
//! `lasertank-core` defines the arena, the tile catalog with its behavior hooks,
//! and the turn controller that resolves one player action to quiescence. It
//! has no I/O: sound, redraw and messages leave through [`GamePorts`], and all
//! state mutation during a turn flows through [`engine::TurnController`].
pub mod arena;
pub mod config;
pub mod context;
pub mod direction;
pub mod engine;
pub mod error;
pub mod history;
pub mod ports;
pub mod state;
pub mod tile;

pub use arena::{Arena, ArenaError, LaserGlyph, Layer, parse_layout, render_layout};
pub use config::GameConfig;
pub use context::{Request, TurnContext};
pub use direction::Direction;
pub use engine::{
    AbortHandle, LaserTracker, LaserType, ObjectTracker, Progress, Shooter, TurnController, TurnError,
    TurnOutcome, TurnPhase,
};
pub use error::{ErrorSeverity, GameError, HookResult, TurnInterrupt};
pub use history::{ActionClass, HistoryError, HistoryStatus, UndoEngine};
pub use ports::{GamePorts, NullPorts, RecordingPorts, SoundEffect};
pub use state::{
    Cheats, GameState, Inventory, Item, KeyColor, KeyRing, PlayStatus, Position, ReplayEntry, ReplayLog,
    Score, WorldSnapshot,
};
pub use tile::{Material, TankForm, Tile, TileKind, TypeFlags};
