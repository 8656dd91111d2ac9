//! Worker tasks that back the runtime orchestration.
//!
//! The turn worker owns the controller and resolves commands one at a time;
//! the animation worker flips two-frame tiles on a fixed cadence. Both share
//! the game state behind one arena-wide lock.

mod animation;
mod ports;
mod turn;

pub use animation::AnimationWorker;
pub use ports::BusPorts;
pub use turn::{Command, TurnWorker};
