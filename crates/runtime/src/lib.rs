//! Concurrency shell around the LaserTank turn engine.
//!
//! This crate wires the deterministic [`lasertank_core::TurnController`] into
//! background workers, a topic event bus and a cloneable command handle.
//! Consumers embed [`Runtime`] to play turns, subscribe to events, and replay
//! recorded sessions through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod events;
pub mod runtime;

mod workers;

pub use api::{InputProvider, PlayerCommand, Result, RuntimeError, RuntimeHandle, ScriptedInput};
pub use events::{DisplayEvent, Event, EventBus, SoundEvent, Topic, TurnEvent};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig, SharedState};
