//! Topic-based event bus for runtime events.
//!
//! Turn lifecycle, sound cues and display updates are published on separate
//! topics so a renderer can ignore audio and a sound mixer can ignore redraws.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{DisplayEvent, SoundEvent, TurnEvent};
