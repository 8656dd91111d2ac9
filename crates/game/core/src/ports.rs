//! Side-effect ports the engine calls out through.
//!
//! Rendering, audio and dialogs are not part of the engine. A turn reports
//! them through [`GamePorts`]; the runtime forwards them onto its event bus.

use strum::{AsRefStr, Display, EnumIter};

use crate::state::Position;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SoundEffect {
    Move,
    Bump,
    Boost,
    Magnet,
    Turn,
    Laser,
    PowerLaser,
    Missile,
    Stunner,
    BlueLaser,
    Disruptor,
    AntiFire,
    LaserDie,
    Reflect,
    Push,
    PushMirror,
    Barrel,
    Boom,
    Crack,
    Crush,
    Disrupt,
    DisruptEnd,
    Rotate,
    Up,
    Down,
    Stun,
    Kill,
    Sink,
    Melt,
    Cool,
    Defrost,
    Frozen,
    Grab,
    Unlock,
    Bomb,
    HeatBomb,
    IceBomb,
    Dead,
    Solved,
}

/// Outbound side effects of a turn. Everything but sound has a no-op default.
pub trait GamePorts: Send {
    fn play_sound(&mut self, sound: SoundEffect);

    /// Cells whose contents changed since the last redraw.
    fn redraw(&mut self, _changed: &[Position]) {}

    fn show_message(&mut self, _message: &str) {}

    fn level_solved(&mut self) {}

    fn game_over(&mut self) {}
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPorts;

impl GamePorts for NullPorts {
    fn play_sound(&mut self, _sound: SoundEffect) {}
}

/// Keeps every call for later inspection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordingPorts {
    pub sounds: Vec<SoundEffect>,
    pub messages: Vec<String>,
    pub redraws: usize,
    pub solved: usize,
    pub deaths: usize,
}

impl RecordingPorts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heard(&self, sound: SoundEffect) -> bool {
        self.sounds.contains(&sound)
    }

    pub fn count(&self, sound: SoundEffect) -> usize {
        self.sounds.iter().filter(|&&played| played == sound).count()
    }
}

impl GamePorts for RecordingPorts {
    fn play_sound(&mut self, sound: SoundEffect) {
        self.sounds.push(sound);
    }

    fn redraw(&mut self, _changed: &[Position]) {
        self.redraws += 1;
    }

    fn show_message(&mut self, message: &str) {
        self.messages.push(message.to_owned());
    }

    fn level_solved(&mut self) {
        self.solved += 1;
    }

    fn game_over(&mut self) {
        self.deaths += 1;
    }
}
