//! Bridges engine side effects onto the event bus.

use lasertank_core::{GamePorts, Position, SoundEffect};

use crate::events::{DisplayEvent, Event, EventBus, SoundEvent, TurnEvent};

/// [`GamePorts`] implementation that publishes every call as an [`Event`].
#[derive(Clone)]
pub struct BusPorts {
    bus: EventBus,
}

impl BusPorts {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl GamePorts for BusPorts {
    fn play_sound(&mut self, sound: SoundEffect) {
        self.bus.publish(Event::Sound(SoundEvent { sound }));
    }

    fn redraw(&mut self, changed: &[Position]) {
        if changed.is_empty() {
            return;
        }
        self.bus.publish(Event::Display(DisplayEvent::Redraw {
            cells: changed.to_vec(),
        }));
    }

    fn show_message(&mut self, message: &str) {
        self.bus.publish(Event::Display(DisplayEvent::Message {
            text: message.to_owned(),
        }));
    }

    fn level_solved(&mut self) {
        self.bus.publish(Event::Turn(TurnEvent::Solved));
    }

    fn game_over(&mut self) {
        self.bus.publish(Event::Turn(TurnEvent::Died));
    }
}
