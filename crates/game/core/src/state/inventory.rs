//! Ammunition, keys, score and cheat switches.

use bitflags::bitflags;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Limited-use tank equipment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Item {
    Missile,
    Stunner,
    Boost,
    Magnet,
    BlueLaser,
    Disruptor,
    Bomb,
    HeatBomb,
    IceBomb,
}

impl Item {
    pub const COUNT: usize = 9;

    const fn index(self) -> usize {
        self as usize
    }

    /// Message shown when the tank tries to use an item it has run out of.
    pub const fn out_of_stock_message(self) -> &'static str {
        match self {
            Item::Missile => "You're out of missiles!",
            Item::Stunner => "You're out of stunners!",
            Item::Boost => "You're out of boosts!",
            Item::Magnet => "You're out of magnets!",
            Item::BlueLaser => "You're out of blue lasers!",
            Item::Disruptor => "You're out of disruptors!",
            Item::Bomb => "You're out of bombs!",
            Item::HeatBomb => "You're out of heat bombs!",
            Item::IceBomb => "You're out of ice bombs!",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyColor {
    Red,
    Green,
    Blue,
}

/// Keys picked up in the current level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyRing {
    counts: [u32; 3],
}

impl KeyRing {
    pub fn count(&self, color: KeyColor) -> u32 {
        self.counts[color as usize]
    }

    pub fn add(&mut self, color: KeyColor) {
        self.counts[color as usize] += 1;
    }

    /// Spends one key of `color`. Returns false when none is held.
    pub fn use_key(&mut self, color: KeyColor) -> bool {
        let slot = &mut self.counts[color as usize];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }
}

/// Ammunition counts plus the key ring.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inventory {
    counts: [u32; Item::COUNT],
    pub keys: KeyRing,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, item: Item, count: u32) -> Self {
        self.counts[item.index()] = count;
        self
    }

    pub fn count(&self, item: Item) -> u32 {
        self.counts[item.index()]
    }

    pub fn add(&mut self, item: Item, count: u32) {
        self.counts[item.index()] += count;
    }

    pub fn available(&self, item: Item, cheats: Cheats) -> bool {
        cheats.contains(Cheats::infinite(item)) || self.count(item) > 0
    }

    /// Uses one `item`. Infinite-ammo cheats leave the count untouched.
    pub fn consume(&mut self, item: Item, cheats: Cheats) -> bool {
        if cheats.contains(Cheats::infinite(item)) {
            return true;
        }
        let slot = &mut self.counts[item.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    /// Gives back one `item` consumed by an undone turn.
    pub fn refund(&mut self, item: Item, cheats: Cheats) {
        if !cheats.contains(Cheats::infinite(item)) {
            self.counts[item.index()] += 1;
        }
    }
}

/// Turn counters shown to the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Score {
    pub moves: u32,
    pub shots: u32,
    pub others: u32,
}

impl Score {
    pub fn update(&mut self, moves: i32, shots: i32, others: i32) {
        self.moves = self.moves.saturating_add_signed(moves);
        self.shots = self.shots.saturating_add_signed(shots);
        self.others = self.others.saturating_add_signed(others);
    }
}

bitflags! {
    /// Cheat switches that relax the rules.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Cheats: u16 {
        /// Deadly ground (water, lava) does not kill.
        const SWIMMING = 1 << 0;
        /// The tank walks through solid tiles.
        const GHOSTLY = 1 << 1;
        /// Game over is ignored and anti-tanks hold fire.
        const INVINCIBLE = 1 << 2;
        const INFINITE_MISSILES = 1 << 3;
        const INFINITE_STUNNERS = 1 << 4;
        const INFINITE_BOOSTS = 1 << 5;
        const INFINITE_MAGNETS = 1 << 6;
        const INFINITE_BLUE_LASERS = 1 << 7;
        const INFINITE_DISRUPTORS = 1 << 8;
        const INFINITE_BOMBS = 1 << 9;
        const INFINITE_HEAT_BOMBS = 1 << 10;
        const INFINITE_ICE_BOMBS = 1 << 11;
        /// One-shot: the tank starts powerful. Spent when applied.
        const POWER_MODE = 1 << 12;
        /// One-shot: the tank starts disguised as an anti-tank. Spent when applied.
        const DISGUISED = 1 << 13;
    }
}

impl Cheats {
    pub const fn infinite(item: Item) -> Cheats {
        match item {
            Item::Missile => Cheats::INFINITE_MISSILES,
            Item::Stunner => Cheats::INFINITE_STUNNERS,
            Item::Boost => Cheats::INFINITE_BOOSTS,
            Item::Magnet => Cheats::INFINITE_MAGNETS,
            Item::BlueLaser => Cheats::INFINITE_BLUE_LASERS,
            Item::Disruptor => Cheats::INFINITE_DISRUPTORS,
            Item::Bomb => Cheats::INFINITE_BOMBS,
            Item::HeatBomb => Cheats::INFINITE_HEAT_BOMBS,
            Item::IceBomb => Cheats::INFINITE_ICE_BOMBS,
        }
    }

    /// Parses a comma separated list such as `"swimming, infinite_missiles"`.
    /// Unknown names are returned as the error.
    pub fn from_list(list: &str) -> Result<Cheats, String> {
        let mut cheats = Cheats::empty();
        for name in list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            match Cheats::from_name(&name.to_ascii_uppercase()) {
                Some(flag) => cheats |= flag,
                None => return Err(name.to_string()),
            }
        }
        Ok(cheats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_stops_at_zero() {
        let mut inventory = Inventory::new().with(Item::Missile, 1);
        assert!(inventory.consume(Item::Missile, Cheats::empty()));
        assert!(!inventory.consume(Item::Missile, Cheats::empty()));
        assert_eq!(inventory.count(Item::Missile), 0);
    }

    #[test]
    fn infinite_cheat_keeps_count() {
        let mut inventory = Inventory::new();
        let cheats = Cheats::INFINITE_BOMBS;
        assert!(inventory.available(Item::Bomb, cheats));
        assert!(inventory.consume(Item::Bomb, cheats));
        inventory.refund(Item::Bomb, cheats);
        assert_eq!(inventory.count(Item::Bomb), 0);
    }

    #[test]
    fn key_ring_tracks_colors_independently() {
        let mut keys = KeyRing::default();
        keys.add(KeyColor::Blue);
        assert!(!keys.use_key(KeyColor::Red));
        assert!(keys.use_key(KeyColor::Blue));
        assert_eq!(keys.count(KeyColor::Blue), 0);
    }

    #[test]
    fn score_never_underflows() {
        let mut score = Score::default();
        score.update(-1, 0, 0);
        assert_eq!(score.moves, 0);
        score.update(2, 1, 1);
        assert_eq!(score, Score { moves: 2, shots: 1, others: 1 });
    }

    #[test]
    fn cheat_list_parsing() {
        let cheats = Cheats::from_list("swimming, infinite_missiles").unwrap();
        assert_eq!(cheats, Cheats::SWIMMING | Cheats::INFINITE_MISSILES);
        assert_eq!(Cheats::from_list("flying"), Err("flying".to_string()));
        assert_eq!(Cheats::from_list(""), Ok(Cheats::empty()));
    }
}
