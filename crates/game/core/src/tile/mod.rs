//! Tile objects that fill every arena layer.
//!
//! Each tile is a [`TileKind`] tag plus a handful of per-instance attributes.
//! Capabilities are derived from the kind; behavior hooks live in [`hooks`] and
//! dispatch with a flat `match` on the kind. Changing a tile's kind always
//! means replacing the whole value through `Arena::morph`.

mod hooks;
mod material;

pub use material::Material;

use bitflags::bitflags;
use strum::{AsRefStr, Display};

use crate::config::GameConfig;
use crate::direction::Direction;
use crate::state::{KeyColor, KeyRing};

/// Form of the player tank.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TankForm {
    #[default]
    Normal,
    /// Green lasers leave the barrel as power lasers.
    Powerful,
    /// Anti-tanks ignore the tank; green lasers come out red.
    Disguised,
    /// Sliding under a frost field.
    Frozen,
}

/// Tile variant tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TileKind {
    // lower ground
    Ground,
    Ice,
    ThinIce,
    Water,
    DeepWater,
    Lava,
    Bridge,

    // vacancy sentinel, any layer
    Empty,

    // upper ground
    TankMover,
    BoxMover,
    MirrorMover,
    AntiMover,
    AnyMover,
    FrostField,

    // lower objects
    Wall,
    HotWall,
    IcyWall,
    DisruptedWall,
    MagneticWall,
    DisruptedMagneticWall,
    CrystalBlock,
    CrackedWall,
    DamagedWall,
    CrumblingWall,
    Box,
    WoodenBox,
    IcyBox,
    HotBox,
    MagneticBox,
    JumpBox,
    /// Plastic box that grips the ground and never slides on ice.
    StickyBox,
    Mirror,
    /// Fixed mirror; a bolt striking its back turns it a quarter.
    RotaryMirror,
    Barrel,
    ExplodingBarrel,
    Flag,
    Key(KeyColor),
    Door(KeyColor),
    AntiTank,
    StunnedAntiTank,
    DeadAntiTank,
    /// Lifts the tank to the floor above.
    StairsUp,
    /// Drops the tank to the floor below.
    StairsDown,

    // upper objects
    Tank(TankForm),
}

bitflags! {
    /// Capability tags used by the trackers to pick redirection rules.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct TypeFlags: u32 {
        const BOX = 1 << 0;
        const ICY = 1 << 1;
        const WALL = 1 << 2;
        /// Conveys the tank.
        const MOVER = 1 << 3;
        const BOX_MOVER = 1 << 4;
        const MIRROR_MOVER = 1 << 5;
        const ANTI_MOVER = 1 << 6;
        const CHARACTER = 1 << 7;
        const BARREL = 1 << 8;
        const MIRROR = 1 << 9;
        const MOVABLE_MIRROR = 1 << 10;
        const ANTI = 1 << 11;
        const MAGNETIC = 1 << 12;
        const KEY = 1 << 13;
        const DOOR = 1 << 14;
        const JUMP = 1 << 15;
        const GROUND = 1 << 16;
        /// Two-frame tiles toggled by the animation worker.
        const ANIMATED = 1 << 17;
        const CRACKED = 1 << 18;
    }
}

impl TileKind {
    pub fn flags(self) -> TypeFlags {
        use TileKind::*;
        match self {
            Ground | Bridge => TypeFlags::GROUND,
            Ice | ThinIce => TypeFlags::GROUND | TypeFlags::ICY,
            Water | DeepWater | Lava => TypeFlags::GROUND | TypeFlags::ANIMATED,
            Empty => TypeFlags::empty(),
            TankMover => TypeFlags::MOVER | TypeFlags::ANIMATED,
            BoxMover => TypeFlags::BOX_MOVER | TypeFlags::ANIMATED,
            MirrorMover => TypeFlags::MIRROR_MOVER | TypeFlags::ANIMATED,
            AntiMover => TypeFlags::ANTI_MOVER | TypeFlags::ANIMATED,
            AnyMover => {
                TypeFlags::MOVER
                    | TypeFlags::BOX_MOVER
                    | TypeFlags::MIRROR_MOVER
                    | TypeFlags::ANTI_MOVER
                    | TypeFlags::ANIMATED
            }
            FrostField => TypeFlags::ANIMATED,
            Wall | HotWall | IcyWall | DisruptedWall | DisruptedMagneticWall => TypeFlags::WALL,
            MagneticWall => TypeFlags::WALL | TypeFlags::MAGNETIC,
            CrystalBlock => TypeFlags::empty(),
            CrackedWall | DamagedWall | CrumblingWall => TypeFlags::WALL | TypeFlags::CRACKED,
            Box | WoodenBox | HotBox | StickyBox => TypeFlags::BOX,
            IcyBox => TypeFlags::BOX | TypeFlags::ICY,
            MagneticBox => TypeFlags::BOX | TypeFlags::MAGNETIC,
            JumpBox => TypeFlags::BOX | TypeFlags::JUMP,
            Mirror => TypeFlags::MIRROR | TypeFlags::MOVABLE_MIRROR,
            RotaryMirror => TypeFlags::MIRROR,
            Barrel | ExplodingBarrel => TypeFlags::BARREL,
            Flag => TypeFlags::ANIMATED,
            Key(_) => TypeFlags::KEY,
            Door(_) => TypeFlags::DOOR,
            AntiTank | StunnedAntiTank | DeadAntiTank => TypeFlags::ANTI,
            StairsUp | StairsDown => TypeFlags::empty(),
            Tank(_) => TypeFlags::CHARACTER,
        }
    }

    pub fn is_solid(self) -> bool {
        use TileKind::*;
        !matches!(
            self,
            Ground
                | Ice
                | ThinIce
                | Water
                | DeepWater
                | Lava
                | Bridge
                | Empty
                | TankMover
                | BoxMover
                | MirrorMover
                | AntiMover
                | AnyMover
                | FrostField
                | DisruptedWall
                | Flag
                | Key(_)
                | StairsUp
                | StairsDown
        )
    }

    /// Whether lasers can push this object around.
    pub fn can_move(self) -> bool {
        use TileKind::*;
        matches!(
            self,
            Box | WoodenBox
                | IcyBox
                | HotBox
                | MagneticBox
                | JumpBox
                | StickyBox
                | Mirror
                | AntiTank
                | StunnedAntiTank
                | DeadAntiTank
        )
    }

    pub fn has_friction(self) -> bool {
        !matches!(self, TileKind::Ice | TileKind::ThinIce)
    }

    pub fn kills_on_move(self) -> bool {
        matches!(self, TileKind::Water | TileKind::DeepWater | TileKind::Lava)
    }

    pub fn solves_on_move(self) -> bool {
        matches!(self, TileKind::Flag)
    }

    pub fn default_material(self) -> Material {
        use TileKind::*;
        match self {
            Wall | CrackedWall | DamagedWall | CrumblingWall => Material::Stone,
            HotWall | HotBox | Lava => Material::Fire,
            IcyWall | IcyBox | Ice | ThinIce => Material::Ice,
            MagneticWall | MagneticBox => Material::Magnetic,
            WoodenBox | Barrel | ExplodingBarrel | Bridge => Material::Wooden,
            StickyBox => Material::Plastic,
            Tank(_) => Material::Metallic,
            _ => Material::Default,
        }
    }
}

/// One occupant of an arena layer slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile {
    kind: TileKind,
    direction: Direction,
    material: Material,
    timer: Option<u16>,
    frame: u8,
    armed: bool,
    jump: u8,
    /// What a character or movable object is standing on in its own layer.
    occupant: Option<Box<Tile>>,
    /// What an exposed variant reverts to.
    previous: Option<Box<Tile>>,
}

impl Tile {
    pub fn new(kind: TileKind) -> Self {
        Self {
            kind,
            direction: Direction::None,
            material: kind.default_material(),
            timer: None,
            frame: 0,
            armed: matches!(kind, TileKind::AntiTank),
            jump: if matches!(kind, TileKind::JumpBox) {
                GameConfig::DEFAULT_JUMP_DISTANCE
            } else {
                0
            },
            occupant: None,
            previous: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(TileKind::Empty)
    }

    pub fn ground() -> Self {
        Self::new(TileKind::Ground)
    }

    pub fn wall() -> Self {
        Self::new(TileKind::Wall)
    }

    pub fn tank(direction: Direction) -> Self {
        Self::new(TileKind::Tank(TankForm::Normal)).facing(direction)
    }

    pub fn mirror(direction: Direction) -> Self {
        Self::new(TileKind::Mirror).facing(direction)
    }

    pub fn rotary_mirror(direction: Direction) -> Self {
        Self::new(TileKind::RotaryMirror).facing(direction)
    }

    pub fn anti_tank(direction: Direction) -> Self {
        Self::new(TileKind::AntiTank).facing(direction)
    }

    pub fn jump_box(distance: u8) -> Self {
        let mut tile = Self::new(TileKind::JumpBox);
        tile.jump = distance;
        tile
    }

    #[must_use]
    pub fn facing(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn with_previous(mut self, previous: Tile) -> Self {
        self.previous = Some(Box::new(previous));
        self
    }

    #[must_use]
    pub fn with_timer(mut self, ticks: u16) -> Self {
        self.activate_timer(ticks);
        self
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn flags(&self) -> TypeFlags {
        self.kind.flags()
    }

    pub fn is_of_type(&self, flags: TypeFlags) -> bool {
        self.flags().intersects(flags)
    }

    pub fn is_empty(&self) -> bool {
        self.kind == TileKind::Empty
    }

    pub fn is_tank(&self) -> bool {
        matches!(self.kind, TileKind::Tank(_))
    }

    pub fn tank_form(&self) -> Option<TankForm> {
        match self.kind {
            TileKind::Tank(form) => Some(form),
            _ => None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn is_solid(&self) -> bool {
        self.kind.is_solid()
    }

    /// Solidity once keys are taken into account. Doors open for a matching key.
    pub fn is_conditionally_solid(&self, keys: &KeyRing) -> bool {
        match self.kind {
            TileKind::Door(color) => keys.count(color) < 1,
            _ => self.is_solid(),
        }
    }

    pub fn can_move(&self) -> bool {
        self.kind.can_move()
    }

    pub fn has_friction(&self) -> bool {
        self.kind.has_friction()
    }

    pub fn lasers_pass_through(&self) -> bool {
        !self.is_solid()
            || matches!(
                self.kind,
                TileKind::CrystalBlock | TileKind::Mirror | TileKind::RotaryMirror
            )
    }

    /// Whether this object stops dead instead of sliding over frictionless ground.
    pub fn grips_ground(&self) -> bool {
        self.kind == TileKind::StickyBox
    }

    pub fn kills_on_move(&self) -> bool {
        self.kind.kills_on_move()
    }

    pub fn solves_on_move(&self) -> bool {
        self.kind.solves_on_move()
    }

    /// Laser force needed before this tile reacts to a hit.
    pub fn minimum_reaction_force(&self) -> u8 {
        self.material.minimum_reaction_force()
    }

    /// Cells covered by one push; jump boxes hop over the intermediate cells.
    pub fn push_reach(&self) -> i32 {
        if self.is_of_type(TypeFlags::JUMP) {
            i32::from(self.jump)
        } else {
            1
        }
    }

    pub fn timer(&self) -> Option<u16> {
        self.timer
    }

    pub fn activate_timer(&mut self, ticks: u16) {
        self.timer = Some(ticks);
    }

    /// Counts the timer down by one. Returns true when it just expired.
    pub fn tick_timer(&mut self) -> bool {
        match self.timer {
            Some(remaining) if remaining <= 1 => {
                self.timer = None;
                true
            }
            Some(remaining) => {
                self.timer = Some(remaining - 1);
                false
            }
            None => false,
        }
    }

    pub fn frame(&self) -> u8 {
        self.frame
    }

    pub fn toggle_frame(&mut self) {
        self.frame ^= 1;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn set_armed(&mut self, armed: bool) {
        self.armed = armed;
    }

    pub fn previous(&self) -> Option<&Tile> {
        self.previous.as_deref()
    }

    /// The tile this one reverts to, or `fallback` when none was remembered.
    pub fn previous_or(&self, fallback: TileKind) -> Tile {
        self.previous
            .as_deref()
            .cloned()
            .unwrap_or_else(|| Tile::new(fallback))
    }

    pub fn occupant(&self) -> Option<&Tile> {
        self.occupant.as_deref()
    }

    /// Removes what this tile is standing on, leaving the `Empty` sentinel in its place.
    pub fn take_occupant(&mut self) -> Tile {
        self.occupant.take().map(|tile| *tile).unwrap_or_else(Tile::empty)
    }

    pub fn set_occupant(&mut self, occupant: Tile) {
        self.occupant = Some(Box::new(occupant));
    }

    /// Copy of what this tile stands on; `Empty` when nothing was recorded.
    pub fn occupant_or_empty(&self) -> Tile {
        self.occupant().cloned().unwrap_or_else(Tile::empty)
    }

    /// Replacement kind keeping direction and occupant; used when a tile changes variant.
    pub fn morphed(&self, kind: TileKind) -> Tile {
        let mut next = Tile::new(kind).facing(self.direction);
        next.occupant = self.occupant.clone();
        next
    }

    /// The same tank in another form. Powerful and disguised forms wear off
    /// on a move-class timer.
    pub fn with_tank_form(&self, form: TankForm) -> Tile {
        let mut next = self.morphed(TileKind::Tank(form));
        next.material = self.material;
        match form {
            TankForm::Powerful => next.activate_timer(GameConfig::POWER_TICKS),
            TankForm::Disguised => next.activate_timer(GameConfig::DISGUISE_TICKS),
            TankForm::Normal | TankForm::Frozen => {}
        }
        next
    }

    /// Whether this tile's timer only advances on move-class actions.
    pub fn ticks_on_moves_only(&self) -> bool {
        matches!(self.kind, TileKind::StunnedAntiTank | TileKind::Tank(_))
    }

    /// Stable byte encoding used for state digests. Animation frames are skipped.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.kind.as_ref().as_bytes());
        out.push(match self.kind {
            TileKind::Key(color) | TileKind::Door(color) => color as u8,
            TileKind::Tank(form) => form as u8,
            _ => 0,
        });
        out.push(self.direction as u8);
        out.push(self.material as u8);
        out.extend_from_slice(&self.timer.map_or(u16::MAX, |t| t).to_le_bytes());
        out.push(u8::from(self.armed));
        out.push(self.jump);
        for nested in [&self.occupant, &self.previous] {
            match nested {
                Some(tile) => {
                    out.push(1);
                    tile.encode(out);
                }
                None => out.push(0),
            }
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doors_open_with_matching_key() {
        let door = Tile::new(TileKind::Door(KeyColor::Green));
        let mut keys = KeyRing::default();
        assert!(door.is_conditionally_solid(&keys));
        keys.add(KeyColor::Red);
        assert!(door.is_conditionally_solid(&keys));
        keys.add(KeyColor::Green);
        assert!(!door.is_conditionally_solid(&keys));
    }

    #[test]
    fn crystal_is_solid_but_transparent() {
        let crystal = Tile::new(TileKind::CrystalBlock);
        assert!(crystal.is_solid());
        assert!(crystal.lasers_pass_through());
        assert!(!Tile::wall().lasers_pass_through());
        assert!(Tile::ground().lasers_pass_through());
    }

    #[test]
    fn stairs_are_walkable_and_sticky_box_is_movable() {
        assert!(!Tile::new(TileKind::StairsUp).is_solid());
        assert!(!Tile::new(TileKind::StairsDown).is_solid());
        let sticky = Tile::new(TileKind::StickyBox);
        assert!(sticky.can_move());
        assert!(sticky.grips_ground());
        assert!(sticky.is_of_type(TypeFlags::BOX));
        assert_eq!(sticky.minimum_reaction_force(), 0);
        assert!(!Tile::new(TileKind::Box).grips_ground());
        let rotary = Tile::rotary_mirror(Direction::NorthEast);
        assert!(rotary.lasers_pass_through());
        assert!(!rotary.can_move());
        assert!(!rotary.is_of_type(TypeFlags::MOVABLE_MIRROR));
    }

    #[test]
    fn any_mover_carries_every_mover_flag() {
        let mover = Tile::new(TileKind::AnyMover);
        assert!(mover.is_of_type(TypeFlags::MOVER));
        assert!(mover.is_of_type(TypeFlags::BOX_MOVER));
        assert!(mover.is_of_type(TypeFlags::MIRROR_MOVER));
        assert!(mover.is_of_type(TypeFlags::ANTI_MOVER));
        assert!(!Tile::new(TileKind::BoxMover).is_of_type(TypeFlags::MOVER));
    }

    #[test]
    fn timer_counts_down_and_expires_once() {
        let mut wall = Tile::new(TileKind::DisruptedWall).with_timer(2);
        assert!(!wall.tick_timer());
        assert!(wall.tick_timer());
        assert_eq!(wall.timer(), None);
        assert!(!wall.tick_timer());
    }

    #[test]
    fn take_occupant_leaves_sentinel() {
        let mut tank = Tile::tank(Direction::East);
        tank.set_occupant(Tile::new(TileKind::Flag));
        assert_eq!(tank.take_occupant().kind(), TileKind::Flag);
        assert!(tank.take_occupant().is_empty());
    }

    #[test]
    fn reaction_force_follows_material() {
        let mut crate_box = Tile::new(TileKind::Box);
        assert_eq!(crate_box.minimum_reaction_force(), 1);
        crate_box.set_material(Material::Metallic);
        assert_eq!(crate_box.minimum_reaction_force(), 2);
        crate_box.set_material(Material::Plastic);
        assert_eq!(crate_box.minimum_reaction_force(), 0);
    }

    #[test]
    fn encoding_ignores_animation_frame() {
        let mut a = Tile::new(TileKind::Water);
        let b = a.clone();
        a.toggle_frame();
        let (mut ea, mut eb) = (Vec::new(), Vec::new());
        a.encode(&mut ea);
        b.encode(&mut eb);
        assert_eq!(ea, eb);
    }

    #[test]
    fn jump_box_reach_defaults() {
        assert_eq!(Tile::new(TileKind::JumpBox).push_reach(), 2);
        assert_eq!(Tile::jump_box(3).push_reach(), 3);
        assert_eq!(Tile::new(TileKind::Box).push_reach(), 1);
    }
}
