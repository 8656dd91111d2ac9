//! Tile reaction hooks.
//!
//! Hooks run on a copy of the tile read from the arena; any change they make
//! goes back through the [`TurnContext`].

use tracing::trace;

use super::{TankForm, Tile, TileKind, TypeFlags};
use crate::arena::Layer;
use crate::config::GameConfig;
use crate::context::{Request, TurnContext};
use crate::direction::{Direction, hits_reflective_side, reflect, resolve_relative};
use crate::engine::LaserType;
use crate::error::HookResult;
use crate::ports::SoundEffect;
use crate::state::{Item, Position};
use crate::tile::Material;

impl Tile {
    /// A bolt moving `(dx, dy)` entered this tile. Returns the direction it
    /// continues in, or [`Direction::None`] when absorbed.
    #[allow(clippy::too_many_arguments)]
    pub fn laser_entered(
        &self,
        ctx: &mut TurnContext<'_>,
        at: Position,
        layer: Layer,
        dx: i32,
        dy: i32,
        laser: LaserType,
        force: u8,
    ) -> HookResult<Direction> {
        use TileKind::*;
        let onward = resolve_relative(dx, dy);
        match self.kind() {
            CrystalBlock | DisruptedWall => Ok(onward),

            Wall | HotWall | IcyWall if laser == LaserType::Disruptor => {
                let disrupted = self
                    .morphed(DisruptedWall)
                    .with_previous(self.clone())
                    .with_timer(GameConfig::DISRUPTION_TICKS);
                ctx.morph(at, layer, disrupted);
                ctx.play(SoundEffect::Disrupt);
                Ok(Direction::None)
            }
            MagneticWall if laser == LaserType::Disruptor => {
                let disrupted = self
                    .morphed(DisruptedMagneticWall)
                    .with_timer(GameConfig::DISRUPTION_TICKS);
                ctx.morph(at, layer, disrupted);
                ctx.play(SoundEffect::Disrupt);
                Ok(Direction::None)
            }

            CrackedWall | DamagedWall | CrumblingWall => {
                if laser == LaserType::Missile {
                    ctx.play(SoundEffect::Boom);
                    ctx.destroy_object(at, layer);
                } else {
                    self.crack(ctx, at, layer);
                }
                Ok(Direction::None)
            }

            Mirror | RotaryMirror if laser == LaserType::Missile => {
                ctx.play(SoundEffect::Boom);
                ctx.destroy_object(at, layer);
                Ok(Direction::None)
            }
            Mirror | RotaryMirror if hits_reflective_side(self.direction(), dx, dy) => Ok(self.direction()),
            RotaryMirror => {
                self.rotate(ctx, at, layer);
                Ok(Direction::None)
            }

            Barrel | ExplodingBarrel => {
                ctx.detonate(at, layer)?;
                Ok(if laser == LaserType::Power {
                    onward
                } else {
                    Direction::None
                })
            }

            AntiTank | StunnedAntiTank
                if laser == LaserType::Missile
                    || laser == LaserType::Power
                    || (self.kind() == AntiTank && onward == self.direction().opposite()) =>
            {
                ctx.play(SoundEffect::Kill);
                ctx.morph(at, layer, self.morphed(DeadAntiTank));
                Ok(Direction::None)
            }
            AntiTank | StunnedAntiTank if laser == LaserType::Stunner => {
                ctx.play(SoundEffect::Stun);
                let stunned = self.morphed(StunnedAntiTank).with_timer(GameConfig::STUN_TICKS);
                ctx.morph(at, layer, stunned);
                Ok(Direction::None)
            }

            _ if !self.is_solid() => Ok(onward),
            _ if self.can_move() => self.pushed_by_laser(ctx, at, layer, dx, dy, laser, force),
            _ => {
                ctx.play(SoundEffect::LaserDie);
                Ok(Direction::None)
            }
        }
    }

    /// Laser push shared by every movable tile.
    ///
    /// Magnetic objects are pulled back toward the shooter unless the bolt is
    /// blue; everything else is pulled only by blue lasers.
    #[allow(clippy::too_many_arguments)]
    fn pushed_by_laser(
        &self,
        ctx: &mut TurnContext<'_>,
        at: Position,
        layer: Layer,
        dx: i32,
        dy: i32,
        laser: LaserType,
        force: u8,
    ) -> HookResult<Direction> {
        let threshold = self.minimum_reaction_force();
        if force < threshold {
            ctx.play(SoundEffect::LaserDie);
            return Ok(Direction::None);
        }

        let pulled = (self.material() == Material::Magnetic) != (laser == LaserType::Blue);
        let (sx, sy) = if pulled { (-dx, -dy) } else { (dx, dy) };
        let reach = self.push_reach();
        let destination = ctx.arena().normalize(at.offset(sx * reach, sy * reach));
        // Barrels and cracked walls react to the collision, so the push still goes ahead.
        let inert_blocker = destination.is_none_or(|target| {
            ctx.arena().get(target, layer).is_some_and(|tile| {
                tile.is_solid()
                    && !tile.is_tank()
                    && !tile.is_of_type(TypeFlags::BARREL | TypeFlags::CRACKED)
            })
        });

        if inert_blocker && force > threshold {
            ctx.play(SoundEffect::Crush);
            ctx.destroy_object(at, layer);
        } else if destination.is_some() {
            ctx.play(if self.is_of_type(TypeFlags::MIRROR) {
                SoundEffect::PushMirror
            } else {
                SoundEffect::Push
            });
            ctx.push_object(at, sx, sy);
        } else {
            ctx.play(SoundEffect::LaserDie);
        }
        Ok(Direction::None)
    }

    /// Second-stage redirect as the bolt leaves this tile.
    ///
    /// `old` is the step the bolt arrived with; `new` is what `laser_entered` returned.
    pub fn laser_exited(&self, ctx: &mut TurnContext<'_>, old: (i32, i32), new: Direction) -> Direction {
        if matches!(self.kind(), TileKind::Mirror | TileKind::RotaryMirror)
            && new == self.direction()
            && hits_reflective_side(self.direction(), old.0, old.1)
        {
            ctx.play(SoundEffect::Reflect);
            return reflect(self.direction(), old.0, old.1);
        }
        new
    }

    /// Area blast from a bomb. Returns whether the tile reacted.
    pub fn range_action(
        &self,
        ctx: &mut TurnContext<'_>,
        at: Position,
        layer: Layer,
        item: Item,
    ) -> HookResult<bool> {
        use TileKind::*;
        if self.kind() == RotaryMirror {
            self.rotate(ctx, at, layer);
            return Ok(true);
        }
        let exposure = match item {
            Item::HeatBomb => Some(Material::Fire),
            Item::IceBomb => Some(Material::Ice),
            _ => None,
        };
        if let Some(material) = exposure {
            return Ok(match self.changes_to_on_exposure(material) {
                Some(changed) => {
                    trace!(target: "lasertank::tile", %at, from = %self.kind(), to = %changed.kind(), "exposure");
                    ctx.morph(at, layer, changed);
                    true
                }
                None => false,
            });
        }
        if item != Item::Bomb {
            return Ok(false);
        }

        match self.kind() {
            Barrel | ExplodingBarrel => {
                ctx.detonate(at, layer)?;
                Ok(true)
            }
            CrackedWall | DamagedWall | CrumblingWall => {
                ctx.play(SoundEffect::Crack);
                ctx.destroy_object(at, layer);
                Ok(true)
            }
            AntiTank | StunnedAntiTank => {
                ctx.play(SoundEffect::Kill);
                ctx.morph(at, layer, self.morphed(DeadAntiTank));
                Ok(true)
            }
            _ if self.can_move() => {
                ctx.play(SoundEffect::Crush);
                ctx.destroy_object(at, layer);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// The tank finished stepping onto this tile.
    pub fn post_move(&self, ctx: &mut TurnContext<'_>, at: Position, layer: Layer) {
        match self.kind() {
            TileKind::Key(color) => {
                ctx.state.inventory.keys.add(color);
                ctx.play(SoundEffect::Grab);
                ctx.destroy_object(at, layer);
            }
            TileKind::Door(color) => {
                if ctx.state.inventory.keys.use_key(color) {
                    ctx.play(SoundEffect::Unlock);
                    ctx.destroy_object(at, layer);
                }
            }
            TileKind::ThinIce => ctx.schedule_decay(at),
            TileKind::FrostField => {
                ctx.play(SoundEffect::Frozen);
                ctx.request(Request::FrozenMovement);
            }
            TileKind::StairsUp => {
                if ctx.change_floor(at.z + 1) {
                    ctx.play(SoundEffect::Up);
                }
            }
            TileKind::StairsDown => {
                if ctx.change_floor(at.z - 1) {
                    ctx.play(SoundEffect::Down);
                }
            }
            _ => {}
        }
    }

    /// The tank tried to enter this tile and was blocked.
    pub fn move_failed(&self, ctx: &mut TurnContext<'_>, at: Position, layer: Layer) {
        if self.is_of_type(TypeFlags::CRACKED) {
            self.crack(ctx, at, layer);
        }
    }

    /// `pushed` arrived on this ground tile. Returning false stops the object.
    pub fn push_into(&self, ctx: &mut TurnContext<'_>, pushed: &Tile, at: Position) -> bool {
        use TileKind::*;
        match self.kind() {
            Lava if pushed.kind() == IcyBox => {
                ctx.play(SoundEffect::Cool);
                ctx.morph(at, Layer::LowerGround, self.morphed(Ground));
                true
            }
            Lava => {
                ctx.play(SoundEffect::Melt);
                ctx.destroy_object(at, Layer::LowerObjects);
                false
            }
            Water => {
                ctx.play(SoundEffect::Sink);
                let filled = if pushed.kind() == WoodenBox { Bridge } else { Ground };
                ctx.destroy_object(at, Layer::LowerObjects);
                ctx.morph(at, Layer::LowerGround, self.morphed(filled));
                false
            }
            DeepWater => {
                ctx.play(SoundEffect::Sink);
                let filled = if pushed.kind() == WoodenBox { Bridge } else { Water };
                ctx.destroy_object(at, Layer::LowerObjects);
                ctx.morph(at, Layer::LowerGround, self.morphed(filled));
                false
            }
            _ => true,
        }
    }

    /// `pushed` left this ground tile.
    pub fn push_out(&self, ctx: &mut TurnContext<'_>, at: Position) {
        if self.kind() == TileKind::ThinIce {
            ctx.play(SoundEffect::Crack);
            ctx.morph(at, Layer::LowerGround, self.morphed(TileKind::Water));
        }
    }

    /// A pushed object ran into this tile.
    pub fn push_collide(&self, ctx: &mut TurnContext<'_>, at: Position, layer: Layer) -> HookResult<()> {
        if self.is_of_type(TypeFlags::BARREL) {
            ctx.detonate(at, layer)?;
        } else if self.is_of_type(TypeFlags::CRACKED) {
            self.crack(ctx, at, layer);
        }
        Ok(())
    }

    /// The per-instance countdown reached zero.
    pub fn timer_expired(&self, ctx: &mut TurnContext<'_>, at: Position, layer: Layer) {
        use TileKind::*;
        let restored = match self.kind() {
            DisruptedWall => self.previous_or(Wall),
            DisruptedMagneticWall => self.morphed(MagneticWall),
            StunnedAntiTank => self.morphed(AntiTank),
            Tank(TankForm::Powerful | TankForm::Disguised) => {
                ctx.play(SoundEffect::DisruptEnd);
                self.with_tank_form(TankForm::Normal)
            }
            _ => return,
        };
        trace!(target: "lasertank::tile", %at, from = %self.kind(), to = %restored.kind(), "timer expired");
        ctx.morph(at, layer, restored);
    }

    /// Quarter turn clockwise in place.
    fn rotate(&self, ctx: &mut TurnContext<'_>, at: Position, layer: Layer) {
        ctx.play(SoundEffect::Rotate);
        ctx.morph(at, layer, self.clone().facing(self.direction().clockwise()));
    }

    /// One step of cracked-wall decay.
    fn crack(&self, ctx: &mut TurnContext<'_>, at: Position, layer: Layer) {
        ctx.play(SoundEffect::Crack);
        match self.kind() {
            TileKind::CrackedWall => ctx.morph(at, layer, self.morphed(TileKind::DamagedWall)),
            TileKind::DamagedWall => ctx.morph(at, layer, self.morphed(TileKind::CrumblingWall)),
            _ => ctx.destroy_object(at, layer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::ports::RecordingPorts;
    use crate::state::{GameState, KeyColor};

    struct Fixture {
        state: GameState,
        ports: RecordingPorts,
        config: GameConfig,
    }

    impl Fixture {
        fn new(layout: &str) -> Self {
            Self {
                state: GameState::from_layout(layout).unwrap(),
                ports: RecordingPorts::new(),
                config: GameConfig::default(),
            }
        }

        fn ctx(&mut self) -> TurnContext<'_> {
            TurnContext::new(&mut self.state, &mut self.ports, &self.config)
        }

        fn kind(&self, x: i32, y: i32, layer: Layer) -> TileKind {
            self.state.arena.get(Position::new(x, y, 0), layer).unwrap().kind()
        }
    }

    #[test]
    fn disruptor_swaps_wall_and_timer_restores_it() {
        let mut fx = Fixture::new(">.#\n");
        let at = Position::new(2, 0, 0);
        let wall = Tile::wall();
        let result = wall.laser_entered(&mut fx.ctx(), at, Layer::LowerObjects, 1, 0, LaserType::Disruptor, 0);
        assert_eq!(result, Ok(Direction::None));
        assert_eq!(fx.kind(2, 0, Layer::LowerObjects), TileKind::DisruptedWall);

        let disrupted = fx.state.arena.get(at, Layer::LowerObjects).unwrap().clone();
        assert!(!disrupted.is_solid());
        disrupted.timer_expired(&mut fx.ctx(), at, Layer::LowerObjects);
        assert_eq!(fx.kind(2, 0, Layer::LowerObjects), TileKind::Wall);
    }

    #[test]
    fn weak_laser_does_not_move_metal() {
        let mut fx = Fixture::new(">.B.\n");
        let at = Position::new(2, 0, 0);
        let mut boxed = Tile::new(TileKind::Box);
        boxed.set_material(Material::Metallic);
        let mut ctx = fx.ctx();
        let result = boxed.laser_entered(&mut ctx, at, Layer::LowerObjects, 1, 0, LaserType::Green, 1);
        assert_eq!(result, Ok(Direction::None));
        assert!(ctx.take_requests().is_empty());
        assert!(fx.ports.heard(SoundEffect::LaserDie));
    }

    #[test]
    fn blue_laser_pulls_plain_box_and_pushes_magnetic_box() {
        let mut fx = Fixture::new(">..B.\n");
        let at = Position::new(3, 0, 0);
        let mut ctx = fx.ctx();
        Tile::new(TileKind::Box)
            .laser_entered(&mut ctx, at, Layer::LowerObjects, 1, 0, LaserType::Blue, 1)
            .unwrap();
        Tile::new(TileKind::MagneticBox)
            .laser_entered(&mut ctx, at, Layer::LowerObjects, 1, 0, LaserType::Blue, 1)
            .unwrap();
        assert_eq!(
            ctx.take_requests(),
            vec![
                Request::PushObject {
                    origin: at,
                    destination: Position::new(2, 0, 0)
                },
                Request::PushObject {
                    origin: at,
                    destination: Position::new(4, 0, 0)
                },
            ]
        );
    }

    #[test]
    fn blocked_box_is_crushed_by_power_laser() {
        let mut fx = Fixture::new(">.B#\n");
        let at = Position::new(2, 0, 0);
        Tile::new(TileKind::Box)
            .laser_entered(&mut fx.ctx(), at, Layer::LowerObjects, 1, 0, LaserType::Power, 5)
            .unwrap();
        assert_eq!(fx.kind(2, 0, Layer::LowerObjects), TileKind::Empty);
        assert!(fx.ports.heard(SoundEffect::Crush));
    }

    #[test]
    fn anti_tank_dies_when_shot_in_the_face() {
        let mut fx = Fixture::new(">.A\n");
        let at = Position::new(2, 0, 0);
        let anti = Tile::anti_tank(Direction::West);
        anti.laser_entered(&mut fx.ctx(), at, Layer::LowerObjects, 1, 0, LaserType::Red, 1)
            .unwrap();
        assert_eq!(fx.kind(2, 0, Layer::LowerObjects), TileKind::DeadAntiTank);
    }

    #[test]
    fn stunner_stuns_then_wears_off() {
        let mut fx = Fixture::new(">.E\n");
        let at = Position::new(2, 0, 0);
        Tile::anti_tank(Direction::East)
            .laser_entered(&mut fx.ctx(), at, Layer::LowerObjects, 1, 0, LaserType::Stunner, 0)
            .unwrap();
        let stunned = fx.state.arena.get(at, Layer::LowerObjects).unwrap().clone();
        assert_eq!(stunned.kind(), TileKind::StunnedAntiTank);
        assert_eq!(stunned.timer(), Some(GameConfig::STUN_TICKS));
        stunned.timer_expired(&mut fx.ctx(), at, Layer::LowerObjects);
        let revived = fx.state.arena.get(at, Layer::LowerObjects).unwrap();
        assert_eq!(revived.kind(), TileKind::AntiTank);
        assert_eq!(revived.direction(), Direction::East);
    }

    #[test]
    fn mirror_reflects_northbound_bolt_east() {
        let mut fx = Fixture::new("1\n^\n");
        let at = Position::ORIGIN;
        let mirror = Tile::mirror(Direction::NorthEast);
        let mut ctx = fx.ctx();
        let entered = mirror
            .laser_entered(&mut ctx, at, Layer::LowerObjects, 0, -1, LaserType::Green, 1)
            .unwrap();
        assert_eq!(entered, Direction::NorthEast);
        assert_eq!(mirror.laser_exited(&mut ctx, (0, -1), entered), Direction::East);
    }

    #[test]
    fn rotary_mirror_reflects_front_and_turns_when_struck_behind() {
        let mut fx = Fixture::new("..\n^.\n");
        let at = Position::ORIGIN;
        let rotary = Tile::rotary_mirror(Direction::NorthEast);
        fx.state.arena.morph(at, Layer::LowerObjects, rotary.clone());
        let mut ctx = fx.ctx();
        let entered = rotary
            .laser_entered(&mut ctx, at, Layer::LowerObjects, 0, -1, LaserType::Green, 1)
            .unwrap();
        assert_eq!(rotary.laser_exited(&mut ctx, (0, -1), entered), Direction::East);

        let absorbed = rotary
            .laser_entered(&mut ctx, at, Layer::LowerObjects, -1, 0, LaserType::Green, 1)
            .unwrap();
        assert_eq!(absorbed, Direction::None);
        let turned = fx.state.arena.get(at, Layer::LowerObjects).unwrap();
        assert_eq!(turned.kind(), TileKind::RotaryMirror);
        assert_eq!(turned.direction(), Direction::SouthEast);
        assert!(fx.ports.heard(SoundEffect::Rotate));
    }

    #[test]
    fn bombs_turn_rotary_mirrors_and_missiles_break_them() {
        let mut fx = Fixture::new(">.\n");
        let at = Position::new(1, 0, 0);
        let rotary = Tile::rotary_mirror(Direction::NorthWest);
        let reacted = rotary
            .range_action(&mut fx.ctx(), at, Layer::LowerObjects, Item::HeatBomb)
            .unwrap();
        assert!(reacted);
        let turned = fx.state.arena.get(at, Layer::LowerObjects).unwrap().clone();
        assert_eq!(turned.direction(), Direction::NorthEast);

        turned
            .laser_entered(&mut fx.ctx(), at, Layer::LowerObjects, 1, 0, LaserType::Missile, 1)
            .unwrap();
        assert_eq!(fx.kind(1, 0, Layer::LowerObjects), TileKind::Empty);
    }

    #[test]
    fn stairs_carry_the_tank_between_floors() {
        let mut fx = Fixture::new(">.\n-\n..\n");
        let at = Position::ORIGIN;
        Tile::new(TileKind::StairsUp).post_move(&mut fx.ctx(), at, Layer::LowerObjects);
        assert_eq!(fx.state.tank, Position::new(0, 0, 1));
        assert!(fx.ports.heard(SoundEffect::Up));

        let upstairs = fx.state.tank;
        Tile::new(TileKind::StairsUp).post_move(&mut fx.ctx(), upstairs, Layer::LowerObjects);
        assert_eq!(fx.state.tank, upstairs);

        Tile::new(TileKind::StairsDown).post_move(&mut fx.ctx(), upstairs, Layer::LowerObjects);
        assert_eq!(fx.state.tank, Position::ORIGIN);
        assert_eq!(fx.ports.count(SoundEffect::Down), 1);
    }

    #[test]
    fn keys_open_matching_doors() {
        let mut fx = Fixture::new(">kD\n");
        let mut ctx = fx.ctx();
        Tile::new(TileKind::Key(KeyColor::Red)).post_move(&mut ctx, Position::new(1, 0, 0), Layer::LowerObjects);
        Tile::new(TileKind::Door(KeyColor::Red)).post_move(&mut ctx, Position::new(2, 0, 0), Layer::LowerObjects);
        assert_eq!(fx.kind(1, 0, Layer::LowerObjects), TileKind::Empty);
        assert_eq!(fx.kind(2, 0, Layer::LowerObjects), TileKind::Empty);
        assert_eq!(fx.state.inventory.keys.count(KeyColor::Red), 0);
    }

    #[test]
    fn wooden_box_sinking_in_water_leaves_bridge() {
        let mut fx = Fixture::new(">W~\n");
        let at = Position::new(2, 0, 0);
        fx.state
            .arena
            .morph(at, Layer::LowerObjects, Tile::new(TileKind::WoodenBox));
        let water = Tile::new(TileKind::Water);
        let kept = water.push_into(&mut fx.ctx(), &Tile::new(TileKind::WoodenBox), at);
        assert!(!kept);
        assert_eq!(fx.kind(2, 0, Layer::LowerGround), TileKind::Bridge);
        assert_eq!(fx.kind(2, 0, Layer::LowerObjects), TileKind::Empty);
    }

    #[test]
    fn heat_bomb_exposes_walls() {
        let mut fx = Fixture::new(">#\n");
        let at = Position::new(1, 0, 0);
        let reacted = Tile::wall()
            .range_action(&mut fx.ctx(), at, Layer::LowerObjects, Item::HeatBomb)
            .unwrap();
        assert!(reacted);
        assert_eq!(fx.kind(1, 0, Layer::LowerObjects), TileKind::HotWall);
    }
}
