//! Per-turn handle passed into every tile hook.
//!
//! Hooks never reach the controller directly. They mutate the world through
//! this context and leave [`Request`]s that the controller drains between
//! phases, so the tracker lists are never modified mid-iteration.

use std::collections::{HashSet, VecDeque};

use arrayvec::ArrayVec;
use tracing::{debug, trace};

use crate::arena::{Arena, Layer};
use crate::config::GameConfig;
use crate::direction::Direction;
use crate::engine::{LaserType, Shooter};
use crate::error::{HookResult, TurnInterrupt};
use crate::ports::{GamePorts, SoundEffect};
use crate::state::{Cheats, GameState, KeyRing, Position};
use crate::tile::{Tile, TileKind, TypeFlags};

/// Work a hook asks the controller to start once the current phase ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    /// Start sliding the object at `origin` towards `destination`.
    PushObject {
        origin: Position,
        destination: Position,
    },
    FireLaser {
        laser: LaserType,
        origin: Position,
        direction: Direction,
        shooter: Shooter,
    },
    /// Stop every object tracker without further callbacks.
    HaltObjects,
    /// The tank entered a frost field and keeps sliding.
    FrozenMovement,
}

pub struct TurnContext<'a> {
    pub state: &'a mut GameState,
    pub ports: &'a mut dyn GamePorts,
    pub config: &'a GameConfig,
    requests: Vec<Request>,
}

impl<'a> TurnContext<'a> {
    pub fn new(state: &'a mut GameState, ports: &'a mut dyn GamePorts, config: &'a GameConfig) -> Self {
        Self {
            state,
            ports,
            config,
            requests: Vec::new(),
        }
    }

    pub fn arena(&self) -> &Arena {
        &self.state.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.state.arena
    }

    /// Copy of a tile; `None` off the grid.
    pub fn tile(&self, position: Position, layer: Layer) -> Option<Tile> {
        self.state.arena.get(position, layer).cloned()
    }

    pub fn keys(&self) -> &KeyRing {
        &self.state.inventory.keys
    }

    pub fn cheats(&self) -> Cheats {
        self.state.cheats
    }

    pub fn tank_position(&self) -> Position {
        self.state.tank
    }

    pub fn play(&mut self, sound: SoundEffect) {
        trace!(target: "lasertank::sound", %sound);
        self.ports.play_sound(sound);
    }

    pub fn message(&mut self, message: &str) {
        self.ports.show_message(message);
    }

    pub fn morph(&mut self, position: Position, layer: Layer, tile: Tile) {
        self.state.arena.morph(position, layer, tile);
    }

    /// Whether the tank may enter a cell holding `tile`.
    pub fn is_passable(&self, tile: &Tile) -> bool {
        self.state.cheats.contains(Cheats::GHOSTLY)
            || !tile.is_conditionally_solid(&self.state.inventory.keys)
            || tile.is_tank()
    }

    /// Lifts or drops the tank to the same column on floor `z`.
    ///
    /// Refused when the floor does not exist or something there blocks the tank.
    pub fn change_floor(&mut self, z: i32) -> bool {
        let origin = self.state.tank;
        let Some(target) = self.arena().normalize(Position::new(origin.x, origin.y, z)) else {
            return false;
        };
        let open = Layer::ALL.iter().all(|&layer| {
            self.state
                .arena
                .get(target, layer)
                .is_some_and(|tile| self.is_passable(tile))
        });
        let Some(mut tank) = self.tile(origin, Layer::UpperObjects).filter(Tile::is_tank) else {
            return false;
        };
        let Some(landing) = self.tile(target, Layer::UpperObjects).filter(|_| open) else {
            trace!(target: "lasertank::turn", %origin, z, "floor change blocked");
            return false;
        };
        let vacated = tank.take_occupant();
        self.morph(origin, Layer::UpperObjects, vacated);
        tank.set_occupant(landing);
        self.morph(target, Layer::UpperObjects, tank);
        self.state.tank = target;
        debug!(target: "lasertank::turn", %origin, %target, "floor change");
        true
    }

    /// Ends the attempt. Fails with [`TurnInterrupt::AlreadyDead`] when the tank died earlier this turn.
    pub fn game_over(&mut self) -> HookResult<()> {
        if self.state.cheats.contains(Cheats::INVINCIBLE) {
            debug!(target: "lasertank::turn", "game over ignored (invincible)");
            return Ok(());
        }
        if self.state.status.dead {
            return Err(TurnInterrupt::AlreadyDead);
        }
        self.state.status.dead = true;
        self.state.decays.clear();
        self.play(SoundEffect::Dead);
        self.ports.game_over();
        debug!(target: "lasertank::turn", tank = %self.state.tank, "game over");
        Ok(())
    }

    pub fn request(&mut self, request: Request) {
        self.requests.push(request);
    }

    pub fn push_object(&mut self, origin: Position, dx: i32, dy: i32) {
        self.request(Request::PushObject {
            origin,
            destination: origin.offset(dx, dy),
        });
    }

    pub fn fire_laser(&mut self, laser: LaserType, origin: Position, direction: Direction, shooter: Shooter) {
        self.request(Request::FireLaser {
            laser,
            origin,
            direction,
            shooter,
        });
    }

    pub fn schedule_decay(&mut self, position: Position) {
        if !self.state.decays.contains(&position) {
            self.state.decays.push(position);
        }
    }

    /// Replaces the tile with whatever it was standing on.
    pub fn destroy_object(&mut self, position: Position, layer: Layer) {
        let remains = self
            .tile(position, layer)
            .map_or_else(Tile::empty, |tile| tile.occupant_or_empty());
        self.morph(position, layer, remains);
    }

    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.requests)
    }

    /// Blows up the barrel at `origin` and every barrel chained to it.
    ///
    /// Exploding barrels propagate to barrels on their four neighbours. The
    /// chain is walked breadth-first; the tank dies at most once no matter how
    /// many blasts reach it.
    pub fn detonate(&mut self, origin: Position, layer: Layer) -> HookResult<()> {
        let radius = self.config.explosion_radius;
        let tank = self.state.tank;
        let mut queue = VecDeque::from([origin]);
        let mut visited = HashSet::from([origin]);
        let mut tank_killed = false;

        while let Some(at) = queue.pop_front() {
            let Some(barrel) = self.tile(at, layer) else {
                continue;
            };
            if !barrel.is_of_type(TypeFlags::BARREL) {
                continue;
            }
            let chains = barrel.kind() == TileKind::ExplodingBarrel;
            self.play(if chains {
                SoundEffect::Boom
            } else {
                SoundEffect::Barrel
            });
            self.destroy_object(at, layer);
            tank_killed |= self.state.arena.circular_scan_tank(at, radius, tank);

            if chains {
                let neighbours: ArrayVec<Position, 4> = Direction::ORTHOGONAL
                    .iter()
                    .filter_map(|direction| {
                        let (dx, dy) = direction.delta();
                        self.state.arena.normalize(at.offset(dx, dy))
                    })
                    .collect();
                for next in neighbours {
                    let is_barrel = self
                        .state
                        .arena
                        .get(next, layer)
                        .is_some_and(|tile| tile.is_of_type(TypeFlags::BARREL));
                    if is_barrel && visited.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }

        debug!(target: "lasertank::turn", %origin, blasts = visited.len(), tank_killed, "detonation");
        if tank_killed {
            self.game_over()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RecordingPorts;

    fn with_context<R>(layout: &str, f: impl FnOnce(&mut TurnContext<'_>) -> R) -> (GameState, RecordingPorts, R) {
        let mut state = GameState::from_layout(layout).unwrap();
        let mut ports = RecordingPorts::new();
        let config = GameConfig::default();
        let result = {
            let mut ctx = TurnContext::new(&mut state, &mut ports, &config);
            f(&mut ctx)
        };
        (state, ports, result)
    }

    #[test]
    fn second_game_over_is_interrupted() {
        let (state, ports, (first, second)) = with_context(">.\n", |ctx| (ctx.game_over(), ctx.game_over()));
        assert_eq!(first, Ok(()));
        assert_eq!(second, Err(TurnInterrupt::AlreadyDead));
        assert!(state.status.dead);
        assert_eq!(ports.deaths, 1);
    }

    #[test]
    fn invincible_tank_survives() {
        let mut state = GameState::from_layout(">.\n")
            .unwrap()
            .with_cheats(Cheats::INVINCIBLE);
        let mut ports = RecordingPorts::new();
        let config = GameConfig::default();
        let mut ctx = TurnContext::new(&mut state, &mut ports, &config);
        assert_eq!(ctx.game_over(), Ok(()));
        assert!(!state.status.dead);
    }

    #[test]
    fn chain_reaches_neighbouring_barrels_only() {
        let (state, _, result) = with_context("xxb.b\n.....\n....>\n", |ctx| {
            ctx.detonate(Position::ORIGIN, Layer::LowerObjects)
        });
        assert_eq!(result, Ok(()));
        let kind = |x| state.arena.get(Position::new(x, 0, 0), Layer::LowerObjects).unwrap().kind();
        assert_eq!(kind(0), TileKind::Empty);
        assert_eq!(kind(1), TileKind::Empty);
        assert_eq!(kind(2), TileKind::Empty);
        assert_eq!(kind(4), TileKind::Barrel);
        assert!(!state.status.dead);
    }

    #[test]
    fn chain_kills_tank_once() {
        let (state, ports, result) = with_context("xxx\n>..\n", |ctx| {
            ctx.detonate(Position::ORIGIN, Layer::LowerObjects)
        });
        assert_eq!(result, Ok(()));
        assert!(state.status.dead);
        assert_eq!(ports.deaths, 1);
        assert_eq!(ports.count(SoundEffect::Boom), 3);
    }

    #[test]
    fn floor_change_carries_the_tank_up_and_back() {
        let (state, _, moved) = with_context(">.\n-\n..\n", |ctx| (ctx.change_floor(1), ctx.change_floor(0)));
        assert_eq!(moved, (true, true));
        assert_eq!(state.tank, Position::ORIGIN);
        assert!(state.arena.get(Position::ORIGIN, Layer::UpperObjects).unwrap().is_tank());
        assert!(state.arena.get(Position::new(0, 0, 1), Layer::UpperObjects).unwrap().is_empty());
    }

    #[test]
    fn floor_change_refused_when_blocked_or_missing() {
        let (state, _, moved) = with_context(">.\n-\n#.\n", |ctx| (ctx.change_floor(1), ctx.change_floor(-1)));
        assert_eq!(moved, (false, false));
        assert_eq!(state.tank, Position::ORIGIN);
    }

    #[test]
    fn destroyed_object_leaves_its_occupant() {
        let (state, _, _) = with_context(">B\n", |ctx| {
            let at = Position::new(1, 0, 0);
            let mut boxed = ctx.tile(at, Layer::LowerObjects).unwrap();
            boxed.set_occupant(Tile::new(TileKind::Flag));
            ctx.morph(at, Layer::LowerObjects, boxed);
            ctx.destroy_object(at, Layer::LowerObjects);
        });
        let left = state.arena.get(Position::new(1, 0, 0), Layer::LowerObjects).unwrap();
        assert_eq!(left.kind(), TileKind::Flag);
    }
}
