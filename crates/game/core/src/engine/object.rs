//! Pushed-object tracking: one tracker per sliding box, mirror or anti-tank.

use tracing::trace;

use crate::arena::Layer;
use crate::context::TurnContext;
use crate::error::HookResult;
use crate::state::Position;
use crate::tile::{Tile, TypeFlags};

/// Pushed objects live on this layer.
const OBJECT_LAYER: Layer = Layer::LowerObjects;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectTracker {
    position: Position,
    step: (i32, i32),
    /// Cells covered per step: the jump distance for jump boxes, otherwise one.
    multiplier: i32,
    moving: bool,
    checking: bool,
    newly_activated: bool,
    below_upper: Tile,
    below_lower: Tile,
}

impl ObjectTracker {
    pub fn new(origin: Position, step: (i32, i32), multiplier: i32) -> Self {
        Self {
            position: origin,
            step,
            multiplier,
            moving: step != (0, 0) && multiplier > 0,
            checking: true,
            newly_activated: true,
            below_upper: Tile::empty(),
            below_lower: Tile::ground(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn step(&self) -> (i32, i32) {
        self.step
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn is_checking(&self) -> bool {
        self.checking
    }

    /// Stops without further callbacks.
    pub fn halt(&mut self) {
        self.moving = false;
        self.checking = false;
    }

    /// Moves the object one step, or reports the collision that stopped it.
    pub fn advance(&mut self, ctx: &mut TurnContext<'_>) -> HookResult<()> {
        if !self.moving {
            return Ok(());
        }
        let origin = self.position;
        let Some(object) = ctx.tile(origin, OBJECT_LAYER).filter(Tile::can_move) else {
            trace!(target: "lasertank::object", %origin, "object vanished");
            self.halt();
            return Ok(());
        };

        let (dx, dy) = self.step;
        let raw = origin.offset(dx * self.multiplier, dy * self.multiplier);
        let Some(destination) = ctx.arena().normalize(raw) else {
            trace!(target: "lasertank::object", %origin, "push off the arena");
            self.halt();
            return Ok(());
        };
        let (Some(displaced), Some(below_lower), Some(below_upper)) = (
            ctx.tile(destination, OBJECT_LAYER),
            ctx.tile(destination, Layer::LowerGround),
            ctx.tile(destination, Layer::UpperGround),
        ) else {
            self.halt();
            return Ok(());
        };

        let passable = destination != ctx.tank_position() && (!displaced.is_solid() || displaced.is_tank());
        if passable {
            self.slide(ctx, object, origin, destination, displaced, below_lower, below_upper);
        } else {
            self.collide(ctx, &object, origin, destination, &displaced)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn slide(
        &mut self,
        ctx: &mut TurnContext<'_>,
        mut object: Tile,
        origin: Position,
        destination: Position,
        displaced: Tile,
        below_lower: Tile,
        below_upper: Tile,
    ) {
        for layer in [Layer::LowerGround, Layer::UpperGround] {
            if let Some(ground) = ctx.tile(origin, layer) {
                ground.push_out(ctx, origin);
            }
        }

        let vacated = object.take_occupant();
        vacated.push_out(ctx, origin);
        ctx.morph(origin, OBJECT_LAYER, vacated);
        object.set_occupant(displaced.clone());
        ctx.morph(destination, OBJECT_LAYER, object.clone());
        self.position = destination;
        trace!(target: "lasertank::object", %origin, %destination, kind = %object.kind(), "slid");

        let settled = below_lower.push_into(ctx, &object, destination)
            && below_upper.push_into(ctx, &object, destination)
            && displaced.push_into(ctx, &object, destination);
        self.below_lower = below_lower;
        self.below_upper = below_upper;
        if !settled {
            self.halt();
            return;
        }

        let conveys = |mover: TypeFlags, passenger: TypeFlags| {
            self.below_upper.is_of_type(mover) && object.is_of_type(passenger)
        };
        let redirect = if object.is_of_type(TypeFlags::ICY) {
            None
        } else if conveys(TypeFlags::ANTI_MOVER, TypeFlags::ANTI)
            || conveys(TypeFlags::BOX_MOVER, TypeFlags::BOX)
            || conveys(TypeFlags::MIRROR_MOVER, TypeFlags::MOVABLE_MIRROR)
        {
            Some(self.below_upper.direction().delta())
        } else {
            self.moving = !object.grips_ground()
                && !(self.below_lower.has_friction() && self.below_upper.has_friction());
            None
        };
        if let Some(step) = redirect {
            self.step = step;
            self.moving = step != (0, 0);
        }
    }

    fn collide(
        &mut self,
        ctx: &mut TurnContext<'_>,
        object: &Tile,
        origin: Position,
        destination: Position,
        blocker: &Tile,
    ) -> HookResult<()> {
        trace!(target: "lasertank::object", %origin, %destination, blocker = %blocker.kind(), "blocked");
        for layer in [Layer::LowerGround, Layer::UpperGround] {
            if let Some(ground) = ctx.tile(origin, layer) {
                ground.push_into(ctx, object, origin);
            }
        }
        self.halt();
        blocker.push_collide(ctx, destination, OBJECT_LAYER)?;
        object.push_collide(ctx, origin, OBJECT_LAYER)
    }

    /// First-tick rule: an object that just landed on frictionless ground slides one more cell.
    pub fn continue_on_ice(&mut self, ctx: &mut TurnContext<'_>) -> HookResult<()> {
        if self.newly_activated
            && self.moving
            && !(self.below_lower.has_friction() && self.below_upper.has_friction())
        {
            self.advance(ctx)?;
        }
        self.checking = self.moving;
        Ok(())
    }

    /// End-of-iteration bookkeeping.
    pub fn settle(&mut self) {
        if !self.checking {
            self.moving = false;
        }
        self.newly_activated = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::ports::{RecordingPorts, SoundEffect};
    use crate::state::GameState;
    use crate::tile::TileKind;

    /// Pushes the object at `origin` east and runs the tracker until it stops.
    fn push_east(layout: &str, origin: Position) -> (GameState, ObjectTracker, usize) {
        let mut state = GameState::from_layout(layout).unwrap();
        let mut ports = RecordingPorts::new();
        let config = GameConfig::default();
        let reach = state
            .arena
            .get(origin, Layer::LowerObjects)
            .map_or(1, Tile::push_reach);
        let mut tracker = ObjectTracker::new(origin, (1, 0), reach);
        let mut ticks = 0;
        {
            let mut ctx = TurnContext::new(&mut state, &mut ports, &config);
            while tracker.is_moving() && ticks < 32 {
                tracker.advance(&mut ctx).unwrap();
                tracker.continue_on_ice(&mut ctx).unwrap();
                tracker.settle();
                ticks += 1;
            }
        }
        (state, tracker, ticks)
    }

    fn kind_at(state: &GameState, x: i32) -> TileKind {
        state
            .arena
            .get(Position::new(x, 0, 0), Layer::LowerObjects)
            .unwrap()
            .kind()
    }

    #[test]
    fn plain_floor_stops_after_one_cell() {
        let (state, tracker, _) = push_east(">.B...\n", Position::new(2, 0, 0));
        assert_eq!(tracker.position(), Position::new(3, 0, 0));
        assert_eq!(kind_at(&state, 2), TileKind::Empty);
        assert_eq!(kind_at(&state, 3), TileKind::Box);
    }

    #[test]
    fn single_ice_tile_gives_double_step_in_one_tick() {
        let (state, tracker, ticks) = push_east(">.B*..\n", Position::new(2, 0, 0));
        assert_eq!(tracker.position(), Position::new(4, 0, 0));
        assert_eq!(kind_at(&state, 4), TileKind::Box);
        assert_eq!(ticks, 1);
    }

    #[test]
    fn icy_box_slides_until_blocked() {
        let (state, tracker, _) = push_east(">I...#\n", Position::new(1, 0, 0));
        assert_eq!(tracker.position(), Position::new(4, 0, 0));
        assert_eq!(kind_at(&state, 4), TileKind::IcyBox);
    }

    #[test]
    fn sticky_box_stops_on_ice() {
        let (state, tracker, ticks) = push_east(">G**.\n", Position::new(1, 0, 0));
        assert_eq!(tracker.position(), Position::new(2, 0, 0));
        assert_eq!(kind_at(&state, 2), TileKind::StickyBox);
        assert_eq!(ticks, 1);
    }

    #[test]
    fn jump_box_hops_over_obstacle() {
        let (state, tracker, _) = push_east(">J#..\n", Position::new(1, 0, 0));
        assert_eq!(tracker.position(), Position::new(3, 0, 0));
        assert_eq!(kind_at(&state, 2), TileKind::Wall);
        assert_eq!(kind_at(&state, 3), TileKind::JumpBox);
    }

    #[test]
    fn blocked_push_leaves_object_in_place() {
        let (state, tracker, _) = push_east(">B#\n", Position::new(1, 0, 0));
        assert_eq!(tracker.position(), Position::new(1, 0, 0));
        assert!(!tracker.is_moving());
        assert_eq!(kind_at(&state, 1), TileKind::Box);
    }

    #[test]
    fn push_off_the_edge_fails_without_change() {
        let (state, tracker, _) = push_east(">.B\n", Position::new(2, 0, 0));
        assert_eq!(tracker.position(), Position::new(2, 0, 0));
        assert_eq!(kind_at(&state, 2), TileKind::Box);
    }

    #[test]
    fn box_keeps_key_it_slid_over() {
        let (state, _, _) = push_east(">Bk.\n", Position::new(1, 0, 0));
        let boxed = state
            .arena
            .get(Position::new(2, 0, 0), Layer::LowerObjects)
            .unwrap();
        assert_eq!(boxed.kind(), TileKind::Box);
        assert!(matches!(boxed.occupant().map(Tile::kind), Some(TileKind::Key(_))));
    }

    #[test]
    fn box_leaving_thin_ice_uncovers_occupant_over_water() {
        let mut state = GameState::from_layout(">B..\n").unwrap();
        let origin = Position::new(1, 0, 0);
        state.arena.morph(origin, Layer::LowerGround, Tile::new(TileKind::ThinIce));
        let mut boxed = Tile::new(TileKind::Box);
        boxed.set_occupant(Tile::new(TileKind::Flag));
        state.arena.morph(origin, Layer::LowerObjects, boxed);

        let mut ports = RecordingPorts::new();
        let config = GameConfig::default();
        let mut tracker = ObjectTracker::new(origin, (1, 0), 1);
        {
            let mut ctx = TurnContext::new(&mut state, &mut ports, &config);
            tracker.advance(&mut ctx).unwrap();
        }
        assert_eq!(tracker.position(), Position::new(2, 0, 0));
        assert_eq!(kind_at(&state, 1), TileKind::Flag);
        let ground = state.arena.get(origin, Layer::LowerGround).unwrap();
        assert_eq!(ground.kind(), TileKind::Water);
        assert!(ports.heard(SoundEffect::Crack));
    }

    #[test]
    fn box_sinks_in_water() {
        let (state, tracker, _) = push_east(">B~.\n", Position::new(1, 0, 0));
        assert!(!tracker.is_moving());
        assert_eq!(kind_at(&state, 2), TileKind::Empty);
        let ground = state
            .arena
            .get(Position::new(2, 0, 0), Layer::LowerGround)
            .unwrap();
        assert_eq!(ground.kind(), TileKind::Ground);
    }
}
