//! Single-step tank movement and the continuation rules around it.

use tracing::{debug, trace};

use crate::arena::Layer;
use crate::context::TurnContext;
use crate::direction::Direction;
use crate::error::HookResult;
use crate::ports::SoundEffect;
use crate::state::Position;
use crate::tile::{TankForm, Tile, TileKind, TypeFlags};

/// Pending tank movement for the current turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TankMovement {
    pub step: (i32, i32),
    /// Another step is due on the next iteration.
    pub loop_check: bool,
    /// The last step succeeded.
    pub proceed: bool,
    /// The tank stands on a mover that set `step`.
    pub mover: bool,
    /// Frost-field slide; ignores friction until blocked.
    pub frozen: bool,
    /// Magnet pull; counts as a non-move action for timers.
    pub magnet: bool,
}

impl TankMovement {
    pub fn new(step: (i32, i32)) -> Self {
        Self {
            step,
            loop_check: true,
            proceed: false,
            mover: false,
            frozen: false,
            magnet: false,
        }
    }

    pub fn frozen(step: (i32, i32)) -> Self {
        Self {
            frozen: true,
            ..Self::new(step)
        }
    }

    /// Whether this movement advances move-class timers.
    pub fn is_move_class(&self) -> bool {
        !self.magnet && self.step.0.abs() <= 1 && self.step.1.abs() <= 1
    }

    fn target(&self, ctx: &TurnContext<'_>) -> Option<Position> {
        let (dx, dy) = self.step;
        ctx.arena().normalize(ctx.tank_position().offset(dx, dy))
    }

    /// Whether all four tiles at the next cell admit the tank.
    pub fn can_move_there(&self, ctx: &TurnContext<'_>) -> bool {
        let Some(target) = self.target(ctx) else {
            return false;
        };
        Layer::ALL.iter().all(|&layer| {
            ctx.state
                .arena
                .get(target, layer)
                .is_some_and(|tile| ctx.is_passable(tile))
        })
    }

    /// Performs one grid step. Returns the four tiles of the target cell when it exists.
    pub fn step_tank(&mut self, ctx: &mut TurnContext<'_>) -> HookResult<Option<[Tile; 4]>> {
        self.proceed = true;
        self.mover = false;
        let origin = ctx.tank_position();
        let Some(target) = self.target(ctx) else {
            trace!(target: "lasertank::movement", %origin, step = ?self.step, "outside arena");
            self.fail(ctx, None);
            return Ok(None);
        };
        let tiles = Layer::ALL.map(|layer| ctx.tile(target, layer).unwrap_or_else(Tile::wall));

        if !self.can_move_there(ctx) {
            self.fail(ctx, Some((target, &tiles)));
            return Ok(Some(tiles));
        }

        let pending: Vec<Position> = ctx.state.decays.drain(..).collect();
        for at in pending {
            if let Some(ice) = ctx.tile(at, Layer::LowerGround)
                && ice.kind() == TileKind::ThinIce
            {
                ice.push_out(ctx, at);
            }
        }

        let Some(mut tank) = ctx.tile(origin, Layer::UpperObjects).filter(Tile::is_tank) else {
            self.proceed = false;
            return Ok(Some(tiles));
        };
        let vacated = tank.take_occupant();
        ctx.morph(origin, Layer::UpperObjects, vacated);
        tank.set_occupant(tiles[Layer::UpperObjects.index()].clone());
        ctx.morph(target, Layer::UpperObjects, tank);
        ctx.state.tank = target;
        trace!(target: "lasertank::movement", %origin, %target, "stepped");

        for (layer, tile) in Layer::ALL.into_iter().zip(tiles.iter()) {
            tile.post_move(ctx, target, layer);
        }

        let belt = &tiles[Layer::UpperGround.index()];
        if belt.is_of_type(TypeFlags::MOVER) && matches!(belt.kind(), TileKind::TankMover | TileKind::AnyMover) {
            self.step = belt.direction().delta();
            self.mover = true;
        }
        Ok(Some(tiles))
    }

    fn fail(&mut self, ctx: &mut TurnContext<'_>, blocked: Option<(Position, &[Tile; 4])>) {
        self.proceed = false;
        ctx.play(SoundEffect::Bump);
        if let Some((target, tiles)) = blocked {
            for (layer, tile) in Layer::ALL.into_iter().zip(tiles.iter()) {
                tile.move_failed(ctx, target, layer);
            }
        }
        let under = ctx.tile(ctx.tank_position(), Layer::UpperGround);
        if let Some(belt) = under
            && matches!(belt.kind(), TileKind::TankMover | TileKind::AnyMover)
        {
            self.step = belt.direction().delta();
            self.mover = true;
        }
    }

    /// Recomputes whether the tank keeps going after this iteration.
    pub fn update_loop_check(&mut self, ctx: &TurnContext<'_>) {
        let tank = ctx.tank_position();
        let slippery = [Layer::LowerGround, Layer::UpperGround].iter().any(|&layer| {
            ctx.state
                .arena
                .get(tank, layer)
                .is_some_and(|tile| !tile.has_friction())
        });
        self.loop_check =
            self.proceed && (slippery || self.mover || self.frozen) && self.can_move_there(ctx);
    }
}

/// Swaps the tank tile to `form`, keeping facing and occupant.
pub(crate) fn set_tank_form(ctx: &mut TurnContext<'_>, form: TankForm) {
    let at = ctx.tank_position();
    if let Some(tank) = ctx.tile(at, Layer::UpperObjects).filter(Tile::is_tank)
        && tank.tank_form() != Some(form)
    {
        debug!(target: "lasertank::movement", %at, ?form, "tank form");
        ctx.morph(at, Layer::UpperObjects, tank.with_tank_form(form));
    }
}

/// Points the tank at `direction` without moving it.
pub(crate) fn face(ctx: &mut TurnContext<'_>, direction: Direction) {
    let at = ctx.tank_position();
    if let Some(tank) = ctx.tile(at, Layer::UpperObjects).filter(Tile::is_tank)
        && tank.direction() != direction
    {
        ctx.morph(at, Layer::UpperObjects, tank.facing(direction));
    }
}
