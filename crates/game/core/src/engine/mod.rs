//! Turn resolution.
//!
//! The [`TurnController`] drives one player action to quiescence. Each call to
//! [`TurnController::iterate`] runs the phases in a fixed order: tank movement,
//! lasers, pushed objects, continuation rules, timers and enemy fire. Hooks never
//! touch the tracker lists directly; they leave requests on the
//! [`TurnContext`] that the controller drains between phases.

mod errors;
mod laser;
mod movement;
mod object;

pub use errors::{TurnError, TurnPhase};
pub use laser::{LaserTracker, LaserType, Shooter};
pub use object::ObjectTracker;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, trace, warn};

use crate::arena::Layer;
use crate::config::GameConfig;
use crate::context::{Request, TurnContext};
use crate::direction::{Direction, resolve_relative};
use crate::error::{HookResult, TurnInterrupt};
use crate::history::HistoryStatus;
use crate::ports::{GamePorts, SoundEffect};
use crate::state::{Cheats, GameState, Item, Position, ReplayEntry};
use crate::tile::{TankForm, Tile, TileKind};

use movement::TankMovement;

/// Summary of a resolved turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnOutcome {
    pub iterations: u32,
    /// The tank changed cells at least once.
    pub moved: bool,
    pub died: bool,
    pub solved: bool,
    pub aborted: bool,
}

/// Result of one controller iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    Running,
    Finished(TurnOutcome),
}

/// Shared cancellation flag, checked between phases.
#[derive(Clone, Debug, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct TurnController {
    config: GameConfig,
    lasers: Vec<LaserTracker>,
    objects: Vec<ObjectTracker>,
    movement: Option<TankMovement>,
    /// Mover step blocked earlier; retried as soon as the way clears.
    auto_move: Option<(i32, i32)>,
    abort: AbortHandle,
    iterations: u32,
    phase: TurnPhase,
    active: bool,
    moved: bool,
}

impl TurnController {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            lasers: Vec::new(),
            objects: Vec::new(),
            movement: None,
            auto_move: None,
            abort: AbortHandle::default(),
            iterations: 0,
            phase: TurnPhase::Movement,
            active: false,
            moved: false,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// A turn has begun and not yet reached quiescence.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn lasers(&self) -> &[LaserTracker] {
        &self.lasers
    }

    pub fn objects(&self) -> &[ObjectTracker] {
        &self.objects
    }

    pub fn has_auto_move(&self) -> bool {
        self.auto_move.is_some()
    }

    fn ensure_ready(&self, state: &GameState) -> Result<(), TurnError> {
        if state.status.dead {
            return Err(TurnError::PlayerDead);
        }
        if state.status.solved {
            return Err(TurnError::LevelSolved);
        }
        if self.active {
            return Err(TurnError::Busy);
        }
        if !state.tank_tile().is_some_and(Tile::is_tank) {
            return Err(TurnError::invalid_arena(format!("no tank at {}", state.tank)));
        }
        Ok(())
    }

    fn ensure_stocked(state: &GameState, ports: &mut dyn GamePorts, item: Item) -> Result<(), TurnError> {
        if state.inventory.available(item, state.cheats) {
            Ok(())
        } else {
            ports.show_message(item.out_of_stock_message());
            Err(TurnError::OutOfAmmo { item })
        }
    }

    /// Records history, spends ammunition and scores the action.
    fn commit(state: &mut GameState, status: HistoryStatus, item: Option<Item>, entry: ReplayEntry) {
        state.record_history(status);
        if let Some(item) = item {
            state.inventory.consume(item, state.cheats);
        }
        let (moves, shots, others) = status.class().score_delta();
        state.score.update(moves, shots, others);
        state.replay.push(entry);
    }

    fn start(&mut self) {
        self.abort.reset();
        self.active = true;
        self.iterations = 0;
        self.phase = TurnPhase::Movement;
        self.moved = false;
    }

    /// Starts a tank move.
    ///
    /// Offsets of magnitude 1 step, 2 boost and 3 pull towards the nearest
    /// magnetic tile in that direction. Exactly one axis may be non-zero.
    pub fn begin_movement(
        &mut self,
        state: &mut GameState,
        ports: &mut dyn GamePorts,
        dx: i32,
        dy: i32,
    ) -> Result<(), TurnError> {
        self.ensure_ready(state)?;
        let magnitude = match (dx, dy) {
            (0, d) | (d, 0) if (1..=3).contains(&d.abs()) => d.abs(),
            _ => return Err(TurnError::InvalidOffset { dx, dy }),
        };
        let item = match magnitude {
            2 => Some(Item::Boost),
            3 => Some(Item::Magnet),
            _ => None,
        };
        if let Some(item) = item {
            Self::ensure_stocked(state, ports, item)?;
        }
        let status = item.map_or(HistoryStatus::empty(), HistoryStatus::for_item);
        Self::commit(state, status, item, ReplayEntry::Move { dx, dy });

        let direction = resolve_relative(dx, dy);
        let config = self.config.clone();
        let mut ctx = TurnContext::new(state, ports, &config);
        movement::face(&mut ctx, direction);
        self.movement = match magnitude {
            3 => {
                let distance = ctx.arena().magnetic_distance(ctx.tank_position(), direction);
                if distance == 0 {
                    ctx.play(SoundEffect::Bump);
                    None
                } else {
                    ctx.play(SoundEffect::Magnet);
                    let (sx, sy) = direction.delta();
                    let mut movement = TankMovement::new((sx * distance, sy * distance));
                    movement.magnet = true;
                    Some(movement)
                }
            }
            2 => {
                ctx.play(SoundEffect::Boost);
                Some(TankMovement::new((dx, dy)))
            }
            _ => {
                ctx.play(SoundEffect::Move);
                Some(TankMovement::new((dx, dy)))
            }
        };
        debug!(target: "lasertank::turn", dx, dy, ?item, "movement begun");
        self.start();
        Ok(())
    }

    /// Starts a frost-field slide in the tank's facing direction.
    pub fn begin_frozen_movement(&mut self, state: &mut GameState, ports: &mut dyn GamePorts) -> Result<(), TurnError> {
        self.ensure_ready(state)?;
        let (dx, dy) = state.tank_direction().delta();
        Self::commit(state, HistoryStatus::empty(), None, ReplayEntry::Move { dx, dy });
        let config = self.config.clone();
        let mut ctx = TurnContext::new(state, ports, &config);
        self.freeze(&mut ctx);
        debug!(target: "lasertank::turn", dx, dy, "frozen movement begun");
        self.start();
        Ok(())
    }

    /// Fires a bolt.
    ///
    /// The tank's green laser is upgraded by its form: powerful tanks fire
    /// power lasers and disguised tanks red ones. An anti-tank shooter must be
    /// armed and is disarmed until its bolt ends.
    pub fn begin_laser_fire(
        &mut self,
        state: &mut GameState,
        ports: &mut dyn GamePorts,
        laser: LaserType,
        shooter: Shooter,
    ) -> Result<(), TurnError> {
        self.ensure_ready(state)?;
        let (origin, direction, fired) = match shooter {
            Shooter::Tank => {
                let fired = match (laser, state.tank_tile().and_then(Tile::tank_form)) {
                    (LaserType::Green, Some(TankForm::Powerful)) => LaserType::Power,
                    (LaserType::Green, Some(TankForm::Disguised)) => LaserType::Red,
                    _ => laser,
                };
                if let Some(item) = fired.item() {
                    Self::ensure_stocked(state, ports, item)?;
                }
                Self::commit(state, fired.history_status(), fired.item(), ReplayEntry::Fire { laser });
                (state.tank, state.tank_direction(), fired)
            }
            Shooter::AntiTank(at) => {
                let anti = state
                    .arena
                    .get_mut(at, Layer::LowerObjects)
                    .filter(|tile| tile.kind() == TileKind::AntiTank && tile.is_armed())
                    .ok_or(TurnError::NotMovable { position: at })?;
                anti.set_armed(false);
                (at, anti.direction(), laser)
            }
        };
        ports.play_sound(fired.sound());
        self.lasers.push(LaserTracker::new(fired, shooter, origin, direction));
        debug!(target: "lasertank::turn", laser = %fired, ?shooter, "laser fired");
        self.start();
        Ok(())
    }

    /// Starts sliding the object at `origin` towards `destination`.
    ///
    /// Called by hooks mid-turn through [`Request::PushObject`]; calling it
    /// while idle starts a turn of its own.
    pub fn begin_object_push(
        &mut self,
        state: &GameState,
        origin: Position,
        destination: Position,
    ) -> Result<(), TurnError> {
        let object = state
            .arena
            .get(origin, Layer::LowerObjects)
            .filter(|tile| tile.can_move())
            .ok_or(TurnError::NotMovable { position: origin })?;
        let step = (
            (destination.x - origin.x).signum(),
            (destination.y - origin.y).signum(),
        );
        if step == (0, 0) {
            return Err(TurnError::InvalidOffset { dx: 0, dy: 0 });
        }
        if self
            .objects
            .iter()
            .any(|tracker| tracker.is_moving() && tracker.position() == origin)
        {
            trace!(target: "lasertank::turn", %origin, "object already sliding");
            return Ok(());
        }
        self.objects.push(ObjectTracker::new(origin, step, object.push_reach()));
        trace!(target: "lasertank::turn", %origin, ?step, kind = %object.kind(), "object push");
        if !self.active {
            self.start();
        }
        Ok(())
    }

    /// Detonates a bomb, heat bomb or ice bomb around the tank.
    pub fn begin_range_attack(
        &mut self,
        state: &mut GameState,
        ports: &mut dyn GamePorts,
        item: Item,
    ) -> Result<(), TurnError> {
        self.ensure_ready(state)?;
        let sound = match item {
            Item::Bomb => SoundEffect::Bomb,
            Item::HeatBomb => SoundEffect::HeatBomb,
            Item::IceBomb => SoundEffect::IceBomb,
            _ => return Err(TurnError::NotRangeWeapon { item }),
        };
        Self::ensure_stocked(state, ports, item)?;
        Self::commit(state, HistoryStatus::for_item(item), Some(item), ReplayEntry::Range { item });

        self.start();
        let config = self.config.clone();
        let mut ctx = TurnContext::new(state, ports, &config);
        ctx.play(sound);
        let cells = ctx.arena().range_cells(ctx.tank_position(), config.range_radius);
        if let Err(TurnInterrupt::AlreadyDead) = blast(&mut ctx, &cells, item) {
            debug!(target: "lasertank::turn", "range attack interrupted by death");
        }
        self.drain(&mut ctx);
        debug!(target: "lasertank::turn", %item, "range attack");
        Ok(())
    }

    /// Points the tank without moving it. Not an undoable action.
    pub fn turn_tank(
        &mut self,
        state: &mut GameState,
        ports: &mut dyn GamePorts,
        direction: Direction,
    ) -> Result<(), TurnError> {
        self.ensure_ready(state)?;
        if !direction.is_orthogonal() {
            let (dx, dy) = direction.delta();
            return Err(TurnError::InvalidOffset { dx, dy });
        }
        state.replay.push(ReplayEntry::Turn { direction });
        let config = self.config.clone();
        let mut ctx = TurnContext::new(state, ports, &config);
        movement::face(&mut ctx, direction);
        ctx.play(SoundEffect::Turn);
        let dirty = ctx.state.arena.take_dirty();
        ctx.ports.redraw(&dirty);
        Ok(())
    }

    /// Begins whatever a recorded command describes.
    pub fn begin_command(
        &mut self,
        state: &mut GameState,
        ports: &mut dyn GamePorts,
        entry: ReplayEntry,
    ) -> Result<(), TurnError> {
        match entry {
            ReplayEntry::Move { dx, dy } => self.begin_movement(state, ports, dx, dy),
            ReplayEntry::Fire { laser } => self.begin_laser_fire(state, ports, laser, Shooter::Tank),
            ReplayEntry::Range { item } => self.begin_range_attack(state, ports, item),
            ReplayEntry::Turn { direction } => self.turn_tank(state, ports, direction),
        }
    }

    pub fn undo(&mut self, state: &mut GameState, ports: &mut dyn GamePorts) -> Result<(), TurnError> {
        if self.active {
            return Err(TurnError::Busy);
        }
        state.undo()?;
        self.auto_move = None;
        ports.redraw(&state.arena.take_dirty());
        Ok(())
    }

    pub fn redo(&mut self, state: &mut GameState, ports: &mut dyn GamePorts) -> Result<(), TurnError> {
        if self.active {
            return Err(TurnError::Busy);
        }
        state.redo()?;
        self.auto_move = None;
        ports.redraw(&state.arena.take_dirty());
        Ok(())
    }

    /// Stops every sliding object without further callbacks.
    pub fn halt_all_moving_objects(&mut self) {
        for tracker in &mut self.objects {
            tracker.halt();
        }
    }

    /// Runs one controller iteration.
    pub fn iterate(&mut self, state: &mut GameState, ports: &mut dyn GamePorts) -> Result<Progress, TurnError> {
        if !self.active {
            return Ok(Progress::Finished(self.outcome(state)));
        }
        if self.iterations >= self.config.max_iterations {
            warn!(
                target: "lasertank::turn",
                iterations = self.iterations,
                phase = %self.phase,
                "turn did not settle"
            );
            let config = self.config.clone();
            let mut ctx = TurnContext::new(state, ports, &config);
            self.cancel(&mut ctx);
            ctx.state.arena.clear_glyphs();
            self.active = false;
            return Err(TurnError::IterationLimit {
                iterations: self.iterations,
                phase: self.phase,
            });
        }
        self.iterations += 1;

        let config = self.config.clone();
        let mut ctx = TurnContext::new(state, ports, &config);
        if !self.abort.is_aborted()
            && let Err(TurnInterrupt::AlreadyDead) = self.run_phases(&mut ctx)
        {
            debug!(target: "lasertank::turn", "tank already dead");
        }
        if ctx.state.status.dead || self.abort.is_aborted() {
            self.cancel(&mut ctx);
        }
        let dirty = ctx.state.arena.take_dirty();
        if !dirty.is_empty() {
            ctx.ports.redraw(&dirty);
        }

        if self.is_quiescent() {
            let outcome = self.finish(&mut ctx);
            return Ok(Progress::Finished(outcome));
        }
        Ok(Progress::Running)
    }

    /// Iterates until the turn settles, pausing `action_delay` between iterations.
    pub fn run_to_quiescence(
        &mut self,
        state: &mut GameState,
        ports: &mut dyn GamePorts,
    ) -> Result<TurnOutcome, TurnError> {
        loop {
            match self.iterate(state, ports)? {
                Progress::Finished(outcome) => return Ok(outcome),
                Progress::Running => {
                    if !self.config.action_delay.is_zero() {
                        std::thread::sleep(self.config.action_delay);
                    }
                }
            }
        }
    }

    fn halted(&self, ctx: &TurnContext<'_>) -> bool {
        self.abort.is_aborted() || ctx.state.is_over()
    }

    fn run_phases(&mut self, ctx: &mut TurnContext<'_>) -> HookResult<()> {
        self.phase = TurnPhase::Movement;
        let mut stepped = false;
        if let Some(movement) = self.movement.as_mut()
            && movement.loop_check
        {
            movement.step_tank(ctx)?;
            stepped = movement.proceed;
            self.moved |= stepped;
        }
        self.drain(ctx);
        if self.halted(ctx) {
            return Ok(());
        }

        self.phase = TurnPhase::Lasers;
        for laser in self.lasers.iter_mut().filter(|laser| laser.is_tracking()) {
            laser.advance(ctx)?;
        }
        self.drain(ctx);
        if self.halted(ctx) {
            return Ok(());
        }

        self.phase = TurnPhase::Objects;
        for object in self.objects.iter_mut().filter(|object| object.is_moving()) {
            object.advance(ctx)?;
        }
        self.drain(ctx);
        if self.halted(ctx) {
            return Ok(());
        }

        for laser in self.lasers.iter_mut().filter(|laser| !laser.is_tracking()) {
            laser.finish(ctx);
        }
        for object in &mut self.objects {
            object.continue_on_ice(ctx)?;
        }
        self.drain(ctx);

        let move_class = self.movement.as_ref().is_some_and(TankMovement::is_move_class);
        self.continue_movement(ctx);
        if stepped
            && ctx
                .tile(ctx.tank_position(), Layer::LowerObjects)
                .is_some_and(|tile| tile.solves_on_move())
        {
            self.solve(ctx);
            return Ok(());
        }
        for object in &mut self.objects {
            object.settle();
        }
        if self.halted(ctx) {
            return Ok(());
        }

        if self.movement.is_none()
            && let Some(step) = self.auto_move
        {
            let retry = TankMovement::new(step);
            if retry.can_move_there(ctx) {
                trace!(target: "lasertank::turn", ?step, "auto-move");
                self.auto_move = None;
                self.movement = Some(retry);
            }
        }

        self.phase = TurnPhase::Timers;
        tick_timers(ctx, move_class);
        if self.halted(ctx) {
            return Ok(());
        }

        self.phase = TurnPhase::Enemies;
        self.check_for_enemies(ctx);

        self.lasers.retain(|laser| !laser.is_finished());
        self.objects
            .retain(|object| object.is_moving() || object.is_checking());
        Ok(())
    }

    fn continue_movement(&mut self, ctx: &mut TurnContext<'_>) {
        let Some(movement) = self.movement.as_mut() else {
            return;
        };
        movement.update_loop_check(ctx);
        if movement.mover && !movement.can_move_there(ctx) {
            self.auto_move = Some(movement.step);
        }
        if movement.loop_check {
            return;
        }
        if movement.frozen {
            movement::set_tank_form(ctx, TankForm::Normal);
            ctx.play(SoundEffect::Defrost);
        }
        self.movement = None;
    }

    fn freeze(&mut self, ctx: &mut TurnContext<'_>) {
        let step = ctx.state.tank_direction().delta();
        match self.movement.as_mut() {
            Some(movement) => {
                movement.frozen = true;
                movement.step = step;
            }
            None => self.movement = Some(TankMovement::frozen(step)),
        }
        movement::set_tank_form(ctx, TankForm::Frozen);
    }

    /// Applies requests left by hooks.
    fn drain(&mut self, ctx: &mut TurnContext<'_>) {
        loop {
            let requests = ctx.take_requests();
            if requests.is_empty() {
                return;
            }
            for request in requests {
                match request {
                    Request::PushObject { origin, destination } => {
                        if let Err(err) = self.begin_object_push(ctx.state, origin, destination) {
                            trace!(target: "lasertank::turn", %origin, %err, "push ignored");
                        }
                    }
                    Request::FireLaser {
                        laser,
                        origin,
                        direction,
                        shooter,
                    } => self.lasers.push(LaserTracker::new(laser, shooter, origin, direction)),
                    Request::HaltObjects => self.halt_all_moving_objects(),
                    Request::FrozenMovement => self.freeze(ctx),
                }
            }
        }
    }

    /// The first armed anti-tank with a clear line to the tank fires.
    fn check_for_enemies(&mut self, ctx: &mut TurnContext<'_>) {
        if ctx.cheats().contains(Cheats::INVINCIBLE)
            || ctx
                .state
                .tank_tile()
                .and_then(Tile::tank_form)
                .is_some_and(|form| form == TankForm::Disguised)
        {
            return;
        }
        let Some(at) = ctx.arena().linear_scan_anti(ctx.tank_position()) else {
            return;
        };
        let Some(mut anti) = ctx.tile(at, Layer::LowerObjects).filter(Tile::is_armed) else {
            return;
        };
        anti.set_armed(false);
        let direction = anti.direction();
        ctx.morph(at, Layer::LowerObjects, anti);
        ctx.play(SoundEffect::AntiFire);
        debug!(target: "lasertank::turn", %at, "anti-tank fires");
        self.lasers
            .push(LaserTracker::new(LaserType::Red, Shooter::AntiTank(at), at, direction));
    }

    fn solve(&mut self, ctx: &mut TurnContext<'_>) {
        ctx.state.status.solved = true;
        self.cancel(ctx);
        ctx.play(SoundEffect::Solved);
        ctx.ports.level_solved();
        info!(target: "lasertank::turn", tank = %ctx.tank_position(), "level solved");
    }

    /// Tears down every tracker. Bolts still release their shooters.
    fn cancel(&mut self, ctx: &mut TurnContext<'_>) {
        for laser in &mut self.lasers {
            laser.finish(ctx);
        }
        self.lasers.clear();
        self.halt_all_moving_objects();
        self.objects.clear();
        if let Some(movement) = self.movement.take()
            && movement.frozen
        {
            movement::set_tank_form(ctx, TankForm::Normal);
        }
        if ctx.state.status.dead {
            self.auto_move = None;
        }
    }

    fn is_quiescent(&self) -> bool {
        self.movement.is_none() && self.lasers.is_empty() && self.objects.is_empty()
    }

    fn finish(&mut self, ctx: &mut TurnContext<'_>) -> TurnOutcome {
        let aborted = self.abort.is_aborted();
        if self.moved
            && !aborted
            && !ctx.state.is_over()
            && !ctx.cheats().contains(Cheats::SWIMMING)
            && ctx
                .tile(ctx.tank_position(), Layer::LowerGround)
                .is_some_and(|ground| ground.kills_on_move())
            && let Err(TurnInterrupt::AlreadyDead) = ctx.game_over()
        {
            debug!(target: "lasertank::turn", "tank already dead");
        }
        if aborted || ctx.state.status.dead {
            ctx.state.arena.clear_glyphs();
        }
        let dirty = ctx.state.arena.take_dirty();
        if !dirty.is_empty() {
            ctx.ports.redraw(&dirty);
        }
        self.active = false;
        let outcome = self.outcome(ctx.state);
        debug!(
            target: "lasertank::turn",
            iterations = outcome.iterations,
            moved = outcome.moved,
            died = outcome.died,
            solved = outcome.solved,
            aborted = outcome.aborted,
            "turn finished"
        );
        outcome
    }

    fn outcome(&self, state: &GameState) -> TurnOutcome {
        TurnOutcome {
            iterations: self.iterations,
            moved: self.moved,
            died: state.status.dead,
            solved: state.status.solved,
            aborted: self.abort.is_aborted(),
        }
    }
}

impl Default for TurnController {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

fn blast(ctx: &mut TurnContext<'_>, cells: &[Position], item: Item) -> HookResult<()> {
    for &at in cells {
        for layer in Layer::ALL {
            if let Some(tile) = ctx.tile(at, layer) {
                tile.range_action(ctx, at, layer, item)?;
            }
        }
    }
    Ok(())
}

/// Ticks every countdown on the tank's floor once.
///
/// Stunned anti-tanks and tank forms only count move-class iterations.
fn tick_timers(ctx: &mut TurnContext<'_>, move_class: bool) {
    let floor = ctx.tank_position().z;
    let timed: Vec<(Position, Layer)> = ctx
        .arena()
        .positions()
        .filter(|position| position.z == floor)
        .flat_map(|position| Layer::ALL.map(|layer| (position, layer)))
        .filter(|&(position, layer)| {
            ctx.arena().get(position, layer).is_some_and(|tile| {
                tile.timer().is_some() && (move_class || !tile.ticks_on_moves_only())
            })
        })
        .collect();
    for (at, layer) in timed {
        let expired = ctx
            .arena_mut()
            .get_mut(at, layer)
            .and_then(|tile| tile.tick_timer().then(|| tile.clone()));
        if let Some(tile) = expired {
            tile.timer_expired(ctx, at, layer);
        }
    }
}
