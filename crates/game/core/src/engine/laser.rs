//! Bolt tracking: one tracker per laser, missile, stunner or disruptor in flight.

use strum::{AsRefStr, Display, EnumIter};
use tracing::trace;

use crate::arena::{LaserGlyph, Layer};
use crate::context::TurnContext;
use crate::direction::{Direction, resolve_relative, resolve_relative_hv};
use crate::error::HookResult;
use crate::history::HistoryStatus;
use crate::ports::SoundEffect;
use crate::state::{Item, Position};
use crate::tile::TileKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LaserType {
    Green,
    Red,
    Blue,
    Power,
    Missile,
    Stunner,
    Disruptor,
}

impl LaserType {
    /// Push strength carried into `laser_entered`.
    pub const fn force(self) -> u8 {
        match self {
            LaserType::Green | LaserType::Red | LaserType::Blue => 1,
            LaserType::Missile => 2,
            LaserType::Power => 5,
            LaserType::Stunner | LaserType::Disruptor => 0,
        }
    }

    /// Limited ammunition spent by firing this bolt, if any.
    pub const fn item(self) -> Option<Item> {
        match self {
            LaserType::Missile => Some(Item::Missile),
            LaserType::Stunner => Some(Item::Stunner),
            LaserType::Blue => Some(Item::BlueLaser),
            LaserType::Disruptor => Some(Item::Disruptor),
            LaserType::Green | LaserType::Red | LaserType::Power => None,
        }
    }

    pub fn history_status(self) -> HistoryStatus {
        match self.item() {
            Some(item) => HistoryStatus::LASER | HistoryStatus::for_item(item),
            None => HistoryStatus::LASER,
        }
    }

    pub const fn sound(self) -> SoundEffect {
        match self {
            LaserType::Green | LaserType::Red => SoundEffect::Laser,
            LaserType::Power => SoundEffect::PowerLaser,
            LaserType::Blue => SoundEffect::BlueLaser,
            LaserType::Missile => SoundEffect::Missile,
            LaserType::Stunner => SoundEffect::Stunner,
            LaserType::Disruptor => SoundEffect::Disruptor,
        }
    }

    fn glyph_direction(self, dx: i32, dy: i32) -> Direction {
        match self {
            LaserType::Missile => resolve_relative(dx, dy),
            LaserType::Stunner | LaserType::Disruptor => Direction::None,
            _ => resolve_relative_hv(dx, dy),
        }
    }
}

/// Who fired a bolt. Anti-tanks are re-armed when their bolt ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shooter {
    Tank,
    AntiTank(Position),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaserTracker {
    laser: LaserType,
    shooter: Shooter,
    /// Cell the bolt enters on its next step. May lie off the grid.
    position: Position,
    step: (i32, i32),
    /// The glyph this bolt drew last, and where.
    glyph_at: Option<(Position, LaserGlyph)>,
    tracking: bool,
    finished: bool,
}

impl LaserTracker {
    /// A bolt leaving `origin` towards `direction`; its first cell is the neighbour.
    pub fn new(laser: LaserType, shooter: Shooter, origin: Position, direction: Direction) -> Self {
        let step = direction.delta();
        Self {
            laser,
            shooter,
            position: origin.offset(step.0, step.1),
            step,
            glyph_at: None,
            tracking: step != (0, 0),
            finished: false,
        }
    }

    pub fn laser(&self) -> LaserType {
        self.laser
    }

    pub fn shooter(&self) -> Shooter {
        self.shooter
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Advances one cell. A reflection earns one immediate extra cell.
    pub fn advance(&mut self, ctx: &mut TurnContext<'_>) -> HookResult<()> {
        if self.tracking && self.advance_once(ctx)? && self.tracking {
            self.advance_once(ctx)?;
        }
        Ok(())
    }

    /// Returns whether the step vector changed.
    fn advance_once(&mut self, ctx: &mut TurnContext<'_>) -> HookResult<bool> {
        let Some(at) = ctx.arena().normalize(self.position) else {
            trace!(target: "lasertank::laser", laser = %self.laser, position = %self.position, "left arena");
            self.tracking = false;
            return Ok(false);
        };

        if at == ctx.tank_position() {
            trace!(target: "lasertank::laser", laser = %self.laser, %at, "hit tank");
            self.tracking = false;
            ctx.game_over()?;
            return Ok(false);
        }

        let (Some(upper), Some(lower)) = (
            ctx.tile(at, Layer::UpperObjects),
            ctx.tile(at, Layer::LowerObjects),
        ) else {
            self.tracking = false;
            return Ok(false);
        };

        let (dx, dy) = self.step;
        if upper.lasers_pass_through() && lower.lasers_pass_through() {
            self.clear_glyph(ctx);
            let glyph = LaserGlyph {
                laser: self.laser,
                direction: self.laser.glyph_direction(dx, dy),
            };
            ctx.arena_mut().set_glyph(at, glyph);
            self.glyph_at = Some((at, glyph));
        }

        let force = self.laser.force();
        let entered = upper.laser_entered(ctx, at, Layer::UpperObjects, dx, dy, self.laser, force)?;
        if entered == Direction::None {
            return Ok(self.absorb(ctx));
        }
        let (ex, ey) = entered.delta();
        let entered = lower.laser_entered(ctx, at, Layer::LowerObjects, ex, ey, self.laser, force)?;
        if entered == Direction::None {
            return Ok(self.absorb(ctx));
        }

        let exited = upper.laser_exited(ctx, self.step, entered);
        let exited = lower.laser_exited(ctx, self.step, exited);
        if exited == Direction::None {
            return Ok(self.absorb(ctx));
        }

        let old = self.step;
        self.step = exited.delta();
        self.position = at.offset(self.step.0, self.step.1);
        if let Some(normalized) = ctx.arena().normalize(self.position) {
            self.position = normalized;
        }
        Ok(self.step != old)
    }

    fn absorb(&mut self, ctx: &mut TurnContext<'_>) -> bool {
        trace!(target: "lasertank::laser", laser = %self.laser, position = %self.position, "absorbed");
        self.clear_glyph(ctx);
        self.tracking = false;
        false
    }

    fn clear_glyph(&mut self, ctx: &mut TurnContext<'_>) {
        if let Some((previous, glyph)) = self.glyph_at.take() {
            ctx.arena_mut().clear_glyph(previous, glyph);
        }
    }

    /// Tears down a bolt that stopped tracking: clears its glyph and re-arms the shooter.
    pub fn finish(&mut self, ctx: &mut TurnContext<'_>) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.tracking = false;
        self.clear_glyph(ctx);
        if let Shooter::AntiTank(at) = self.shooter
            && let Some(mut anti) = ctx.tile(at, Layer::LowerObjects)
            && anti.kind() == TileKind::AntiTank
        {
            anti.set_armed(true);
            ctx.morph(at, Layer::LowerObjects, anti);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::ports::RecordingPorts;
    use crate::state::GameState;

    fn run(layout: &str, laser: LaserType, direction: Direction) -> (GameState, RecordingPorts, Vec<Position>) {
        let mut state = GameState::from_layout(layout).unwrap();
        let mut ports = RecordingPorts::new();
        let config = GameConfig::default();
        let origin = state.tank;
        let mut visited = Vec::new();
        {
            let mut ctx = TurnContext::new(&mut state, &mut ports, &config);
            let mut tracker = LaserTracker::new(laser, Shooter::Tank, origin, direction);
            for _ in 0..32 {
                if !tracker.is_tracking() {
                    break;
                }
                tracker.advance(&mut ctx).unwrap();
                if let Some((at, _)) = tracker.glyph_at
                    && visited.last() != Some(&at)
                {
                    visited.push(at);
                }
            }
            tracker.finish(&mut ctx);
        }
        (state, ports, visited)
    }

    #[test]
    fn bolt_crosses_open_floor_and_leaves() {
        let (state, _, visited) = run(">...\n", LaserType::Green, Direction::East);
        assert_eq!(
            visited,
            vec![Position::new(1, 0, 0), Position::new(2, 0, 0), Position::new(3, 0, 0)]
        );
        assert_eq!(state.arena.glyph_count(), 0);
    }

    #[test]
    fn wall_absorbs_bolt() {
        let (state, ports, visited) = run(">.#.\n", LaserType::Red, Direction::East);
        assert_eq!(visited, vec![Position::new(1, 0, 0)]);
        assert!(ports.heard(SoundEffect::LaserDie));
        assert!(!state.status.dead);
    }

    #[test]
    fn bolt_routed_round_three_mirrors_hits_its_own_tank() {
        let layout = "3..4\n....\n>..1\n";
        let (state, ports, _) = run(layout, LaserType::Green, Direction::East);
        assert_eq!(ports.count(SoundEffect::Reflect), 3);
        assert!(state.status.dead);
        assert_eq!(ports.deaths, 1);
    }

    #[test]
    fn missile_destroys_mirror() {
        let (state, ports, _) = run(">.1.\n", LaserType::Missile, Direction::East);
        assert!(ports.heard(SoundEffect::Boom));
        let at = Position::new(2, 0, 0);
        assert!(state.arena.get(at, Layer::LowerObjects).unwrap().is_empty());
    }

    #[test]
    fn crossing_bolt_keeps_the_other_glyph() {
        let mut state = GameState::from_layout(">...\n....\n").unwrap();
        let mut ports = RecordingPorts::new();
        let config = GameConfig::default();
        let crossing = Position::new(2, 0, 0);
        let mut ctx = TurnContext::new(&mut state, &mut ports, &config);
        let mut eastbound = LaserTracker::new(LaserType::Green, Shooter::Tank, Position::new(1, 0, 0), Direction::East);
        let mut northbound = LaserTracker::new(LaserType::Red, Shooter::Tank, Position::new(2, 1, 0), Direction::North);

        eastbound.advance(&mut ctx).unwrap();
        northbound.advance(&mut ctx).unwrap();
        let red = ctx.arena().glyph(crossing).unwrap();
        assert_eq!(red.laser, LaserType::Red);

        eastbound.advance(&mut ctx).unwrap();
        assert_eq!(ctx.arena().glyph(crossing), Some(red));
        northbound.finish(&mut ctx);
        assert_eq!(ctx.arena().glyph(crossing), None);
    }

    #[test]
    fn stunner_leaves_no_directional_glyph() {
        assert_eq!(LaserType::Stunner.glyph_direction(1, 0), Direction::None);
        assert_eq!(LaserType::Green.glyph_direction(0, 1), Direction::Vertical);
        assert_eq!(LaserType::Missile.glyph_direction(-1, 0), Direction::West);
    }

    #[test]
    fn ammo_flags() {
        assert_eq!(LaserType::Green.item(), None);
        assert_eq!(
            LaserType::Missile.history_status(),
            HistoryStatus::LASER | HistoryStatus::MISSILE
        );
        assert_eq!(LaserType::Power.force(), 5);
    }
}
