use core::time::Duration;

/// Engine limits and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    /// Pause between controller iterations. Presentation pacing only.
    pub action_delay: Duration,
    /// Controller iterations allowed for a single turn before it is torn down.
    pub max_iterations: u32,
    /// Chebyshev radius used when a barrel checks for the tank.
    pub explosion_radius: i32,
    /// Chebyshev radius of bomb, heat bomb and ice bomb blasts.
    pub range_radius: i32,
}

impl GameConfig {
    // ===== arena limits =====
    pub const MIN_DIMENSION: i32 = 1;
    pub const MAX_DIMENSION: i32 = 256;
    pub const MAX_FLOORS: i32 = 16;
    pub const LAYER_COUNT: usize = 4;

    // ===== tile timers =====
    /// Ticks a disrupted wall stays open.
    pub const DISRUPTION_TICKS: u16 = 20;
    /// Move ticks an anti-tank stays stunned.
    pub const STUN_TICKS: u16 = 10;
    /// Move ticks a powerful tank keeps its power.
    pub const POWER_TICKS: u16 = 50;
    /// Move ticks a disguise lasts.
    pub const DISGUISE_TICKS: u16 = 30;
    /// Hop distance for jump boxes built without an explicit value.
    pub const DEFAULT_JUMP_DISTANCE: u8 = 2;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_ACTION_DELAY: Duration = Duration::ZERO;
    pub const DEFAULT_MAX_ITERATIONS: u32 = 10_000;
    pub const DEFAULT_EXPLOSION_RADIUS: i32 = 1;
    pub const DEFAULT_RANGE_RADIUS: i32 = 1;

    pub fn new() -> Self {
        Self {
            action_delay: Self::DEFAULT_ACTION_DELAY,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            explosion_radius: Self::DEFAULT_EXPLOSION_RADIUS,
            range_radius: Self::DEFAULT_RANGE_RADIUS,
        }
    }

    pub fn with_action_delay(mut self, action_delay: Duration) -> Self {
        self.action_delay = action_delay;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
