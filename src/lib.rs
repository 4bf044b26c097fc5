//! Elemental Pong - a Pong variant with grid hazards and paddle skills
//!
//! Core modules:
//! - `sim`: Deterministic simulation (match state, hazard grid, skills, AI)
//! - `progress`: Persisted player profile (current level, master volume)

pub mod progress;
pub mod sim;

pub use progress::Progress;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Play area dimensions (world units), centered at the origin
    pub const PLAY_WIDTH: f32 = 16.0;
    pub const PLAY_HEIGHT: f32 = 10.0;

    /// Hazard grid partition: rows tile the x axis, columns tile the y axis
    pub const GRID_ROWS: usize = 4;
    pub const GRID_COLUMNS: usize = 5;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 0.2;
    pub const BALL_SERVE_SPEED: f32 = 6.0;
    /// Maximum ball speed (hazards and skills can't push it past this)
    pub const BALL_MAX_SPEED: f32 = 27.0;
    /// Maximum vertical component of the serve direction
    pub const MAX_SERVE_ANGLE: f32 = 0.67;
    /// Maximum deflection off a paddle face (degrees from horizontal)
    pub const MAX_BOUNCE_ANGLE_DEG: f32 = 45.0;
    /// Speed boost on paddle hit (multiplicative)
    pub const PADDLE_HIT_BOOST: f32 = 1.1;
    /// Speed boost on wall hit (multiplicative)
    pub const WALL_HIT_BOOST: f32 = 1.05;

    /// Paddle defaults
    pub const PADDLE_X: f32 = 7.5;
    pub const PADDLE_HALF_HEIGHT: f32 = 1.0;
    pub const PADDLE_SPEED: f32 = 7.0;
    /// Vertical bound for paddle centers (and AI intercept clamping)
    pub const PADDLE_MAX_Y: f32 = 4.5;

    /// Hazard tuning
    pub const FIRE_SPEED_FACTOR: f32 = 1.5;
    pub const WATER_SPEED_FACTOR: f32 = 0.6;
    pub const FIRE_PADDLE_SHRINK: f32 = 0.8;
    pub const FIRE_PADDLE_SHRINK_SECS: f32 = 2.0;
    pub const WIND_FORCE: f32 = 5.0;
    pub const WIND_SHIFT_SECS: f32 = 2.0;
    pub const DEFAULT_HAZARD_DURATION_SECS: f32 = 5.0;

    /// Skill tuning
    pub const SKILL_SLOTS: usize = 2;
    pub const DOUBLE_BALL_ANGLE_DEG: f32 = 30.0;
    pub const DOUBLE_BALL_SECS: f32 = 5.0;
    pub const SPEED_UP_RATIO: f32 = 1.5;
    pub const SPEED_UP_SECS: f32 = 2.0;
    pub const SLOW_DOWN_RATIO: f32 = 0.5;
    pub const SLOW_DOWN_SECS: f32 = 2.0;
    pub const ENLARGE_PADDLE_FACTOR: f32 = 1.4;
    pub const ENLARGE_PADDLE_SECS: f32 = 5.0;
    pub const SHRINK_PADDLE_FACTOR: f32 = 0.3;
    pub const SHRINK_PADDLE_SECS: f32 = 4.0;
    pub const FIREBALL_SPEED_BOOST: f32 = 1.5;
    pub const FIREBALL_SECS: f32 = 5.0;
    pub const FIREBALL_BURN_CHANCE: f32 = 0.7;
    pub const DEFAULT_SKILL_COOLDOWN_SECS: f32 = 5.0;
    pub const FIREBALL_COOLDOWN_SECS: f32 = 12.0;

    /// Level progression
    pub const MAX_LEVEL: u32 = 15;
    pub const DEFAULT_WIN_SCORE: u32 = 5;
}

/// Rotate a vector by an angle in radians
#[inline]
pub fn rotate_vec(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Seconds to whole simulation ticks (rounded up so short timers still fire)
#[inline]
pub fn secs_to_ticks(secs: f32) -> u64 {
    (secs / consts::SIM_DT).ceil().max(0.0) as u64
}
