//! Game state and core simulation types
//!
//! Everything needed to replay a match deterministically lives here.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;

use super::ai::AiController;
use super::events::EventQueue;
use super::hazards::HazardGrid;
use super::level::LevelProgression;
use super::match_state::MatchState;
use super::scheduler::{Scheduler, TimerId};
use super::skills::SkillRegistry;

/// Left or right player slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Sign of this side's outward x direction (-1 left, +1 right)
    pub fn x_sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Side that last touched the ball (None until the first paddle hit)
    pub last_hit: Option<Side>,
    /// Temporary clone spawned by DoubleBall; removed on any score event
    pub is_clone: bool,
    /// Fireball mark: persists past the burn window (color/speed are kept)
    pub fire_touched: bool,
    /// While true the ball burns through hazards with a fixed chance
    pub burning: bool,
    /// Grid cell the ball center was in last tick, for enter/exit tracking
    pub cell: Option<(usize, usize)>,
    /// Pending clone-removal timer, if this is a clone
    #[serde(default)]
    pub clone_timer: Option<TimerId>,
}

impl Ball {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: BALL_RADIUS,
            last_hit: None,
            is_clone: false,
            fire_touched: false,
            burning: false,
            cell: None,
            clone_timer: None,
        }
    }

    /// Place at center with a random serve direction, clearing per-rally marks
    pub fn serve(&mut self, rng: &mut Pcg32) {
        let y = rng.random_range(-PADDLE_MAX_Y * 0.78..PADDLE_MAX_Y * 0.78);
        self.pos = Vec2::new(0.0, y);
        let x = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let dir = Vec2::new(x, rng.random_range(-MAX_SERVE_ANGLE..MAX_SERVE_ANGLE));
        self.vel = dir * BALL_SERVE_SPEED;
        self.last_hit = None;
        self.fire_touched = false;
        self.burning = false;
        self.cell = None;
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Scale speed by `factor`, clamped to the global cap
    pub fn scale_speed(&mut self, factor: f32) {
        let speed = self.vel.length();
        if speed <= f32::EPSILON {
            return;
        }
        let capped = (speed * factor).min(BALL_MAX_SPEED);
        self.vel = self.vel / speed * capped;
    }
}

/// One side's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub side: Side,
    pub y: f32,
    pub base_half_height: f32,
    /// Height scale applied by skills and hazards (1.0 = normal)
    pub scale: f32,
    /// Grid cell the paddle center was in last tick
    pub cell: Option<(usize, usize)>,
}

impl Paddle {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            y: 0.0,
            base_half_height: PADDLE_HALF_HEIGHT,
            scale: 1.0,
            cell: None,
        }
    }

    pub fn x(&self) -> f32 {
        self.side.x_sign() * PADDLE_X
    }

    pub fn half_height(&self) -> f32 {
        self.base_half_height * self.scale
    }

    /// Move by a -1..1 input value, clamped to the playable band
    pub fn apply_input(&mut self, input: f32, dt: f32) {
        self.y += input.clamp(-1.0, 1.0) * PADDLE_SPEED * dt;
        self.y = self.y.clamp(-PADDLE_MAX_Y, PADDLE_MAX_Y);
    }
}

/// Entity-id allocator, kept separate from the rest of `GameState` so
/// components can allocate while other state fields are borrowed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAlloc {
    next: u32,
}

impl Default for IdAlloc {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAlloc {
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    /// Simulation tick counter; frozen while paused
    pub time_ticks: u64,
    /// Real-time tick counter for UI-only timers; never gated
    pub real_ticks: u64,
    pub match_state: MatchState,
    pub levels: LevelProgression,
    pub grid: HazardGrid,
    pub skills: SkillRegistry,
    pub scheduler: Scheduler,
    pub events: EventQueue,
    pub balls: Vec<Ball>,
    pub paddles: [Paddle; 2],
    pub ai: [AiController; 2],
    pub ids: IdAlloc,
    /// Active hazard-spawn pacing timer for the current level
    pub spawn_timer: Option<TimerId>,
}

impl GameState {
    /// Create a new game state with the given seed. The match starts Idle;
    /// call [`GameState::start_level`] to begin play.
    pub fn new(seed: u64) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            real_ticks: 0,
            match_state: MatchState::default(),
            levels: LevelProgression::default(),
            grid: HazardGrid::new(GRID_ROWS, GRID_COLUMNS, PLAY_WIDTH, PLAY_HEIGHT),
            skills: SkillRegistry::default(),
            scheduler: Scheduler::new(),
            events: EventQueue::new(),
            balls: Vec::new(),
            paddles: [Paddle::new(Side::Left), Paddle::new(Side::Right)],
            ai: [AiController::new(Side::Left), AiController::new(Side::Right)],
            ids: IdAlloc::default(),
            spawn_timer: None,
        };
        state.spawn_primary_ball();
        state
    }

    /// Spawn the primary (non-clone) ball at rest in the center
    pub fn spawn_primary_ball(&mut self) {
        let id = self.ids.next_id();
        self.balls.push(Ball::new(id));
    }

    /// The primary ball, if present (clones never outlive it)
    pub fn primary_ball(&self) -> Option<&Ball> {
        self.balls.iter().find(|b| !b.is_clone)
    }

    pub fn primary_ball_mut(&mut self) -> Option<&mut Ball> {
        self.balls.iter_mut().find(|b| !b.is_clone)
    }

    pub fn ball_by_id(&self, id: u32) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    pub fn ball_by_id_mut(&mut self, id: u32) -> Option<&mut Ball> {
        self.balls.iter_mut().find(|b| b.id == id)
    }

    /// Whether a side is AI-controlled under the current play mode
    pub fn side_is_ai(&self, side: Side) -> bool {
        self.match_state.play_mode.side_is_ai(side)
    }

    /// Ensure balls are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.balls.sort_by_key(|b| b.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_stays_in_bounds() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut ball = Ball::new(1);
        for _ in 0..100 {
            ball.serve(&mut rng);
            assert!(ball.pos.y.abs() < PLAY_HEIGHT / 2.0);
            assert!(ball.pos.x.abs() < f32::EPSILON);
            assert!(ball.vel.x.abs() > 0.0);
            assert!(ball.vel.y.abs() <= MAX_SERVE_ANGLE * BALL_SERVE_SPEED);
        }
    }

    #[test]
    fn test_scale_speed_caps_at_max() {
        let mut ball = Ball::new(1);
        ball.vel = Vec2::new(BALL_MAX_SPEED, 0.0);
        ball.scale_speed(10.0);
        assert!((ball.speed() - BALL_MAX_SPEED).abs() < 1e-3);
    }

    #[test]
    fn test_paddle_input_clamped() {
        let mut paddle = Paddle::new(Side::Left);
        for _ in 0..10_000 {
            paddle.apply_input(1.0, SIM_DT);
        }
        assert!((paddle.y - PADDLE_MAX_Y).abs() < 1e-4);
    }

    #[test]
    fn test_primary_ball_skips_clones() {
        let mut state = GameState::new(1);
        let clone_id = state.ids.next_id();
        let mut clone = Ball::new(clone_id);
        clone.is_clone = true;
        state.balls.insert(0, clone);
        assert!(!state.primary_ball().unwrap().is_clone);
    }
}
