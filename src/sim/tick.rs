//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Takes sampled
//! input for a single tick, integrates ball and paddle motion, resolves
//! hazard and skill effects, fires due timers, then routes queued events to
//! their internal consumers.

use glam::Vec2;

use crate::consts::*;
use crate::rotate_vec;
use crate::sim::events::GameEvent;
use crate::sim::match_state::{MatchPhase, RoundOutcome};
use crate::sim::scheduler::TimerAction;
use crate::sim::state::{GameState, Side};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Left paddle movement axis in [-1, 1], positive is up
    pub move_left: f32,
    /// Right paddle movement axis in [-1, 1], positive is up
    pub move_right: f32,
    /// Skill slot activation edges for the left player
    pub activate_left: [bool; SKILL_SLOTS],
    /// Skill slot activation edges for the right player
    pub activate_right: [bool; SKILL_SLOTS],
    /// Pause toggle
    pub toggle_pause: bool,
    /// Cycle human/AI control assignment
    pub cycle_play_mode: bool,
}

/// Advance the game state by one fixed timestep.
///
/// The real-time clock always advances; the sim clock only ticks while a
/// round is running and unpaused, so pausing freezes every scheduled timer
/// along with the balls.
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.real_ticks += 1;

    if input.toggle_pause {
        state.toggle_pause();
    }
    if input.cycle_play_mode {
        state.cycle_play_mode();
    }

    if state.match_state.paused || state.match_state.phase != MatchPhase::Running {
        state.route_pending_events();
        return;
    }

    state.time_ticks += 1;
    let now = state.time_ticks;

    step_paddles(state, input, now, dt);
    step_skill_activation(state, input, now);
    step_balls(state, dt);

    state.apply_cell_transitions();
    state.apply_wind_forces(dt);
    state.apply_burn_through();

    for (_id, action) in state.scheduler.drain_due(now) {
        apply_timer_action(state, action);
    }

    state.route_pending_events();
}

fn step_paddles(state: &mut GameState, input: &TickInput, now: u64, dt: f32) {
    for side in [Side::Left, Side::Right] {
        let idx = side.index();
        let axis = if state.side_is_ai(side) {
            let GameState { ai, paddles, balls, rng, .. } = state;
            ai[idx].movement(paddles[idx].y, balls, now, rng)
        } else {
            match side {
                Side::Left => input.move_left,
                Side::Right => input.move_right,
            }
        };
        state.paddles[idx].apply_input(axis.clamp(-1.0, 1.0), dt);
    }
}

fn step_skill_activation(state: &mut GameState, input: &TickInput, now: u64) {
    for side in [Side::Left, Side::Right] {
        if state.side_is_ai(side) {
            let occupied = state.skills.occupied_slots(side);
            let wanted = {
                let GameState { ai, balls, rng, .. } = state;
                ai[side.index()].wants_skill(balls, &occupied, now, rng)
            };
            if let Some(slot) = wanted {
                state.activate_skill(side, slot);
            }
        } else {
            let edges = match side {
                Side::Left => input.activate_left,
                Side::Right => input.activate_right,
            };
            for (slot, pressed) in edges.iter().enumerate() {
                if *pressed {
                    state.activate_skill(side, slot);
                }
            }
        }
    }
}

fn step_balls(state: &mut GameState, dt: f32) {
    let wall_y = PLAY_HEIGHT / 2.0 - BALL_RADIUS;
    let mut scored: Option<Side> = None;

    let GameState { balls, paddles, .. } = state;
    for ball in balls.iter_mut() {
        ball.pos += ball.vel * dt;

        // Top and bottom walls reflect and add a little pace.
        if ball.pos.y.abs() > wall_y {
            ball.pos.y = wall_y * ball.pos.y.signum();
            ball.vel.y = -ball.vel.y;
            ball.scale_speed(WALL_HIT_BOOST);
        }

        for paddle in paddles.iter() {
            let toward = ball.vel.x * paddle.side.x_sign() > 0.0;
            let reach = PADDLE_X - ball.radius;
            if toward
                && ball.pos.x * paddle.side.x_sign() >= reach
                && (ball.pos.y - paddle.y).abs() <= paddle.half_height() + ball.radius
            {
                // Hit offset along the paddle face steers the return, up to
                // the maximum bounce angle at the very edge.
                let rel = ((ball.pos.y - paddle.y) / paddle.half_height()).clamp(-1.0, 1.0);
                let angle_sign = match paddle.side {
                    Side::Left => 1.0,
                    Side::Right => -1.0,
                };
                let theta = rel * MAX_BOUNCE_ANGLE_DEG.to_radians() * angle_sign;
                let speed = (ball.vel.length() * PADDLE_HIT_BOOST).min(BALL_MAX_SPEED);
                let into_court = Vec2::new(-paddle.side.x_sign(), 0.0);
                ball.vel = rotate_vec(into_court, theta) * speed;
                ball.pos.x = reach * paddle.side.x_sign();
                ball.last_hit = Some(paddle.side);
            }
        }

        // Past the side edge: the opposite player takes the point. Only the
        // first crossing in a tick counts; record_point no-ops once the
        // phase leaves Running anyway.
        if ball.pos.x.abs() > PLAY_WIDTH / 2.0 + ball.radius && scored.is_none() {
            scored = Some(if ball.pos.x < 0.0 { Side::Right } else { Side::Left });
        }
    }

    if let Some(side) = scored {
        state.record_point(side);
    }
}

fn apply_timer_action(state: &mut GameState, action: TimerAction) {
    match action {
        TimerAction::HazardExpire { hazard } => {
            state.remove_hazard(hazard);
        }
        TimerAction::WindShift { hazard } => state.shift_wind(hazard),
        TimerAction::CooldownReady { side, slot } => state.finish_cooldown(side, slot),
        TimerAction::BallSpeedRestore { ratio } => {
            if let Some(ball) = state.primary_ball_mut() {
                ball.scale_speed(1.0 / ratio);
            }
        }
        TimerAction::PaddleScaleRevert { side, scale } => {
            state.paddles[side.index()].scale = scale;
        }
        TimerAction::CloneExpire { ball } => {
            state.balls.retain(|b| !(b.is_clone && b.id == ball));
        }
        TimerAction::FireballEnd { ball } => {
            if let Some(b) = state.ball_by_id_mut(ball) {
                b.burning = false;
            }
        }
        TimerAction::HazardSpawnPulse => state.hazard_spawn_pulse(),
    }
}

impl GameState {
    /// Route queued events to their internal consumers in deterministic
    /// order. Events pushed while routing (cascades) are picked up within
    /// the same pass, so state settles before the frontend drains anything.
    pub(crate) fn route_pending_events(&mut self) {
        while let Some(event) = self.events.next_unrouted() {
            match event {
                GameEvent::MatchReset => {
                    self.clear_all_hazards();
                    self.clear_skills(None);
                    self.remove_clone_balls();
                    self.scheduler.cancel_matching(|a| {
                        matches!(
                            a,
                            TimerAction::BallSpeedRestore { .. }
                                | TimerAction::PaddleScaleRevert { .. }
                                | TimerAction::FireballEnd { .. }
                                | TimerAction::CloneExpire { .. }
                        )
                    });
                    for paddle in &mut self.paddles {
                        paddle.scale = 1.0;
                    }
                    self.serve_primary();
                }
                GameEvent::PointScored { .. } => {
                    // Rally reset: clones vanish, hazards and skills persist.
                    self.remove_clone_balls();
                    self.serve_primary();
                    if matches!(
                        self.match_state.phase,
                        MatchPhase::RoundEnd(RoundOutcome::PointScored(_))
                    ) {
                        self.match_state.phase = MatchPhase::Running;
                    }
                }
                GameEvent::MatchWon { side } => {
                    self.remove_clone_balls();
                    if let Some(timer) = self.spawn_timer.take() {
                        self.scheduler.cancel(timer);
                    }
                    let level = self.levels.current;
                    match side {
                        Side::Left => {
                            let is_final = self.levels.at_final_level();
                            self.events.push(GameEvent::LevelComplete { level, is_final });
                            self.levels.advance();
                        }
                        Side::Right => self.events.push(GameEvent::GameOver { level }),
                    }
                }
                _ => {}
            }
        }
    }

    fn remove_clone_balls(&mut self) {
        for ball in &self.balls {
            if ball.is_clone {
                if let Some(timer) = ball.clone_timer {
                    self.scheduler.cancel(timer);
                }
            }
        }
        self.balls.retain(|b| !b.is_clone);
    }

    fn serve_primary(&mut self) {
        let GameState { balls, rng, .. } = self;
        if let Some(ball) = balls.iter_mut().find(|b| !b.is_clone) {
            ball.serve(rng);
        }
    }
}
