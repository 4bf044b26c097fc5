//! Skill registry
//!
//! Each side holds at most two equipped skills, independently cooled
//! down. Activation executes the effect immediately and schedules the
//! cooldown reset; activating while on cooldown is a no-op and does not
//! restart the timer.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::rotate_vec;

use super::events::GameEvent;
use super::scheduler::{TimerAction, TimerId};
use super::state::{Ball, GameState, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    DoubleBall,
    SpeedUpBall,
    SlowDownBall,
    EnlargePaddle,
    ShrinkPaddle,
    Fireball,
}

/// Catalog order; level definitions reference skills by these indices
pub const SKILL_CATALOG: [SkillKind; 6] = [
    SkillKind::DoubleBall,
    SkillKind::SpeedUpBall,
    SkillKind::SlowDownBall,
    SkillKind::EnlargePaddle,
    SkillKind::ShrinkPaddle,
    SkillKind::Fireball,
];

impl SkillKind {
    pub fn from_index(index: usize) -> Option<Self> {
        SKILL_CATALOG.get(index).copied()
    }

    pub fn cooldown_secs(self) -> f32 {
        match self {
            SkillKind::Fireball => FIREBALL_COOLDOWN_SECS,
            _ => DEFAULT_SKILL_COOLDOWN_SECS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SkillKind::DoubleBall => "Double Ball",
            SkillKind::SpeedUpBall => "Speed Up Ball",
            SkillKind::SlowDownBall => "Slow Down Ball",
            SkillKind::EnlargePaddle => "Enlarge Paddle",
            SkillKind::ShrinkPaddle => "Shrink Paddle",
            SkillKind::Fireball => "Fireball",
        }
    }
}

/// Why an equip attempt was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipError {
    SlotOutOfRange,
    SlotOccupied,
}

/// An equipped skill bound to one side and input slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillInstance {
    pub kind: SkillKind,
    /// UI-assignable activation key
    pub binding: Option<char>,
    pub cooldown_secs: f32,
    pub on_cooldown: bool,
    /// Simulation tick at which the cooldown elapses (UI display)
    pub ready_at: u64,
    pub cooldown_timer: Option<TimerId>,
}

impl SkillInstance {
    fn new(kind: SkillKind, binding: Option<char>) -> Self {
        Self {
            kind,
            binding,
            cooldown_secs: kind.cooldown_secs(),
            on_cooldown: false,
            ready_at: 0,
            cooldown_timer: None,
        }
    }

    pub fn cooldown_remaining_ticks(&self, now: u64) -> u64 {
        if self.on_cooldown {
            self.ready_at.saturating_sub(now)
        } else {
            0
        }
    }
}

/// Per-side equipped skills, at most [`SKILL_SLOTS`] each
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillRegistry {
    slots: [[Option<SkillInstance>; SKILL_SLOTS]; 2],
}

impl SkillRegistry {
    pub fn get(&self, side: Side, slot: usize) -> Option<&SkillInstance> {
        self.slots[side.index()].get(slot).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, side: Side, slot: usize) -> Option<&mut SkillInstance> {
        self.slots[side.index()].get_mut(slot).and_then(|s| s.as_mut())
    }

    /// Equip into a specific slot. Fails if the slot index is out of range
    /// or already occupied (no implicit eviction).
    pub fn equip(
        &mut self,
        side: Side,
        slot: usize,
        kind: SkillKind,
        binding: Option<char>,
    ) -> Result<(), EquipError> {
        let entry = self.slots[side.index()]
            .get_mut(slot)
            .ok_or(EquipError::SlotOutOfRange)?;
        if entry.is_some() {
            return Err(EquipError::SlotOccupied);
        }
        *entry = Some(SkillInstance::new(kind, binding));
        Ok(())
    }

    pub fn remove(&mut self, side: Side, slot: usize) -> Option<SkillInstance> {
        self.slots[side.index()].get_mut(slot).and_then(|s| s.take())
    }

    pub fn equipped_count(&self, side: Side) -> usize {
        self.slots[side.index()].iter().flatten().count()
    }

    /// Occupied slot indices for a side, in order
    pub fn occupied_slots(&self, side: Side) -> Vec<usize> {
        self.slots[side.index()]
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|_| i))
            .collect()
    }
}

impl GameState {
    /// Equip a skill for a side. Rejection leaves existing equipment
    /// untouched and is reported to the caller.
    pub fn equip_skill(
        &mut self,
        side: Side,
        slot: usize,
        kind: SkillKind,
        binding: Option<char>,
    ) -> Result<(), EquipError> {
        let result = self.skills.equip(side, slot, kind, binding);
        if let Err(e) = result {
            log::warn!("equip {kind:?} for {side:?} slot {slot} rejected: {e:?}");
        }
        result
    }

    /// Activate the skill in a slot. Returns false (no effect, timer not
    /// restarted) if the slot is empty or still cooling down.
    pub fn activate_skill(&mut self, side: Side, slot: usize) -> bool {
        let Some(instance) = self.skills.get(side, slot) else {
            return false;
        };
        if instance.on_cooldown {
            return false;
        }
        let kind = instance.kind;
        let cooldown = instance.cooldown_secs;
        let now = self.time_ticks;

        self.execute_skill(kind, side);

        let timer = self
            .scheduler
            .schedule_in(now, cooldown, TimerAction::CooldownReady { side, slot });
        if let Some(instance) = self.skills.get_mut(side, slot) {
            instance.on_cooldown = true;
            instance.ready_at = now + crate::secs_to_ticks(cooldown);
            instance.cooldown_timer = Some(timer);
        }
        self.events.push(GameEvent::SkillActivated { side, slot, kind });
        log::debug!("{side:?} activated {kind:?} (slot {slot})");
        true
    }

    fn execute_skill(&mut self, kind: SkillKind, side: Side) {
        let now = self.time_ticks;
        match kind {
            SkillKind::DoubleBall => {
                // Clone the primary ball with its velocity rotated by a
                // fixed angle; force-removed on the next point regardless
                // of its own timer
                let Some(source) = self.primary_ball().cloned() else {
                    return;
                };
                let id = self.ids.next_id();
                let mut clone = Ball::new(id);
                clone.pos = source.pos;
                clone.vel = rotate_vec(source.vel, DOUBLE_BALL_ANGLE_DEG.to_radians());
                clone.last_hit = source.last_hit;
                clone.is_clone = true;
                clone.clone_timer = Some(self.scheduler.schedule_in(
                    now,
                    DOUBLE_BALL_SECS,
                    TimerAction::CloneExpire { ball: id },
                ));
                self.balls.push(clone);
                self.normalize_order();
            }
            SkillKind::SpeedUpBall => {
                if self
                    .primary_ball_mut()
                    .map(|b| b.scale_speed(SPEED_UP_RATIO))
                    .is_some()
                {
                    self.scheduler.schedule_in(
                        now,
                        SPEED_UP_SECS,
                        TimerAction::BallSpeedRestore { ratio: SPEED_UP_RATIO },
                    );
                }
            }
            SkillKind::SlowDownBall => {
                if self
                    .primary_ball_mut()
                    .map(|b| b.scale_speed(SLOW_DOWN_RATIO))
                    .is_some()
                {
                    self.scheduler.schedule_in(
                        now,
                        SLOW_DOWN_SECS,
                        TimerAction::BallSpeedRestore { ratio: SLOW_DOWN_RATIO },
                    );
                }
            }
            SkillKind::EnlargePaddle => {
                let idx = side.index();
                let snapshot = self.paddles[idx].scale;
                self.paddles[idx].scale *= ENLARGE_PADDLE_FACTOR;
                self.scheduler.schedule_in(
                    now,
                    ENLARGE_PADDLE_SECS,
                    TimerAction::PaddleScaleRevert { side, scale: snapshot },
                );
            }
            SkillKind::ShrinkPaddle => {
                // Targets the opponent's paddle
                let target = side.opponent();
                let idx = target.index();
                let snapshot = self.paddles[idx].scale;
                self.paddles[idx].scale *= SHRINK_PADDLE_FACTOR;
                self.scheduler.schedule_in(
                    now,
                    SHRINK_PADDLE_SECS,
                    TimerAction::PaddleScaleRevert { side: target, scale: snapshot },
                );
            }
            SkillKind::Fireball => {
                // Affects balls last touched by this side (or untouched).
                // The speed boost persists past the burn window.
                let mut marked = Vec::new();
                for ball in &mut self.balls {
                    if ball.last_hit == Some(side) || ball.last_hit.is_none() {
                        ball.fire_touched = true;
                        ball.burning = true;
                        ball.scale_speed(FIREBALL_SPEED_BOOST);
                        marked.push(ball.id);
                    }
                }
                for id in marked {
                    self.scheduler
                        .schedule_in(now, FIREBALL_SECS, TimerAction::FireballEnd { ball: id });
                }
            }
        }
    }

    /// Remove all equipped skills for one side (or both), cancelling any
    /// pending cooldown timers. Invoked on every match reset.
    pub fn clear_skills(&mut self, side: Option<Side>) {
        let sides: &[Side] = match side {
            Some(Side::Left) => &[Side::Left],
            Some(Side::Right) => &[Side::Right],
            None => &[Side::Left, Side::Right],
        };
        for &s in sides {
            for slot in 0..SKILL_SLOTS {
                if let Some(instance) = self.skills.remove(s, slot) {
                    if let Some(timer) = instance.cooldown_timer {
                        self.scheduler.cancel(timer);
                    }
                }
            }
        }
    }

    /// Mark a slot ready again (scheduler callback). Skips silently if the
    /// skill was removed in the meantime.
    pub(crate) fn finish_cooldown(&mut self, side: Side, slot: usize) {
        if let Some(instance) = self.skills.get_mut(side, slot) {
            instance.on_cooldown = false;
            instance.cooldown_timer = None;
        }
    }

    /// Fireball burn-through: while a ball is burning, any hazard sharing
    /// its cell is removed with a fixed chance per tick.
    pub(crate) fn apply_burn_through(&mut self) {
        let mut removals = Vec::new();
        for ball in &self.balls {
            if !ball.burning {
                continue;
            }
            if let Some((r, c)) = ball.cell {
                if let Some(h) = self.grid.hazard_at(r, c) {
                    if self.rng.random::<f32>() < FIREBALL_BURN_CHANCE {
                        removals.push(h.id);
                    }
                }
            }
        }
        for id in removals {
            self.remove_hazard(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::match_state::MatchPhase;
    use glam::Vec2;

    fn state() -> GameState {
        let mut s = GameState::new(99);
        s.match_state.phase = MatchPhase::Running;
        if let Some(ball) = s.primary_ball_mut() {
            ball.vel = Vec2::new(4.0, 0.0);
        }
        s
    }

    #[test]
    fn test_third_skill_rejected() {
        let mut s = state();
        assert!(s.equip_skill(Side::Left, 0, SkillKind::DoubleBall, Some('q')).is_ok());
        assert!(s.equip_skill(Side::Left, 1, SkillKind::Fireball, Some('w')).is_ok());
        assert_eq!(
            s.equip_skill(Side::Left, 2, SkillKind::SpeedUpBall, None),
            Err(EquipError::SlotOutOfRange)
        );
        assert_eq!(
            s.equip_skill(Side::Left, 0, SkillKind::SpeedUpBall, None),
            Err(EquipError::SlotOccupied)
        );
        // Existing two are untouched
        assert_eq!(s.skills.get(Side::Left, 0).unwrap().kind, SkillKind::DoubleBall);
        assert_eq!(s.skills.get(Side::Left, 1).unwrap().kind, SkillKind::Fireball);
        assert_eq!(s.skills.equipped_count(Side::Left), 2);
    }

    #[test]
    fn test_activation_on_cooldown_is_noop() {
        let mut s = state();
        s.equip_skill(Side::Left, 0, SkillKind::SpeedUpBall, None).unwrap();
        assert!(s.activate_skill(Side::Left, 0));
        let ready_at = s.skills.get(Side::Left, 0).unwrap().ready_at;
        let speed = s.primary_ball().unwrap().speed();

        // Second activation: no effect, timer not restarted
        s.time_ticks += 10;
        assert!(!s.activate_skill(Side::Left, 0));
        assert_eq!(s.skills.get(Side::Left, 0).unwrap().ready_at, ready_at);
        assert!((s.primary_ball().unwrap().speed() - speed).abs() < 1e-5);
    }

    #[test]
    fn test_cooldown_ready_exactly_once() {
        let mut s = state();
        s.equip_skill(Side::Right, 1, SkillKind::SlowDownBall, None).unwrap();
        s.activate_skill(Side::Right, 1);
        assert!(s.skills.get(Side::Right, 1).unwrap().on_cooldown);

        let due = s.scheduler.drain_due(u64::MAX);
        let ready: Vec<_> = due
            .iter()
            .filter(|(_, a)| matches!(a, TimerAction::CooldownReady { side: Side::Right, slot: 1 }))
            .collect();
        assert_eq!(ready.len(), 1);
        s.finish_cooldown(Side::Right, 1);
        assert!(!s.skills.get(Side::Right, 1).unwrap().on_cooldown);
    }

    #[test]
    fn test_double_ball_spawns_rotated_clone() {
        let mut s = state();
        s.equip_skill(Side::Left, 0, SkillKind::DoubleBall, None).unwrap();
        s.activate_skill(Side::Left, 0);
        assert_eq!(s.balls.len(), 2);
        let clone = s.balls.iter().find(|b| b.is_clone).unwrap();
        let primary = s.primary_ball().unwrap();
        assert!((clone.speed() - primary.speed()).abs() < 1e-4);
        let angle = primary.vel.angle_to(clone.vel).abs();
        assert!((angle - DOUBLE_BALL_ANGLE_DEG.to_radians()).abs() < 1e-3);
        assert!(clone.clone_timer.is_some());
    }

    #[test]
    fn test_paddle_skills_snapshot_restore() {
        let mut s = state();
        s.equip_skill(Side::Left, 0, SkillKind::EnlargePaddle, None).unwrap();
        s.equip_skill(Side::Right, 0, SkillKind::ShrinkPaddle, None).unwrap();
        s.activate_skill(Side::Left, 0);
        assert!((s.paddles[0].scale - ENLARGE_PADDLE_FACTOR).abs() < 1e-5);
        // Shrink targets the opponent (left)
        s.activate_skill(Side::Right, 0);
        assert!((s.paddles[0].scale - ENLARGE_PADDLE_FACTOR * SHRINK_PADDLE_FACTOR).abs() < 1e-5);
        assert!((s.paddles[1].scale - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_fireball_marks_and_boosts() {
        let mut s = state();
        s.equip_skill(Side::Left, 0, SkillKind::Fireball, None).unwrap();
        let before = s.primary_ball().unwrap().speed();
        s.activate_skill(Side::Left, 0);
        let ball = s.primary_ball().unwrap();
        assert!(ball.fire_touched);
        assert!(ball.burning);
        assert!((ball.speed() - before * FIREBALL_SPEED_BOOST).abs() < 1e-4);
        // Fireball has the longer cooldown
        let instance = s.skills.get(Side::Left, 0).unwrap();
        assert_eq!(instance.cooldown_secs, FIREBALL_COOLDOWN_SECS);
    }

    #[test]
    fn test_clear_skills_cancels_cooldowns() {
        let mut s = state();
        s.equip_skill(Side::Left, 0, SkillKind::SpeedUpBall, None).unwrap();
        s.equip_skill(Side::Right, 0, SkillKind::SlowDownBall, None).unwrap();
        s.activate_skill(Side::Left, 0);
        s.activate_skill(Side::Right, 0);
        s.clear_skills(None);
        assert_eq!(s.skills.equipped_count(Side::Left), 0);
        assert_eq!(s.skills.equipped_count(Side::Right), 0);
        assert!(
            !s.scheduler
                .drain_due(u64::MAX)
                .iter()
                .any(|(_, a)| matches!(a, TimerAction::CooldownReady { .. }))
        );
    }

    #[test]
    fn test_burn_through_removes_hazard() {
        let mut s = state();
        s.spawn_hazard_at(2, 2, super::super::hazards::HazardKind::Water, None);
        let center = s.grid.cell(2, 2).unwrap().center;
        let ball = s.primary_ball_mut().unwrap();
        ball.pos = center;
        ball.burning = true;
        ball.cell = Some((2, 2));
        // 70% chance per tick: a handful of ticks removes it with
        // overwhelming probability under any seed
        for _ in 0..64 {
            s.apply_burn_through();
        }
        assert_eq!(s.grid.active_count(), 0);
    }
}
