//! Cancellable timer scheduler
//!
//! Replaces engine coroutines ("wait N seconds then act") with entries
//! keyed on an absolute expiry tick, drained once per simulation tick.
//! Actions are plain data dispatched by the tick loop; each one re-checks
//! that its target instance still exists before acting, so a late fire
//! against a removed hazard/skill/ball is a silent no-op.

use serde::{Deserialize, Serialize};

use crate::secs_to_ticks;

use super::state::Side;

/// Identity of a scheduled timer, used for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// What to do when a timer fires. Closed set: every timed effect in the
/// game is one of these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TimerAction {
    /// Remove a hazard whose duration elapsed
    HazardExpire { hazard: u32 },
    /// Re-roll an Air hazard's wind heading
    WindShift { hazard: u32 },
    /// Skill cooldown elapsed; slot is usable again
    CooldownReady { side: Side, slot: usize },
    /// Undo a ball speed modifier by dividing by the ratio it applied
    /// (direction-preserving, so concurrent modifiers compose)
    BallSpeedRestore { ratio: f32 },
    /// Restore a paddle's exact pre-effect scale (snapshot)
    PaddleScaleRevert { side: Side, scale: f32 },
    /// Remove a temporary clone ball
    CloneExpire { ball: u32 },
    /// End a fireball's burn-through window (speed boost is kept)
    FireballEnd { ball: u32 },
    /// Next pulse of the level's hazard spawn pacing
    HazardSpawnPulse,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct TimerEntry {
    id: TimerId,
    fire_at: u64,
    action: TimerAction,
}

/// Timer set advanced once per simulation tick.
///
/// Entries are stored unsorted (the set stays small) and drained in
/// (fire_at, id) order for determinism.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    entries: Vec<TimerEntry>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to fire `secs` from `now` (in simulation ticks)
    pub fn schedule_in(&mut self, now: u64, secs: f32, action: TimerAction) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(TimerEntry {
            id,
            fire_at: now + secs_to_ticks(secs),
            action,
        });
        id
    }

    /// Cancel a timer by identity. Cancelling an already-fired or unknown
    /// timer is a no-op.
    pub fn cancel(&mut self, id: TimerId) {
        self.entries.retain(|e| e.id != id);
    }

    /// Cancel every timer whose action matches the predicate
    pub fn cancel_matching(&mut self, mut pred: impl FnMut(&TimerAction) -> bool) {
        self.entries.retain(|e| !pred(&e.action));
    }

    /// Remove and return all entries due at `now`, in (fire_at, id) order
    pub fn drain_due(&mut self, now: u64) -> Vec<(TimerId, TimerAction)> {
        let mut due: Vec<TimerEntry> = Vec::new();
        self.entries.retain(|e| {
            if e.fire_at <= now {
                due.push(*e);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|e| (e.fire_at, e.id));
        due.into_iter().map(|e| (e.id, e.action)).collect()
    }

    /// Ticks until the timer fires, if it is still pending
    pub fn remaining_ticks(&self, id: TimerId, now: u64) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.fire_at.saturating_sub(now))
    }

    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
