//! Typed broadcast events
//!
//! Replaces ad-hoc delegate wiring with a single queue. Producers push,
//! the tick loop routes events to internal consumers in a fixed order,
//! and the UI layer drains whatever is left after each tick. Subscriber
//! lifetime problems can't happen: there are no subscribers to leak.

use serde::{Deserialize, Serialize};

use super::hazards::HazardKind;
use super::match_state::PlayMode;
use super::skills::SkillKind;
use super::state::Side;

/// A broadcast notification. Fire-and-forget, one-to-many.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Both scores, emitted after every change (including resets)
    ScoreChanged { left: u32, right: u32 },
    /// A rally ended without deciding the match
    PointScored { side: Side },
    /// UI hint: flash the score display for this side
    ScoreHighlight { side: Side },
    /// Full match reset: scores zeroed, hazards and skills cleared
    MatchReset,
    /// A side reached the win score; terminal until the next level init
    MatchWon { side: Side },
    PauseChanged { paused: bool },
    PlayModeChanged { mode: PlayMode },
    LevelStarted { level: u32 },
    /// `is_final` distinguishes beating the last level from an intermediate one
    LevelComplete { level: u32, is_final: bool },
    GameOver { level: u32 },
    HazardSpawned { row: usize, col: usize, kind: HazardKind },
    HazardRemoved { row: usize, col: usize, kind: HazardKind },
    SkillActivated { side: Side, slot: usize, kind: SkillKind },
}

/// Broadcast queue with a routing cursor.
///
/// `routed` marks how far the internal consumers have processed; events
/// pushed during routing are picked up by the same pass, so cascades
/// (reset triggered by a point, for example) resolve within one tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventQueue {
    items: Vec<GameEvent>,
    routed: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.items.push(event);
    }

    /// Next event the internal routing pass hasn't seen yet
    pub(crate) fn next_unrouted(&mut self) -> Option<GameEvent> {
        let ev = self.items.get(self.routed).copied();
        if ev.is_some() {
            self.routed += 1;
        }
        ev
    }

    /// Hand all pending events to the external consumer and clear the queue
    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.routed = 0;
        std::mem::take(&mut self.items)
    }

    /// Events currently pending (routed or not), oldest first
    pub fn pending(&self) -> &[GameEvent] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
