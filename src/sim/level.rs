//! Level definitions and progression
//!
//! The catalog holds authored definitions; a requested level with no
//! authored entry gets a synthesized default (win score 5, difficulty and
//! hazard pressure scaling with the level, hazard types unlocked
//! progressively). The current-level pointer is clamped to [1, max] and
//! never overflows past the final level.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

use super::events::GameEvent;
use super::hazards::HazardKind;
use super::match_state::MatchPhase;
use super::scheduler::TimerAction;
use super::state::{GameState, Side};

/// Authored configuration for one level. Immutable after authoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub level_number: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub win_score: u32,
    /// 0 = easy, 1 = perfect
    pub ai_difficulty: f32,
    #[serde(default)]
    pub ai_uses_skills: bool,
    /// Indices into [`super::skills::SKILL_CATALOG`] the AI equips
    #[serde(default)]
    pub ai_skill_indices: Vec<usize>,
    /// Hazard spawns per second
    pub hazard_frequency: f32,
    pub hazard_duration_secs: f32,
    pub available_hazards: Vec<HazardKind>,
    /// Skills offered to the human at level-complete
    #[serde(default)]
    pub selectable_skill_indices: Vec<usize>,
}

impl LevelDefinition {
    /// Synthesized default for a level with no authored definition
    pub fn synthesized(level: u32) -> Self {
        let mut available = Vec::new();
        if level >= 3 {
            available.push(HazardKind::Fire);
        }
        if level >= 5 {
            available.push(HazardKind::Water);
        }
        if level >= 8 {
            available.push(HazardKind::Air);
        }
        Self {
            level_number: level,
            name: format!("Level {level}"),
            description: String::new(),
            win_score: DEFAULT_WIN_SCORE,
            ai_difficulty: (0.5 + level as f32 * 0.05).min(1.0),
            ai_uses_skills: level >= 6,
            ai_skill_indices: if level >= 6 { vec![1, 2] } else { Vec::new() },
            hazard_frequency: (0.1 + level as f32 * 0.02).min(0.5),
            hazard_duration_secs: DEFAULT_HAZARD_DURATION_SECS,
            available_hazards: available,
            selectable_skill_indices: (0..(level as usize).min(6)).collect(),
        }
    }
}

/// Authored level list, looked up by level number
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelCatalog {
    pub definitions: Vec<LevelDefinition>,
}

impl LevelCatalog {
    /// The shipped campaign: a handful of authored levels, the rest
    /// synthesized on demand
    pub fn campaign() -> Self {
        Self {
            definitions: vec![
                LevelDefinition {
                    level_number: 1,
                    name: "First Rally".into(),
                    description: "A plain court. Learn the paddle.".into(),
                    win_score: 3,
                    ai_difficulty: 0.35,
                    ai_uses_skills: false,
                    ai_skill_indices: Vec::new(),
                    hazard_frequency: 0.0,
                    hazard_duration_secs: DEFAULT_HAZARD_DURATION_SECS,
                    available_hazards: Vec::new(),
                    selectable_skill_indices: vec![0],
                },
                LevelDefinition {
                    level_number: 2,
                    name: "Warming Up".into(),
                    description: "The opponent starts paying attention.".into(),
                    win_score: 4,
                    ai_difficulty: 0.45,
                    ai_uses_skills: false,
                    ai_skill_indices: Vec::new(),
                    hazard_frequency: 0.0,
                    hazard_duration_secs: DEFAULT_HAZARD_DURATION_SECS,
                    available_hazards: Vec::new(),
                    selectable_skill_indices: vec![0, 1],
                },
                LevelDefinition {
                    level_number: 3,
                    name: "Scorched Court".into(),
                    description: "Fire patches speed the ball up on contact.".into(),
                    win_score: 5,
                    ai_difficulty: 0.5,
                    ai_uses_skills: false,
                    ai_skill_indices: Vec::new(),
                    hazard_frequency: 0.15,
                    hazard_duration_secs: DEFAULT_HAZARD_DURATION_SECS,
                    available_hazards: vec![HazardKind::Fire],
                    selectable_skill_indices: vec![0, 1, 2],
                },
                LevelDefinition {
                    level_number: 5,
                    name: "Tidal Shift".into(),
                    description: "Water patches drag the ball down.".into(),
                    win_score: 5,
                    ai_difficulty: 0.6,
                    ai_uses_skills: true,
                    ai_skill_indices: vec![2, 4],
                    hazard_frequency: 0.2,
                    hazard_duration_secs: DEFAULT_HAZARD_DURATION_SECS,
                    available_hazards: vec![HazardKind::Fire, HazardKind::Water],
                    selectable_skill_indices: vec![0, 1, 2, 3],
                },
                LevelDefinition {
                    level_number: 8,
                    name: "Crosswinds".into(),
                    description: "Air cells shove the ball around.".into(),
                    win_score: 5,
                    ai_difficulty: 0.7,
                    ai_uses_skills: true,
                    ai_skill_indices: vec![1, 5],
                    hazard_frequency: 0.26,
                    hazard_duration_secs: DEFAULT_HAZARD_DURATION_SECS,
                    available_hazards: vec![HazardKind::Fire, HazardKind::Water, HazardKind::Air],
                    selectable_skill_indices: vec![0, 1, 2, 3, 4, 5],
                },
            ],
        }
    }

    pub fn get(&self, level: u32) -> Option<&LevelDefinition> {
        self.definitions.iter().find(|d| d.level_number == level)
    }
}

/// Owns the authoritative current-level pointer and the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelProgression {
    pub current: u32,
    pub max_level: u32,
    pub catalog: LevelCatalog,
    /// Definition applied by the last level init
    pub active: Option<LevelDefinition>,
}

impl Default for LevelProgression {
    fn default() -> Self {
        Self {
            current: 1,
            max_level: MAX_LEVEL,
            catalog: LevelCatalog::campaign(),
            active: None,
        }
    }
}

impl LevelProgression {
    /// Authored definition if present, synthesized otherwise
    pub fn definition(&self, level: u32) -> LevelDefinition {
        match self.catalog.get(level) {
            Some(def) => def.clone(),
            None => {
                log::warn!("no authored definition for level {level}, synthesizing default");
                LevelDefinition::synthesized(level)
            }
        }
    }

    /// Move the pointer forward; terminal at max_level (no overflow)
    pub fn advance(&mut self) {
        if self.current < self.max_level {
            self.current += 1;
        }
    }

    pub fn at_final_level(&self) -> bool {
        self.current >= self.max_level
    }
}

impl GameState {
    /// Initialize a level: clamp, apply win score and AI parameters,
    /// reset the match (which clears hazards, skills and clones), equip
    /// the AI's skill pool, arm hazard spawning, broadcast level-started.
    pub fn start_level(&mut self, level: u32) {
        let level = level.clamp(1, self.levels.max_level);
        let def = self.levels.definition(level);
        self.levels.current = level;

        self.match_state.win_score = def.win_score.max(1);

        if let Some(timer) = self.spawn_timer.take() {
            self.scheduler.cancel(timer);
        }

        // Full reset first so it can't wipe the AI skills equipped below
        self.reset_match();
        self.route_pending_events();

        for controller in &mut self.ai {
            controller.configure(def.ai_difficulty, def.ai_uses_skills);
        }
        if def.ai_uses_skills {
            for (slot, &index) in def.ai_skill_indices.iter().take(SKILL_SLOTS).enumerate() {
                match super::skills::SkillKind::from_index(index) {
                    Some(kind) => {
                        let _ = self.equip_skill(Side::Right, slot, kind, None);
                    }
                    None => log::warn!("level {level} references unknown skill index {index}"),
                }
            }
        }

        if def.hazard_frequency > 0.0 && !def.available_hazards.is_empty() {
            self.schedule_spawn_pulse(def.hazard_frequency);
        }
        self.levels.active = Some(def);

        self.events.push(GameEvent::LevelStarted { level });
        self.route_pending_events();
        log::info!("level {level} started");
    }

    /// Re-initialize the same level (after a loss)
    pub fn retry_level(&mut self) {
        self.start_level(self.levels.current);
    }

    /// Start whatever level the progression pointer now names (after a
    /// win, `advance` has already moved it)
    pub fn continue_to_next_level(&mut self) {
        self.start_level(self.levels.current);
    }

    fn schedule_spawn_pulse(&mut self, frequency: f32) {
        let base = 1.0 / frequency;
        let wait = self.rng.random_range(base * 0.7..base * 1.3);
        self.spawn_timer =
            Some(self.scheduler
                .schedule_in(self.time_ticks, wait, TimerAction::HazardSpawnPulse));
    }

    /// One pulse of the level's hazard pacing: spawn, then re-arm.
    /// From level 5 on there is a 20% chance of a full row or column.
    pub(crate) fn hazard_spawn_pulse(&mut self) {
        self.spawn_timer = None;
        if self.match_state.phase != MatchPhase::Running {
            return;
        }
        let Some(def) = self.levels.active.clone() else {
            return;
        };
        if def.available_hazards.is_empty() {
            return;
        }
        let kind = def.available_hazards[self.rng.random_range(0..def.available_hazards.len())];
        let duration = Some(def.hazard_duration_secs);

        if self.levels.current > 4 && self.rng.random::<f32>() < 0.2 {
            if self.rng.random_bool(0.5) {
                let row = self.rng.random_range(0..self.grid.rows);
                self.spawn_hazard_row(row, kind, duration);
            } else {
                let col = self.rng.random_range(0..self.grid.columns);
                self.spawn_hazard_column(col, kind, duration);
            }
        } else {
            self.spawn_hazard_random(kind, duration);
        }

        if def.hazard_frequency > 0.0 {
            self.schedule_spawn_pulse(def.hazard_frequency);
        }
    }
}
