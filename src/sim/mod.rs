//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod ai;
pub mod events;
pub mod hazards;
pub mod level;
pub mod match_state;
pub mod scheduler;
pub mod skills;
pub mod state;
pub mod tick;

pub use events::{EventQueue, GameEvent};
pub use hazards::{Hazard, HazardGrid, HazardKind};
pub use level::{LevelCatalog, LevelDefinition, LevelProgression};
pub use match_state::{MatchPhase, MatchState, PlayMode};
pub use scheduler::{Scheduler, TimerAction, TimerId};
pub use skills::{EquipError, SkillInstance, SkillKind, SkillRegistry};
pub use state::{Ball, GameState, Paddle, Side};
pub use tick::{TickInput, tick};
