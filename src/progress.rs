//! Campaign progress persistence
//!
//! Persisted as JSON in the platform data directory, separately from any
//! in-match state. Missing or corrupt files fall back to defaults so a bad
//! save never blocks starting the game.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const APP_DIR: &str = "elemental-pong";
const PROGRESS_FILE: &str = "progress.json";

/// Saved campaign progress and preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    /// Highest level unlocked (1-based)
    pub current_level: u32,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
}

impl Default for Progress {
    fn default() -> Self {
        Self { current_level: 1, master_volume: 1.0 }
    }
}

impl Progress {
    fn path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join(APP_DIR).join(PROGRESS_FILE))
    }

    /// Load saved progress, falling back to defaults if the file is
    /// missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            log::warn!("no data directory available, using default progress");
            return Self::default();
        };
        match fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(progress) => progress,
                Err(e) => {
                    log::warn!("corrupt progress file {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Save progress, creating the data directory if needed.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::path() else {
            return Err(std::io::Error::other("no data directory available"));
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(std::io::Error::other)?;
        fs::write(&path, json)?;
        log::debug!("saved progress to {}", path.display());
        Ok(())
    }

    /// Record a completed level, keeping the furthest unlock.
    pub fn record_completion(&mut self, level: u32, max_level: u32) {
        let next = (level + 1).min(max_level);
        if next > self.current_level {
            self.current_level = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_progress_starts_at_level_one() {
        let p = Progress::default();
        assert_eq!(p.current_level, 1);
        assert_eq!(p.master_volume, 1.0);
    }

    #[test]
    fn test_record_completion_only_moves_forward() {
        let mut p = Progress { current_level: 5, master_volume: 1.0 };
        p.record_completion(2, 15);
        assert_eq!(p.current_level, 5);
        p.record_completion(7, 15);
        assert_eq!(p.current_level, 8);
        p.record_completion(15, 15);
        assert_eq!(p.current_level, 15);
    }

    #[test]
    fn test_progress_round_trips_through_json() {
        let p = Progress { current_level: 9, master_volume: 0.4 };
        let json = serde_json::to_string(&p).unwrap();
        let back: Progress = serde_json::from_str(&json).unwrap();
        assert_eq!(back.current_level, 9);
        assert_eq!(back.master_volume, 0.4);
    }
}
