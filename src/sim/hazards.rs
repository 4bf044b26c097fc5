//! Hazard grid
//!
//! A fixed rows x columns partition of the play area. Each cell holds at
//! most one hazard; assigning a new hazard to an occupied cell removes the
//! previous occupant first. Following the original play-area layout, rows
//! tile the x axis and columns tile the y axis.
//!
//! Per-kind effect contract:
//! - Fire: one-shot ball speed-up on entry; shrinks a paddle that wanders
//!   in, with a scheduled revert
//! - Water: one-shot ball slow-down on entry
//! - Air: continuous force on every ball inside the cell, tracked by an
//!   explicit membership set; wind re-rolls its heading on a fixed interval

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

use super::events::GameEvent;
use super::scheduler::{TimerAction, TimerId};
use super::state::{GameState, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardKind {
    Fire,
    Water,
    Air,
}

/// Air-specific state, colocated with the instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindState {
    pub dir: Vec2,
    pub shift_timer: Option<TimerId>,
    /// Ball ids currently inside the cell
    pub affected: Vec<u32>,
}

/// An active hazard, owned by its grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: u32,
    pub kind: HazardKind,
    pub row: usize,
    pub col: usize,
    pub spawned_at: u64,
    /// None means permanent
    pub duration_ticks: Option<u64>,
    pub expire_timer: Option<TimerId>,
    /// Present only for Air hazards
    pub wind: Option<WindState>,
}

/// One grid cell: an axis-aligned rectangle plus at most one hazard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub center: Vec2,
    pub size: Vec2,
    pub hazard: Option<Hazard>,
}

impl Cell {
    pub fn contains(&self, pos: Vec2) -> bool {
        (pos.x - self.center.x).abs() <= self.size.x / 2.0
            && (pos.y - self.center.y).abs() <= self.size.y / 2.0
    }
}

/// The grid partition. Cells tile the play area without gaps or overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardGrid {
    pub rows: usize,
    pub columns: usize,
    play_size: Vec2,
    cells: Vec<Cell>,
}

impl HazardGrid {
    pub fn new(rows: usize, columns: usize, width: f32, height: f32) -> Self {
        let cell_w = width / rows as f32;
        let cell_h = height / columns as f32;
        let start = Vec2::new(-width / 2.0 + cell_w / 2.0, -height / 2.0 + cell_h / 2.0);
        let mut cells = Vec::with_capacity(rows * columns);
        for r in 0..rows {
            for c in 0..columns {
                cells.push(Cell {
                    row: r,
                    col: c,
                    center: start + Vec2::new(r as f32 * cell_w, c as f32 * cell_h),
                    size: Vec2::new(cell_w, cell_h),
                    hazard: None,
                });
            }
        }
        Self {
            rows,
            columns,
            play_size: Vec2::new(width, height),
            cells,
        }
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.columns).then(|| row * self.columns + col)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.index(row, col).map(move |i| &mut self.cells[i])
    }

    /// Grid coordinate containing a world position, if inside the play area
    pub fn cell_at(&self, pos: Vec2) -> Option<(usize, usize)> {
        let half = self.play_size / 2.0;
        if pos.x.abs() > half.x || pos.y.abs() > half.y {
            return None;
        }
        let cell_w = self.play_size.x / self.rows as f32;
        let cell_h = self.play_size.y / self.columns as f32;
        let row = (((pos.x + half.x) / cell_w) as usize).min(self.rows - 1);
        let col = (((pos.y + half.y) / cell_h) as usize).min(self.columns - 1);
        Some((row, col))
    }

    pub fn hazard_at(&self, row: usize, col: usize) -> Option<&Hazard> {
        self.cell(row, col).and_then(|c| c.hazard.as_ref())
    }

    pub fn hazard_by_id(&self, id: u32) -> Option<&Hazard> {
        self.cells
            .iter()
            .filter_map(|c| c.hazard.as_ref())
            .find(|h| h.id == id)
    }

    pub fn hazard_by_id_mut(&mut self, id: u32) -> Option<&mut Hazard> {
        self.cells
            .iter_mut()
            .filter_map(|c| c.hazard.as_mut())
            .find(|h| h.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|c| c.hazard.is_some()).count()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cells with no active hazard, in (row, col) order
    pub fn free_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .filter(|c| c.hazard.is_none())
            .map(|c| (c.row, c.col))
            .collect()
    }
}

impl GameState {
    /// Spawn a hazard at a specific cell, replacing any prior occupant.
    /// `duration` of None means permanent. Returns the hazard id, or None
    /// if the coordinate is out of range (rejected, no state change).
    pub fn spawn_hazard_at(
        &mut self,
        row: usize,
        col: usize,
        kind: HazardKind,
        duration: Option<f32>,
    ) -> Option<u32> {
        if self.grid.cell(row, col).is_none() {
            log::warn!("hazard spawn rejected: cell ({row}, {col}) out of range");
            return None;
        }
        // Cell never silently orphans an active hazard
        if let Some(prev) = self.grid.hazard_at(row, col).map(|h| h.id) {
            self.remove_hazard(prev);
        }

        let id = self.ids.next_id();
        let now = self.time_ticks;
        // Balls already inside the cell: they count as having entered
        let in_cell: Vec<u32> = self
            .balls
            .iter()
            .filter(|b| b.cell == Some((row, col)))
            .map(|b| b.id)
            .collect();
        let expire_timer = duration
            .map(|secs| self.scheduler.schedule_in(now, secs, TimerAction::HazardExpire { hazard: id }));
        let wind = (kind == HazardKind::Air).then(|| {
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            WindState {
                dir: Vec2::new(angle.cos(), angle.sin()),
                shift_timer: Some(self.scheduler.schedule_in(
                    now,
                    WIND_SHIFT_SECS,
                    TimerAction::WindShift { hazard: id },
                )),
                affected: in_cell.clone(),
            }
        });

        if let Some(cell) = self.grid.cell_mut(row, col) {
            cell.hazard = Some(Hazard {
                id,
                kind,
                row,
                col,
                spawned_at: now,
                duration_ticks: duration.map(crate::secs_to_ticks),
                expire_timer,
                wind,
            });
        }
        // Fire/Water fire their one-shot entry effect on those occupants
        // now; Air's membership set was seeded above
        let factor = match kind {
            HazardKind::Fire => Some(FIRE_SPEED_FACTOR),
            HazardKind::Water => Some(WATER_SPEED_FACTOR),
            HazardKind::Air => None,
        };
        if let Some(factor) = factor {
            for ball in self.balls.iter_mut() {
                if in_cell.contains(&ball.id) {
                    ball.scale_speed(factor);
                }
            }
        }
        if kind == HazardKind::Fire {
            for idx in 0..2 {
                if self.paddles[idx].cell == Some((row, col)) {
                    self.shrink_paddle(idx);
                }
            }
        }
        self.events.push(GameEvent::HazardSpawned { row, col, kind });
        log::debug!("spawned {kind:?} hazard {id} at ({row}, {col})");
        Some(id)
    }

    /// Spawn in a uniformly random cell, preferring unoccupied cells and
    /// falling back to any cell when none is free
    pub fn spawn_hazard_random(&mut self, kind: HazardKind, duration: Option<f32>) -> Option<u32> {
        let free = self.grid.free_cells();
        let (row, col) = if free.is_empty() {
            (
                self.rng.random_range(0..self.grid.rows),
                self.rng.random_range(0..self.grid.columns),
            )
        } else {
            free[self.rng.random_range(0..free.len())]
        };
        self.spawn_hazard_at(row, col, kind, duration)
    }

    /// Spawn independently in every cell of a row
    pub fn spawn_hazard_row(&mut self, row: usize, kind: HazardKind, duration: Option<f32>) -> Vec<u32> {
        (0..self.grid.columns)
            .filter_map(|col| self.spawn_hazard_at(row, col, kind, duration))
            .collect()
    }

    /// Spawn independently in every cell of a column
    pub fn spawn_hazard_column(&mut self, col: usize, kind: HazardKind, duration: Option<f32>) -> Vec<u32> {
        (0..self.grid.rows)
            .filter_map(|row| self.spawn_hazard_at(row, col, kind, duration))
            .collect()
    }

    /// Remove a hazard by id: detach from its cell, cancel pending timers,
    /// release the wind membership set. Idempotent; removing an unknown id
    /// is silently ignored.
    pub fn remove_hazard(&mut self, id: u32) -> bool {
        let Some(hazard) = self.grid.hazard_by_id(id).cloned() else {
            return false;
        };
        if let Some(t) = hazard.expire_timer {
            self.scheduler.cancel(t);
        }
        if let Some(wind) = &hazard.wind {
            if let Some(t) = wind.shift_timer {
                self.scheduler.cancel(t);
            }
        }
        if let Some(cell) = self.grid.cell_mut(hazard.row, hazard.col) {
            cell.hazard = None;
        }
        self.events.push(GameEvent::HazardRemoved {
            row: hazard.row,
            col: hazard.col,
            kind: hazard.kind,
        });
        true
    }

    /// Remove every active hazard regardless of remaining duration
    pub fn clear_all_hazards(&mut self) {
        let ids: Vec<u32> = self
            .grid
            .cells()
            .iter()
            .filter_map(|c| c.hazard.as_ref().map(|h| h.id))
            .collect();
        for id in ids {
            self.remove_hazard(id);
        }
    }

    /// Re-roll an Air hazard's wind heading and schedule the next shift.
    /// No-op if the hazard is gone (stale timer).
    pub(crate) fn shift_wind(&mut self, hazard_id: u32) {
        let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
        let now = self.time_ticks;
        let next = self
            .scheduler
            .schedule_in(now, WIND_SHIFT_SECS, TimerAction::WindShift { hazard: hazard_id });
        match self.grid.hazard_by_id_mut(hazard_id).and_then(|h| h.wind.as_mut()) {
            Some(wind) => {
                wind.dir = Vec2::new(angle.cos(), angle.sin());
                wind.shift_timer = Some(next);
            }
            None => self.scheduler.cancel(next),
        }
    }

    /// Track ball and paddle cell membership, applying entry effects.
    /// Fire and Water are one-shot on entry; Air maintains its membership
    /// set for the continuous force pass.
    pub(crate) fn apply_cell_transitions(&mut self) {
        for i in 0..self.balls.len() {
            let pos = self.balls[i].pos;
            let new_cell = self.grid.cell_at(pos);
            let old_cell = self.balls[i].cell;
            if new_cell == old_cell {
                continue;
            }
            let ball_id = self.balls[i].id;
            if let Some((r, c)) = old_cell {
                if let Some(h) = self.grid.cell_mut(r, c).and_then(|c| c.hazard.as_mut()) {
                    if let Some(wind) = h.wind.as_mut() {
                        wind.affected.retain(|&b| b != ball_id);
                    }
                }
            }
            if let Some((r, c)) = new_cell {
                let kind = self.grid.hazard_at(r, c).map(|h| h.kind);
                match kind {
                    Some(HazardKind::Fire) => self.balls[i].scale_speed(FIRE_SPEED_FACTOR),
                    Some(HazardKind::Water) => self.balls[i].scale_speed(WATER_SPEED_FACTOR),
                    Some(HazardKind::Air) => {
                        if let Some(wind) = self
                            .grid
                            .cell_mut(r, c)
                            .and_then(|c| c.hazard.as_mut())
                            .and_then(|h| h.wind.as_mut())
                        {
                            if !wind.affected.contains(&ball_id) {
                                wind.affected.push(ball_id);
                            }
                        }
                    }
                    None => {}
                }
            }
            self.balls[i].cell = new_cell;
        }

        for idx in 0..2 {
            let pos = Vec2::new(self.paddles[idx].x(), self.paddles[idx].y);
            let new_cell = self.grid.cell_at(pos);
            if new_cell == self.paddles[idx].cell {
                continue;
            }
            if let Some((r, c)) = new_cell {
                if self.grid.hazard_at(r, c).map(|h| h.kind) == Some(HazardKind::Fire) {
                    self.shrink_paddle(idx);
                }
            }
            self.paddles[idx].cell = new_cell;
        }
    }

    /// Shrink a paddle caught in fire, scheduling a revert to its
    /// pre-shrink scale
    fn shrink_paddle(&mut self, idx: usize) {
        let side = if idx == 0 { Side::Left } else { Side::Right };
        let snapshot = self.paddles[idx].scale;
        self.paddles[idx].scale *= FIRE_PADDLE_SHRINK;
        self.scheduler.schedule_in(
            self.time_ticks,
            FIRE_PADDLE_SHRINK_SECS,
            TimerAction::PaddleScaleRevert { side, scale: snapshot },
        );
    }

    /// Apply each Air hazard's continuous force to the balls in its
    /// membership set. Stale ids (destroyed clones) are pruned.
    pub(crate) fn apply_wind_forces(&mut self, dt: f32) {
        let mut pushes: Vec<(u32, Vec2)> = Vec::new();
        for cell in self.grid.cells() {
            let Some(hazard) = &cell.hazard else { continue };
            let Some(wind) = &hazard.wind else { continue };
            for &ball_id in &wind.affected {
                pushes.push((ball_id, wind.dir * WIND_FORCE * dt));
            }
        }
        for (ball_id, push) in pushes {
            if let Some(ball) = self.balls.iter_mut().find(|b| b.id == ball_id) {
                ball.vel += push;
                let speed = ball.speed();
                if speed > BALL_MAX_SPEED {
                    ball.vel = ball.vel / speed * BALL_MAX_SPEED;
                }
            }
        }
        // Prune membership entries for balls that no longer exist
        let live: Vec<u32> = self.balls.iter().map(|b| b.id).collect();
        for cell in self.grid.cells.iter_mut() {
            if let Some(wind) = cell.hazard.as_mut().and_then(|h| h.wind.as_mut()) {
                wind.affected.retain(|id| live.contains(id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::match_state::MatchPhase;

    fn state() -> GameState {
        let mut s = GameState::new(123);
        s.match_state.phase = MatchPhase::Running;
        s
    }

    #[test]
    fn test_cells_tile_without_gaps() {
        let grid = HazardGrid::new(4, 5, 16.0, 10.0);
        assert_eq!(grid.cells().len(), 20);
        // Every in-bounds point maps to exactly one cell that contains it
        for &(x, y) in &[(0.0, 0.0), (-7.9, -4.9), (7.9, 4.9), (3.3, -2.2)] {
            let pos = Vec2::new(x, y);
            let (r, c) = grid.cell_at(pos).unwrap();
            assert!(grid.cell(r, c).unwrap().contains(pos));
        }
        assert_eq!(grid.cell_at(Vec2::new(9.0, 0.0)), None);
    }

    #[test]
    fn test_occupied_cell_replacement_is_exclusive() {
        let mut s = state();
        let fire = s.spawn_hazard_at(2, 3, HazardKind::Fire, Some(5.0)).unwrap();
        let water = s.spawn_hazard_at(2, 3, HazardKind::Water, Some(5.0)).unwrap();
        let h = s.grid.hazard_at(2, 3).unwrap();
        assert_eq!(h.id, water);
        assert_eq!(h.kind, HazardKind::Water);
        assert_eq!(s.grid.active_count(), 1);
        // Fire's expiry timer was cancelled: advancing past its duration
        // fires nothing for it, and a manual remove is a no-op
        assert!(!s.remove_hazard(fire));
        let due = s.scheduler.drain_due(u64::MAX);
        assert!(
            !due.iter()
                .any(|(_, a)| *a == TimerAction::HazardExpire { hazard: fire })
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut s = state();
        assert_eq!(s.spawn_hazard_at(99, 0, HazardKind::Fire, None), None);
        assert_eq!(s.grid.active_count(), 0);
    }

    #[test]
    fn test_row_and_column_spawns() {
        let mut s = state();
        let row = s.spawn_hazard_row(1, HazardKind::Water, Some(5.0));
        assert_eq!(row.len(), s.grid.columns);
        let col = s.spawn_hazard_column(3, HazardKind::Fire, Some(5.0));
        assert_eq!(col.len(), s.grid.rows);
        // Row 1 col 3 was replaced by the column spawn
        assert_eq!(s.grid.hazard_at(1, 3).unwrap().kind, HazardKind::Fire);
    }

    #[test]
    fn test_random_spawn_prefers_free_cells() {
        let mut s = state();
        // Fill all but one cell
        for r in 0..s.grid.rows {
            for c in 0..s.grid.columns {
                if (r, c) != (0, 0) {
                    s.spawn_hazard_at(r, c, HazardKind::Fire, None);
                }
            }
        }
        s.spawn_hazard_random(HazardKind::Water, None).unwrap();
        assert_eq!(s.grid.hazard_at(0, 0).unwrap().kind, HazardKind::Water);
        // Grid full: falls back to replacing some cell
        assert!(s.spawn_hazard_random(HazardKind::Air, None).is_some());
        assert_eq!(s.grid.active_count(), s.grid.rows * s.grid.columns);
    }

    #[test]
    fn test_clear_all_empties_grid_and_timers() {
        let mut s = state();
        s.spawn_hazard_at(0, 0, HazardKind::Air, Some(5.0));
        s.spawn_hazard_at(1, 1, HazardKind::Fire, Some(5.0));
        s.clear_all_hazards();
        assert_eq!(s.grid.active_count(), 0);
        assert!(
            !s.scheduler
                .drain_due(u64::MAX)
                .iter()
                .any(|(_, a)| matches!(
                    a,
                    TimerAction::HazardExpire { .. } | TimerAction::WindShift { .. }
                ))
        );
    }

    #[test]
    fn test_fire_entry_is_one_shot() {
        let mut s = state();
        s.spawn_hazard_at(2, 2, HazardKind::Fire, None);
        let center = s.grid.cell(2, 2).unwrap().center;
        let ball = s.primary_ball_mut().unwrap();
        ball.pos = center;
        ball.vel = Vec2::new(2.0, 0.0);
        s.apply_cell_transitions();
        let sped = s.primary_ball().unwrap().speed();
        assert!((sped - 2.0 * FIRE_SPEED_FACTOR).abs() < 1e-4);
        // Staying in the cell does not re-apply
        s.apply_cell_transitions();
        assert!((s.primary_ball().unwrap().speed() - sped).abs() < 1e-5);
    }

    #[test]
    fn test_spawn_under_ball_applies_entry_effect() {
        let mut s = state();
        let center = s.grid.cell(2, 2).unwrap().center;
        {
            let ball = s.primary_ball_mut().unwrap();
            ball.pos = center;
            ball.vel = Vec2::new(2.0, 0.0);
        }
        s.apply_cell_transitions();
        let ball_id = s.primary_ball().unwrap().id;

        // Fire spawned under a resident ball speeds it up immediately
        s.spawn_hazard_at(2, 2, HazardKind::Fire, None);
        assert!((s.primary_ball().unwrap().speed() - 2.0 * FIRE_SPEED_FACTOR).abs() < 1e-4);
        // Still one-shot: the next transition pass does not re-apply
        s.apply_cell_transitions();
        assert!((s.primary_ball().unwrap().speed() - 2.0 * FIRE_SPEED_FACTOR).abs() < 1e-4);

        // Air replacing it starts with the ball in its membership set,
        // so the wind pushes it from the first force pass
        s.spawn_hazard_at(2, 2, HazardKind::Air, None);
        let affected = &s.grid.hazard_at(2, 2).unwrap().wind.as_ref().unwrap().affected;
        assert_eq!(affected, &vec![ball_id]);
        let before = s.primary_ball().unwrap().vel;
        s.apply_wind_forces(SIM_DT);
        assert_ne!(s.primary_ball().unwrap().vel, before);
    }

    #[test]
    fn test_fire_spawned_under_paddle_shrinks_it() {
        let mut s = state();
        s.apply_cell_transitions();
        let (r, c) = s.paddles[1].cell.unwrap();
        s.spawn_hazard_at(r, c, HazardKind::Fire, None);
        assert!((s.paddles[1].scale - FIRE_PADDLE_SHRINK).abs() < 1e-5);
        let due = s.scheduler.drain_due(u64::MAX);
        assert!(due.iter().any(|(_, a)| matches!(
            a,
            TimerAction::PaddleScaleRevert { side: Side::Right, .. }
        )));
    }

    #[test]
    fn test_air_membership_and_force() {
        let mut s = state();
        s.spawn_hazard_at(1, 2, HazardKind::Air, None);
        let center = s.grid.cell(1, 2).unwrap().center;
        let ball_id = s.primary_ball().unwrap().id;
        let ball = s.primary_ball_mut().unwrap();
        ball.pos = center;
        ball.vel = Vec2::new(1.0, 0.0);
        s.apply_cell_transitions();
        let affected = &s.grid.hazard_at(1, 2).unwrap().wind.as_ref().unwrap().affected;
        assert_eq!(affected, &vec![ball_id]);

        let before = s.primary_ball().unwrap().vel;
        s.apply_wind_forces(SIM_DT);
        assert_ne!(s.primary_ball().unwrap().vel, before);

        // Force stops immediately on exit
        s.primary_ball_mut().unwrap().pos = Vec2::new(7.9, 4.9);
        s.apply_cell_transitions();
        assert!(
            s.grid
                .hazard_at(1, 2)
                .unwrap()
                .wind
                .as_ref()
                .unwrap()
                .affected
                .is_empty()
        );
    }

    #[test]
    fn test_paddle_fire_shrink_schedules_revert() {
        let mut s = state();
        // Paddle at x = -7.5 sits in row 0; put fire in its cell
        let (r, c) = s.grid.cell_at(Vec2::new(-PADDLE_X, 0.0)).unwrap();
        s.spawn_hazard_at(r, c, HazardKind::Fire, None);
        s.apply_cell_transitions();
        assert!((s.paddles[0].scale - FIRE_PADDLE_SHRINK).abs() < 1e-5);
        let due = s.scheduler.drain_due(u64::MAX);
        assert!(due.iter().any(|(_, a)| matches!(
            a,
            TimerAction::PaddleScaleRevert { side: Side::Left, .. }
        )));
    }
}
