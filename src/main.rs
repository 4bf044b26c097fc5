//! Elemental Pong entry point
//!
//! Headless demo runner: plays the campaign AI-vs-AI at fixed timestep and
//! logs the emitted events. A graphical frontend would drive the same sim
//! loop from its frame callback instead.

use elemental_pong::consts::*;
use elemental_pong::progress::Progress;
use elemental_pong::sim::{GameEvent, GameState, PlayMode, TickInput, tick};

fn main() {
    env_logger::init();

    let mut seed: u64 = 0x5eed;
    let mut level: Option<u32> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                seed = args
                    .next()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_else(|| {
                        log::warn!("--seed needs a number, using default");
                        seed
                    });
            }
            "--level" => {
                level = args.next().and_then(|v| v.parse().ok());
            }
            other => {
                log::warn!("ignoring unknown argument {other:?}");
            }
        }
    }

    let mut progress = Progress::load();
    let start_level = level.unwrap_or(progress.current_level);
    log::info!("starting level {start_level} with seed {seed}");

    let mut state = GameState::new(seed);
    state.match_state.play_mode = PlayMode::AiVsAi;
    state.start_level(start_level);

    let input = TickInput::default();
    // Hard backstop so a degenerate AI stalemate still terminates.
    let max_ticks = 120 * 60 * 30;

    for _ in 0..max_ticks {
        tick(&mut state, &input, SIM_DT);

        let mut done = false;
        for event in state.events.drain() {
            match event {
                GameEvent::ScoreChanged { left, right } => {
                    log::info!("score {left} - {right}");
                }
                GameEvent::HazardSpawned { row, col, kind } => {
                    log::debug!("{kind:?} hazard at ({row}, {col})");
                }
                GameEvent::SkillActivated { side, kind, .. } => {
                    log::info!("{side:?} used {}", kind.name());
                }
                GameEvent::LevelComplete { level, is_final } => {
                    progress.record_completion(level, MAX_LEVEL);
                    if let Err(e) = progress.save() {
                        log::warn!("failed to save progress: {e}");
                    }
                    if is_final {
                        log::info!("campaign complete at level {level}");
                        done = true;
                    } else {
                        log::info!("level {level} complete, advancing");
                        state.start_level(level + 1);
                    }
                }
                GameEvent::GameOver { level } => {
                    if let Err(e) = progress.save() {
                        log::warn!("failed to save progress: {e}");
                    }
                    log::info!("defeated at level {level}");
                    done = true;
                }
                _ => {}
            }
        }
        if done {
            return;
        }
    }
    log::warn!("tick budget exhausted without a result");
}
