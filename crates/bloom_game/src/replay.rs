//! Scripted input playback for headless runs and determinism tests.
//!
//! A replay lists the keys held on each frame. Press and release edges are
//! derived from consecutive frames by `InputState::set_held`, so a key held
//! for several frames triggers jump or attack only once.
//!
//! A frame normally lasts exactly `fixed_dt`. A frame may set its own `dt` to
//! model uneven host pacing; a frame too short to run a step keeps its press
//! edges for the next one.

use bloom_core::input::{InputState, Key};
use bloom_core::time::{TimeState, MAX_FRAME_DT};
use glam::Vec2;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::controller::PlayerState;
use crate::scene::Scene;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f64,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub keys: Vec<Key>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    /// Host delta for this frame in seconds. Defaults to the sequence's
    /// `fixed_dt`.
    #[serde(default)]
    pub dt: Option<f64>,
}

impl ReplayFrame {
    fn held(keys: &[Key], repeat: u32) -> Self {
        Self {
            keys: keys.to_vec(),
            repeat,
            dt: None,
        }
    }
}

impl ReplaySequence {
    /// Walk right, jump, attack, walk back left and attack again.
    pub fn demo() -> Self {
        Self {
            fixed_dt: default_dt(),
            frames: vec![
                ReplayFrame::held(&[], 30),
                ReplayFrame::held(&[Key::Right], 45),
                ReplayFrame::held(&[Key::Right, Key::Space], 1),
                ReplayFrame::held(&[Key::Right], 50),
                ReplayFrame::held(&[], 20),
                ReplayFrame::held(&[Key::X], 1),
                ReplayFrame::held(&[], 30),
                ReplayFrame::held(&[Key::Left], 90),
                ReplayFrame::held(&[], 5),
                ReplayFrame::held(&[Key::X], 1),
                ReplayFrame::held(&[], 30),
            ],
        }
    }

    /// One entry per host frame, `repeat` expanded.
    pub fn expanded_frames(&self) -> Vec<&ReplayFrame> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push(frame);
            }
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt <= 0.0 || !(..=MAX_FRAME_DT).contains(&replay.fixed_dt) {
        return Err(format!(
            "Replay validation failed: fixed_dt must be in (0, {}], got {}",
            MAX_FRAME_DT, replay.fixed_dt
        ));
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    for (i, frame) in replay.frames.iter().enumerate() {
        if let Some(dt) = frame.dt {
            if !(0.0..=MAX_FRAME_DT).contains(&dt) {
                return Err(format!(
                    "Replay validation failed: frames[{}].dt must be in [0, {}], got {}",
                    i, MAX_FRAME_DT, dt
                ));
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySummary {
    pub frames: usize,
    pub steps: u64,
    pub final_position: Option<Vec2>,
    pub final_state: Option<PlayerState>,
    pub containers_filled: usize,
    pub growth_objects: usize,
}

/// Feed `replay` through the input state and fixed-step clock into `scene`.
pub fn run_replay(scene: &mut Scene, replay: &ReplaySequence) -> ReplaySummary {
    let mut input = InputState::new();
    let mut time = TimeState::with_fixed_dt(replay.fixed_dt);
    let frames = replay.expanded_frames();
    let mut containers_filled = 0;
    let mut last = None;

    for frame in &frames {
        input.set_held(&frame.keys);
        time.advance(frame.dt.unwrap_or(replay.fixed_dt));
        while time.should_step() {
            let report = scene.step(&input, time.fixed_dt as f32);
            containers_filled += report.containers_filled;
            last = Some(report);
        }
        // Edges survive a frame that ran no step.
        if time.steps_this_frame > 0 {
            input.end_frame();
        }
        time.end_frame();
    }

    ReplaySummary {
        frames: frames.len(),
        steps: time.fixed_step_count,
        final_position: last.and_then(|report| report.position),
        final_state: last.and_then(|report| report.state),
        containers_filled,
        growth_objects: scene.growth().len(),
    }
}

const fn default_dt() -> f64 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}
