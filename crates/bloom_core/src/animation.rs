//! Frame-based sprite-sheet animation types and deterministic tick logic.
//!
//! A clip is a sequence of frames from one sprite sheet with per-frame
//! durations. All timing uses integer microseconds (`u64`) so advancement is
//! identical across platforms under the fixed-timestep model.
//!
//! The JSON format stores `duration_ms` for readability; on load it is
//! converted to `duration_us`.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A single frame of a clip: an index into the clip's sprite sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFrame {
    pub frame: u32,
    pub duration_us: u64,
}

/// A named sequence of sheet frames that can loop or play once.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub texture: String,
    pub frames: Vec<AnimationFrame>,
    pub looping: bool,
}

impl AnimationClip {
    /// Consecutive sheet frames `first..=last` played at `frame_rate` fps.
    pub fn from_frame_range(
        texture: &str,
        first: u32,
        last: u32,
        frame_rate: u32,
        looping: bool,
    ) -> Self {
        let duration_us = 1_000_000 / u64::from(frame_rate.max(1));
        Self {
            texture: texture.to_string(),
            frames: (first..=last)
                .map(|frame| AnimationFrame { frame, duration_us })
                .collect(),
            looping,
        }
    }

    /// Total duration of one full cycle in microseconds.
    pub fn total_duration_us(&self) -> u64 {
        self.frames.iter().map(|f| f.duration_us).sum()
    }
}

/// Top-level animation definition file.
#[derive(Debug, Clone)]
pub struct AnimationFile {
    pub version: String,
    pub animation_id: String,
    pub animations: HashMap<String, AnimationClip>,
}

/// Runtime state for one active animation instance.
#[derive(Debug, Clone)]
pub struct AnimationState {
    pub clip_name: String,
    pub frame_index: usize,
    pub elapsed_us: u64,
    pub finished: bool,
}

impl AnimationState {
    pub fn new(clip_name: &str) -> Self {
        Self {
            clip_name: clip_name.to_string(),
            frame_index: 0,
            elapsed_us: 0,
            finished: false,
        }
    }

    /// Advance by `dt_us` microseconds and return the current sheet frame.
    /// Integer arithmetic only.
    pub fn tick(&mut self, dt_us: u64, clip: &AnimationClip) -> u32 {
        if clip.frames.is_empty() {
            return 0;
        }
        if self.finished {
            return self.current_frame(clip);
        }

        self.elapsed_us += dt_us;

        loop {
            let current = &clip.frames[self.frame_index];
            if self.elapsed_us < current.duration_us {
                break;
            }

            self.elapsed_us -= current.duration_us;
            self.frame_index += 1;

            if self.frame_index >= clip.frames.len() {
                if clip.looping {
                    self.frame_index = 0;
                } else {
                    self.frame_index = clip.frames.len() - 1;
                    self.elapsed_us = 0;
                    self.finished = true;
                    break;
                }
            }
        }

        clip.frames[self.frame_index].frame
    }

    pub fn current_frame(&self, clip: &AnimationClip) -> u32 {
        clip.frames
            .get(self.frame_index)
            .or_else(|| clip.frames.last())
            .map_or(0, |f| f.frame)
    }
}

// --- JSON deserialization types (private) ---

#[derive(Debug, Deserialize)]
struct AnimationFileJson {
    version: String,
    animation_id: String,
    animations: HashMap<String, AnimationClipJson>,
}

#[derive(Debug, Deserialize)]
struct AnimationClipJson {
    texture: String,
    frames: Vec<AnimationFrameJson>,
    #[serde(default)]
    looping: bool,
}

#[derive(Debug, Deserialize)]
struct AnimationFrameJson {
    frame: u32,
    duration_ms: u64,
}

/// Load an animation definition file from disk.
pub fn load_animation_file(path: &Path) -> Result<AnimationFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read animation file {}: {e}", path.display()))?;
    let json: AnimationFileJson = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse animation file {}: {e}", path.display()))?;
    validate_animation_json(&json)?;

    let animations = json
        .animations
        .into_iter()
        .map(|(name, clip)| {
            let frames = clip
                .frames
                .into_iter()
                .map(|f| AnimationFrame {
                    frame: f.frame,
                    duration_us: f.duration_ms * 1000,
                })
                .collect();
            (
                name,
                AnimationClip {
                    texture: clip.texture,
                    frames,
                    looping: clip.looping,
                },
            )
        })
        .collect();

    Ok(AnimationFile {
        version: json.version,
        animation_id: json.animation_id,
        animations,
    })
}

fn validate_animation_json(json: &AnimationFileJson) -> Result<(), String> {
    if json.version != "0.1" {
        return Err(format!(
            "Animation validation failed: unsupported version '{}'",
            json.version
        ));
    }
    if json.animation_id.is_empty() {
        return Err("Animation validation failed: animation_id is empty".to_string());
    }
    for (name, clip) in &json.animations {
        if clip.texture.is_empty() {
            return Err(format!(
                "Animation validation failed: clip '{}' has an empty texture",
                name
            ));
        }
        if clip.frames.is_empty() {
            return Err(format!(
                "Animation validation failed: clip '{}' has no frames",
                name
            ));
        }
        if let Some(i) = clip.frames.iter().position(|f| f.duration_ms == 0) {
            return Err(format!(
                "Animation validation failed: clip '{}' frame {} has zero duration",
                name, i
            ));
        }
    }
    Ok(())
}
