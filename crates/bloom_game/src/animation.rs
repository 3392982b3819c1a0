//! Clip registry and per-sprite animation playback.
//!
//! Wraps the core `AnimationClip`/`AnimationState` types from
//! `bloom_core::animation`. `AnimationRegistry` resolves clips by name;
//! `AnimationPlayer` is the playback service a sprite owns: `play` is
//! idempotent for the current clip, and `tick` reports completion of a
//! non-looping clip exactly once.

use std::collections::HashMap;
use std::path::Path;

use bloom_core::animation::{load_animation_file, AnimationClip, AnimationState};

pub const CLIP_IDLE: &str = "idle";
pub const CLIP_WALK_LEFT: &str = "walk-left";
pub const CLIP_WALK_RIGHT: &str = "walk-right";
pub const CLIP_JUMP: &str = "jump";
pub const CLIP_ATTACK: &str = "attack";

pub struct AnimationRegistry {
    clips: HashMap<String, AnimationClip>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self {
            clips: HashMap::new(),
        }
    }

    /// The player's sheets: walk 0-4 at 10 fps, jump 0-11 at 10 fps, attack
    /// 0-4 at 15 fps. Idle is the first walk frame.
    pub fn with_player_clips() -> Self {
        let mut registry = Self::new();
        registry.insert(
            CLIP_IDLE,
            AnimationClip::from_frame_range("player-walk", 0, 0, 10, false),
        );
        registry.insert(
            CLIP_WALK_LEFT,
            AnimationClip::from_frame_range("player-walk", 0, 4, 10, true),
        );
        registry.insert(
            CLIP_WALK_RIGHT,
            AnimationClip::from_frame_range("player-walk", 0, 4, 10, true),
        );
        registry.insert(
            CLIP_JUMP,
            AnimationClip::from_frame_range("player-jump", 0, 11, 10, false),
        );
        registry.insert(
            CLIP_ATTACK,
            AnimationClip::from_frame_range("player-attack", 0, 4, 15, false),
        );
        registry
    }

    pub fn insert(&mut self, name: &str, clip: AnimationClip) {
        self.clips.insert(name.to_string(), clip);
    }

    /// Load an animation file and register its clips, replacing same-named ones.
    pub fn load_file(&mut self, path: &Path) -> Result<(), String> {
        let file = load_animation_file(path)?;
        log::info!(
            "Loaded {} clips from animation file '{}'",
            file.animations.len(),
            file.animation_id
        );
        self.clips.extend(file.animations);
        Ok(())
    }

    pub fn resolve_clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.get(name)
    }

    /// Fail when any of `names` has no clip.
    pub fn require_clips(&self, names: &[&str]) -> Result<(), String> {
        for name in names {
            if !self.clips.contains_key(*name) {
                return Err(format!("Animation clip '{}' is not registered", name));
            }
        }
        Ok(())
    }

    /// Fail unless `name` is a non-empty clip that plays once. Completion of
    /// such a clip is what ends a state gated on it.
    pub fn require_play_once(&self, name: &str) -> Result<(), String> {
        let clip = self
            .clips
            .get(name)
            .ok_or_else(|| format!("Animation clip '{}' is not registered", name))?;
        if clip.looping {
            return Err(format!(
                "Animation clip '{}' must not loop: it has to report completion",
                name
            ));
        }
        if clip.frames.is_empty() || clip.total_duration_us() == 0 {
            return Err(format!("Animation clip '{}' has no playable frames", name));
        }
        Ok(())
    }
}

impl Default for AnimationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationEvent {
    Completed(String),
}

/// The sheet frame to show this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRef<'a> {
    pub texture: &'a str,
    pub frame: u32,
}

#[derive(Debug, Clone, Default)]
pub struct AnimationPlayer {
    state: Option<AnimationState>,
}

impl AnimationPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `clip_name` from its first frame. Returns false, and leaves the
    /// running playback untouched, when that clip is already current.
    pub fn play(&mut self, clip_name: &str) -> bool {
        if self.current() == Some(clip_name) {
            return false;
        }
        self.state = Some(AnimationState::new(clip_name));
        true
    }

    pub fn current(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.clip_name.as_str())
    }

    #[allow(dead_code)]
    pub fn is_finished(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.finished)
    }

    pub fn tick(&mut self, dt_us: u64, registry: &AnimationRegistry) -> Option<AnimationEvent> {
        let state = self.state.as_mut()?;
        let Some(clip) = registry.resolve_clip(&state.clip_name) else {
            log::warn!("Animation clip '{}' is not registered", state.clip_name);
            return None;
        };

        let was_finished = state.finished;
        state.tick(dt_us, clip);
        if state.finished && !was_finished {
            Some(AnimationEvent::Completed(state.clip_name.clone()))
        } else {
            None
        }
    }

    pub fn frame<'a>(&self, registry: &'a AnimationRegistry) -> Option<FrameRef<'a>> {
        let state = self.state.as_ref()?;
        let clip = registry.resolve_clip(&state.clip_name)?;
        Some(FrameRef {
            texture: &clip.texture,
            frame: state.current_frame(clip),
        })
    }
}
