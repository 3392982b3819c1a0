//! Keyboard state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` returns true every frame the key
//!   is physically down. Movement reads this.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only for the frame
//!   the transition happened. Cleared by `end_frame()`, which the driver calls
//!   only after at least one fixed simulation step has consumed them, so a
//!   press on a zero-step frame is never lost. Jump and attack read these.

use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    Escape,
    W,
    A,
    S,
    D,
    X,
}

impl Key {
    pub const ALL: &'static [Key] = &[
        Key::Left,
        Key::Right,
        Key::Up,
        Key::Down,
        Key::Space,
        Key::Escape,
        Key::W,
        Key::A,
        Key::S,
        Key::D,
        Key::X,
    ];
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    /// Bring the held set in line with `keys`, generating press and release
    /// edges for every key whose state changed.
    pub fn set_held(&mut self, keys: &[Key]) {
        for &key in Key::ALL {
            if keys.contains(&key) {
                self.key_down(key);
            } else {
                self.key_up(key);
            }
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn any_held(&self, keys: &[Key]) -> bool {
        keys.iter().any(|&k| self.is_held(k))
    }

    pub fn any_just_pressed(&self, keys: &[Key]) -> bool {
        keys.iter().any(|&k| self.is_just_pressed(k))
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}
