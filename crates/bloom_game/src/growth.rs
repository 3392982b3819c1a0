//! Flowers that grow out of filled containers.
//!
//! A growth object starts `anchor_lift` above the container's base at a
//! fraction of its final scale and eases upward and outward over a fixed
//! duration. The grow-in cannot be interrupted and nothing changes once it
//! completes.

use glam::Vec2;

use crate::arena::{Arena, Handle};
use crate::config::GrowthConfig;
use crate::placement::{SpriteHandle, SpriteLayer, DEPTH_GROWTH, TEXTURE_FLOWER};

#[derive(Debug, Clone)]
pub struct GrowthObject {
    pub start: Vec2,
    pub target: Vec2,
    pub start_scale: f32,
    pub target_scale: f32,
    pub elapsed_us: u64,
    pub duration_us: u64,
    pub sprite: SpriteHandle,
}

impl GrowthObject {
    /// Linear progress in [0, 1].
    pub fn progress(&self) -> f32 {
        if self.duration_us == 0 {
            return 1.0;
        }
        (self.elapsed_us.min(self.duration_us) as f64 / self.duration_us as f64) as f32
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed_us >= self.duration_us
    }

    pub fn position(&self) -> Vec2 {
        self.start.lerp(self.target, ease_out_cubic(self.progress()))
    }

    pub fn scale(&self) -> f32 {
        if self.is_complete() {
            return self.target_scale;
        }
        let t = ease_out_cubic(self.progress());
        self.start_scale + (self.target_scale - self.start_scale) * t
    }
}

pub type GrowthHandle = Handle<GrowthObject>;

fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

#[derive(Debug)]
pub struct GrowthSystem {
    config: GrowthConfig,
    objects: Arena<GrowthObject>,
}

impl GrowthSystem {
    pub fn new(config: GrowthConfig) -> Self {
        Self {
            config,
            objects: Arena::new(),
        }
    }

    /// Spawn a flower above the container whose base sits at `pot_base`.
    pub fn spawn(&mut self, pot_base: Vec2, sprites: &mut SpriteLayer) -> GrowthHandle {
        let start_scale = self.config.scale * self.config.start_fraction;
        let at = pot_base - Vec2::new(0.0, self.config.anchor_lift);
        let sprite = sprites.spawn_sprite(at, TEXTURE_FLOWER, 0);
        sprites.set_origin(sprite, Vec2::new(0.5, 1.0));
        sprites.set_scale(sprite, start_scale);
        sprites.set_depth(sprite, DEPTH_GROWTH);

        log::debug!("Growth spawned at ({:.1}, {:.1})", at.x, at.y);
        self.objects.insert(GrowthObject {
            start: at,
            target: at - Vec2::new(0.0, self.config.rise),
            start_scale,
            target_scale: self.config.scale,
            elapsed_us: 0,
            duration_us: self.config.duration_ms * 1_000,
            sprite,
        })
    }

    /// Advance every growing object and push its pose to its sprite. Returns
    /// how many finished growing on this tick.
    pub fn tick(&mut self, dt_us: u64, sprites: &mut SpriteLayer) -> usize {
        let mut finished = 0;
        for (_, object) in self.objects.iter_mut() {
            if object.is_complete() {
                continue;
            }
            object.elapsed_us = object.elapsed_us.saturating_add(dt_us);
            sprites.set_position(object.sprite, object.position());
            sprites.set_scale(object.sprite, object.scale());
            if object.is_complete() {
                finished += 1;
            }
        }
        finished
    }

    #[allow(dead_code)]
    pub fn get(&self, handle: GrowthHandle) -> Option<&GrowthObject> {
        self.objects.get(handle)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[allow(dead_code)]
    pub fn growing_count(&self) -> usize {
        self.objects
            .iter()
            .filter(|(_, object)| !object.is_complete())
            .count()
    }

    pub fn clear(&mut self) -> usize {
        self.objects.clear()
    }
}
