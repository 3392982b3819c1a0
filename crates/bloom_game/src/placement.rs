//! Sprite placement records handed to the host renderer.
//!
//! Nothing here draws. Each `Sprite` describes one textured quad (sheet frame,
//! position, origin, scale, flip, depth) and `draw_order` yields them back to
//! front. Texture keys are the names the host's asset loader registered.

use glam::Vec2;

use crate::arena::{Arena, Handle};

pub const TEXTURE_BACK: &str = "back";
pub const TEXTURE_MIDDLE: &str = "background";
pub const TEXTURE_TILES: &str = "tiles";
pub const TEXTURE_POT: &str = "flower-pot-red";
pub const TEXTURE_FLOWER: &str = "flower-purple";
pub const TEXTURE_PLAYER: &str = "player-walk";

pub const DEPTH_BACKGROUND: f32 = 0.0;
pub const DEPTH_GROUND: f32 = 1.0;
pub const DEPTH_CONTAINER: f32 = 2.0;
pub const DEPTH_GROWTH: f32 = 3.0;
pub const DEPTH_PLAYER: f32 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub texture: String,
    pub frame: u32,
    pub position: Vec2,
    /// Normalized anchor within the quad; (0.5, 0.5) is the centre.
    pub origin: Vec2,
    pub scale: Vec2,
    /// Overrides the texture's natural size before `scale` applies.
    pub display_size: Option<Vec2>,
    pub flip_x: bool,
    pub depth: f32,
}

pub type SpriteHandle = Handle<Sprite>;

#[derive(Debug, Default)]
pub struct SpriteLayer {
    sprites: Arena<Sprite>,
}

impl SpriteLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn_sprite(&mut self, position: Vec2, texture: &str, frame: u32) -> SpriteHandle {
        self.sprites.insert(Sprite {
            texture: texture.to_string(),
            frame,
            position,
            origin: Vec2::splat(0.5),
            scale: Vec2::ONE,
            display_size: None,
            flip_x: false,
            depth: 0.0,
        })
    }

    #[allow(dead_code)]
    pub fn get(&self, handle: SpriteHandle) -> Option<&Sprite> {
        self.sprites.get(handle)
    }

    pub fn set_position(&mut self, handle: SpriteHandle, position: Vec2) {
        if let Some(sprite) = self.sprites.get_mut(handle) {
            sprite.position = position;
        }
    }

    pub fn set_texture(&mut self, handle: SpriteHandle, texture: &str) {
        if let Some(sprite) = self.sprites.get_mut(handle) {
            if sprite.texture != texture {
                sprite.texture = texture.to_string();
            }
        }
    }

    pub fn set_frame(&mut self, handle: SpriteHandle, frame: u32) {
        if let Some(sprite) = self.sprites.get_mut(handle) {
            sprite.frame = frame;
        }
    }

    pub fn set_scale(&mut self, handle: SpriteHandle, scale: f32) {
        if let Some(sprite) = self.sprites.get_mut(handle) {
            sprite.scale = Vec2::splat(scale);
        }
    }

    pub fn set_flip_x(&mut self, handle: SpriteHandle, flip_x: bool) {
        if let Some(sprite) = self.sprites.get_mut(handle) {
            sprite.flip_x = flip_x;
        }
    }

    pub fn set_depth(&mut self, handle: SpriteHandle, depth: f32) {
        if let Some(sprite) = self.sprites.get_mut(handle) {
            sprite.depth = depth;
        }
    }

    pub fn set_origin(&mut self, handle: SpriteHandle, origin: Vec2) {
        if let Some(sprite) = self.sprites.get_mut(handle) {
            sprite.origin = origin;
        }
    }

    pub fn set_display_size(&mut self, handle: SpriteHandle, size: Vec2) {
        if let Some(sprite) = self.sprites.get_mut(handle) {
            sprite.display_size = Some(size);
        }
    }

    /// Back to front by depth; equal depths keep spawn order.
    pub fn draw_order(&self) -> Vec<(SpriteHandle, &Sprite)> {
        let mut ordered: Vec<_> = self.sprites.iter().collect();
        ordered.sort_by(|(_, a), (_, b)| a.depth.total_cmp(&b.depth));
        ordered
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn clear(&mut self) -> usize {
        self.sprites.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawned_sprite_has_centred_defaults() {
        let mut layer = SpriteLayer::new();
        let handle = layer.spawn_sprite(Vec2::new(10.0, 20.0), TEXTURE_POT, 0);
        let sprite = layer.get(handle).expect("sprite");
        assert_eq!(sprite.origin, Vec2::splat(0.5));
        assert_eq!(sprite.scale, Vec2::ONE);
        assert!(!sprite.flip_x);
        assert!(sprite.display_size.is_none());
    }

    #[test]
    fn setters_update_the_addressed_sprite_only() {
        let mut layer = SpriteLayer::new();
        let a = layer.spawn_sprite(Vec2::ZERO, TEXTURE_PLAYER, 0);
        let b = layer.spawn_sprite(Vec2::ZERO, TEXTURE_FLOWER, 0);
        layer.set_flip_x(a, true);
        layer.set_scale(a, 0.16);
        layer.set_texture(a, "player-jump");
        layer.set_frame(a, 3);

        let a = layer.get(a).expect("a");
        assert!(a.flip_x);
        assert_eq!(a.scale, Vec2::splat(0.16));
        assert_eq!(a.texture, "player-jump");
        assert_eq!(a.frame, 3);
        assert_eq!(layer.get(b).expect("b").scale, Vec2::ONE);
    }

    #[test]
    fn draw_order_sorts_by_depth_then_spawn_order() {
        let mut layer = SpriteLayer::new();
        let player = layer.spawn_sprite(Vec2::ZERO, TEXTURE_PLAYER, 0);
        let tile_a = layer.spawn_sprite(Vec2::ZERO, TEXTURE_TILES, 0);
        let tile_b = layer.spawn_sprite(Vec2::ZERO, TEXTURE_TILES, 1);
        layer.set_depth(player, DEPTH_PLAYER);
        layer.set_depth(tile_a, DEPTH_GROUND);
        layer.set_depth(tile_b, DEPTH_GROUND);

        let order: Vec<_> = layer.draw_order().into_iter().map(|(h, _)| h).collect();
        assert_eq!(order, vec![tile_a, tile_b, player]);
    }
}
