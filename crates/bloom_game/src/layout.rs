//! Ground row and prop placement.
//!
//! `plan_layout` is pure: it decides where every tile goes and which slots get
//! a container, drawing only from the random source it is handed. `build_layout`
//! turns a plan into colliders, sprites and registered containers.

use glam::Vec2;
use rand::Rng;

use crate::arena::{Arena, Handle};
use crate::config::{ViewportConfig, WorldConfig};
use crate::interaction::{ContainerHandle, ContainerRegistry};
use crate::physics::{BodyHandle, PhysicsWorld, LAYER_GROUND};
use crate::placement::{
    SpriteHandle, SpriteLayer, DEPTH_CONTAINER, DEPTH_GROUND, TEXTURE_POT, TEXTURE_TILES,
};

/// Tile sheet variants alternated along the row.
const TILE_VARIANTS: u32 = 2;

#[derive(Debug, Clone, Copy)]
pub struct LayoutParams {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub tile_size: f32,
    pub container_chance: f64,
    /// Gap between the tile top and the container's base.
    pub container_lift: f32,
    pub container_scale: f32,
}

impl LayoutParams {
    pub fn new(viewport: &ViewportConfig, world: &WorldConfig) -> Self {
        Self {
            viewport_width: viewport.width,
            viewport_height: viewport.height,
            tile_size: world.tile_size,
            container_chance: world.container_chance,
            container_lift: world.container_lift,
            container_scale: world.container_scale,
        }
    }

    /// One slot per tile across the width, plus one of overlap.
    pub fn slot_count(&self) -> usize {
        (self.viewport_width / self.tile_size).ceil() as usize + 1
    }

    /// Top edge of the ground row.
    pub fn ground_top(&self) -> f32 {
        self.viewport_height.floor() - self.tile_size
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSlot {
    pub index: usize,
    /// Top-left corner of the tile.
    pub position: Vec2,
    pub frame: u32,
    /// Bottom-centre of the container placed above this tile, if any.
    pub container: Option<Vec2>,
}

pub fn plan_layout<R: Rng + ?Sized>(params: &LayoutParams, rng: &mut R) -> Vec<TileSlot> {
    let y = params.ground_top();
    (0..params.slot_count())
        .map(|index| {
            let x = index as f32 * params.tile_size;
            let container = rng.random_bool(params.container_chance).then(|| {
                Vec2::new(
                    x + params.tile_size * 0.5,
                    y - params.container_lift,
                )
            });
            TileSlot {
                index,
                position: Vec2::new(x, y),
                frame: index as u32 % TILE_VARIANTS,
                container,
            }
        })
        .collect()
}

/// Record of a placed tile. Hosts read it; the simulation only owns it.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct GroundTile {
    pub position: Vec2,
    pub size: f32,
    pub frame: u32,
    pub body: BodyHandle,
    pub sprite: SpriteHandle,
}

pub type GroundTileHandle = Handle<GroundTile>;

#[derive(Debug, Default, Clone)]
pub struct LayoutReport {
    pub tiles: Vec<GroundTileHandle>,
    pub containers: Vec<ContainerHandle>,
}

/// Instantiate a plan: a static ground collider of half the tile height at
/// each tile's top, the tile sprite, and a registered container sprite where
/// the plan placed one.
pub fn build_layout(
    params: &LayoutParams,
    plan: &[TileSlot],
    physics: &mut PhysicsWorld,
    sprites: &mut SpriteLayer,
    tiles: &mut Arena<GroundTile>,
    containers: &mut ContainerRegistry,
) -> LayoutReport {
    let size = params.tile_size;
    let mut report = LayoutReport::default();

    for slot in plan {
        let body = physics.create_static_body(
            slot.position,
            Vec2::new(size, size * 0.5),
            LAYER_GROUND,
        );
        let sprite = sprites.spawn_sprite(slot.position, TEXTURE_TILES, slot.frame);
        sprites.set_origin(sprite, Vec2::ZERO);
        sprites.set_display_size(sprite, Vec2::splat(size));
        sprites.set_depth(sprite, DEPTH_GROUND);

        report.tiles.push(tiles.insert(GroundTile {
            position: slot.position,
            size,
            frame: slot.frame,
            body,
            sprite,
        }));

        if let Some(position) = slot.container {
            let pot = sprites.spawn_sprite(position, TEXTURE_POT, 0);
            sprites.set_origin(pot, Vec2::new(0.5, 1.0));
            sprites.set_scale(pot, params.container_scale);
            sprites.set_depth(pot, DEPTH_CONTAINER);
            report.containers.push(containers.register(position));
        }
    }

    log::info!(
        "Layout built: {} ground tiles, {} containers",
        report.tiles.len(),
        report.containers.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params(chance: f64) -> LayoutParams {
        let mut world = WorldConfig::default();
        world.container_chance = chance;
        LayoutParams::new(&ViewportConfig::default(), &world)
    }

    struct Built {
        physics: PhysicsWorld,
        sprites: SpriteLayer,
        tiles: Arena<GroundTile>,
        containers: ContainerRegistry,
        report: LayoutReport,
    }

    fn build(params: &LayoutParams, seed: u64) -> Built {
        let plan = plan_layout(params, &mut StdRng::seed_from_u64(seed));
        let mut built = Built {
            physics: PhysicsWorld::new(800.0),
            sprites: SpriteLayer::new(),
            tiles: Arena::new(),
            containers: ContainerRegistry::new(),
            report: LayoutReport::default(),
        };
        built.report = build_layout(
            params,
            &plan,
            &mut built.physics,
            &mut built.sprites,
            &mut built.tiles,
            &mut built.containers,
        );
        built
    }

    #[test]
    fn default_viewport_gets_seventeen_immovable_tiles() {
        let params = params(0.3);
        assert_eq!(params.slot_count(), 17);

        let built = build(&params, 7);
        assert_eq!(built.report.tiles.len(), 17);
        for &handle in &built.report.tiles {
            let tile = built.tiles.get(handle).expect("tile");
            let body = built.physics.body(tile.body).expect("tile body");
            assert!(body.is_immovable());
            assert!(!body.allows_gravity());
        }
    }

    #[test]
    fn tiles_alternate_frames_along_the_bottom_row() {
        let plan = plan_layout(&params(0.0), &mut StdRng::seed_from_u64(1));
        for slot in &plan {
            assert_eq!(slot.position, Vec2::new(slot.index as f32 * 64.0, 704.0));
            assert_eq!(slot.frame, slot.index as u32 % 2);
        }
        assert_eq!(plan.last().expect("slot").position.x, 1024.0);
    }

    #[test]
    fn collider_is_half_a_tile_thick_at_the_tile_top() {
        let built = build(&params(0.0), 1);
        let tile = built
            .tiles
            .get(built.report.tiles[3])
            .expect("tile");
        let body = built.physics.body(tile.body).expect("body");
        assert_eq!(body.aabb.min(), Vec2::new(192.0, 704.0));
        assert_eq!(body.aabb.size(), Vec2::new(64.0, 32.0));
        assert_eq!(body.layers, LAYER_GROUND);

        let sprite = built.sprites.get(tile.sprite).expect("sprite");
        assert_eq!(sprite.origin, Vec2::ZERO);
        assert_eq!(sprite.display_size, Some(Vec2::splat(64.0)));
        assert_eq!(sprite.depth, DEPTH_GROUND);
    }

    #[test]
    fn chance_extremes_place_no_containers_or_one_per_slot() {
        let none = build(&params(0.0), 3);
        assert!(none.containers.is_empty());

        let all = build(&params(1.0), 3);
        assert_eq!(all.containers.len(), 17);
        let (_, first) = all.containers.iter().next().expect("container");
        assert_eq!(first.position, Vec2::new(32.0, 684.0));
        assert!(!first.filled);

        let (_, pot) = all
            .sprites
            .draw_order()
            .into_iter()
            .find(|(_, sprite)| sprite.texture == TEXTURE_POT && sprite.position == first.position)
            .expect("pot sprite");
        assert_eq!(pot.origin, Vec2::new(0.5, 1.0));
        assert_eq!(pot.depth, DEPTH_CONTAINER);
    }

    #[test]
    fn same_seed_gives_same_plan() {
        let params = params(0.3);
        let a = plan_layout(&params, &mut StdRng::seed_from_u64(42));
        let b = plan_layout(&params, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn containers_are_rolled_independently_per_slot() {
        let params = params(0.5);
        let plans: Vec<Vec<bool>> = (0..8)
            .map(|seed| {
                plan_layout(&params, &mut StdRng::seed_from_u64(seed))
                    .iter()
                    .map(|slot| slot.container.is_some())
                    .collect()
            })
            .collect();
        assert!(plans.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn narrow_viewport_rounds_slot_count_up() {
        let mut p = params(0.0);
        p.viewport_width = 100.0;
        assert_eq!(p.slot_count(), 3);
    }
}
