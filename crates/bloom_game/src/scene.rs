//! The scene arena: owns every body, sprite, tile, container and growth
//! object for one play session and runs the per-frame update.
//!
//! Frame order inside `step`:
//!   1. physics integration (refreshes ground contact)
//!   2. controller movement / landing / jump / airborne / idle / attack gate
//!   3. attack resolution against the container registry, growth spawns
//!   4. horizontal clamp to the viewport margins
//!   5. animation tick, completion routed through the controller's table
//!   6. growth tick
//!   7. player sprite sync

use std::path::Path;

use bloom_core::input::InputState;
use glam::Vec2;
use rand::Rng;

use crate::animation::{AnimationPlayer, AnimationRegistry, CLIP_ATTACK};
use crate::arena::Arena;
use crate::config::{validate_config, GameConfig};
use crate::controller::{
    ControllerConfig, ControllerEvent, ControllerInput, Facing, PlayerController, PlayerState,
};
use crate::growth::GrowthSystem;
use crate::interaction::ContainerRegistry;
use crate::layout::{build_layout, plan_layout, GroundTile, LayoutParams, LayoutReport};
use crate::physics::{Aabb, Body, BodyHandle, PhysicsWorld, LAYER_GROUND};
use crate::placement::{
    SpriteHandle, SpriteLayer, DEPTH_BACKGROUND, DEPTH_PLAYER, TEXTURE_BACK, TEXTURE_MIDDLE,
    TEXTURE_PLAYER,
};

#[derive(Debug, Clone)]
pub struct Character {
    pub body: BodyHandle,
    pub sprite: SpriteHandle,
    pub controller: PlayerController,
    pub animator: AnimationPlayer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    /// `None` when the scene has no character.
    pub state: Option<PlayerState>,
    pub position: Option<Vec2>,
    pub grounded: bool,
    pub attacking: bool,
    pub containers_filled: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub bodies: usize,
    pub sprites: usize,
    pub tiles: usize,
    pub containers: usize,
    pub growth_objects: usize,
}

/// Built-in player clips, replaced clip-by-clip by the configured file.
pub fn load_clips(config: &GameConfig) -> Result<AnimationRegistry, String> {
    let mut clips = AnimationRegistry::with_player_clips();
    if let Some(path) = &config.animations {
        clips.load_file(Path::new(path))?;
    }
    Ok(clips)
}

pub struct Scene {
    config: GameConfig,
    clips: AnimationRegistry,
    physics: PhysicsWorld,
    sprites: SpriteLayer,
    tiles: Arena<GroundTile>,
    containers: ContainerRegistry,
    growth: GrowthSystem,
    character: Option<Character>,
    frame: u64,
}

impl Scene {
    /// Fails on an invalid config, when a controller clip is missing, or
    /// when the attack clip could never finish.
    pub fn new(config: GameConfig, clips: AnimationRegistry) -> Result<Self, String> {
        validate_config(&config)?;
        clips.require_clips(&PlayerState::clip_names())?;
        clips.require_play_once(CLIP_ATTACK)?;

        let viewport = config.viewport;
        let physics = PhysicsWorld::new(config.world.gravity).with_bounds(Aabb::from_min_size(
            Vec2::ZERO,
            Vec2::new(viewport.width, viewport.height),
        ));
        let growth = GrowthSystem::new(config.growth);
        Ok(Self {
            config,
            clips,
            physics,
            sprites: SpriteLayer::new(),
            tiles: Arena::new(),
            containers: ContainerRegistry::new(),
            growth,
            character: None,
            frame: 0,
        })
    }

    /// Backgrounds, ground row, containers, then the player.
    pub fn build<R: Rng + ?Sized>(&mut self, rng: &mut R) -> LayoutReport {
        self.spawn_backgrounds();

        let params = LayoutParams::new(&self.config.viewport, &self.config.world);
        let plan = plan_layout(&params, rng);
        let report = build_layout(
            &params,
            &plan,
            &mut self.physics,
            &mut self.sprites,
            &mut self.tiles,
            &mut self.containers,
        );

        self.spawn_character();
        log::info!(
            "Scene built: {} bodies, {} sprites",
            self.physics.body_count(),
            self.sprites.len()
        );
        report
    }

    /// Spawn the player above the ground row at the horizontal centre. There
    /// is only ever one character; a second call returns the existing body.
    pub fn spawn_character(&mut self) -> BodyHandle {
        if let Some(character) = &self.character {
            log::warn!("Character already spawned; keeping the existing one");
            return character.body;
        }

        let viewport = self.config.viewport;
        let player = self.config.player;
        let spawn = Vec2::new(
            viewport.width * 0.5,
            viewport.height - self.config.world.tile_size - player.spawn_lift,
        );

        let body = self
            .physics
            .create_kinematic_body(spawn, Vec2::new(player.half_width, player.half_height));
        self.physics.add_collider(body, LAYER_GROUND);
        self.physics.set_gravity_scale(body, player.gravity_scale);

        let sprite = self.sprites.spawn_sprite(spawn, TEXTURE_PLAYER, 0);
        self.sprites.set_scale(sprite, player.scale);
        self.sprites.set_depth(sprite, DEPTH_PLAYER);

        let mut animator = AnimationPlayer::new();
        let controller = PlayerController::new(
            ControllerConfig::new(&player, &viewport),
            &mut animator,
        );
        self.character = Some(Character {
            body,
            sprite,
            controller,
            animator,
        });
        log::info!("Player spawned at ({:.1}, {:.1})", spawn.x, spawn.y);
        body
    }

    /// Run one fixed step of `dt` seconds.
    pub fn step(&mut self, input: &InputState, dt: f32) -> FrameReport {
        self.frame += 1;
        let dt_us = (dt as f64 * 1_000_000.0).round() as u64;

        let Some(character) = self.character.as_mut() else {
            return FrameReport {
                frame: self.frame,
                state: None,
                position: None,
                grounded: false,
                attacking: false,
                containers_filled: 0,
            };
        };

        self.physics.step(dt);
        let Some(body) = self.physics.body_mut(character.body) else {
            log::warn!("Player body {:?} is missing", character.body);
            return FrameReport {
                frame: self.frame,
                state: Some(character.controller.state()),
                position: None,
                grounded: false,
                attacking: character.controller.is_attacking(),
                containers_filled: 0,
            };
        };

        let input = ControllerInput::from_input_state(input);
        let mut containers_filled = 0;
        if let Some(attack) = character
            .controller
            .update(body, input, &mut character.animator)
        {
            let fills = self
                .containers
                .resolve_attack(attack.origin, attack.facing, attack.range);
            for fill in &fills {
                log::debug!("Container {:?} filled", fill.container);
                self.growth.spawn(fill.position, &mut self.sprites);
            }
            containers_filled = fills.len();
        }

        character.controller.clamp_to_viewport(body);

        if let Some(event) = character.animator.tick(dt_us, &self.clips) {
            if let Some(event) = ControllerEvent::from_animation(&event) {
                character
                    .controller
                    .handle_event(event, body, &input, &mut character.animator);
            }
        }

        self.growth.tick(dt_us, &mut self.sprites);
        sync_player_sprite(character, body, &self.clips, &mut self.sprites);

        let report = FrameReport {
            frame: self.frame,
            state: Some(character.controller.state()),
            position: Some(body.position()),
            grounded: character.controller.is_grounded(),
            attacking: character.controller.is_attacking(),
            containers_filled,
        };
        log::trace!("{:?}", report);
        report
    }

    /// Release everything the scene owns. The scene is empty, and `step` a
    /// no-op, afterwards.
    pub fn teardown(&mut self) -> TeardownReport {
        self.character = None;
        let report = TeardownReport {
            bodies: self.physics.clear(),
            sprites: self.sprites.clear(),
            tiles: self.tiles.clear(),
            containers: self.containers.clear(),
            growth_objects: self.growth.clear(),
        };
        log::info!(
            "Scene torn down: {} bodies, {} sprites, {} tiles, {} containers, {} growth objects",
            report.bodies,
            report.sprites,
            report.tiles,
            report.containers,
            report.growth_objects
        );
        report
    }

    pub fn character(&self) -> Option<&Character> {
        self.character.as_ref()
    }

    #[allow(dead_code)]
    pub fn character_body(&self) -> Option<&Body> {
        self.character
            .as_ref()
            .and_then(|character| self.physics.body(character.body))
    }

    pub fn containers(&self) -> &ContainerRegistry {
        &self.containers
    }

    pub fn growth(&self) -> &GrowthSystem {
        &self.growth
    }

    pub fn sprites(&self) -> &SpriteLayer {
        &self.sprites
    }

    #[allow(dead_code)]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    #[allow(dead_code)]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn spawn_backgrounds(&mut self) {
        let viewport = self.config.viewport;
        let size = Vec2::new(viewport.width, viewport.height);
        for texture in [TEXTURE_BACK, TEXTURE_MIDDLE] {
            let sprite = self.sprites.spawn_sprite(size * 0.5, texture, 0);
            self.sprites.set_display_size(sprite, size);
            self.sprites.set_depth(sprite, DEPTH_BACKGROUND);
        }
    }
}

fn sync_player_sprite(
    character: &Character,
    body: &Body,
    clips: &AnimationRegistry,
    sprites: &mut SpriteLayer,
) {
    sprites.set_position(character.sprite, body.position());
    sprites.set_flip_x(
        character.sprite,
        character.controller.facing() == Facing::Left,
    );
    if let Some(frame) = character.animator.frame(clips) {
        sprites.set_texture(character.sprite, frame.texture);
        sprites.set_frame(character.sprite, frame.frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::{DEPTH_CONTAINER, TEXTURE_FLOWER};
    use bloom_core::animation::AnimationClip;
    use bloom_core::input::Key;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    fn config_with_chance(chance: f64) -> GameConfig {
        let mut config = GameConfig::default();
        config.world.container_chance = chance;
        config
    }

    fn built_scene(chance: f64) -> Scene {
        let mut scene = Scene::new(
            config_with_chance(chance),
            AnimationRegistry::with_player_clips(),
        )
        .expect("scene");
        scene.build(&mut StdRng::seed_from_u64(11));
        scene
    }

    /// Drives the scene through the real input state, one step per frame.
    struct Driver {
        scene: Scene,
        input: InputState,
    }

    impl Driver {
        fn new(scene: Scene) -> Self {
            let mut driver = Self {
                scene,
                input: InputState::new(),
            };
            driver.run(&[], 30);
            assert!(driver.report().grounded, "player should have landed");
            driver
        }

        fn frame(&mut self, keys: &[Key]) -> FrameReport {
            self.input.set_held(keys);
            let report = self.scene.step(&self.input, DT);
            self.input.end_frame();
            report
        }

        fn run(&mut self, keys: &[Key], frames: usize) -> Vec<FrameReport> {
            (0..frames).map(|_| self.frame(keys)).collect()
        }

        fn report(&mut self) -> FrameReport {
            self.frame(&[])
        }

        fn body(&self) -> &Body {
            self.scene.character_body().expect("player body")
        }
    }

    #[test]
    fn build_lays_out_ground_backgrounds_and_player() {
        let scene = built_scene(0.0);
        assert_eq!(scene.tile_count(), 17);
        assert!(scene.containers().is_empty());
        // Two backgrounds, seventeen tiles, one player.
        assert_eq!(scene.sprites().len(), 20);

        let body = scene.character_body().expect("player");
        assert_eq!(body.position(), Vec2::new(512.0, 654.0));
        assert_eq!(body.aabb.half, Vec2::splat(40.96));

        let order = scene.sprites().draw_order();
        assert_eq!(order[0].1.texture, TEXTURE_BACK);
        assert_eq!(order[1].1.texture, TEXTURE_MIDDLE);
        assert_eq!(order.last().expect("player").1.depth, DEPTH_PLAYER);
    }

    #[test]
    fn missing_controller_clip_is_fatal() {
        let mut clips = AnimationRegistry::new();
        for name in ["idle", "walk-left", "walk-right", "jump"] {
            clips.insert(name, AnimationClip::from_frame_range("player-walk", 0, 0, 10, false));
        }
        let err = Scene::new(GameConfig::default(), clips)
            .err()
            .expect("attack clip is missing");
        assert!(err.contains(CLIP_ATTACK));
    }

    #[test]
    fn looping_attack_clip_from_file_is_fatal() {
        let path = std::env::temp_dir().join(format!(
            "bloom_scene_test_looping_attack_{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{
              "version": "0.1",
              "animation_id": "player",
              "animations": {
                "attack": {
                  "texture": "player-attack",
                  "frames": [ { "frame": 0, "duration_ms": 66 } ],
                  "looping": true
                }
              }
            }"#,
        )
        .expect("write clip file");

        let mut config = GameConfig::default();
        config.animations = Some(path.display().to_string());
        let clips = load_clips(&config).expect("clip file itself is valid");
        let err = Scene::new(config, clips)
            .err()
            .expect("looping attack must be rejected");
        assert!(err.contains("'attack' must not loop"));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn invalid_config_is_fatal() {
        let result = Scene::new(config_with_chance(2.0), AnimationRegistry::with_player_clips());
        assert!(result.is_err());
    }

    #[test]
    fn scene_without_character_is_a_no_op() {
        let mut scene = Scene::new(GameConfig::default(), AnimationRegistry::with_player_clips())
            .expect("scene");
        let mut input = InputState::new();
        input.key_down(Key::Right);
        input.key_down(Key::X);

        let report = scene.step(&input, DT);
        assert_eq!(report.frame, 1);
        assert_eq!(report.state, None);
        assert_eq!(report.containers_filled, 0);
        assert_eq!(scene.sprites().len(), 0);
    }

    #[test]
    fn holding_right_for_a_second_walks_about_two_hundred() {
        let mut driver = Driver::new(built_scene(0.0));
        let start_x = driver.body().position().x;

        let reports = driver.run(&[Key::Right], 60);
        let mut last_x = start_x;
        for report in &reports {
            let x = report.position.expect("position").x;
            assert!(x >= last_x);
            last_x = x;
            assert_eq!(report.state, Some(PlayerState::WalkRight));
            assert!(!report.attacking);
        }
        assert!((last_x - start_x - 200.0).abs() < 5.0);

        let sprite = driver
            .scene
            .sprites()
            .get(driver.scene.character().expect("player").sprite)
            .expect("player sprite");
        assert_eq!(sprite.texture, "player-walk");
        assert!(!sprite.flip_x);
        assert_eq!(sprite.position.x, last_x);
    }

    #[test]
    fn held_jump_key_only_jumps_once() {
        let mut driver = Driver::new(built_scene(0.0));
        let report = driver.frame(&[Key::Space]);
        assert_eq!(report.state, Some(PlayerState::Jump));
        assert_eq!(driver.body().velocity.y, -400.0);

        // Holding the key, then re-pressing it mid-air, adds nothing.
        driver.run(&[Key::Space], 5);
        driver.frame(&[]);
        driver.frame(&[Key::Up]);
        assert!(driver.body().velocity.y > -400.0 + 6.0 * 13.0);

        let landed = driver.run(&[], 90);
        let last = landed.last().expect("report");
        assert!(last.grounded);
        assert_eq!(last.state, Some(PlayerState::Idle));
    }

    #[test]
    fn left_margin_clamps_on_the_next_frame() {
        let mut driver = Driver::new(built_scene(0.0));
        let body = driver.scene.character().expect("player").body;
        driver
            .scene
            .physics
            .body_mut(body)
            .expect("body")
            .set_x(20.0);

        driver.frame(&[Key::A]);
        assert_eq!(driver.body().position().x, 50.0);
        assert_eq!(driver.body().velocity.x, 0.0);
    }

    #[test]
    fn attack_fills_the_pot_in_front_and_grows_a_flower() {
        // Every slot has a pot: bases at x = 32 + 64 i, y = 684.
        let mut driver = Driver::new(built_scene(1.0));

        let report = driver.frame(&[Key::X]);
        assert!(report.attacking);
        assert_eq!(report.containers_filled, 1);
        assert_eq!(driver.scene.growth().len(), 1);
        let filled: Vec<_> = driver
            .scene
            .containers()
            .iter()
            .filter(|(_, c)| c.filled)
            .map(|(_, c)| c.position.x)
            .collect();
        assert_eq!(filled, vec![544.0]);

        // The flower starts above the pot's base, not inside it.
        let (_, flower) = driver
            .scene
            .sprites()
            .draw_order()
            .into_iter()
            .find(|(_, sprite)| sprite.texture == TEXTURE_FLOWER)
            .expect("flower sprite");
        assert_eq!(flower.position.x, 544.0);
        assert!(flower.position.y < 684.0);
        assert!(flower.depth > DEPTH_CONTAINER);

        // Held directions do nothing until the attack finishes.
        let during = driver.run(&[Key::Left], 19);
        for report in &during {
            assert!(report.position.expect("position").x == 512.0);
            assert_eq!(report.containers_filled, 0);
        }
        assert!(!during.last().expect("report").attacking);

        // Turn around and hit the pot behind.
        driver.run(&[], 1);
        driver.frame(&[Key::Left]);
        driver.frame(&[]);
        let x = driver.body().position().x;
        let report = driver.frame(&[Key::X]);
        assert_eq!(report.containers_filled, 1);
        assert_eq!(driver.scene.containers().filled_count(), 2);
        let sprite = driver
            .scene
            .sprites()
            .get(driver.scene.character().expect("player").sprite)
            .expect("player sprite");
        assert!(sprite.flip_x);
        assert_eq!(sprite.texture, "player-attack");
        assert!(x < 512.0);
    }

    #[test]
    fn repeated_attacks_never_refill() {
        let mut driver = Driver::new(built_scene(1.0));
        let mut total = 0;
        for _ in 0..4 {
            total += driver.frame(&[Key::X]).containers_filled;
            driver.run(&[], 25);
        }
        assert_eq!(total, 1);
        assert_eq!(driver.scene.containers().filled_count(), 1);
        assert_eq!(driver.scene.growth().len(), 1);
    }

    #[test]
    fn attacking_frames_have_zero_horizontal_velocity() {
        let mut driver = Driver::new(built_scene(0.0));
        driver.run(&[Key::Right], 10);
        driver.frame(&[Key::Right, Key::X]);
        loop {
            let report = driver.frame(&[Key::Right]);
            if !report.attacking {
                break;
            }
            assert_eq!(driver.body().velocity.x, 0.0);
            assert_eq!(report.state, Some(PlayerState::Attack));
        }
        driver.frame(&[Key::Right]);
        assert_eq!(driver.body().velocity.x, 200.0);
    }

    #[test]
    fn teardown_releases_everything_and_stops_stepping() {
        let mut driver = Driver::new(built_scene(1.0));
        driver.frame(&[Key::X]);

        let report = driver.scene.teardown();
        assert_eq!(
            report,
            TeardownReport {
                bodies: 18,
                sprites: 2 + 17 + 17 + 1 + 1,
                tiles: 17,
                containers: 17,
                growth_objects: 1,
            }
        );
        assert!(driver.scene.character().is_none());
        assert_eq!(driver.report().state, None);
    }
}
