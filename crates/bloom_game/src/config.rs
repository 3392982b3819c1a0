//! Game tuning loaded from JSON. Every field has a default, so an absent
//! section (or an absent file) means the stock demo values.

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct GameConfig {
    pub viewport: ViewportConfig,
    pub world: WorldConfig,
    pub player: PlayerConfig,
    pub growth: GrowthConfig,
    /// Optional animation clip file replacing the built-in player clips.
    pub animations: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct WorldConfig {
    pub gravity: f32,
    pub tile_size: f32,
    /// Per-slot probability of placing a container.
    pub container_chance: f64,
    /// Distance from the tile top up to the container's base.
    pub container_lift: f32,
    pub container_scale: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: 800.0,
            tile_size: 64.0,
            container_chance: 0.3,
            container_lift: 20.0,
            container_scale: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct PlayerConfig {
    pub speed: f32,
    pub jump_velocity: f32,
    pub attack_range: f32,
    pub scale: f32,
    pub half_width: f32,
    pub half_height: f32,
    /// Multiplier on world gravity for the player's body.
    pub gravity_scale: f32,
    /// Spawn height above the tile row.
    pub spawn_lift: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 200.0,
            jump_velocity: -400.0,
            attack_range: 60.0,
            scale: 0.16,
            half_width: 40.96,
            half_height: 40.96,
            gravity_scale: 1.0,
            spawn_lift: 50.0,
            margin_left: 50.0,
            margin_right: 50.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct GrowthConfig {
    pub scale: f32,
    /// Height above the pot's base where the flower first appears.
    pub anchor_lift: f32,
    /// Fraction of `scale` the growth object starts at.
    pub start_fraction: f32,
    /// Distance the object eases upward while growing.
    pub rise: f32,
    pub duration_ms: u64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            anchor_lift: 32.0,
            start_fraction: 0.1,
            rise: 24.0,
            duration_ms: 600,
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Smallest accepted ground tile edge, in pixels.
pub const MIN_TILE_SIZE: f32 = 8.0;

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

pub fn validate_config(config: &GameConfig) -> Result<(), String> {
    let viewport = &config.viewport;
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return Err("Config validation failed: viewport width and height must be > 0".to_string());
    }

    let world = &config.world;
    if !(MIN_TILE_SIZE..=viewport.width).contains(&world.tile_size) {
        return Err(format!(
            "Config validation failed: world.tile_size {} must be in [{}, viewport width]",
            world.tile_size, MIN_TILE_SIZE
        ));
    }
    if !positive(world.gravity) {
        return Err(format!(
            "Config validation failed: world.gravity {} must be finite and > 0 (y points down)",
            world.gravity
        ));
    }
    if !positive(world.container_scale) {
        return Err("Config validation failed: world.container_scale must be > 0".to_string());
    }
    if !(0.0..=1.0).contains(&world.container_chance) {
        return Err(format!(
            "Config validation failed: world.container_chance {} is outside [0, 1]",
            world.container_chance
        ));
    }

    let player = &config.player;
    if player.speed <= 0.0 || player.attack_range <= 0.0 {
        return Err(
            "Config validation failed: player.speed and player.attack_range must be > 0"
                .to_string(),
        );
    }
    if player.jump_velocity >= 0.0 {
        return Err(
            "Config validation failed: player.jump_velocity must be negative (y points down)"
                .to_string(),
        );
    }
    if player.half_width <= 0.0 || player.half_height <= 0.0 {
        return Err("Config validation failed: player half extents must be > 0".to_string());
    }
    if !positive(player.scale) {
        return Err("Config validation failed: player.scale must be > 0".to_string());
    }
    if !player.gravity_scale.is_finite() || player.gravity_scale < 0.0 {
        return Err("Config validation failed: player.gravity_scale must be >= 0".to_string());
    }
    if player.margin_left < 0.0
        || player.margin_right < 0.0
        || player.margin_left + player.margin_right >= viewport.width
    {
        return Err(format!(
            "Config validation failed: margins {} + {} leave no room in a {} wide viewport",
            player.margin_left, player.margin_right, viewport.width
        ));
    }

    let growth = &config.growth;
    if growth.duration_ms == 0 {
        return Err("Config validation failed: growth.duration_ms must be > 0".to_string());
    }
    if growth.start_fraction <= 0.0 || growth.start_fraction > 1.0 {
        return Err("Config validation failed: growth.start_fraction must be in (0, 1]".to_string());
    }
    if !positive(growth.scale) {
        return Err("Config validation failed: growth.scale must be > 0".to_string());
    }
    if growth.anchor_lift.is_nan()
        || growth.rise.is_nan()
        || growth.anchor_lift < 0.0
        || growth.rise < 0.0
    {
        return Err(
            "Config validation failed: growth.anchor_lift and growth.rise must be >= 0".to_string(),
        );
    }

    Ok(())
}
