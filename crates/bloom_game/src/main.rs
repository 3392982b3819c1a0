//! Bloom -- headless platformer runner.
//!
//! Builds one scene (backgrounds, a tiled ground row with randomly placed
//! flower pots, and the player), then drives it with a scripted input replay
//! through the fixed-timestep clock. The scene's sprite list is what a host
//! renderer would draw each frame; this binary only logs the outcome.

mod animation;
mod arena;
mod config;
mod controller;
mod growth;
mod interaction;
mod layout;
mod physics;
mod placement;
mod replay;
mod scene;

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;

use config::{load_config_from_path, GameConfig};
use replay::{load_replay_from_path, run_replay, ReplaySequence};
use scene::{load_clips, Scene};

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    replay: Option<PathBuf>,
    seed: Option<u64>,
}

fn usage() -> String {
    "Usage: cargo run -p bloom_game -- [--config <path>] [--replay <path>] [--seed <u64>]\nExample: cargo run -p bloom_game -- --replay assets/replays/demo.json --seed 7".to_string()
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut args = Args::default();
    let mut iter = raw.iter();
    while let Some(flag) = iter.next() {
        let mut value = || {
            iter.next()
                .ok_or_else(|| format!("Missing value for '{flag}'\n{}", usage()))
        };
        match flag.as_str() {
            "--config" => args.config = Some(PathBuf::from(value()?)),
            "--replay" => args.replay = Some(PathBuf::from(value()?)),
            "--seed" => {
                let raw_seed = value()?;
                let seed = raw_seed
                    .parse::<u64>()
                    .map_err(|e| format!("Invalid seed '{raw_seed}': {e}"))?;
                args.seed = Some(seed);
            }
            "--help" | "-h" => return Err(usage()),
            other => return Err(format!("Unknown argument '{other}'\n{}", usage())),
        }
    }
    Ok(args)
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&raw)?;

    let config = match &args.config {
        Some(path) => load_config_from_path(path)?,
        None => GameConfig::default(),
    };
    let replay = match &args.replay {
        Some(path) => load_replay_from_path(path)?,
        None => ReplaySequence::demo(),
    };

    let clips = load_clips(&config)?;
    let mut scene = Scene::new(config, clips)?;
    let layout = match args.seed {
        Some(seed) => {
            log::info!("Layout seed: {seed}");
            scene.build(&mut StdRng::seed_from_u64(seed))
        }
        None => scene.build(&mut rand::rng()),
    };
    log::info!(
        "Placed {} tiles and {} flower pots",
        layout.tiles.len(),
        layout.containers.len()
    );

    let summary = run_replay(&mut scene, &replay);
    log::info!(
        "Replay finished: {} frames, {} steps, state {:?}, position {:?}",
        summary.frames,
        summary.steps,
        summary.final_state,
        summary.final_position
    );
    log::info!(
        "Containers filled: {} of {}, flowers grown: {}, sprites to draw: {}",
        scene.containers().filled_count(),
        scene.containers().len(),
        summary.growth_objects,
        scene.sprites().draw_order().len()
    );

    scene.teardown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_every_flag() {
        let args = parse_args(&strings(&[
            "--config",
            "game.json",
            "--replay",
            "run.json",
            "--seed",
            "42",
        ]))
        .expect("valid args");
        assert_eq!(args.config, Some(PathBuf::from("game.json")));
        assert_eq!(args.replay, Some(PathBuf::from("run.json")));
        assert_eq!(args.seed, Some(42));
    }

    #[test]
    fn no_flags_means_defaults() {
        let args = parse_args(&[]).expect("empty args");
        assert!(args.config.is_none() && args.replay.is_none() && args.seed.is_none());
    }

    #[test]
    fn rejects_bad_seed_missing_value_and_unknown_flag() {
        assert!(parse_args(&strings(&["--seed", "abc"]))
            .expect_err("bad seed")
            .contains("Invalid seed"));
        assert!(parse_args(&strings(&["--replay"]))
            .expect_err("missing value")
            .contains("Missing value"));
        assert!(parse_args(&strings(&["--fast"]))
            .expect_err("unknown flag")
            .contains("Unknown argument"));
    }
}
