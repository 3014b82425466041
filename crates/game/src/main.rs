mod app;
mod config;
mod world;

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use engine::{run_stack, LoopConfig, PixelsSurface, ScreenStack, SurfaceError};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::app::ExploreScreen;
use crate::config::{apply_env_overrides, load_config, ConfigError, CONFIG_ENV_VAR};
use crate::world::{TerrainSet, World, WorldLoadError};

const WINDOW_TITLE: &str = "Roam";

#[derive(Debug, Error)]
enum StartupError {
    #[error("usage: game <world-file> [--config <file>] [--heights]")]
    Usage,
    #[error("failed to read world file {path}: {source}")]
    ReadWorld {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    WorldLoad(#[from] WorldLoadError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    world_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    show_heights: bool,
}

fn parse_args<I: Iterator<Item = String>>(mut raw: I) -> Result<Args, StartupError> {
    let mut args = Args::default();
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--heights" => args.show_heights = true,
            "--config" => {
                let value = raw.next().ok_or(StartupError::Usage)?;
                args.config_path = Some(PathBuf::from(value));
            }
            _ if arg.starts_with('-') => return Err(StartupError::Usage),
            _ if args.world_path.is_none() => args.world_path = Some(PathBuf::from(arg)),
            _ => return Err(StartupError::Usage),
        }
    }
    Ok(args)
}

fn main() {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "startup");

    if let Err(err) = run() {
        error!(error = %err, "startup_failed");
        process::exit(1);
    }
    info!("shutdown");
}

fn run() -> Result<(), StartupError> {
    let args = parse_args(env::args().skip(1))?;
    let world_path = args.world_path.ok_or(StartupError::Usage)?;

    let config_path = args
        .config_path
        .or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));
    let mut config = load_config(config_path.as_deref())?;
    apply_env_overrides(&mut config);
    if args.show_heights {
        config.show_heights = true;
    }

    let text = fs::read_to_string(&world_path).map_err(|source| StartupError::ReadWorld {
        path: world_path.display().to_string(),
        source,
    })?;
    let world = World::read(&text, TerrainSet::standard())?;
    info!(
        width = world.width(),
        height = world.height(),
        start_x = world.start().0,
        start_y = world.start().1,
        "world_loaded"
    );

    let mut surface = PixelsSurface::new(WINDOW_TITLE, config.window_width, config.window_height)?;
    let screen = ExploreScreen::new(world, &config, &mut surface)?;
    let mut stack = ScreenStack::new(Box::new(screen));

    run_stack(
        &mut stack,
        &mut surface,
        &LoopConfig {
            frame_cap_ms: config.frame_cap_ms,
            ..LoopConfig::default()
        },
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, StartupError> {
        parse_args(args.iter().map(ToString::to_string))
    }

    #[test]
    fn world_path_is_the_first_positional_argument() {
        let args = parse(&["worlds/overworld.txt"]).expect("args");
        assert_eq!(args.world_path, Some(PathBuf::from("worlds/overworld.txt")));
        assert!(!args.show_heights);
        assert_eq!(args.config_path, None);
    }

    #[test]
    fn flags_combine_with_the_world_path() {
        let args = parse(&["--heights", "w.txt", "--config", "roam.json"]).expect("args");
        assert_eq!(args.world_path, Some(PathBuf::from("w.txt")));
        assert_eq!(args.config_path, Some(PathBuf::from("roam.json")));
        assert!(args.show_heights);
    }

    #[test]
    fn unknown_flags_are_usage_errors() {
        assert!(matches!(parse(&["--nope"]), Err(StartupError::Usage)));
    }

    #[test]
    fn extra_positional_arguments_are_usage_errors() {
        assert!(matches!(
            parse(&["a.txt", "b.txt"]),
            Err(StartupError::Usage)
        ));
    }

    #[test]
    fn config_flag_requires_a_value() {
        assert!(matches!(
            parse(&["w.txt", "--config"]),
            Err(StartupError::Usage)
        ));
    }
}
