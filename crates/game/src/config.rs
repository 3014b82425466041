use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

pub const CONFIG_ENV_VAR: &str = "ROAM_CONFIG";
pub const SCROLL_SPEED_ENV_VAR: &str = "ROAM_SCROLL_SPEED";
pub const SHOW_HEIGHTS_ENV_VAR: &str = "ROAM_SHOW_HEIGHTS";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub frame_cap_ms: u64,
    /// Scroll velocity in pixels per frame while an arrow key is held.
    pub scroll_speed: i32,
    /// Velocity multiplier while shift is held.
    pub fast_multiplier: i32,
    /// Draw each tile's height digit.
    pub show_heights: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            frame_cap_ms: 20,
            scroll_speed: 8,
            fast_multiplier: 5,
            show_heights: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {message}")]
    Parse { path: String, message: String },
}

/// Loads the config file, or the defaults when no path is given. A present
/// but unreadable or malformed file is a startup error, never silently
/// ignored.
pub fn load_config(path: Option<&Path>) -> Result<ViewerConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(ViewerConfig::default());
    };

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    match serde_path_to_error::deserialize::<_, ViewerConfig>(&mut deserializer) {
        Ok(config) => Ok(config),
        Err(error) => Err(ConfigError::Parse {
            path: path.display().to_string(),
            message: format!("{} at {}", error.inner(), error.path()),
        }),
    }
}

/// Applies environment overrides on top of the loaded config. Malformed
/// values are operator typos, not documents: they warn and fall back to the
/// configured value.
pub fn apply_env_overrides(config: &mut ViewerConfig) {
    if let Ok(value) = env::var(SCROLL_SPEED_ENV_VAR) {
        apply_scroll_speed_override(config, &value);
    }
    if let Ok(value) = env::var(SHOW_HEIGHTS_ENV_VAR) {
        apply_show_heights_override(config, &value);
    }
}

fn apply_scroll_speed_override(config: &mut ViewerConfig, value: &str) {
    match value.parse::<i32>() {
        Ok(speed) if speed > 0 => config.scroll_speed = speed,
        _ => warn!(
            env_var = SCROLL_SPEED_ENV_VAR,
            value, "invalid scroll speed override; keeping configured value"
        ),
    }
}

fn apply_show_heights_override(config: &mut ViewerConfig, value: &str) {
    match value.parse::<bool>() {
        Ok(show) => config.show_heights = show,
        Err(_) => warn!(
            env_var = SHOW_HEIGHTS_ENV_VAR,
            value, "invalid show-heights override; keeping configured value"
        ),
    }
}
