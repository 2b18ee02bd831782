use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

const CONFIG_FILE: &str = "config.toml";

#[derive(Resource, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub xr: XrConfig,
    pub measurement: MeasurementConfig,
    pub model: ModelConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct XrConfig {
    /// Request an AR session at all.
    pub enabled: bool,
    /// Surface detection through hit-testing.
    pub hit_test: bool,
    /// World-anchored tracking through the anchor-persistence service.
    pub anchors: bool,
    /// Simulated round-trip of an anchor-persistence request.
    pub anchor_latency_ms: u64,
    /// Height (meters) of the detected horizontal surface.
    pub surface_height: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MeasurementConfig {
    pub marker_radius: f32,
    /// RGBA, 0.0..=1.0
    pub line_color: [f32; 4],
    /// Show each measurement's label in the scene.
    pub show_labels: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// glTF file relative to the assets directory.
    pub path: String,
    pub scale: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            xr: XrConfig::default(),
            measurement: MeasurementConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl Default for XrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hit_test: true,
            anchors: true,
            anchor_latency_ms: 120,
            surface_height: 0.0,
        }
    }
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            marker_radius: 0.02,
            line_color: [1.0, 1.0, 1.0, 1.0],
            show_labels: true,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "models/Buggy.gltf".to_string(),
            scale: 0.01,
        }
    }
}

fn config_path() -> PathBuf {
    paths::config_dir().join(CONFIG_FILE)
}

pub fn parse_config(contents: &str) -> Result<AppConfig, String> {
    toml::from_str(contents).map_err(|e| format!("Failed to parse config: {}", e))
}

pub fn load_config_from(path: &Path) -> AppConfig {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(contents) => match parse_config(&contents) {
                Ok(config) => {
                    info!("Loaded config from {:?}", path);
                    return config;
                }
                Err(e) => {
                    warn!("{}, using defaults", e);
                    return AppConfig::default();
                }
            },
            Err(e) => {
                warn!("Failed to read config: {}, using defaults", e);
                return AppConfig::default();
            }
        }
    }

    let config = AppConfig::default();
    if let Err(e) = save_config_to(&config, path) {
        error!("{}", e);
    }
    config
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), String> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    if let Some(parent) = path.parent() {
        paths::ensure_dir(parent);
    }
    fs::write(path, contents).map_err(|e| format!("Failed to write config: {}", e))?;
    info!("Saved config to {:?}", path);
    Ok(())
}

pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(load_config());
    }
}
