use anyhow::Context;
use rummytally_core::{GameSettings, DEFAULT_MAX_POINTS};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const SAVE_DIR_ENV: &str = "RUMMYTALLY_SAVE_DIR";
const DEFAULT_SAVE_DIR: &str = ".rummytally";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    #[serde(default = "default_max_points")]
    max_points: i64,
    #[serde(default)]
    drop_points: Option<i64>,
}

fn default_max_points() -> i64 {
    DEFAULT_MAX_POINTS
}

/// Reads `{"maxPoints": .., "dropPoints": ..}`. A missing drop penalty is
/// derived from the ceiling.
pub fn load_settings_file(path: &Path) -> anyhow::Result<GameSettings> {
    let raw: RawSettings = load_json(path)?;
    let settings = match raw.drop_points {
        Some(drop_points) => GameSettings::new(raw.max_points, drop_points),
        None => GameSettings::with_suggested_drop(raw.max_points),
    };
    settings.with_context(|| format!("validate {}", path.display()))
}

pub fn default_save_dir() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(SAVE_DIR_ENV) {
        return Some(PathBuf::from(path));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(DEFAULT_SAVE_DIR))
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}
