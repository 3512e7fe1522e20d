//! Configuration loading from TOML files.
//!
//! Lookup order:
//! 1. `$DUPMAP_CONFIG` environment variable
//! 2. `~/.config/dupmap/config.toml`
//! 3. Built-in defaults (everything is optional)

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use dupmap_io::InputOptions;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputOptions,
    pub output: OutputConfig,
}

/// Report destinations.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub clusters_path: PathBuf,
    pub contradictions_path: PathBuf,
    /// Optional JSON stats file.
    pub summary_json: Option<PathBuf>,
}

// --- Defaults ---

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            clusters_path: PathBuf::from("duplicates.txt"),
            contradictions_path: PathBuf::from("contradictions.txt"),
            summary_json: None,
        }
    }
}

/// Load config from disk. Returns defaults if no config file exists.
pub fn load_config() -> Result<Config> {
    let path = config_path();

    if let Some(p) = &path {
        if p.exists() {
            let content =
                std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| format!("parsing {}", p.display()))?;
            tracing::debug!(path = %p.display(), "loaded config");
            return Ok(config);
        }
    }

    Ok(Config::default())
}

/// Resolve the config file path.
fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("DUPMAP_CONFIG") {
        return Some(PathBuf::from(p));
    }

    dirs_home().map(|home| home.join(".config").join("dupmap").join("config.toml"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

/// Show the active config path (for `dupmap config`).
pub fn show_config_path() -> String {
    match config_path() {
        Some(p) if p.exists() => format!("{} (loaded)", p.display()),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "no config path resolved (using defaults)".into(),
    }
}
