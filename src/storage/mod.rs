//! Storage Layer
//!
//! Locates the per-user configuration directory and saves recognized text.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("org", "cvlabs", "cv-labs")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Default location of the config file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// Write recognized text to `path` as UTF-8.
///
/// Surrounding whitespace is trimmed. Returns `Ok(false)` without touching the
/// filesystem when there is nothing to save.
pub fn save_text(text: &str, path: &Path) -> Result<bool> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(false);
    }

    std::fs::write(path, text.as_bytes())?;
    info!("Saved {} bytes of text to {:?}", text.len(), path);
    Ok(true)
}
