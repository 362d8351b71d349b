//! CV Labs - computer-vision lab tools
//!
//! A face and eye highlighter, a keypoint-based object locator and a
//! Tesseract OCR viewer, hosted in one desktop window.

mod capture;
mod config;
mod dashboard;
mod display;
mod shared;
mod storage;
mod vision;

use anyhow::Result;
use clap::Parser;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{AppConfig, ToolKind};
use crate::shared::SharedAppState;
use crate::vision::OcrEngine;

/// CV Labs - face detection, object location and OCR
#[derive(Parser, Debug)]
#[command(name = "cv-labs")]
#[command(about = "Computer-vision lab tools: face highlighter, object locator, OCR viewer")]
struct Args {
    /// Tool to open first
    #[arg(short, long, value_enum)]
    tool: Option<ToolKind>,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera device index
    #[arg(long)]
    camera: Option<i32>,

    /// Directory holding the Haar cascade XML files
    #[arg(long)]
    cascade_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("CV Labs starting...");

    let config_path = match args.config.clone() {
        Some(path) => Some(path),
        None => match storage::default_config_path() {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("No config directory, settings will not be saved: {:#}", e);
                None
            }
        },
    };

    let mut config = load_or_create_config(config_path.as_deref());
    apply_overrides(&mut config, &args);

    if !OcrEngine::is_available() {
        warn!("Text recognition needs the tesseract binary on PATH");
    }

    let shared_state = Arc::new(RwLock::new(SharedAppState::new(config, config_path)));

    if let Err(e) = dashboard::run_dashboard(shared_state) {
        tracing::error!("Dashboard error: {}", e);
    }

    info!("CV Labs shutdown complete");
    Ok(())
}

/// Load configuration from file, writing the defaults on first run
fn load_or_create_config(path: Option<&std::path::Path>) -> AppConfig {
    let Some(path) = path else {
        return AppConfig::default();
    };

    if path.exists() {
        match config::load_config(path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                return config;
            }
            Err(e) => {
                warn!("Ignoring invalid configuration: {:#}", e);
                return AppConfig::default();
            }
        }
    }

    let config = AppConfig::default();
    match config::save_config(&config, path) {
        Ok(()) => info!("Wrote default configuration to {:?}", path),
        Err(e) => warn!("Could not write default configuration: {:#}", e),
    }
    config
}

/// Command-line values win over the file for this session
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(tool) = args.tool {
        config.general.initial_tool = tool;
    }
    if let Some(camera) = args.camera {
        config.capture.camera_index = camera;
    }
    if let Some(dir) = &args.cascade_dir {
        config.face.cascade_dir = dir.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from([
            "cv-labs",
            "--tool",
            "locate",
            "--camera",
            "2",
            "--cascade-dir",
            "/opt/cascades",
        ]);
        assert_eq!(args.tool, Some(ToolKind::Locate));
        assert_eq!(args.camera, Some(2));
        assert_eq!(args.cascade_dir, Some(PathBuf::from("/opt/cascades")));
        assert!(args.config.is_none());
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let args = Args::parse_from(["cv-labs", "-t", "ocr", "--camera", "1"]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &args);

        assert_eq!(config.general.initial_tool, ToolKind::Ocr);
        assert_eq!(config.capture.camera_index, 1);
        assert_eq!(config.face, AppConfig::default().face);
    }

    #[test]
    fn test_first_run_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = load_or_create_config(Some(&path));
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[capture\ncamera_index = ").unwrap();

        assert_eq!(load_or_create_config(Some(&path)), AppConfig::default());
    }
}
