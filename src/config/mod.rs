//! Application Configuration
//!
//! User settings and tool parameters stored in TOML format.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Camera and tick settings
    pub capture: CaptureSettings,
    /// Face/eye highlighter settings
    pub face: FaceSettings,
    /// Object locator settings
    pub locate: LocateSettings,
    /// Text recognition settings
    pub ocr: OcrSettings,
    /// Display settings
    pub display: DisplaySettings,
}

/// Which tool the window opens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Face,
    Locate,
    Ocr,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Tool shown at startup
    pub initial_tool: ToolKind,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            initial_tool: ToolKind::Face,
        }
    }
}

/// Capture-related settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Camera device index passed to the capture backend
    pub camera_index: i32,
    /// Delay between face highlighter ticks
    pub face_tick_ms: u64,
    /// Delay between object locator ticks
    pub locate_tick_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            camera_index: 0,
            face_tick_ms: 10,
            locate_tick_ms: 30,
        }
    }
}

/// Cascade classifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceSettings {
    /// Directory holding the stock Haar cascade XML files
    pub cascade_dir: PathBuf,
    /// Frontal face cascade file name
    pub face_cascade: String,
    /// Eye cascade file name
    pub eye_cascade: String,
    /// Pyramid scale step between detection passes
    pub scale_factor: f64,
    /// Neighbouring detections required to keep a candidate
    pub min_neighbors: i32,
    /// Smallest face side in pixels
    pub min_face_size: i32,
    /// Smallest eye side in pixels
    pub min_eye_size: i32,
}

impl Default for FaceSettings {
    fn default() -> Self {
        Self {
            cascade_dir: PathBuf::from("/usr/share/opencv4/haarcascades"),
            face_cascade: "haarcascade_frontalface_default.xml".to_string(),
            eye_cascade: "haarcascade_eye.xml".to_string(),
            scale_factor: 1.1,
            min_neighbors: 5,
            min_face_size: 30,
            min_eye_size: 10,
        }
    }
}

impl FaceSettings {
    /// Full path of the face cascade
    pub fn face_cascade_path(&self) -> PathBuf {
        self.cascade_dir.join(&self.face_cascade)
    }

    /// Full path of the eye cascade
    pub fn eye_cascade_path(&self) -> PathBuf {
        self.cascade_dir.join(&self.eye_cascade)
    }
}

/// Keypoint detector used by the object locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Binary ORB descriptors, Hamming distance
    Orb,
    /// Float SIFT descriptors, L2 distance
    #[default]
    Sift,
}

impl FeatureKind {
    pub fn name(&self) -> &'static str {
        match self {
            FeatureKind::Orb => "ORB",
            FeatureKind::Sift => "SIFT",
        }
    }
}

/// Object locator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocateSettings {
    /// Keypoint detector
    pub features: FeatureKind,
    /// Keypoint budget for ORB
    pub orb_features: i32,
    /// Lowe ratio-test threshold
    pub ratio: f32,
    /// Good matches must exceed this count before a homography is fitted
    pub min_good_matches: usize,
    /// RANSAC reprojection threshold in pixels
    pub ransac_threshold: f64,
    /// Draw inlier markers on the scene
    pub show_markers: bool,
    /// Connect markers to the centre of the located object
    pub connect_markers: bool,
}

impl Default for LocateSettings {
    fn default() -> Self {
        Self {
            features: FeatureKind::Sift,
            orb_features: 1000,
            ratio: 0.75,
            min_good_matches: 10,
            ransac_threshold: 5.0,
            show_markers: true,
            connect_markers: true,
        }
    }
}

/// Text recognition settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract language list, e.g. "rus+eng"
    pub language: String,
    /// Tesseract engine mode
    pub oem: i32,
    /// Tesseract page segmentation mode
    pub psm: i32,
    /// Binarize with Otsu's threshold before recognition
    pub binarize: bool,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "rus+eng".to_string(),
            oem: 3,
            psm: 6,
            binarize: true,
        }
    }
}

/// Display settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Side of the square box the object thumbnail is fitted into
    pub thumbnail_size: f32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            thumbnail_size: 150.0,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert_eq!(config.general.initial_tool, ToolKind::Face);

        assert_eq!(config.capture.camera_index, 0);
        assert_eq!(config.capture.face_tick_ms, 10);
        assert_eq!(config.capture.locate_tick_ms, 30);

        assert!((config.face.scale_factor - 1.1).abs() < 1e-9);
        assert_eq!(config.face.min_neighbors, 5);
        assert_eq!(config.face.min_face_size, 30);
        assert_eq!(config.face.min_eye_size, 10);

        assert_eq!(config.locate.features, FeatureKind::Sift);
        assert!((config.locate.ratio - 0.75).abs() < f32::EPSILON);
        assert_eq!(config.locate.min_good_matches, 10);
        assert!((config.locate.ransac_threshold - 5.0).abs() < 1e-9);
        assert!(config.locate.show_markers);
        assert!(config.locate.connect_markers);

        assert_eq!(config.ocr.language, "rus+eng");
        assert_eq!(config.ocr.oem, 3);
        assert_eq!(config.ocr.psm, 6);
        assert!(config.ocr.binarize);
    }

    #[test]
    fn test_cascade_paths() {
        let face = FaceSettings {
            cascade_dir: PathBuf::from("/data/cascades"),
            ..FaceSettings::default()
        };

        assert_eq!(
            face.face_cascade_path(),
            PathBuf::from("/data/cascades/haarcascade_frontalface_default.xml")
        );
        assert_eq!(
            face.eye_cascade_path(),
            PathBuf::from("/data/cascades/haarcascade_eye.xml")
        );
    }

    #[test]
    fn test_config_with_custom_values() {
        let mut config = AppConfig::default();
        config.general.initial_tool = ToolKind::Ocr;
        config.locate.features = FeatureKind::Orb;
        config.ocr.language = "eng".to_string();

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed, config);
        assert!(toml_str.contains("features = \"orb\""));
        assert!(toml_str.contains("initial_tool = \"ocr\""));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str("[ocr]\nlanguage = \"eng\"\n").unwrap();

        assert_eq!(parsed.ocr.language, "eng");
        assert_eq!(parsed.ocr.psm, 6);
        assert_eq!(parsed.capture, CaptureSettings::default());
    }

    #[test]
    fn test_save_and_load_config() {
        let config = AppConfig::default();
        let temp_file = NamedTempFile::new().unwrap();

        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
