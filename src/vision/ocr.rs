//! Text recognition
//!
//! Images are converted to grayscale, optionally binarized with Otsu's global
//! threshold and handed to the Tesseract command line engine.

use image::{DynamicImage, GrayImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use rusty_tesseract::{Args, Image, TessError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::OcrSettings;

/// Errors raised while recognizing text
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("no image selected")]
    NoImage,
    #[error("image {path:?} could not be opened: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Tesseract is not installed or not on PATH")]
    EngineMissing,
    #[error("recognition failed: {0}")]
    Recognition(String),
}

impl From<TessError> for OcrError {
    fn from(e: TessError) -> Self {
        match e {
            TessError::TesseractNotFoundError => OcrError::EngineMissing,
            other => OcrError::Recognition(other.to_string()),
        }
    }
}

/// Recognized text and the image the engine actually saw
#[derive(Debug, Clone)]
pub struct Recognition {
    /// Engine output with surrounding whitespace removed
    pub text: String,
    /// Binarized input, when binarization is enabled
    pub binarized: Option<GrayImage>,
}

/// Decode an image file for recognition
pub fn load_image(path: &Path) -> Result<DynamicImage, OcrError> {
    image::open(path).map_err(|source| OcrError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Grayscale plus Otsu binarization; output pixels are either 0 or 255
pub fn binarize(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();
    let level = otsu_level(&gray);
    debug!("Otsu level {}", level);
    threshold(&gray, level, ThresholdType::Binary)
}

/// Tesseract arguments for the configured language and modes
pub fn build_args(settings: &OcrSettings) -> Args {
    let lang = settings.language.trim();
    let lang = if lang.is_empty() {
        OcrSettings::default().language
    } else {
        lang.to_string()
    };

    Args {
        lang,
        config_variables: HashMap::new(),
        dpi: None,
        psm: Some(settings.psm),
        oem: Some(settings.oem),
    }
}

/// Thin wrapper around the system Tesseract engine
#[derive(Debug, Clone)]
pub struct OcrEngine {
    settings: OcrSettings,
}

impl OcrEngine {
    pub fn new(settings: &OcrSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    pub fn set_settings(&mut self, settings: &OcrSettings) {
        self.settings = settings.clone();
    }

    /// Check that a Tesseract binary can be run
    pub fn is_available() -> bool {
        match rusty_tesseract::get_tesseract_version() {
            Ok(version) => {
                info!("Tesseract {}", version.lines().next().unwrap_or_default());
                true
            }
            Err(e) => {
                warn!("Tesseract unavailable: {}", e);
                false
            }
        }
    }

    /// Recognize the text in `image`
    pub fn recognize(&self, image: &DynamicImage) -> Result<Recognition, OcrError> {
        let binarized = self.settings.binarize.then(|| binarize(image));
        let input = match &binarized {
            Some(bin) => DynamicImage::ImageLuma8(bin.clone()),
            None => image.clone(),
        };

        let tess_image = Image::from_dynamic_image(&input)?;
        let args = build_args(&self.settings);
        let raw = rusty_tesseract::image_to_string(&tess_image, &args)?;
        let text = raw.trim().to_string();

        info!(
            "Recognized {} characters with lang {}",
            text.chars().count(),
            args.lang
        );
        Ok(Recognition { text, binarized })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};
    use tempfile::tempdir;

    #[test]
    fn test_build_args_defaults() {
        let args = build_args(&OcrSettings::default());
        assert_eq!(args.lang, "rus+eng");
        assert_eq!(args.oem, Some(3));
        assert_eq!(args.psm, Some(6));
        assert!(args.config_variables.is_empty());
    }

    #[test]
    fn test_build_args_custom_language() {
        let settings = OcrSettings {
            language: " deu+eng ".to_string(),
            psm: 3,
            ..OcrSettings::default()
        };
        let args = build_args(&settings);
        assert_eq!(args.lang, "deu+eng");
        assert_eq!(args.psm, Some(3));
    }

    #[test]
    fn test_build_args_blank_language_falls_back() {
        let settings = OcrSettings {
            language: "   ".to_string(),
            ..OcrSettings::default()
        };
        assert_eq!(build_args(&settings).lang, "rus+eng");
    }

    #[test]
    fn test_binarize_is_two_level() {
        // Dark text band on a light gradient background
        let image = RgbImage::from_fn(64, 32, |x, y| {
            if (12..20).contains(&y) && x % 4 != 0 {
                Rgb([20, 25, 30])
            } else {
                let v = 180 + (x as u8 % 40);
                Rgb([v, v, v])
            }
        });

        let bin = binarize(&DynamicImage::ImageRgb8(image));
        assert_eq!(bin.dimensions(), (64, 32));
        assert!(bin.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert_eq!(*bin.get_pixel(1, 15), Luma([0]));
        assert_eq!(*bin.get_pixel(1, 2), Luma([255]));
    }

    #[test]
    fn test_load_missing_image() {
        let result = load_image(Path::new("/nonexistent/scan.png"));
        assert!(matches!(result, Err(OcrError::ImageLoad { .. })));
    }

    #[test]
    fn test_load_image_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.png");
        RgbImage::from_pixel(8, 6, Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();

        let image = load_image(&path).unwrap();
        assert_eq!((image.width(), image.height()), (8, 6));
    }

    #[test]
    fn test_tess_error_mapping() {
        assert!(matches!(
            OcrError::from(TessError::TesseractNotFoundError),
            OcrError::EngineMissing
        ));
    }
}
