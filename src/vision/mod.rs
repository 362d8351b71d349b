//! Vision Layer
//!
//! Frame processors for the three tools. Detection, feature extraction,
//! matching and homography fitting are OpenCV calls; text recognition is
//! delegated to the system Tesseract engine.

pub mod face;
pub mod locate;
pub mod ocr;

use std::path::PathBuf;
use thiserror::Error;

pub use face::FaceDetector;
pub use locate::{LocateOutcome, ObjectLocator};
pub use ocr::{OcrEngine, OcrError};

/// Errors raised by the OpenCV-backed processors
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("cascade {0:?} could not be loaded, check the OpenCV data directory")]
    CascadeLoad(PathBuf),
    #[error("no object image selected")]
    NoObject,
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}
