//! Capture Layer
//!
//! Frame sources for the live tools: a camera device read through OpenCV's
//! `VideoCapture`, or a still image loaded once from disk.

pub mod controller;
pub mod frame;

use opencv::{core::Mat, imgcodecs, prelude::*, videoio};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use controller::{CaptureLoop, CaptureState, Tick};
pub use frame::Frame;

/// Image file extensions offered by the open dialogs
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "webp"];

/// Errors produced while acquiring frames
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera {0} could not be opened (missing, busy or not permitted)")]
    CameraUnavailable(i32),
    #[error("camera stopped delivering frames")]
    ReadFailed,
    #[error("no more frames")]
    EndOfInput,
    #[error("image {0:?} could not be read")]
    ImageUnreadable(PathBuf),
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

/// Anything the capture loop can pull frames from
pub trait FrameSource {
    /// Acquire the next frame
    fn next_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Release the underlying device. Calling it twice must be harmless.
    fn release(&mut self);

    /// Human-readable description for status lines and logs
    fn describe(&self) -> String;
}

/// Camera device read through OpenCV
pub struct CameraSource {
    index: i32,
    capture: Option<videoio::VideoCapture>,
}

impl CameraSource {
    /// Open camera `index`
    pub fn open(index: i32) -> Result<Self, CaptureError> {
        info!("Opening camera {}", index);
        let capture = videoio::VideoCapture::new(index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            warn!("Camera {} did not open", index);
            return Err(CaptureError::CameraUnavailable(index));
        }

        Ok(Self {
            index,
            capture: Some(capture),
        })
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        let capture = self.capture.as_mut().ok_or(CaptureError::EndOfInput)?;

        let mut image = Mat::default();
        if !capture.read(&mut image)? || image.empty() {
            return Err(CaptureError::ReadFailed);
        }

        Ok(Frame::new(image))
    }

    fn release(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            if let Err(e) = capture.release() {
                warn!("Failed to release camera {}: {}", self.index, e);
            }
            info!("Camera {} released", self.index);
        }
    }

    fn describe(&self) -> String {
        format!("Camera {}", self.index)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// A still image served as a one-frame stream
pub struct StillImageSource {
    path: PathBuf,
    image: Option<Mat>,
}

impl StillImageSource {
    /// Load the image at `path`
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let image = load_image(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            image: Some(image),
        })
    }
}

impl FrameSource for StillImageSource {
    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        self.image
            .take()
            .map(Frame::new)
            .ok_or(CaptureError::EndOfInput)
    }

    fn release(&mut self) {
        self.image = None;
    }

    fn describe(&self) -> String {
        file_label(&self.path)
    }
}

/// Load a color image from disk in BGR order
pub fn load_image(path: &Path) -> Result<Mat, CaptureError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| CaptureError::ImageUnreadable(path.to_path_buf()))?;

    let image = imgcodecs::imread(path_str, imgcodecs::IMREAD_COLOR)?;
    if image.empty() {
        return Err(CaptureError::ImageUnreadable(path.to_path_buf()));
    }

    debug!("Loaded {:?} ({}x{})", path, image.cols(), image.rows());
    Ok(image)
}

/// File name shown next to a picker button
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_label() {
        assert_eq!(file_label(Path::new("/home/user/scene.png")), "scene.png");
        assert_eq!(file_label(Path::new("object.jpg")), "object.jpg");
    }

    #[test]
    fn test_load_missing_image() {
        let result = load_image(Path::new("/nonexistent/scene.png"));
        assert!(matches!(result, Err(CaptureError::ImageUnreadable(_))));
    }

    #[test]
    fn test_load_non_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        assert!(matches!(
            StillImageSource::open(&path),
            Err(CaptureError::ImageUnreadable(_))
        ));
    }

    #[test]
    fn test_still_image_yields_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.png");
        image::RgbImage::from_pixel(8, 6, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let mut source = StillImageSource::open(&path).unwrap();
        let frame = source.next_frame().unwrap();
        assert_eq!(frame.dimensions(), (8, 6));
        assert!(matches!(source.next_frame(), Err(CaptureError::EndOfInput)));
        assert_eq!(source.describe(), "scene.png");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CaptureError::CameraUnavailable(2).to_string(),
            "camera 2 could not be opened (missing, busy or not permitted)"
        );
        assert_eq!(CaptureError::EndOfInput.to_string(), "no more frames");
    }
}
