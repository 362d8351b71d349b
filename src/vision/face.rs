//! Face and eye highlighting with Haar cascades

use opencv::{
    core::{Mat, Rect, Scalar, Size, Vector},
    imgproc, objdetect,
    prelude::*,
};
use std::path::Path;
use tracing::{debug, info};

use super::VisionError;
use crate::config::FaceSettings;

const FACE_COLOR: (f64, f64, f64) = (255.0, 0.0, 0.0);
const EYE_COLOR: (f64, f64, f64) = (0.0, 255.0, 0.0);
const LINE_THICKNESS: i32 = 2;

/// A face and the eyes found inside it, all in frame coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDetection {
    pub face: Rect,
    pub eyes: Vec<Rect>,
}

/// Two cascade classifiers run back to back: faces on the frame, eyes on each face
pub struct FaceDetector {
    face_cascade: objdetect::CascadeClassifier,
    eye_cascade: objdetect::CascadeClassifier,
    settings: FaceSettings,
}

impl FaceDetector {
    /// Load both cascades named in `settings`
    pub fn new(settings: &FaceSettings) -> Result<Self, VisionError> {
        let face_cascade = load_cascade(&settings.face_cascade_path())?;
        let eye_cascade = load_cascade(&settings.eye_cascade_path())?;
        info!("Haar cascades loaded from {:?}", settings.cascade_dir);

        Ok(Self {
            face_cascade,
            eye_cascade,
            settings: settings.clone(),
        })
    }

    pub fn settings(&self) -> &FaceSettings {
        &self.settings
    }

    /// Detect faces, then eyes inside every face
    pub fn detect(&mut self, frame: &Mat) -> Result<Vec<FaceDetection>, VisionError> {
        let mut gray = Mat::default();
        imgproc::cvt_color_def(frame, &mut gray, imgproc::COLOR_BGR2GRAY)?;

        let mut faces = Vector::<Rect>::new();
        self.face_cascade.detect_multi_scale(
            &gray,
            &mut faces,
            self.settings.scale_factor,
            self.settings.min_neighbors,
            0,
            Size::new(self.settings.min_face_size, self.settings.min_face_size),
            Size::new(0, 0),
        )?;

        let mut detections = Vec::with_capacity(faces.len());
        for face in faces.iter() {
            let face_gray = Mat::roi(&gray, face)?;
            let mut eyes = Vector::<Rect>::new();
            self.eye_cascade.detect_multi_scale(
                &*face_gray,
                &mut eyes,
                self.settings.scale_factor,
                self.settings.min_neighbors,
                0,
                Size::new(self.settings.min_eye_size, self.settings.min_eye_size),
                Size::new(0, 0),
            )?;

            detections.push(FaceDetection {
                face,
                eyes: eyes.iter().map(|eye| offset_rect(eye, face)).collect(),
            });
        }

        debug!("Detected {} faces", detections.len());
        Ok(detections)
    }

    /// Detect and draw in place. Returns the number of faces found.
    pub fn process(&mut self, frame: &mut Mat) -> Result<usize, VisionError> {
        let detections = self.detect(frame)?;
        annotate(frame, &detections)?;
        Ok(detections.len())
    }
}

fn load_cascade(path: &Path) -> Result<objdetect::CascadeClassifier, VisionError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| VisionError::CascadeLoad(path.to_path_buf()))?;

    // A missing file yields an empty classifier rather than an error
    let cascade = objdetect::CascadeClassifier::new(path_str)
        .map_err(|_| VisionError::CascadeLoad(path.to_path_buf()))?;
    if cascade.empty()? {
        return Err(VisionError::CascadeLoad(path.to_path_buf()));
    }

    Ok(cascade)
}

/// Translate a rectangle found inside `origin` into the enclosing image
pub fn offset_rect(inner: Rect, origin: Rect) -> Rect {
    Rect::new(origin.x + inner.x, origin.y + inner.y, inner.width, inner.height)
}

/// Draw face rectangles in blue and eye rectangles in green
pub fn annotate(frame: &mut Mat, detections: &[FaceDetection]) -> opencv::Result<()> {
    let face_color = Scalar::new(FACE_COLOR.0, FACE_COLOR.1, FACE_COLOR.2, 0.0);
    let eye_color = Scalar::new(EYE_COLOR.0, EYE_COLOR.1, EYE_COLOR.2, 0.0);

    for detection in detections {
        imgproc::rectangle(
            frame,
            detection.face,
            face_color,
            LINE_THICKNESS,
            imgproc::LINE_8,
            0,
        )?;
        for eye in &detection.eyes {
            imgproc::rectangle(frame, *eye, eye_color, LINE_THICKNESS, imgproc::LINE_8, 0)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Vec3b, CV_8UC3};
    use std::path::PathBuf;

    #[test]
    fn test_offset_rect() {
        let face = Rect::new(100, 50, 80, 80);
        let eye = Rect::new(10, 20, 15, 12);
        assert_eq!(offset_rect(eye, face), Rect::new(110, 70, 15, 12));
    }

    #[test]
    fn test_missing_cascade_is_reported() {
        let settings = FaceSettings {
            cascade_dir: PathBuf::from("/nonexistent/haarcascades"),
            ..FaceSettings::default()
        };

        match FaceDetector::new(&settings) {
            Err(VisionError::CascadeLoad(path)) => {
                assert_eq!(path, settings.face_cascade_path());
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("cascade should not load"),
        }
    }

    #[test]
    fn test_annotate_draws_face_and_eyes() {
        let mut frame =
            Mat::new_rows_cols_with_default(100, 100, CV_8UC3, Scalar::all(0.0)).unwrap();
        let detections = vec![FaceDetection {
            face: Rect::new(10, 10, 60, 60),
            eyes: vec![Rect::new(20, 25, 10, 10)],
        }];

        annotate(&mut frame, &detections).unwrap();

        // Top edge of the face box is blue in BGR
        assert_eq!(*frame.at_2d::<Vec3b>(10, 40).unwrap(), Vec3b::from([255, 0, 0]));
        // Left edge of the eye box is green
        assert_eq!(*frame.at_2d::<Vec3b>(30, 20).unwrap(), Vec3b::from([0, 255, 0]));
        // Centre of the face is untouched
        assert_eq!(*frame.at_2d::<Vec3b>(50, 50).unwrap(), Vec3b::from([0, 0, 0]));
    }
}
