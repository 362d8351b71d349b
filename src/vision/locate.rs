//! Planar object location by keypoint matching
//!
//! Keypoints of the object image are matched against each scene with a
//! brute-force kNN matcher, filtered with Lowe's ratio test and, when enough
//! matches survive, fitted with a RANSAC homography. The projected object
//! outline and the inlier keypoints are drawn onto a copy of the scene.

use opencv::{
    calib3d,
    core::{self, DMatch, KeyPoint, Mat, Point, Point2f, Ptr, Scalar, Vector},
    features2d, imgproc,
    prelude::*,
};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::VisionError;
use crate::config::{FeatureKind, LocateSettings};

/// One candidate match between an object descriptor and a scene descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    /// Index into the object keypoints
    pub query_idx: i32,
    /// Index into the scene keypoints
    pub train_idx: i32,
    pub distance: f32,
}

impl From<DMatch> for MatchCandidate {
    fn from(m: DMatch) -> Self {
        Self {
            query_idx: m.query_idx,
            train_idx: m.train_idx,
            distance: m.distance,
        }
    }
}

/// Keep the best candidate of every list whose best distance is strictly
/// below `ratio` times the second best. Lists with fewer than two candidates
/// carry no evidence and are dropped.
pub fn ratio_test(candidates: &[Vec<MatchCandidate>], ratio: f32) -> Vec<MatchCandidate> {
    candidates
        .iter()
        .filter_map(|pair| match pair.as_slice() {
            [best, second, ..] if best.distance < ratio * second.distance => Some(*best),
            _ => None,
        })
        .collect()
}

/// A homography is only attempted with strictly more than `min_good` matches
pub fn enough_matches(good: usize, min_good: usize) -> bool {
    good > min_good
}

/// Object corners in the order they are projected and outlined
pub fn object_corners(width: i32, height: i32) -> [Point2f; 4] {
    let w = (width - 1) as f32;
    let h = (height - 1) as f32;
    [
        Point2f::new(0.0, 0.0),
        Point2f::new(0.0, h),
        Point2f::new(w, h),
        Point2f::new(w, 0.0),
    ]
}

/// Centre of a projected outline, taken between its first and third corner
pub fn quad_center(quad: &[Point2f; 4]) -> Point {
    Point::new(
        ((quad[0].x + quad[2].x) / 2.0) as i32,
        ((quad[0].y + quad[2].y) / 2.0) as i32,
    )
}

/// Result of locating the object in one scene
#[derive(Debug)]
pub struct LocateOutcome {
    /// Scene copy with the outline and markers drawn
    pub annotated: Mat,
    /// Matches that passed the ratio test
    pub good_matches: usize,
    /// Good matches consistent with the homography
    pub inliers: usize,
    /// Projected object outline, when a homography was found
    pub outline: Option<[Point2f; 4]>,
    /// Time spent in detection, matching and drawing
    pub elapsed: Duration,
}

impl LocateOutcome {
    pub fn found(&self) -> bool {
        self.outline.is_some()
    }
}

enum Detector {
    Orb(Ptr<features2d::ORB>),
    Sift(Ptr<features2d::SIFT>),
}

impl Detector {
    fn create(settings: &LocateSettings) -> opencv::Result<Self> {
        Ok(match settings.features {
            FeatureKind::Orb => Detector::Orb(features2d::ORB::create(
                settings.orb_features,
                1.2,
                8,
                31,
                0,
                2,
                features2d::ORB_ScoreType::HARRIS_SCORE,
                31,
                20,
            )?),
            FeatureKind::Sift => Detector::Sift(features2d::SIFT::create_def()?),
        })
    }

    /// Distance matching the descriptor type
    fn norm(&self) -> i32 {
        match self {
            Detector::Orb(_) => core::NORM_HAMMING,
            Detector::Sift(_) => core::NORM_L2,
        }
    }

    fn detect_and_compute(&mut self, gray: &Mat) -> opencv::Result<(Vector<KeyPoint>, Mat)> {
        let mut keypoints = Vector::<KeyPoint>::new();
        let mut descriptors = Mat::default();
        let mask = Mat::default();
        match self {
            Detector::Orb(orb) => {
                orb.detect_and_compute(gray, &mask, &mut keypoints, &mut descriptors, false)?
            }
            Detector::Sift(sift) => {
                sift.detect_and_compute(gray, &mask, &mut keypoints, &mut descriptors, false)?
            }
        }
        Ok((keypoints, descriptors))
    }
}

/// Keypoints of the reference object, computed once per object image
struct ObjectModel {
    keypoints: Vector<KeyPoint>,
    descriptors: Mat,
    width: i32,
    height: i32,
}

impl ObjectModel {
    fn compute(detector: &mut Detector, image: &Mat) -> opencv::Result<Self> {
        let mut gray = Mat::default();
        imgproc::cvt_color_def(image, &mut gray, imgproc::COLOR_BGR2GRAY)?;
        let (keypoints, descriptors) = detector.detect_and_compute(&gray)?;
        debug!("Object has {} keypoints", keypoints.len());

        Ok(Self {
            keypoints,
            descriptors,
            width: gray.cols(),
            height: gray.rows(),
        })
    }
}

/// Finds a reference object in scenes
pub struct ObjectLocator {
    detector: Detector,
    matcher: features2d::BFMatcher,
    settings: LocateSettings,
    object: Option<ObjectModel>,
    object_image: Option<Mat>,
}

impl ObjectLocator {
    pub fn new(settings: &LocateSettings) -> Result<Self, VisionError> {
        let detector = Detector::create(settings)?;
        let matcher = features2d::BFMatcher::new(detector.norm(), false)?;
        info!("Object locator using {}", settings.features.name());

        Ok(Self {
            detector,
            matcher,
            settings: settings.clone(),
            object: None,
            object_image: None,
        })
    }

    /// Apply new settings, rebuilding the detector when the feature type changes.
    ///
    /// On error the locator keeps its previous settings, detector and object.
    pub fn update_settings(&mut self, settings: &LocateSettings) -> Result<(), VisionError> {
        let rebuild = settings.features != self.settings.features
            || settings.orb_features != self.settings.orb_features;

        if rebuild {
            let mut detector = Detector::create(settings)?;
            let matcher = features2d::BFMatcher::new(detector.norm(), false)?;
            let object = self
                .object_image
                .as_ref()
                .map(|image| ObjectModel::compute(&mut detector, image))
                .transpose()?;

            self.detector = detector;
            self.matcher = matcher;
            self.object = object;
            info!("Object locator switched to {}", settings.features.name());
        }
        self.settings = settings.clone();
        Ok(())
    }

    /// Set the reference object (BGR image)
    pub fn set_object(&mut self, image: Mat) -> Result<(), VisionError> {
        self.object = Some(ObjectModel::compute(&mut self.detector, &image)?);
        self.object_image = Some(image);
        Ok(())
    }

    /// Locate the object in `scene` and return an annotated copy
    pub fn locate(&mut self, scene: &Mat) -> Result<LocateOutcome, VisionError> {
        let started = Instant::now();
        let object = self.object.as_ref().ok_or(VisionError::NoObject)?;

        let mut annotated = scene.try_clone()?;
        let outcome = |annotated: Mat, good_matches, inliers, outline| LocateOutcome {
            annotated,
            good_matches,
            inliers,
            outline,
            elapsed: started.elapsed(),
        };

        let mut gray = Mat::default();
        imgproc::cvt_color_def(scene, &mut gray, imgproc::COLOR_BGR2GRAY)?;
        let (scene_keypoints, scene_descriptors) = self.detector.detect_and_compute(&gray)?;

        if object.descriptors.empty() || scene_descriptors.empty() {
            return Ok(outcome(annotated, 0, 0, None));
        }

        let mut knn = Vector::<Vector<DMatch>>::new();
        self.matcher.knn_train_match(
            &object.descriptors,
            &scene_descriptors,
            &mut knn,
            2,
            &core::no_array(),
            false,
        )?;
        let candidates: Vec<Vec<MatchCandidate>> = knn
            .iter()
            .map(|pair| pair.iter().map(MatchCandidate::from).collect())
            .collect();
        let good = ratio_test(&candidates, self.settings.ratio);

        if !enough_matches(good.len(), self.settings.min_good_matches) {
            return Ok(outcome(annotated, good.len(), 0, None));
        }

        let mut object_points = Vector::<Point2f>::with_capacity(good.len());
        let mut scene_points = Vector::<Point2f>::with_capacity(good.len());
        for m in &good {
            object_points.push(object.keypoints.get(m.query_idx as usize)?.pt());
            scene_points.push(scene_keypoints.get(m.train_idx as usize)?.pt());
        }

        let mut mask = Mat::default();
        let homography = calib3d::find_homography(
            &object_points,
            &scene_points,
            &mut mask,
            calib3d::RANSAC,
            self.settings.ransac_threshold,
        )?;
        if homography.empty() {
            return Ok(outcome(annotated, good.len(), 0, None));
        }

        let corners = Vector::<Point2f>::from_iter(object_corners(object.width, object.height));
        let mut projected = Vector::<Point2f>::new();
        core::perspective_transform(&corners, &mut projected, &homography)?;
        let outline = [
            projected.get(0)?,
            projected.get(1)?,
            projected.get(2)?,
            projected.get(3)?,
        ];

        let mut inlier_points = Vec::new();
        for (i, point) in scene_points.iter().enumerate() {
            if !mask.empty() && *mask.at::<u8>(i as i32)? != 0 {
                inlier_points.push(point);
            }
        }

        draw_overlay(
            &mut annotated,
            &outline,
            &inlier_points,
            self.settings.show_markers,
            self.settings.connect_markers,
        )?;

        debug!(
            "Object located: {} good matches, {} inliers",
            good.len(),
            inlier_points.len()
        );
        Ok(outcome(annotated, good.len(), inlier_points.len(), Some(outline)))
    }
}

/// Draw the object outline and, optionally, inlier markers joined to its centre
pub fn draw_overlay(
    image: &mut Mat,
    outline: &[Point2f; 4],
    inliers: &[Point2f],
    show_markers: bool,
    connect_markers: bool,
) -> opencv::Result<()> {
    let polygon: Vector<Point> = outline
        .iter()
        .map(|p| Point::new(p.x as i32, p.y as i32))
        .collect();
    imgproc::polylines(
        image,
        &Vector::<Vector<Point>>::from_iter([polygon]),
        true,
        Scalar::new(0.0, 255.0, 0.0, 0.0),
        3,
        imgproc::LINE_AA,
        0,
    )?;

    if !show_markers {
        return Ok(());
    }

    let center = quad_center(outline);
    for p in inliers {
        let marker = Point::new(p.x as i32, p.y as i32);
        imgproc::circle(
            image,
            marker,
            4,
            Scalar::new(255.0, 0.0, 0.0, 0.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;

        if connect_markers {
            imgproc::line(
                image,
                marker,
                center,
                Scalar::new(0.0, 0.0, 255.0, 0.0),
                1,
                imgproc::LINE_8,
                0,
            )?;
        }
    }

    Ok(())
}
