//! Dashboard view state management

use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::{DynamicImage, GrayImage};

use crate::capture::CaptureLoop;
use crate::config::{AppConfig, ToolKind};
use crate::display::DisplaySink;
use crate::vision::{FaceDetector, ObjectLocator, OcrEngine};

/// Current view in the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardView {
    #[default]
    Face,
    Locate,
    Ocr,
    Settings,
}

impl DashboardView {
    /// All views in sidebar order
    pub const ALL: [DashboardView; 4] = [
        DashboardView::Face,
        DashboardView::Locate,
        DashboardView::Ocr,
        DashboardView::Settings,
    ];

    /// Get the display name for this view
    pub fn name(&self) -> &'static str {
        match self {
            DashboardView::Face => "Face",
            DashboardView::Locate => "Locate",
            DashboardView::Ocr => "OCR",
            DashboardView::Settings => "Settings",
        }
    }

    /// Get the icon character for this view
    pub fn icon(&self) -> &'static str {
        match self {
            DashboardView::Face => "F",
            DashboardView::Locate => "L",
            DashboardView::Ocr => "T",
            DashboardView::Settings => "S",
        }
    }
}

impl From<ToolKind> for DashboardView {
    fn from(tool: ToolKind) -> Self {
        match tool {
            ToolKind::Face => DashboardView::Face,
            ToolKind::Locate => DashboardView::Locate,
            ToolKind::Ocr => DashboardView::Ocr,
        }
    }
}

/// Overall dashboard state
#[derive(Debug)]
pub struct DashboardState {
    /// Current active view
    pub current_view: DashboardView,
    pub face: FaceViewState,
    pub locate: LocateViewState,
    pub ocr: OcrViewState,
    pub settings: SettingsViewState,
}

impl DashboardState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            current_view: config.general.initial_tool.into(),
            face: FaceViewState::new(config),
            locate: LocateViewState::new(config),
            ocr: OcrViewState::new(config),
            settings: SettingsViewState::default(),
        }
    }

    /// Switch views, stopping every live capture on the way
    pub fn switch_to(&mut self, view: DashboardView) -> bool {
        if view == self.current_view {
            return false;
        }
        self.stop_all();
        self.current_view = view;
        true
    }

    /// Bring the views in line with an edited configuration
    pub fn apply_config(&mut self, config: &AppConfig) {
        self.face
            .capture
            .set_interval(Duration::from_millis(config.capture.face_tick_ms));
        self.locate
            .capture
            .set_interval(Duration::from_millis(config.capture.locate_tick_ms));

        // Cascades are reloaded on the next start
        if self
            .face
            .detector
            .as_ref()
            .is_some_and(|d| d.settings() != &config.face)
        {
            self.face.detector = None;
        }
    }

    /// Stop all capture loops and release their devices
    pub fn stop_all(&mut self) {
        if self.face.capture.stop() {
            self.face.display.clear();
            self.face.reset_stats();
        }
        self.locate.capture.stop();
    }
}

/// Face highlighter view state
pub struct FaceViewState {
    pub capture: CaptureLoop,
    /// Loaded on first start and kept afterwards
    pub detector: Option<FaceDetector>,
    pub display: DisplaySink,
    /// Faces found in the last frame
    pub last_faces: usize,
    /// Size and acquisition time of the last frame
    pub last_frame: Option<((u32, u32), Instant)>,
    /// Smoothed frame rate
    pub fps: f32,
}

impl std::fmt::Debug for FaceViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceViewState")
            .field("state", &self.capture.state())
            .field("detector_loaded", &self.detector.is_some())
            .field("last_faces", &self.last_faces)
            .field("fps", &self.fps)
            .finish()
    }
}

impl FaceViewState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            capture: CaptureLoop::new(Duration::from_millis(config.capture.face_tick_ms)),
            detector: None,
            display: DisplaySink::new("face_frame"),
            last_faces: 0,
            last_frame: None,
            fps: 0.0,
        }
    }

    /// Record a processed frame and update the frame rate
    pub fn record_frame(&mut self, size: (u32, u32), at: Instant, faces: usize) {
        if let Some((_, previous)) = self.last_frame {
            let dt = at.saturating_duration_since(previous).as_secs_f32();
            if dt > 0.0 {
                let current = 1.0 / dt;
                self.fps = if self.fps == 0.0 {
                    current
                } else {
                    self.fps * 0.9 + current * 0.1
                };
            }
        }
        self.last_frame = Some((size, at));
        self.last_faces = faces;
    }

    /// Forget per-session statistics
    pub fn reset_stats(&mut self) {
        self.last_frame = None;
        self.last_faces = 0;
        self.fps = 0.0;
    }
}

/// Where the locate tool takes its scene from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneSource {
    #[default]
    Webcam,
    Image,
}

/// Object locator view state
pub struct LocateViewState {
    pub capture: CaptureLoop,
    pub source: SceneSource,
    pub scene_path: Option<PathBuf>,
    pub object_path: Option<PathBuf>,
    /// Created on first use, rebuilt when the feature kind changes
    pub locator: Option<ObjectLocator>,
    pub display: DisplaySink,
    pub thumbnail: DisplaySink,
    /// Processing time and match counts of the last frame
    pub status: String,
}

impl std::fmt::Debug for LocateViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocateViewState")
            .field("state", &self.capture.state())
            .field("source", &self.source)
            .field("scene_path", &self.scene_path)
            .field("object_path", &self.object_path)
            .field("status", &self.status)
            .finish()
    }
}

impl LocateViewState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            capture: CaptureLoop::new(Duration::from_millis(config.capture.locate_tick_ms)),
            source: SceneSource::Webcam,
            scene_path: None,
            object_path: None,
            locator: None,
            display: DisplaySink::new("locate_scene"),
            thumbnail: DisplaySink::new("locate_object"),
            status: String::new(),
        }
    }

    /// Change the scene source; leaving image mode forgets the scene
    pub fn set_source(&mut self, source: SceneSource) {
        if source == self.source {
            return;
        }
        self.capture.stop();
        if source == SceneSource::Webcam {
            self.scene_path = None;
            self.display.clear();
        }
        self.source = source;
    }

    /// Why matching cannot start yet, if anything is missing
    pub fn missing_input(&self) -> Option<&'static str> {
        if self.object_path.is_none() {
            return Some("Please select an object image first.");
        }
        if self.source == SceneSource::Image && self.scene_path.is_none() {
            return Some("Please select a scene image first.");
        }
        None
    }
}

/// Text recognition view state
pub struct OcrViewState {
    pub engine: OcrEngine,
    pub image_path: Option<PathBuf>,
    pub image: Option<DynamicImage>,
    pub binarized: Option<GrayImage>,
    pub original_display: DisplaySink,
    pub binarized_display: DisplaySink,
    pub show_binarized: bool,
    /// Recognized text, editable before saving
    pub text: String,
}

impl std::fmt::Debug for OcrViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrViewState")
            .field("image_path", &self.image_path)
            .field("has_binarized", &self.binarized.is_some())
            .field("show_binarized", &self.show_binarized)
            .field("text_len", &self.text.len())
            .finish()
    }
}

impl OcrViewState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            engine: OcrEngine::new(&config.ocr),
            image_path: None,
            image: None,
            binarized: None,
            original_display: DisplaySink::new("ocr_original"),
            binarized_display: DisplaySink::new("ocr_binarized"),
            show_binarized: false,
            text: String::new(),
        }
    }

    /// Replace the current image, dropping results computed for the old one
    pub fn set_image(&mut self, path: PathBuf, image: DynamicImage) {
        self.image_path = Some(path);
        self.image = Some(image);
        self.binarized = None;
        self.binarized_display.clear();
        self.text.clear();
    }
}

/// Settings view state
#[derive(Debug, Default)]
pub struct SettingsViewState {
    /// Currently expanded section
    pub expanded_section: Option<SettingsSection>,
}

/// Settings sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSection {
    General,
    Capture,
    Face,
    Locate,
    Ocr,
    Display,
}

impl SettingsSection {
    pub const ALL: [SettingsSection; 6] = [
        SettingsSection::General,
        SettingsSection::Capture,
        SettingsSection::Face,
        SettingsSection::Locate,
        SettingsSection::Ocr,
        SettingsSection::Display,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SettingsSection::General => "General",
            SettingsSection::Capture => "Capture",
            SettingsSection::Face => "Face detection",
            SettingsSection::Locate => "Object location",
            SettingsSection::Ocr => "Text recognition",
            SettingsSection::Display => "Display",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_view_from_config() {
        let mut config = AppConfig::default();
        config.general.initial_tool = ToolKind::Ocr;

        let state = DashboardState::new(&config);
        assert_eq!(state.current_view, DashboardView::Ocr);
    }

    #[test]
    fn test_tick_intervals_from_config() {
        let mut config = AppConfig::default();
        config.capture.face_tick_ms = 25;

        let state = DashboardState::new(&config);
        assert_eq!(state.face.capture.interval(), Duration::from_millis(25));
        assert_eq!(state.locate.capture.interval(), Duration::from_millis(30));
    }

    #[test]
    fn test_apply_config_updates_intervals() {
        let mut state = DashboardState::new(&AppConfig::default());
        let mut config = AppConfig::default();
        config.capture.locate_tick_ms = 50;

        state.apply_config(&config);
        assert_eq!(state.locate.capture.interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_switch_to_same_view_is_noop() {
        let mut state = DashboardState::new(&AppConfig::default());
        assert!(!state.switch_to(DashboardView::Face));
        assert!(state.switch_to(DashboardView::Settings));
        assert_eq!(state.current_view, DashboardView::Settings);
    }

    #[test]
    fn test_face_frame_rate() {
        let mut state = FaceViewState::new(&AppConfig::default());
        let start = Instant::now();

        state.record_frame((640, 480), start, 1);
        assert_eq!(state.fps, 0.0);

        state.record_frame((640, 480), start + Duration::from_millis(100), 2);
        assert!((state.fps - 10.0).abs() < 0.01);
        assert_eq!(state.last_faces, 2);

        state.reset_stats();
        assert!(state.last_frame.is_none());
        assert_eq!(state.fps, 0.0);
    }

    #[test]
    fn test_locate_missing_input() {
        let mut state = LocateViewState::new(&AppConfig::default());
        assert!(state.missing_input().unwrap().contains("object"));

        state.object_path = Some(PathBuf::from("object.png"));
        assert!(state.missing_input().is_none());

        state.set_source(SceneSource::Image);
        assert!(state.missing_input().unwrap().contains("scene"));

        state.scene_path = Some(PathBuf::from("scene.png"));
        assert!(state.missing_input().is_none());
    }

    #[test]
    fn test_switching_to_webcam_forgets_scene() {
        let mut state = LocateViewState::new(&AppConfig::default());
        state.set_source(SceneSource::Image);
        state.scene_path = Some(PathBuf::from("scene.png"));

        state.set_source(SceneSource::Webcam);
        assert!(state.scene_path.is_none());
        assert_eq!(state.source, SceneSource::Webcam);
    }

    #[test]
    fn test_new_ocr_image_clears_text() {
        let mut state = OcrViewState::new(&AppConfig::default());
        state.text = "old result".to_string();

        state.set_image(PathBuf::from("page.png"), DynamicImage::new_rgb8(4, 4));
        assert!(state.text.is_empty());
        assert!(state.binarized.is_none());
        assert_eq!(state.image_path, Some(PathBuf::from("page.png")));
    }

    #[test]
    fn test_view_names() {
        assert_eq!(DashboardView::Ocr.name(), "OCR");
        assert_eq!(DashboardView::from(ToolKind::Locate), DashboardView::Locate);
        assert_eq!(DashboardView::ALL.len(), 4);
    }
}
