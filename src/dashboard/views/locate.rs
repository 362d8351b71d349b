//! Locate view - find a reference object in the camera feed or a scene image

use egui::RichText;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::capture::{
    file_label, load_image, CameraSource, CaptureError, FrameSource, StillImageSource, Tick,
    IMAGE_EXTENSIONS,
};
use crate::config::LocateSettings;
use crate::dashboard::components::StatusCard;
use crate::dashboard::state::{LocateViewState, SceneSource};
use crate::dashboard::theme::{panel_frame, view_header, ThemeColors};
use crate::dashboard::views::render_canvas;
use crate::shared::SharedAppState;
use crate::vision::{LocateOutcome, ObjectLocator};

/// Render the locate view
pub fn render_locate_view(
    ui: &mut egui::Ui,
    view_state: &mut LocateViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
) {
    run_tick(ui.ctx(), view_state, shared_state);

    view_header(
        ui,
        "Object Location",
        "Matches keypoints of an object image against a scene and outlines the object",
    );

    ui.horizontal_top(|ui| {
        ui.vertical(|ui| {
            ui.set_width(230.0);
            render_controls(ui, view_state, shared_state);
        });
        ui.add_space(16.0);
        ui.vertical(|ui| {
            render_canvas(ui, &view_state.display, "Select an object and press Start");
            ui.add_space(8.0);
            let status = if view_state.status.is_empty() {
                "Processing time: -"
            } else {
                view_state.status.as_str()
            };
            ui.label(RichText::new(status).size(13.0).color(ThemeColors::TEXT_SECONDARY));
        });
    });
}

fn render_controls(
    ui: &mut egui::Ui,
    view_state: &mut LocateViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
) {
    panel_frame(ThemeColors::BG_MEDIUM).show(ui, |ui| {
        ui.label(RichText::new("Scene source").strong());
        let mut source = view_state.source;
        ui.radio_value(&mut source, SceneSource::Webcam, "Webcam");
        ui.radio_value(&mut source, SceneSource::Image, "Image");
        view_state.set_source(source);

        ui.add_space(12.0);
        ui.label("Scene image:");
        let image_mode = view_state.source == SceneSource::Image;
        if ui
            .add_enabled(image_mode, egui::Button::new("Choose file..."))
            .clicked()
        {
            if let Some(path) = pick_image("Choose scene image") {
                select_scene(view_state, shared_state, ui.ctx(), path);
            }
        }
        if let Some(path) = &view_state.scene_path {
            ui.label(RichText::new(file_label(path)).size(12.0).color(ThemeColors::TEXT_MUTED));
        }

        ui.add_space(12.0);
        ui.label("Object image:");
        if ui.button("Choose file...").clicked() {
            if let Some(path) = pick_image("Choose object image") {
                select_object(view_state, shared_state, ui.ctx(), path);
            }
        }
        if let Some(path) = &view_state.object_path {
            ui.label(RichText::new(file_label(path)).size(12.0).color(ThemeColors::TEXT_MUTED));
        }
        let thumbnail_size = shared_state.read().config.display.thumbnail_size;
        if view_state.thumbnail.has_image() {
            ui.add_space(4.0);
            view_state
                .thumbnail
                .paint(ui, egui::Vec2::splat(thumbnail_size), true);
        }

        ui.add_space(12.0);
        {
            let mut state = shared_state.write();
            let locate = &mut state.config.locate;
            let mut changed = ui.checkbox(&mut locate.show_markers, "Show markers").changed();
            ui.add_enabled_ui(locate.show_markers, |ui| {
                changed |= ui
                    .checkbox(&mut locate.connect_markers, "Connect markers")
                    .changed();
            });
            if changed {
                state.mark_config_changed();
            }
        }

        ui.add_space(16.0);
        let running = view_state.capture.is_running();
        let label = if running { "Stop" } else { "Start" };
        if ui
            .add(egui::Button::new(label).min_size(egui::vec2(120.0, 32.0)))
            .clicked()
        {
            if running {
                view_state.capture.stop();
            } else {
                start(view_state, shared_state);
            }
        }

        ui.add_space(12.0);
        StatusCard::capture(view_state.source_title(), view_state.capture.state()).show(ui);
    });
}

fn pick_image(title: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Image files", IMAGE_EXTENSIONS)
        .pick_file()
}

/// Show the picked scene right away
fn select_scene(
    view_state: &mut LocateViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
    ctx: &egui::Context,
    path: PathBuf,
) {
    let shown = load_image(&path)
        .map_err(anyhow::Error::from)
        .and_then(|scene| Ok(view_state.display.show_mat(ctx, &scene)?));

    match shown {
        Ok(()) => {
            info!("Scene image {:?}", path);
            view_state.scene_path = Some(path);
            view_state.status.clear();
        }
        Err(e) => {
            view_state.scene_path = None;
            shared_state
                .write()
                .notices
                .error(format!("Could not load the scene image: {:#}", e));
        }
    }
}

/// Compute the object model and show its thumbnail
fn select_object(
    view_state: &mut LocateViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
    ctx: &egui::Context,
    path: PathBuf,
) {
    let settings = shared_state.read().config.locate.clone();

    let result = (|| -> anyhow::Result<()> {
        let object = load_image(&path)?;
        view_state.thumbnail.show_mat(ctx, &object)?;
        locator_for(&mut view_state.locator, &settings)?.set_object(object)?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            info!("Object image {:?}", path);
            view_state.object_path = Some(path);
        }
        Err(e) => {
            view_state.object_path = None;
            view_state.thumbnail.clear();
            shared_state
                .write()
                .notices
                .error(format!("Could not load the object image: {:#}", e));
        }
    }
}

/// The locator, created on first use and kept in step with the settings
fn locator_for<'a>(
    locator: &'a mut Option<ObjectLocator>,
    settings: &LocateSettings,
) -> anyhow::Result<&'a mut ObjectLocator> {
    match locator {
        Some(existing) => {
            existing.update_settings(settings)?;
        }
        None => {
            *locator = Some(ObjectLocator::new(settings)?);
        }
    }
    locator
        .as_mut()
        .ok_or_else(|| anyhow::anyhow!("object locator unavailable"))
}

fn start(view_state: &mut LocateViewState, shared_state: &Arc<RwLock<SharedAppState>>) {
    if let Some(missing) = view_state.missing_input() {
        shared_state.write().notices.warning(missing);
        return;
    }

    let camera_index = shared_state.read().config.capture.camera_index;
    let scene_path = view_state.scene_path.clone();
    let source = view_state.source;

    let opened = view_state.capture.start(move || -> Result<Box<dyn FrameSource>, CaptureError> {
        match (source, scene_path) {
            (SceneSource::Image, Some(path)) => Ok(Box::new(StillImageSource::open(&path)?)),
            _ => Ok(Box::new(CameraSource::open(camera_index)?)),
        }
    });
    if let Err(e) = opened {
        shared_state.write().notices.error(e.to_string());
    }
}

/// Pull a frame when one is due, locate the object in it and show the result
fn run_tick(
    ctx: &egui::Context,
    view_state: &mut LocateViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
) {
    if !view_state.capture.is_running() {
        return;
    }

    let settings = shared_state.read().config.locate.clone();
    let now = Instant::now();
    let locator = &mut view_state.locator;
    let display = &mut view_state.display;

    let tick = view_state.capture.tick(now, |frame| -> anyhow::Result<LocateOutcome> {
        let outcome = locator_for(locator, &settings)?.locate(&frame.image)?;
        display.show_mat(ctx, &outcome.annotated)?;
        Ok(outcome)
    });

    match tick {
        Tick::Processed(Ok(outcome)) => view_state.status = status_line(&outcome),
        // One bad frame does not end a live session
        Tick::Processed(Err(e)) => warn!("Locate frame skipped: {:#}", e),
        Tick::Failed(CaptureError::EndOfInput) => {}
        Tick::Failed(e) => {
            shared_state.write().notices.error(e.to_string());
        }
        Tick::Inactive | Tick::NotDue | Tick::Busy => {}
    }

    if let Some(wait) = view_state.capture.time_until_due(Instant::now()) {
        ctx.request_repaint_after(wait);
    }
}

/// Status line shown under the scene
pub fn status_line(outcome: &LocateOutcome) -> String {
    let mut line = format!(
        "Processing time: {:.6} s | good matches: {}",
        outcome.elapsed.as_secs_f64(),
        outcome.good_matches
    );
    if outcome.found() {
        line.push_str(&format!(" | inliers: {}", outcome.inliers));
    }
    line
}

impl LocateViewState {
    fn source_title(&self) -> &'static str {
        match self.source {
            SceneSource::Webcam => "Camera",
            SceneSource::Image => "Scene image",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Mat, Scalar, CV_8UC3};
    use opencv::prelude::*;
    use std::time::Duration;

    #[test]
    fn test_status_line_has_six_decimals() {
        let outcome = LocateOutcome {
            annotated: Mat::default(),
            good_matches: 4,
            inliers: 0,
            outline: None,
            elapsed: Duration::from_micros(12_345),
        };
        assert_eq!(
            status_line(&outcome),
            "Processing time: 0.012345 s | good matches: 4"
        );
    }

    #[test]
    fn test_locator_for_creates_once() {
        let settings = LocateSettings {
            features: crate::config::FeatureKind::Orb,
            ..LocateSettings::default()
        };
        let flat = Mat::new_rows_cols_with_default(64, 64, CV_8UC3, Scalar::all(128.0)).unwrap();
        let mut locator = None;
        locator_for(&mut locator, &settings)
            .unwrap()
            .set_object(flat.try_clone().unwrap())
            .unwrap();

        // The object survives a second lookup, so the locator was not recreated
        let outcome = locator_for(&mut locator, &settings).unwrap().locate(&flat);
        assert!(outcome.is_ok());
    }
}
