//! Face view - live face and eye highlighting from the camera

use egui::RichText;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use crate::capture::{CameraSource, FrameSource, Tick};
use crate::dashboard::components::StatusCard;
use crate::dashboard::state::FaceViewState;
use crate::dashboard::theme::{view_header, ThemeColors};
use crate::dashboard::views::render_canvas;
use crate::shared::SharedAppState;
use crate::vision::FaceDetector;

/// Render the face view
pub fn render_face_view(
    ui: &mut egui::Ui,
    view_state: &mut FaceViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
) {
    run_tick(ui.ctx(), view_state, shared_state);

    view_header(ui, "Face Detection", "Highlights faces and eyes in the camera feed");

    let running = view_state.capture.is_running();
    ui.horizontal(|ui| {
        if ui
            .add_enabled(!running, egui::Button::new("Start").min_size(egui::vec2(90.0, 32.0)))
            .clicked()
        {
            start(view_state, shared_state);
        }
        if ui
            .add_enabled(running, egui::Button::new("Stop").min_size(egui::vec2(90.0, 32.0)))
            .clicked()
        {
            stop(view_state);
        }
        if ui
            .add(egui::Button::new("Exit").min_size(egui::vec2(90.0, 32.0)))
            .clicked()
        {
            stop(view_state);
            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
        }

        ui.add_space(24.0);
        StatusCard::capture("Camera", view_state.capture.state()).show(ui);
        ui.add_space(8.0);
        let faces = if running {
            view_state.last_faces.to_string()
        } else {
            "-".to_string()
        };
        StatusCard::new("Faces", faces, view_state.capture.state().into()).show(ui);
    });

    ui.add_space(16.0);

    render_canvas(ui, &view_state.display, "Press Start to open the camera");

    if let (Some(source), Some(((width, height), _))) =
        (view_state.capture.source_name(), view_state.last_frame)
    {
        ui.add_space(8.0);
        ui.label(
            RichText::new(format!(
                "{}  {}x{}  {:.1} fps  (tick {} ms)",
                source,
                width,
                height,
                view_state.fps,
                view_state.capture.interval().as_millis()
            ))
            .size(12.0)
            .color(ThemeColors::TEXT_MUTED),
        );
    }
}

/// Load the cascades if needed, then open the camera
fn start(view_state: &mut FaceViewState, shared_state: &Arc<RwLock<SharedAppState>>) {
    let (face_settings, camera_index) = {
        let state = shared_state.read();
        (state.config.face.clone(), state.config.capture.camera_index)
    };

    if view_state.detector.is_none() {
        match FaceDetector::new(&face_settings) {
            Ok(detector) => view_state.detector = Some(detector),
            Err(e) => {
                shared_state.write().notices.error(e.to_string());
                return;
            }
        }
    }

    let opened = view_state.capture.start(|| {
        CameraSource::open(camera_index).map(|camera| Box::new(camera) as Box<dyn FrameSource>)
    });
    if let Err(e) = opened {
        shared_state.write().notices.error(e.to_string());
    }
}

fn stop(view_state: &mut FaceViewState) {
    view_state.capture.stop();
    view_state.display.clear();
    view_state.reset_stats();
}

/// Pull a frame when one is due, annotate it and show it
fn run_tick(
    ctx: &egui::Context,
    view_state: &mut FaceViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
) {
    let now = Instant::now();
    let detector = &mut view_state.detector;
    let display = &mut view_state.display;

    let tick = view_state.capture.tick(now, |frame| {
        let size = frame.dimensions();
        let at = frame.timestamp;
        let mut image = frame.into_image();
        let faces = match detector.as_mut() {
            Some(detector) => detector.process(&mut image)?,
            None => 0,
        };
        display.show_mat(ctx, &image)?;
        Ok::<_, anyhow::Error>((size, at, faces))
    });

    match tick {
        Tick::Processed(Ok((size, at, faces))) => view_state.record_frame(size, at, faces),
        Tick::Processed(Err(e)) => warn!("Face frame skipped: {:#}", e),
        Tick::Failed(e) => {
            view_state.display.clear();
            view_state.reset_stats();
            shared_state.write().notices.error(e.to_string());
        }
        Tick::Inactive | Tick::NotDue | Tick::Busy => {}
    }

    if let Some(wait) = view_state.capture.time_until_due(Instant::now()) {
        ctx.request_repaint_after(wait);
    }
}
