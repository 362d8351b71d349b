//! Dashboard views

pub mod face;
pub mod locate;
pub mod ocr;
pub mod settings;

pub use face::render_face_view;
pub use locate::render_locate_view;
pub use ocr::render_ocr_view;
pub use settings::render_settings_view;

use egui::RichText;

use crate::dashboard::theme::ThemeColors;
use crate::display::DisplaySink;

/// Image canvas filling the remaining space; the image is never upscaled
pub fn render_canvas(ui: &mut egui::Ui, sink: &DisplaySink, placeholder: &str) {
    let bounds = (ui.available_size() - egui::vec2(0.0, 32.0)).max(egui::vec2(64.0, 64.0));

    egui::Frame::none()
        .fill(ThemeColors::BG_CANVAS)
        .rounding(egui::Rounding::same(8.0))
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.set_min_size(bounds - egui::vec2(16.0, 16.0));
            ui.centered_and_justified(|ui| {
                if !sink.paint(ui, bounds - egui::vec2(16.0, 16.0), false) {
                    ui.label(RichText::new(placeholder).color(ThemeColors::TEXT_MUTED));
                }
            });
        });
}
