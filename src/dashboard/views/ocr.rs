//! OCR view - recognize text in an image file and save it

use egui::RichText;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

use crate::capture::{file_label, IMAGE_EXTENSIONS};
use crate::dashboard::state::OcrViewState;
use crate::dashboard::theme::{panel_frame, view_header, ThemeColors};
use crate::dashboard::views::render_canvas;
use crate::display::{dynamic_to_color_image, gray_to_color_image};
use crate::shared::SharedAppState;
use crate::storage;
use crate::vision::{ocr, OcrError};

/// Render the OCR view
pub fn render_ocr_view(
    ui: &mut egui::Ui,
    view_state: &mut OcrViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
) {
    view_header(ui, "Text Recognition", "Recognizes printed text with Tesseract");

    panel_frame(ThemeColors::BG_MEDIUM).show(ui, |ui| {
        ui.horizontal(|ui| {
            if ui.button("Choose image...").clicked() {
                if let Some(path) = pick_image() {
                    open_image(ui.ctx(), view_state, shared_state, path);
                }
            }
            let label = view_state
                .image_path
                .as_deref()
                .map(file_label)
                .unwrap_or_else(|| "No file selected".to_string());
            ui.label(RichText::new(label).color(ThemeColors::TEXT_MUTED));
        });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label("Language:");
            {
                let mut state = shared_state.write();
                let edit = egui::TextEdit::singleline(&mut state.config.ocr.language)
                    .hint_text("rus+eng")
                    .desired_width(120.0);
                if ui.add(edit).changed() {
                    state.mark_config_changed();
                }
            }

            ui.add_space(16.0);
            if ui.button("Recognize").clicked() {
                recognize(ui.ctx(), view_state, shared_state);
            }
            if ui.button("Save text").clicked() {
                save(view_state, shared_state);
            }

            ui.add_space(16.0);
            ui.add_enabled(
                view_state.binarized_display.has_image(),
                egui::Checkbox::new(&mut view_state.show_binarized, "Show binarized"),
            );
        });
    });

    ui.add_space(12.0);

    let text_height = 160.0;
    let canvas_height = (ui.available_height() - text_height - 24.0).max(120.0);
    ui.allocate_ui(egui::vec2(ui.available_width(), canvas_height), |ui| {
        let sink = if view_state.show_binarized && view_state.binarized_display.has_image() {
            &view_state.binarized_display
        } else {
            &view_state.original_display
        };
        render_canvas(ui, sink, "Choose an image to recognize");
    });

    ui.add_space(12.0);
    egui::ScrollArea::vertical()
        .id_salt("ocr_text")
        .max_height(text_height)
        .show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(&mut view_state.text)
                    .desired_width(f32::INFINITY)
                    .desired_rows(6)
                    .hint_text("Recognized text appears here"),
            );
        });
}

fn pick_image() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Choose image")
        .add_filter("Image files", IMAGE_EXTENSIONS)
        .pick_file()
}

fn open_image(
    ctx: &egui::Context,
    view_state: &mut OcrViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
    path: PathBuf,
) {
    match ocr::load_image(&path) {
        Ok(image) => {
            view_state.original_display.show(ctx, dynamic_to_color_image(&image));
            view_state.set_image(path, image);
        }
        Err(e) => shared_state.write().notices.error(e.to_string()),
    }
}

fn recognize(
    ctx: &egui::Context,
    view_state: &mut OcrViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
) {
    let settings = shared_state.read().config.ocr.clone();
    view_state.engine.set_settings(&settings);

    let result = match &view_state.image {
        Some(image) => view_state.engine.recognize(image),
        None => Err(OcrError::NoImage),
    };

    match result {
        Ok(recognition) => {
            view_state.text = recognition.text;
            match &recognition.binarized {
                Some(bin) => view_state.binarized_display.show(ctx, gray_to_color_image(bin)),
                None => {
                    view_state.binarized_display.clear();
                    view_state.show_binarized = false;
                }
            }
            view_state.binarized = recognition.binarized;
        }
        Err(OcrError::NoImage) => shared_state
            .write()
            .notices
            .warning("Please choose an image first."),
        Err(e) => shared_state.write().notices.error(e.to_string()),
    }
}

/// Ask for a target file and write the text there. Without text only a warning is shown.
fn save(view_state: &OcrViewState, shared_state: &Arc<RwLock<SharedAppState>>) {
    if view_state.text.trim().is_empty() {
        shared_state.write().notices.warning("There is no text to save.");
        return;
    }

    let Some(path) = rfd::FileDialog::new()
        .set_title("Save text")
        .add_filter("Text files", &["txt"])
        .set_file_name("recognized.txt")
        .save_file()
    else {
        return;
    };

    match storage::save_text(&view_state.text, &path) {
        Ok(true) => shared_state
            .write()
            .notices
            .info(format!("Text saved to {}", path.display())),
        Ok(false) => {}
        Err(e) => shared_state
            .write()
            .notices
            .error(format!("Could not save the text: {:#}", e)),
    }
}
