//! Settings view - Application configuration

use egui::RichText;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::{AppConfig, FeatureKind, ToolKind};
use crate::dashboard::state::{SettingsSection, SettingsViewState};
use crate::dashboard::theme::{panel_frame, view_header, ThemeColors};
use crate::shared::SharedAppState;

/// Render the settings view
pub fn render_settings_view(
    ui: &mut egui::Ui,
    view_state: &mut SettingsViewState,
    shared_state: &Arc<RwLock<SharedAppState>>,
) {
    view_header(ui, "Settings", "Detector parameters, capture timing and defaults");

    let mut changed = false;
    let mut edited = shared_state.read().config.clone();

    egui::ScrollArea::vertical().show(ui, |ui| {
        for section in SettingsSection::ALL {
            let expanded = view_state.expanded_section == Some(section);
            panel_frame(ThemeColors::BG_MEDIUM).show(ui, |ui| {
                ui.set_width(ui.available_width());
                let header = ui
                    .horizontal(|ui| {
                        let arrow = if expanded { "v" } else { ">" };
                        ui.label(RichText::new(arrow).size(12.0).color(ThemeColors::TEXT_MUTED));
                        ui.add_space(8.0);
                        ui.heading(RichText::new(section.title()).size(16.0));
                    })
                    .response;

                if header.interact(egui::Sense::click()).clicked() {
                    view_state.expanded_section = if expanded { None } else { Some(section) };
                }

                if expanded {
                    ui.add_space(12.0);
                    ui.separator();
                    ui.add_space(8.0);
                    changed |= render_section(ui, section, &mut edited);
                }
            });
            ui.add_space(12.0);
        }

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if ui
                .add(egui::Button::new("Reset to Defaults").min_size(egui::vec2(120.0, 36.0)))
                .clicked()
            {
                edited = AppConfig::default();
                changed = true;
            }
            ui.add_space(16.0);
            ui.label(
                RichText::new("Settings are saved automatically")
                    .size(12.0)
                    .color(ThemeColors::TEXT_MUTED),
            );
        });
    });

    if changed {
        let mut state = shared_state.write();
        state.config = edited;
        state.mark_config_changed();
    }
}

/// Widgets for one section. Returns true when a value changed.
fn render_section(ui: &mut egui::Ui, section: SettingsSection, config: &mut AppConfig) -> bool {
    let mut changed = false;

    match section {
        SettingsSection::General => {
            ui.horizontal(|ui| {
                ui.label("Open on start:");
                for (tool, name) in [
                    (ToolKind::Face, "Face"),
                    (ToolKind::Locate, "Locate"),
                    (ToolKind::Ocr, "OCR"),
                ] {
                    changed |= ui
                        .radio_value(&mut config.general.initial_tool, tool, name)
                        .changed();
                }
            });
        }
        SettingsSection::Capture => {
            let capture = &mut config.capture;
            changed |= labeled(ui, "Camera index:", |ui| {
                ui.add(egui::DragValue::new(&mut capture.camera_index).range(0..=16))
            });
            changed |= labeled(ui, "Face tick:", |ui| {
                ui.add(egui::Slider::new(&mut capture.face_tick_ms, 1..=200).suffix(" ms"))
            });
            changed |= labeled(ui, "Locate tick:", |ui| {
                ui.add(egui::Slider::new(&mut capture.locate_tick_ms, 1..=200).suffix(" ms"))
            });
        }
        SettingsSection::Face => {
            let face = &mut config.face;
            let mut dir = face.cascade_dir.display().to_string();
            if labeled(ui, "Cascade directory:", |ui| ui.text_edit_singleline(&mut dir)) {
                face.cascade_dir = dir.into();
                changed = true;
            }
            changed |= labeled(ui, "Face cascade:", |ui| {
                ui.text_edit_singleline(&mut face.face_cascade)
            });
            changed |= labeled(ui, "Eye cascade:", |ui| {
                ui.text_edit_singleline(&mut face.eye_cascade)
            });
            changed |= labeled(ui, "Scale factor:", |ui| {
                ui.add(egui::Slider::new(&mut face.scale_factor, 1.01..=2.0))
            });
            changed |= labeled(ui, "Min neighbors:", |ui| {
                ui.add(egui::Slider::new(&mut face.min_neighbors, 1..=20))
            });
            changed |= labeled(ui, "Min face size:", |ui| {
                ui.add(egui::Slider::new(&mut face.min_face_size, 10..=200).suffix(" px"))
            });
            changed |= labeled(ui, "Min eye size:", |ui| {
                ui.add(egui::Slider::new(&mut face.min_eye_size, 5..=100).suffix(" px"))
            });
        }
        SettingsSection::Locate => {
            let locate = &mut config.locate;
            ui.horizontal(|ui| {
                ui.label("Features:");
                for kind in [FeatureKind::Sift, FeatureKind::Orb] {
                    changed |= ui.radio_value(&mut locate.features, kind, kind.name()).changed();
                }
            });
            changed |= labeled(ui, "ORB features:", |ui| {
                ui.add(egui::Slider::new(&mut locate.orb_features, 100..=5000))
            });
            changed |= labeled(ui, "Ratio test:", |ui| {
                ui.add(egui::Slider::new(&mut locate.ratio, 0.5..=0.95))
            });
            changed |= labeled(ui, "Min good matches:", |ui| {
                ui.add(egui::Slider::new(&mut locate.min_good_matches, 4..=100))
            });
            changed |= labeled(ui, "RANSAC threshold:", |ui| {
                ui.add(egui::Slider::new(&mut locate.ransac_threshold, 1.0..=20.0).suffix(" px"))
            });
        }
        SettingsSection::Ocr => {
            let ocr = &mut config.ocr;
            changed |= labeled(ui, "Language:", |ui| ui.text_edit_singleline(&mut ocr.language));
            changed |= labeled(ui, "Engine mode (oem):", |ui| {
                ui.add(egui::Slider::new(&mut ocr.oem, 0..=3))
            });
            changed |= labeled(ui, "Page segmentation (psm):", |ui| {
                ui.add(egui::Slider::new(&mut ocr.psm, 0..=13))
            });
            changed |= labeled(ui, "Binarize (Otsu):", |ui| ui.checkbox(&mut ocr.binarize, ""));
        }
        SettingsSection::Display => {
            changed |= labeled(ui, "Object thumbnail:", |ui| {
                ui.add(
                    egui::Slider::new(&mut config.display.thumbnail_size, 50.0..=400.0)
                        .suffix(" px"),
                )
            });
        }
    }

    changed
}

fn labeled(
    ui: &mut egui::Ui,
    label: &str,
    add: impl FnOnce(&mut egui::Ui) -> egui::Response,
) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add_space(8.0);
        add(ui).changed()
    })
    .inner
}
