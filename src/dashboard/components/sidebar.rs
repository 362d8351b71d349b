//! Sidebar navigation component

use egui::{Color32, RichText, Rounding, Sense, Vec2};

use crate::capture::CaptureState;
use crate::dashboard::state::DashboardView;
use crate::dashboard::theme::{color_with_alpha, ThemeColors};

/// Render the sidebar and return the view the user clicked, if any.
///
/// `live` marks views whose capture loop is currently running.
pub fn render_sidebar(
    ui: &mut egui::Ui,
    current_view: DashboardView,
    live: impl Fn(DashboardView) -> CaptureState,
) -> Option<DashboardView> {
    let mut clicked = None;

    ui.vertical(|ui| {
        ui.add_space(16.0);
        ui.horizontal(|ui| {
            ui.add_space(12.0);
            ui.label(
                RichText::new("CV Labs")
                    .size(22.0)
                    .color(ThemeColors::ACCENT_PRIMARY)
                    .strong(),
            );
        });

        ui.add_space(20.0);
        ui.separator();
        ui.add_space(12.0);

        for view in DashboardView::ALL {
            let running = live(view) == CaptureState::Running;
            if nav_button(ui, view, view == current_view, running) {
                clicked = Some(view);
            }
            ui.add_space(4.0);
        }

        ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                ui.add_space(12.0);
                ui.label(
                    RichText::new(concat!("v", env!("CARGO_PKG_VERSION")))
                        .size(10.0)
                        .color(ThemeColors::TEXT_MUTED),
                );
            });
            ui.add_space(8.0);
            ui.separator();
        });
    });

    clicked
}

fn nav_button(ui: &mut egui::Ui, view: DashboardView, is_selected: bool, running: bool) -> bool {
    let desired_size = Vec2::new(ui.available_width() - 16.0, 36.0);
    let (rect, response) = ui.allocate_exact_size(desired_size, Sense::click());

    if ui.is_rect_visible(rect) {
        let bg_color = if is_selected {
            color_with_alpha(ThemeColors::ACCENT_PRIMARY, 51)
        } else if response.hovered() {
            ThemeColors::BG_HOVER
        } else {
            Color32::TRANSPARENT
        };

        let text_color = if is_selected {
            ThemeColors::ACCENT_PRIMARY
        } else if response.hovered() {
            ThemeColors::TEXT_PRIMARY
        } else {
            ThemeColors::TEXT_SECONDARY
        };

        let painter = ui.painter();
        painter.rect_filled(rect.shrink2(Vec2::new(8.0, 0.0)), Rounding::same(6.0), bg_color);

        if is_selected {
            let indicator = egui::Rect::from_min_size(
                rect.left_top() + Vec2::new(8.0, 6.0),
                Vec2::new(3.0, rect.height() - 12.0),
            );
            painter.rect_filled(indicator, Rounding::same(1.5), ThemeColors::ACCENT_PRIMARY);
        }

        painter.text(
            rect.left_center() + Vec2::new(24.0, 0.0),
            egui::Align2::LEFT_CENTER,
            view.icon(),
            egui::FontId::proportional(14.0),
            text_color,
        );
        painter.text(
            rect.left_center() + Vec2::new(48.0, 0.0),
            egui::Align2::LEFT_CENTER,
            view.name(),
            egui::FontId::proportional(14.0),
            text_color,
        );

        // Live capture indicator
        if running {
            painter.circle_filled(
                rect.right_center() - Vec2::new(24.0, 0.0),
                4.0,
                ThemeColors::STATUS_RUNNING,
            );
        }
    }

    response.clicked()
}
