//! Modal notice window

use egui::{Align2, Color32, Id, RichText};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::dashboard::theme::{color_with_alpha, ThemeColors};
use crate::shared::{NoticeLevel, SharedAppState};

fn level_color(level: NoticeLevel) -> Color32 {
    match level {
        NoticeLevel::Info => ThemeColors::ACCENT_PRIMARY,
        NoticeLevel::Warning => ThemeColors::ACCENT_WARNING,
        NoticeLevel::Error => ThemeColors::ACCENT_ERROR,
    }
}

/// Show the oldest pending notice above everything else.
///
/// Input to the rest of the window is blocked by a backdrop until the notice
/// is dismissed.
pub fn render_notices(ctx: &egui::Context, shared_state: &Arc<RwLock<SharedAppState>>) {
    let (notice, waiting) = {
        let state = shared_state.read();
        if state.notices.is_empty() {
            return;
        }
        match state.notices.current() {
            Some(notice) => (notice.clone(), state.notices.len() - 1),
            None => return,
        }
    };

    // Backdrop swallowing clicks behind the window
    let screen = ctx.screen_rect();
    egui::Area::new(Id::new("notice_backdrop"))
        .order(egui::Order::Foreground)
        .fixed_pos(screen.min)
        .show(ctx, |ui| {
            ui.painter()
                .rect_filled(screen, 0.0, color_with_alpha(Color32::BLACK, 140));
            ui.allocate_rect(screen, egui::Sense::click());
        });

    let mut dismissed = false;
    egui::Window::new(RichText::new(notice.level.title()).color(level_color(notice.level)))
        .id(Id::new("notice_window"))
        .order(egui::Order::Tooltip)
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.set_max_width(360.0);
            ui.label(RichText::new(&notice.message).color(ThemeColors::TEXT_PRIMARY));
            ui.add_space(12.0);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("OK").clicked() || ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    dismissed = true;
                }
                if waiting > 0 {
                    ui.label(
                        RichText::new(format!("{} more", waiting))
                            .size(11.0)
                            .color(ThemeColors::TEXT_MUTED),
                    );
                }
            });
        });

    if dismissed {
        shared_state.write().notices.dismiss();
    }
}
