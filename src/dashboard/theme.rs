//! Dashboard theme and styling
//!
//! Dark theme shared by all tool views.

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, TextStyle, Visuals};

/// Dark color palette
pub struct ThemeColors;

impl ThemeColors {
    // Background colors
    pub const BG_DARK: Color32 = Color32::from_rgb(20, 22, 26);
    pub const BG_MEDIUM: Color32 = Color32::from_rgb(30, 33, 39);
    pub const BG_LIGHT: Color32 = Color32::from_rgb(41, 45, 53);
    pub const BG_HOVER: Color32 = Color32::from_rgb(52, 57, 67);
    /// Backdrop behind image canvases
    pub const BG_CANVAS: Color32 = Color32::from_rgb(12, 13, 16);

    // Accent colors
    pub const ACCENT_PRIMARY: Color32 = Color32::from_rgb(64, 180, 160);
    pub const ACCENT_WARNING: Color32 = Color32::from_rgb(255, 193, 7);
    pub const ACCENT_ERROR: Color32 = Color32::from_rgb(231, 76, 60);

    // Text colors
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(236, 238, 242);
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(160, 166, 178);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(104, 110, 122);

    pub const BORDER: Color32 = Color32::from_rgb(54, 59, 70);

    // Status colors
    pub const STATUS_RUNNING: Color32 = Color32::from_rgb(46, 204, 113);
    pub const STATUS_STOPPED: Color32 = Color32::from_rgb(160, 166, 178);
}

/// Apply the theme to egui
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    let mut visuals = Visuals::dark();

    visuals.window_fill = ThemeColors::BG_MEDIUM;
    visuals.panel_fill = ThemeColors::BG_DARK;
    visuals.faint_bg_color = ThemeColors::BG_LIGHT;
    visuals.extreme_bg_color = ThemeColors::BG_CANVAS;

    let rounding = Rounding::same(6.0);
    let widgets = &mut visuals.widgets;
    widgets.noninteractive.bg_fill = ThemeColors::BG_MEDIUM;
    widgets.noninteractive.fg_stroke = Stroke::new(1.0, ThemeColors::TEXT_SECONDARY);
    widgets.inactive.bg_fill = ThemeColors::BG_LIGHT;
    widgets.inactive.fg_stroke = Stroke::new(1.0, ThemeColors::TEXT_PRIMARY);
    widgets.hovered.bg_fill = ThemeColors::BG_HOVER;
    widgets.hovered.fg_stroke = Stroke::new(1.0, ThemeColors::TEXT_PRIMARY);
    widgets.active.bg_fill = ThemeColors::ACCENT_PRIMARY;
    widgets.active.fg_stroke = Stroke::new(1.0, ThemeColors::TEXT_PRIMARY);
    widgets.open.bg_fill = ThemeColors::BG_HOVER;
    for w in [
        &mut widgets.noninteractive,
        &mut widgets.inactive,
        &mut widgets.hovered,
        &mut widgets.active,
        &mut widgets.open,
    ] {
        w.rounding = rounding;
    }

    visuals.selection.bg_fill = color_with_alpha(ThemeColors::ACCENT_PRIMARY, 77);
    visuals.selection.stroke = Stroke::new(1.0, ThemeColors::ACCENT_PRIMARY);
    visuals.hyperlink_color = ThemeColors::ACCENT_PRIMARY;

    // Notice windows
    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_shadow.blur = 12.0;
    visuals.window_stroke = Stroke::new(1.0, ThemeColors::BORDER);
    visuals.menu_rounding = rounding;

    style.visuals = visuals;

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(12.0, 6.0);
    style.spacing.window_margin = egui::Margin::same(16.0);

    style.text_styles = [
        (TextStyle::Small, FontId::new(12.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(15.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(14.0, FontFamily::Monospace)),
        (TextStyle::Button, FontId::new(15.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(22.0, FontFamily::Proportional)),
    ]
    .into();

    ctx.set_style(style);
}

/// Helper to create a color with modified alpha
pub fn color_with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

/// Rounded panel used for control groups and canvases
pub fn panel_frame(fill: Color32) -> egui::Frame {
    egui::Frame::none()
        .fill(fill)
        .rounding(Rounding::same(8.0))
        .inner_margin(16.0)
}

/// View title with a one-line description under it
pub fn view_header(ui: &mut egui::Ui, title: &str, subtitle: &str) {
    ui.heading(egui::RichText::new(title).size(24.0).strong());
    ui.add_space(4.0);
    ui.label(
        egui::RichText::new(subtitle)
            .size(14.0)
            .color(ThemeColors::TEXT_SECONDARY),
    );
    ui.add_space(16.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_with_alpha() {
        let c = color_with_alpha(Color32::from_rgb(10, 20, 30), 128);
        assert_eq!(c.a(), 128);
    }

    #[test]
    fn test_apply_theme_sets_panel_fill() {
        let ctx = egui::Context::default();
        apply_theme(&ctx);
        assert_eq!(ctx.style().visuals.panel_fill, ThemeColors::BG_DARK);
    }
}
