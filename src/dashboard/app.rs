//! Dashboard application entry point

use eframe::egui;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{error, info};

use crate::config;
use crate::dashboard::components::{render_notices, render_sidebar};
use crate::dashboard::state::{DashboardState, DashboardView};
use crate::dashboard::theme;
use crate::dashboard::views::{
    render_face_view, render_locate_view, render_ocr_view, render_settings_view,
};
use crate::shared::SharedAppState;

/// The main dashboard application
pub struct DashboardApp {
    /// Shared application state
    shared_state: Arc<RwLock<SharedAppState>>,
    /// Dashboard-specific state
    dashboard_state: DashboardState,
    /// Whether theme has been applied
    theme_applied: bool,
}

impl DashboardApp {
    /// Create a new dashboard application
    pub fn new(shared_state: Arc<RwLock<SharedAppState>>) -> Self {
        let dashboard_state = DashboardState::new(&shared_state.read().config);
        Self {
            shared_state,
            dashboard_state,
            theme_applied: false,
        }
    }

    /// Create eframe options for the dashboard window
    pub fn options() -> eframe::NativeOptions {
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([1100.0, 760.0])
                .with_min_inner_size([820.0, 560.0])
                .with_title("CV Labs"),
            ..Default::default()
        }
    }

    /// Push config edits to the views and persist them
    fn sync_config(&mut self) {
        let (config, path) = {
            let mut state = self.shared_state.write();
            if !state.take_config_changed() {
                return;
            }
            (state.config.clone(), state.config_path.clone())
        };

        self.dashboard_state.apply_config(&config);

        if let Some(path) = path {
            match config::save_config(&config, &path) {
                Ok(()) => info!("Configuration saved to {:?}", path),
                Err(e) => error!("Failed to save configuration: {:#}", e),
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            theme::apply_theme(ctx);
            self.theme_applied = true;
        }

        self.sync_config();

        let current = self.dashboard_state.current_view;
        let face_state = self.dashboard_state.face.capture.state();
        let locate_state = self.dashboard_state.locate.capture.state();

        let clicked = egui::SidePanel::left("sidebar")
            .resizable(false)
            .default_width(180.0)
            .show(ctx, |ui| {
                render_sidebar(ui, current, |view| match view {
                    DashboardView::Face => face_state,
                    DashboardView::Locate => locate_state,
                    _ => Default::default(),
                })
            })
            .inner;

        if let Some(view) = clicked {
            if self.dashboard_state.switch_to(view) {
                info!("Switched to {} view", view.name());
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::Frame::none().inner_margin(24.0).show(ui, |ui| {
                let state = &mut self.dashboard_state;
                match state.current_view {
                    DashboardView::Face => {
                        render_face_view(ui, &mut state.face, &self.shared_state);
                    }
                    DashboardView::Locate => {
                        render_locate_view(ui, &mut state.locate, &self.shared_state);
                    }
                    DashboardView::Ocr => {
                        render_ocr_view(ui, &mut state.ocr, &self.shared_state);
                    }
                    DashboardView::Settings => {
                        render_settings_view(ui, &mut state.settings, &self.shared_state);
                    }
                }
            });
        });

        render_notices(ctx, &self.shared_state);
    }
}

/// Run the dashboard application
pub fn run_dashboard(shared_state: Arc<RwLock<SharedAppState>>) -> Result<(), eframe::Error> {
    let app = DashboardApp::new(shared_state);
    eframe::run_native(
        "CV Labs",
        DashboardApp::options(),
        Box::new(|_cc| Ok(Box::new(app))),
    )
}
