//! Dashboard UI Module
//!
//! One window hosting the face, locate and OCR tools as sidebar views, plus
//! a settings view for the persisted configuration.

pub mod app;
pub mod components;
pub mod state;
pub mod theme;
pub mod views;

pub use app::run_dashboard;
