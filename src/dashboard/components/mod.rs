//! Reusable UI components for the dashboard

pub mod notice;
pub mod sidebar;
pub mod status_card;

pub use notice::render_notices;
pub use sidebar::render_sidebar;
pub use status_card::StatusCard;
