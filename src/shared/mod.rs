//! State shared between the dashboard views
//!
//! Holds the persisted configuration and the queue of user-facing notices.

pub mod state;

pub use state::{NoticeLevel, SharedAppState};
