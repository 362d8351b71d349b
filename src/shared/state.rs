//! Shared application state

use std::collections::VecDeque;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::config::AppConfig;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn title(&self) -> &'static str {
        match self {
            NoticeLevel::Info => "Information",
            NoticeLevel::Warning => "Warning",
            NoticeLevel::Error => "Error",
        }
    }
}

/// A message shown to the user in a modal window until dismissed
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// FIFO of pending notices; only the oldest one is shown at a time
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    pending: VecDeque<Notice>,
}

impl NoticeQueue {
    /// Queue a notice. An identical notice already waiting is not repeated.
    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice {
            level,
            message: message.into(),
        };
        match level {
            NoticeLevel::Info => info!("{}", notice.message),
            NoticeLevel::Warning => warn!("{}", notice.message),
            NoticeLevel::Error => error!("{}", notice.message),
        }

        if !self.pending.contains(&notice) {
            self.pending.push_back(notice);
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message);
    }

    /// Notice currently on screen
    pub fn current(&self) -> Option<&Notice> {
        self.pending.front()
    }

    /// Close the current notice
    pub fn dismiss(&mut self) -> Option<Notice> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Central state shared by all views
#[derive(Debug, Clone, Default)]
pub struct SharedAppState {
    /// Application configuration
    pub config: AppConfig,
    /// Where the configuration is persisted, `None` keeps it in memory only
    pub config_path: Option<PathBuf>,
    /// Pending user-facing notices
    pub notices: NoticeQueue,
    /// Config was edited since the last save
    config_dirty: bool,
}

impl SharedAppState {
    pub fn new(config: AppConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
            notices: NoticeQueue::default(),
            config_dirty: false,
        }
    }

    /// Flag the configuration for saving
    pub fn mark_config_changed(&mut self) {
        self.config_dirty = true;
    }

    /// Clear and return the dirty flag
    pub fn take_config_changed(&mut self) -> bool {
        std::mem::take(&mut self.config_dirty)
    }
}
