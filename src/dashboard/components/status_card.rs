//! Status card component for displaying status information

use egui::{Color32, RichText, Vec2};

use crate::capture::CaptureState;
use crate::dashboard::theme::{panel_frame, ThemeColors};

/// A card displaying status information
pub struct StatusCard {
    pub title: String,
    pub value: String,
    pub status: CardStatus,
}

/// Status types for cards
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CardStatus {
    Active,
    Inactive,
}

impl CardStatus {
    pub fn color(&self) -> Color32 {
        match self {
            CardStatus::Active => ThemeColors::STATUS_RUNNING,
            CardStatus::Inactive => ThemeColors::STATUS_STOPPED,
        }
    }
}

impl From<CaptureState> for CardStatus {
    fn from(state: CaptureState) -> Self {
        match state {
            CaptureState::Running => CardStatus::Active,
            CaptureState::Idle | CaptureState::Stopped => CardStatus::Inactive,
        }
    }
}

/// Label for a capture state
pub fn capture_state_label(state: CaptureState) -> &'static str {
    match state {
        CaptureState::Idle => "Idle",
        CaptureState::Running => "Running",
        CaptureState::Stopped => "Stopped",
    }
}

impl StatusCard {
    pub fn new(title: impl Into<String>, value: impl Into<String>, status: CardStatus) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            status,
        }
    }

    /// Card for a capture loop state
    pub fn capture(title: impl Into<String>, state: CaptureState) -> Self {
        Self::new(title, capture_state_label(state), state.into())
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        panel_frame(ThemeColors::BG_MEDIUM).show(ui, |ui| {
            ui.set_min_width(150.0);

            ui.horizontal(|ui| {
                let dot_center = ui.cursor().left_top() + Vec2::new(6.0, 10.0);
                ui.painter().circle_filled(dot_center, 4.0, self.status.color());
                ui.add_space(16.0);

                ui.vertical(|ui| {
                    ui.label(
                        RichText::new(&self.title)
                            .size(12.0)
                            .color(ThemeColors::TEXT_MUTED),
                    );
                    ui.add_space(4.0);
                    ui.label(
                        RichText::new(&self.value)
                            .size(18.0)
                            .color(ThemeColors::TEXT_PRIMARY)
                            .strong(),
                    );
                });
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_card() {
        let card = StatusCard::capture("Camera", CaptureState::Running);
        assert_eq!(card.value, "Running");
        assert_eq!(card.status, CardStatus::Active);

        let card = StatusCard::capture("Camera", CaptureState::Stopped);
        assert_eq!(card.status, CardStatus::Inactive);
    }
}
