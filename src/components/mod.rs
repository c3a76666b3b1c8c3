use crate::store::{Command, EntityStore};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

pub mod code_verify;
pub mod dashboard;
pub mod dialog;
pub mod login;
pub mod role_select;

/// A full-screen view that owns its own state.
pub trait Component {
    /// What the view asks the app to do.
    type Action;

    fn handle_input(&mut self, event: KeyEvent) -> Result<Option<Self::Action>>;
    fn render(&self, frame: &mut Frame);
}

/// Requests a dashboard hands back to the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardAction {
    Apply(Command),
    /// Run the symptom triage for this text.
    Analyze(String),
    Logout,
}

/// A role dashboard. Dashboards only read the store; writes go back as commands.
pub trait Dashboard {
    fn handle_input(
        &mut self,
        event: KeyEvent,
        store: &EntityStore,
    ) -> Result<Option<DashboardAction>>;

    fn render(&self, frame: &mut Frame, store: &EntityStore);

    /// Shows a rejected command to the user.
    fn report_error(&mut self, message: String);

    /// Called on every tick.
    fn tick(&mut self) {}
}

pub mod theme {
    use ratatui::style::Color;

    pub const BACKGROUND: Color = Color::Rgb(16, 16, 28);
    pub const PANEL: Color = Color::Rgb(22, 22, 35);
    pub const HEADER_ROW: Color = Color::Rgb(26, 26, 36);
    pub const BORDER: Color = Color::Rgb(75, 75, 120);
    pub const BORDER_FOCUS: Color = Color::Rgb(250, 250, 110);
    pub const TEXT: Color = Color::Rgb(230, 230, 250);
    pub const TEXT_DIM: Color = Color::Rgb(200, 200, 220);
    pub const HELP: Color = Color::Rgb(140, 140, 170);
    pub const HIGHLIGHT: Color = Color::Rgb(40, 40, 65);
    pub const ACCENT: Color = Color::Rgb(129, 199, 245);
    pub const SUCCESS: Color = Color::Rgb(140, 219, 140);
    pub const WARNING: Color = Color::Rgb(250, 200, 90);
    pub const INFO: Color = Color::Rgb(120, 170, 250);
    pub const DANGER: Color = Color::Rgb(255, 100, 100);
}

/// Badge colour for a status label.
pub fn status_style(status: &str) -> Style {
    let color = match status {
        "Completed" | "Delivered" | "Picked Up" | "Confirmed" => theme::SUCCESS,
        "Pending" | "Requested" | "Placed" => theme::WARNING,
        "En Route" | "Preparing" | "Ready" => theme::INFO,
        "Cancelled" => theme::DANGER,
        _ => theme::TEXT_DIM,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Helper function to create a centered rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Moves a wrapping list selection one step.
pub(crate) fn step_selection(current: Option<usize>, len: usize, forward: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let next = match current {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };
    Some(next)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_colours_follow_status_groups() {
        assert_eq!(status_style("Delivered").fg, Some(theme::SUCCESS));
        assert_eq!(status_style("Requested").fg, Some(theme::WARNING));
        assert_eq!(status_style("En Route").fg, Some(theme::INFO));
        assert_eq!(status_style("Cancelled").fg, Some(theme::DANGER));
    }

    #[test]
    fn selection_wraps_both_ways() {
        assert_eq!(step_selection(None, 0, true), None);
        assert_eq!(step_selection(None, 3, false), Some(0));
        assert_eq!(step_selection(Some(2), 3, true), Some(0));
        assert_eq!(step_selection(Some(0), 3, false), Some(2));
    }
}
