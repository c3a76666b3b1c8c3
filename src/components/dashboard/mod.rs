//! Role dashboards and the pieces they share.

use crate::components::dialog::{ConfirmDialog, DialogChoice};
use crate::components::{theme, Dashboard, DashboardAction};
use crate::models::{Identity, Role};
use crate::store::Command;
use crate::tui::Frame;
use crossterm::event::KeyEvent;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Tabs},
};
use std::time::{Duration, Instant};

pub mod booking;
pub mod driver;
pub mod emergency;
pub mod hospital;
pub mod patient;
pub mod pharmacy;

pub use driver::DriverDashboard;
pub use hospital::HospitalDashboard;
pub use patient::PatientDashboard;
pub use pharmacy::PharmacyDashboard;

const NOTICE_TIMEOUT: Duration = Duration::from_secs(5);

/// The dashboard for the signed-in role.
pub enum ActiveDashboard {
    Patient(PatientDashboard),
    Hospital(HospitalDashboard),
    Driver(DriverDashboard),
    Pharmacy(PharmacyDashboard),
}

impl ActiveDashboard {
    /// Builds the dashboard matching `identity.role`.
    pub fn for_identity(identity: &Identity) -> Self {
        match identity.role {
            Role::Patient => ActiveDashboard::Patient(PatientDashboard::new(identity.clone())),
            Role::Hospital => ActiveDashboard::Hospital(HospitalDashboard::new(identity.clone())),
            Role::Driver => ActiveDashboard::Driver(DriverDashboard::new(identity.clone())),
            Role::Pharmacy => ActiveDashboard::Pharmacy(PharmacyDashboard::new(identity.clone())),
        }
    }

    pub fn as_dashboard(&self) -> &dyn Dashboard {
        match self {
            ActiveDashboard::Patient(d) => d,
            ActiveDashboard::Hospital(d) => d,
            ActiveDashboard::Driver(d) => d,
            ActiveDashboard::Pharmacy(d) => d,
        }
    }

    pub fn as_dashboard_mut(&mut self) -> &mut dyn Dashboard {
        match self {
            ActiveDashboard::Patient(d) => d,
            ActiveDashboard::Hospital(d) => d,
            ActiveDashboard::Driver(d) => d,
            ActiveDashboard::Pharmacy(d) => d,
        }
    }
}

/// Result of a key press inside a patient form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    Submit(Command),
    Back,
}

/// Inline error line that clears itself after a few seconds.
#[derive(Debug, Default)]
pub struct Notice {
    message: Option<String>,
    shown_at: Option<Instant>,
}

impl Notice {
    pub fn set(&mut self, message: String) {
        self.message = Some(message);
        self.shown_at = Some(Instant::now());
    }

    pub fn clear(&mut self) {
        self.message = None;
        self.shown_at = None;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn check_timeout(&mut self) {
        if self.shown_at.is_some_and(|t| t.elapsed() >= NOTICE_TIMEOUT) {
            self.clear();
        }
    }
}

/// Logout confirmation every dashboard carries.
pub(crate) fn logout_dialog() -> ConfirmDialog {
    ConfirmDialog::new("Confirm Logout", "Are you sure you want to logout?")
}

/// Routes a key to an open logout dialog.
///
/// Returns `None` when the dialog is closed and the key is the dashboard's to handle.
pub(crate) fn handle_logout_dialog(
    dialog: &mut ConfirmDialog,
    key: KeyEvent,
) -> Option<Option<DashboardAction>> {
    if !dialog.open {
        return None;
    }
    match dialog.handle_input(key) {
        Some(DialogChoice::Confirmed) => Some(Some(DashboardAction::Logout)),
        _ => Some(None),
    }
}

/// Splits the screen into header, tab bar, body and footer and draws the chrome.
///
/// Returns the body area.
pub(crate) fn render_chrome(
    frame: &mut Frame,
    title: &str,
    identity: &Identity,
    tabs: &[String],
    selected_tab: usize,
    help: &str,
    notice: &Notice,
) -> Rect {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(theme::BACKGROUND)),
        area,
    );

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(if tabs.is_empty() { 0 } else { 2 }),
            Constraint::Min(8),    // Body
            Constraint::Length(1), // Notice
            Constraint::Length(1), // Help
        ])
        .margin(1)
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            title.to_string(),
            Style::default()
                .fg(theme::TEXT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  |  ", Style::default().fg(theme::BORDER)),
        Span::styled(
            identity.display_name.clone(),
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(theme::BORDER)),
    );
    frame.render_widget(header, layout[0]);

    if !tabs.is_empty() {
        let tab_bar = Tabs::new(tabs.iter().map(|t| Line::from(t.clone())))
            .select(selected_tab)
            .style(Style::default().fg(theme::TEXT_DIM))
            .highlight_style(
                Style::default()
                    .fg(theme::BORDER_FOCUS)
                    .add_modifier(Modifier::BOLD),
            )
            .divider(Span::styled(" | ", Style::default().fg(theme::BORDER)));
        frame.render_widget(tab_bar, layout[1]);
    }

    if let Some(message) = notice.message() {
        frame.render_widget(
            Paragraph::new(message)
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center),
            layout[3],
        );
    }

    frame.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(theme::HELP))
            .alignment(Alignment::Center),
        layout[4],
    );

    layout[2]
}

/// Centred placeholder for an empty list.
pub(crate) fn empty_state<'a>(title: &'a str, detail: &'a str) -> Paragraph<'a> {
    Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            title,
            Style::default()
                .fg(theme::TEXT_DIM)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(detail, Style::default().fg(theme::HELP))),
    ])
    .alignment(Alignment::Center)
}

/// Rounded panel block used for dashboard sections.
pub(crate) fn panel(title: impl Into<Line<'static>>) -> Block<'static> {
    let title: Line<'static> = title.into();
    Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(theme::BORDER))
        .style(Style::default().bg(theme::PANEL))
}

/// Table header row in the shared style.
pub(crate) fn header_row(cells: &[&'static str]) -> ratatui::widgets::Row<'static> {
    ratatui::widgets::Row::new(
        cells
            .iter()
            .map(|h| ratatui::widgets::Cell::from(*h).style(Style::default().fg(theme::TEXT))),
    )
    .style(Style::default().bg(theme::HEADER_ROW))
    .height(1)
    .bottom_margin(1)
}

pub(crate) fn highlight_style() -> Style {
    Style::default()
        .bg(theme::HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_role_gets_its_own_dashboard() {
        for role in Role::ALL {
            let identity = Identity {
                id: "u1".to_string(),
                display_name: "Asha".to_string(),
                email: "asha@medx.test".to_string(),
                role,
            };
            let matches = matches!(
                (role, ActiveDashboard::for_identity(&identity)),
                (Role::Patient, ActiveDashboard::Patient(_))
                    | (Role::Hospital, ActiveDashboard::Hospital(_))
                    | (Role::Driver, ActiveDashboard::Driver(_))
                    | (Role::Pharmacy, ActiveDashboard::Pharmacy(_))
            );
            assert!(matches, "wrong dashboard for {role}");
        }
    }

    #[test]
    fn notice_clears_explicitly() {
        let mut notice = Notice::default();
        notice.set("boom".to_string());
        notice.check_timeout();
        assert_eq!(notice.message(), Some("boom"));
        notice.clear();
        assert_eq!(notice.message(), None);
    }
}
