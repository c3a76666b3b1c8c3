//! Driver dashboard: availability toggle, the radar feed and the current job.

use super::{
    empty_state, handle_logout_dialog, header_row, highlight_style, logout_dialog, panel,
    render_chrome, Notice,
};
use crate::components::dialog::ConfirmDialog;
use crate::components::{step_selection, theme, Dashboard, DashboardAction};
use crate::models::{Identity, Ride, RideStatus};
use crate::store::{Command, EntityStore};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Cell, Paragraph, Row, Table, TableState},
};

/// Label of the button that moves the driver's current job forward.
fn job_action_label(status: RideStatus) -> Option<&'static str> {
    match status {
        RideStatus::EnRoute => Some("Confirm Patient Pickup"),
        RideStatus::PickedUp => Some("Complete Ride"),
        RideStatus::Requested | RideStatus::Completed => None,
    }
}

pub struct DriverDashboard {
    identity: Identity,
    /// Offline drivers see neither the feed nor their current job.
    pub online: bool,
    feed_state: TableState,
    logout: ConfirmDialog,
    notice: Notice,
}

impl DriverDashboard {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            online: true,
            feed_state: TableState::default().with_selected(Some(0)),
            logout: logout_dialog(),
            notice: Notice::default(),
        }
    }

    fn current_job<'a>(&self, store: &'a EntityStore) -> Option<&'a Ride> {
        store.active_ride_for(&self.identity.display_name)
    }

    fn on_enter(&self, store: &EntityStore) -> Option<DashboardAction> {
        if !self.online {
            return None;
        }
        if let Some(ride) = self.current_job(store) {
            return ride.status.next().map(|status| {
                DashboardAction::Apply(Command::AdvanceRide {
                    id: ride.id.clone(),
                    status,
                })
            });
        }

        let open = store.open_rides();
        if open.is_empty() {
            return None;
        }
        let index = self.feed_state.selected().unwrap_or(0).min(open.len() - 1);
        Some(DashboardAction::Apply(Command::AdvanceRide {
            id: open[index].id.clone(),
            status: RideStatus::EnRoute,
        }))
    }

    fn render_offline(&self, frame: &mut Frame, area: Rect) {
        let card = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "You are currently offline.",
                Style::default()
                    .fg(theme::TEXT)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Go online to receive emergency dispatch requests.",
                Style::default().fg(theme::HELP),
            )),
        ])
        .alignment(Alignment::Center)
        .block(panel(" Status "));
        frame.render_widget(card, area);
    }

    fn render_job(&self, frame: &mut Frame, area: Rect, ride: &Ride) {
        let block = panel(Line::from(Span::styled(
            " CURRENT JOB ",
            Style::default()
                .fg(theme::INFO)
                .add_modifier(Modifier::BOLD),
        )));
        let label = Style::default()
            .fg(theme::TEXT_DIM)
            .add_modifier(Modifier::BOLD);
        let value = Style::default().fg(theme::TEXT);

        let mut lines = vec![
            Line::from(Span::styled(
                ride.status.to_string(),
                Style::default()
                    .fg(theme::INFO)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("{} • {}", ride.vehicle, ride.patient_name),
                Style::default().fg(theme::HELP),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("● ", Style::default().fg(theme::SUCCESS)),
                Span::styled("PICKUP   ", label),
                Span::styled(ride.pickup_location.as_str(), value),
            ]),
            Line::from(Span::styled("│", Style::default().fg(theme::BORDER))),
            Line::from(vec![
                Span::styled("● ", Style::default().fg(theme::DANGER)),
                Span::styled("DROPOFF  ", label),
                Span::styled(ride.drop_location.as_str(), value),
            ]),
            Line::from(""),
        ];
        if let Some(action) = job_action_label(ride.status) {
            let bg = if ride.status == RideStatus::EnRoute {
                theme::SUCCESS
            } else {
                theme::INFO
            };
            lines.push(Line::from(Span::styled(
                format!(" {action} "),
                Style::default()
                    .fg(theme::BACKGROUND)
                    .bg(bg)
                    .add_modifier(Modifier::BOLD),
            )));
        }

        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
    }

    fn render_feed(&self, frame: &mut Frame, area: Rect, store: &EntityStore) {
        let open = store.open_rides();
        let title = Line::from(vec![
            Span::raw(" Radar Feed "),
            Span::styled(
                format!(" {} ", open.len()),
                Style::default()
                    .fg(Color::White)
                    .bg(theme::DANGER)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
        ]);
        let block = panel(title);

        if open.is_empty() {
            frame.render_widget(
                empty_state("Scanning Area...", "Waiting for dispatch from HQ.").block(block),
                area,
            );
            return;
        }

        let rows = open.iter().map(|r| {
            Row::new(vec![
                Cell::from(Span::styled(
                    format!("● {}", r.vehicle),
                    Style::default()
                        .fg(theme::DANGER)
                        .add_modifier(Modifier::BOLD),
                )),
                Cell::from(r.patient_name.clone()),
                Cell::from(r.pickup_location.clone()),
                Cell::from("2.4km • 4m"),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(20),
                Constraint::Percentage(25),
                Constraint::Percentage(35),
                Constraint::Percentage(20),
            ],
        )
        .header(header_row(&["Request", "Patient", "Pickup", "Distance"]))
        .block(block)
        .row_highlight_style(highlight_style())
        .highlight_symbol("► ");

        let mut state = self.feed_state.clone();
        if state.selected().is_some_and(|i| i >= open.len()) {
            state.select(Some(open.len() - 1));
        }
        frame.render_stateful_widget(table, area, &mut state);
    }
}

impl Dashboard for DriverDashboard {
    fn handle_input(
        &mut self,
        key: KeyEvent,
        store: &EntityStore,
    ) -> Result<Option<DashboardAction>> {
        if let Some(action) = handle_logout_dialog(&mut self.logout, key) {
            return Ok(action);
        }

        match key.code {
            KeyCode::Esc => self.logout.show(),
            KeyCode::Char('o') | KeyCode::Char('O') => self.online = !self.online,
            KeyCode::Up | KeyCode::Down => {
                let len = store.open_rides().len();
                let next = step_selection(self.feed_state.selected(), len, key.code == KeyCode::Down);
                self.feed_state.select(next.or(Some(0)));
            }
            KeyCode::Enter => return Ok(self.on_enter(store)),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, store: &EntityStore) {
        let job = self.current_job(store);
        let help = match (self.online, job) {
            (false, _) => "O: Go online | Esc: Logout",
            (true, Some(_)) => "Enter: Next step | O: Go offline | Esc: Logout",
            (true, None) => "↑↓: Select | Enter: Accept Request | O: Go offline | Esc: Logout",
        };
        let body = render_chrome(
            frame,
            "Driver Portal",
            &self.identity,
            &[],
            0,
            help,
            &self.notice,
        );

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(6)])
            .split(body);

        let (label, color) = if self.online {
            ("● ONLINE", theme::SUCCESS)
        } else {
            ("○ OFFLINE", theme::TEXT_DIM)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Right),
            layout[0],
        );

        let content = centered_column(layout[1]);
        match (self.online, job) {
            (false, _) => self.render_offline(frame, content),
            (true, Some(ride)) => self.render_job(frame, content, ride),
            (true, None) => self.render_feed(frame, content, store),
        }

        self.logout.render(frame);
    }

    fn report_error(&mut self, message: String) {
        self.notice.set(message);
    }

    fn tick(&mut self) {
        self.notice.check_timeout();
    }
}

/// Narrow centre column the driver views are laid out in.
fn centered_column(area: Rect) -> Rect {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(15),
            Constraint::Percentage(70),
            Constraint::Percentage(15),
        ])
        .split(area)[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::render_to_text;
    use crate::models::{Role, VehicleType};
    use crate::store::NewRide;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn identity(id: &str, name: &str, role: Role) -> Identity {
        Identity {
            id: id.to_string(),
            display_name: name.to_string(),
            email: format!("{id}@medx.test"),
            role,
        }
    }

    fn driver() -> DriverDashboard {
        DriverDashboard::new(identity("d1", "Ravi", Role::Driver))
    }

    fn store_with_ride() -> (EntityStore, String) {
        let mut store = EntityStore::new();
        let id = store
            .add_ride(
                &identity("p1", "Asha", Role::Patient),
                NewRide {
                    vehicle: VehicleType::Ambulance,
                },
            )
            .id
            .clone();
        (store, id)
    }

    #[test]
    fn accepting_a_request_moves_it_en_route() {
        let (store, id) = store_with_ride();
        let mut dashboard = driver();
        assert_eq!(
            dashboard.handle_input(key(KeyCode::Enter), &store).unwrap(),
            Some(DashboardAction::Apply(Command::AdvanceRide {
                id,
                status: RideStatus::EnRoute,
            }))
        );
    }

    #[test]
    fn current_job_offers_only_the_next_step() {
        let (mut store, id) = store_with_ride();
        store.update_ride_status(&id, RideStatus::EnRoute, "Ravi").unwrap();
        let mut dashboard = driver();

        let screen = render_to_text(100, 30, |frame| dashboard.render(frame, &store));
        assert!(screen.contains("Confirm Patient Pickup"));
        assert!(!screen.contains("Complete Ride"));

        assert_eq!(
            dashboard.handle_input(key(KeyCode::Enter), &store).unwrap(),
            Some(DashboardAction::Apply(Command::AdvanceRide {
                id: id.clone(),
                status: RideStatus::PickedUp,
            }))
        );

        store.update_ride_status(&id, RideStatus::PickedUp, "Ravi").unwrap();
        let screen = render_to_text(100, 30, |frame| dashboard.render(frame, &store));
        assert!(screen.contains("Complete Ride"));
    }

    #[test]
    fn another_drivers_job_stays_out_of_the_feed() {
        let (mut store, id) = store_with_ride();
        store.update_ride_status(&id, RideStatus::EnRoute, "Meena").unwrap();
        let mut dashboard = driver();

        assert_eq!(dashboard.handle_input(key(KeyCode::Enter), &store).unwrap(), None);
        let screen = render_to_text(100, 30, |frame| dashboard.render(frame, &store));
        assert!(screen.contains("Scanning Area..."));
        assert!(screen.contains("Waiting for dispatch from HQ."));
    }

    #[test]
    fn offline_driver_cannot_accept() {
        let (store, _) = store_with_ride();
        let mut dashboard = driver();
        dashboard.handle_input(key(KeyCode::Char('o')), &store).unwrap();
        assert!(!dashboard.online);
        assert_eq!(dashboard.handle_input(key(KeyCode::Enter), &store).unwrap(), None);

        let screen = render_to_text(100, 30, |frame| dashboard.render(frame, &store));
        assert!(screen.contains("You are currently offline."));
    }
}
