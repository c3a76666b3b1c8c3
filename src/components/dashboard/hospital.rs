//! Hospital dashboard: the appointment queue and the inbound emergency feed.

use super::{
    empty_state, handle_logout_dialog, header_row, highlight_style, logout_dialog, panel,
    render_chrome, Notice,
};
use crate::components::dialog::ConfirmDialog;
use crate::components::{status_style, step_selection, theme, Dashboard, DashboardAction};
use crate::models::{Consultation, ConsultationStatus, Identity};
use crate::store::{Command, EntityStore};
use crate::tui::Frame;
use crate::utils::{clock_time, format_currency};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Cell, Row, Table, TableState},
};

const RECEIVING_UNIT: &str = "Apollo ER";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HospitalTab {
    Appointments,
    EmergencyFeed,
}

pub struct HospitalDashboard {
    identity: Identity,
    tab: HospitalTab,
    table_state: TableState,
    logout: ConfirmDialog,
    notice: Notice,
}

impl HospitalDashboard {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            tab: HospitalTab::Appointments,
            table_state: TableState::default().with_selected(Some(0)),
            logout: logout_dialog(),
            notice: Notice::default(),
        }
    }

    fn selected_request<'a>(&self, pending: &[&'a Consultation]) -> Option<&'a Consultation> {
        if pending.is_empty() {
            return None;
        }
        let index = self.table_state.selected().unwrap_or(0).min(pending.len() - 1);
        Some(pending[index])
    }

    fn review(&self, store: &EntityStore, status: ConsultationStatus) -> Option<DashboardAction> {
        let pending = store.pending_consultations();
        self.selected_request(&pending).map(|c| {
            DashboardAction::Apply(Command::ReviewConsultation {
                id: c.id.clone(),
                status,
            })
        })
    }

    fn render_appointments(&self, frame: &mut Frame, area: Rect, store: &EntityStore) {
        let pending = store.pending_consultations();
        let title = Line::from(vec![
            Span::raw(" Appointment Requests "),
            Span::styled(
                format!(" {} Pending ", pending.len()),
                Style::default()
                    .fg(theme::BACKGROUND)
                    .bg(theme::WARNING)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
        ]);
        let block = panel(title);

        if pending.is_empty() {
            frame.render_widget(
                empty_state("All caught up! No pending appointments.", "").block(block),
                area,
            );
            return;
        }

        let rows = pending.iter().map(|c| {
            Row::new(vec![
                Cell::from(c.patient_name.clone()),
                Cell::from(c.date.to_string()),
                Cell::from(c.kind.label()),
                Cell::from(c.symptoms.clone()),
                Cell::from(c.hospital_name.clone()),
                Cell::from(format_currency(c.amount)),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(18),
                Constraint::Percentage(14),
                Constraint::Percentage(12),
                Constraint::Percentage(26),
                Constraint::Percentage(18),
                Constraint::Percentage(12),
            ],
        )
        .header(header_row(&["Patient", "Date", "Type", "Symptoms", "Hospital", "Fee"]))
        .block(block)
        .row_highlight_style(highlight_style())
        .highlight_symbol("► ");

        let mut state = self.table_state.clone();
        if state.selected().is_some_and(|i| i >= pending.len()) {
            state.select(Some(pending.len() - 1));
        }
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_emergencies(&self, frame: &mut Frame, area: Rect, store: &EntityStore) {
        let inbound = store.active_emergencies();
        let block = panel(Line::from(Span::styled(
            " Live Emergency Feed ",
            Style::default()
                .fg(theme::DANGER)
                .add_modifier(Modifier::BOLD),
        )));

        if inbound.is_empty() {
            frame.render_widget(
                empty_state("No active emergencies.", "Inbound transports will appear here.")
                    .block(block),
                area,
            );
            return;
        }

        let rows = inbound.iter().map(|r| {
            Row::new(vec![
                Cell::from(Span::styled(
                    format!("Inbound {}", r.vehicle),
                    Style::default()
                        .fg(theme::DANGER)
                        .add_modifier(Modifier::BOLD),
                )),
                Cell::from(r.patient_name.clone()),
                Cell::from(clock_time(r.request_time)),
                Cell::from(format!("{} mins", r.eta_minutes)),
                Cell::from(r.driver_name.clone().unwrap_or_else(|| "Unassigned".to_string())),
                Cell::from(RECEIVING_UNIT),
                Cell::from(Span::styled(r.status.to_string(), status_style(&r.status.to_string()))),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(18),
                Constraint::Percentage(16),
                Constraint::Percentage(10),
                Constraint::Percentage(10),
                Constraint::Percentage(16),
                Constraint::Percentage(14),
                Constraint::Percentage(16),
            ],
        )
        .header(header_row(&[
            "Unit", "Patient", "Called", "ETA", "Driver", "Destination", "Status",
        ]))
        .block(block);
        frame.render_widget(table, area);
    }
}

impl Dashboard for HospitalDashboard {
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
            KeyCode::Tab | KeyCode::BackTab => {
                self.tab = match self.tab {
                    HospitalTab::Appointments => HospitalTab::EmergencyFeed,
                    HospitalTab::EmergencyFeed => HospitalTab::Appointments,
                };
            }
            KeyCode::Down | KeyCode::Up if self.tab == HospitalTab::Appointments => {
                let len = store.pending_consultations().len();
                let next = step_selection(self.table_state.selected(), len, key.code == KeyCode::Down);
                self.table_state.select(next.or(Some(0)));
            }
            KeyCode::Char('a') | KeyCode::Char('A') if self.tab == HospitalTab::Appointments => {
                return Ok(self.review(store, ConsultationStatus::Confirmed));
            }
            KeyCode::Char('d') | KeyCode::Char('D') if self.tab == HospitalTab::Appointments => {
                return Ok(self.review(store, ConsultationStatus::Cancelled));
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, store: &EntityStore) {
        let tabs = vec![
            format!("Appointments ({})", store.pending_consultations().len()),
            format!("Emergency Feed ({})", store.active_emergencies().len()),
        ];
        let (selected, help) = match self.tab {
            HospitalTab::Appointments => (
                0,
                "↑↓: Select | A: Accept Patient | D: Decline | Tab: Emergency Feed | Esc: Logout",
            ),
            HospitalTab::EmergencyFeed => (1, "Tab: Appointments | Esc: Logout"),
        };
        let body = render_chrome(
            frame,
            "MedX Hospital Portal",
            &self.identity,
            &tabs,
            selected,
            help,
            &self.notice,
        );

        match self.tab {
            HospitalTab::Appointments => self.render_appointments(frame, body, store),
            HospitalTab::EmergencyFeed => self.render_emergencies(frame, body, store),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::render_to_text;
    use crate::models::{ConsultationType, Role, VehicleType};
    use crate::store::{NewConsultation, NewRide};
    use crossterm::event::KeyModifiers;
    use time::macros::date;

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

    fn store_with_two_bookings() -> (EntityStore, Vec<String>) {
        let mut store = EntityStore::new();
        let patient = identity("p1", "Asha", Role::Patient);
        let ids = ["fever", "rash"]
            .iter()
            .map(|symptoms| {
                store
                    .add_consultation(
                        &patient,
                        NewConsultation {
                            hospital_id: "h1".to_string(),
                            date: date!(2024 - 02 - 01),
                            symptoms: symptoms.to_string(),
                            kind: ConsultationType::Audio,
                        },
                    )
                    .unwrap()
                    .id
                    .clone()
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn accept_and_decline_target_the_selected_row() {
        let (store, ids) = store_with_two_bookings();
        let mut dashboard = HospitalDashboard::new(identity("h-staff", "Front Desk", Role::Hospital));

        assert_eq!(
            dashboard.handle_input(key(KeyCode::Char('a')), &store).unwrap(),
            Some(DashboardAction::Apply(Command::ReviewConsultation {
                id: ids[0].clone(),
                status: ConsultationStatus::Confirmed,
            }))
        );

        dashboard.handle_input(key(KeyCode::Down), &store).unwrap();
        assert_eq!(
            dashboard.handle_input(key(KeyCode::Char('d')), &store).unwrap(),
            Some(DashboardAction::Apply(Command::ReviewConsultation {
                id: ids[1].clone(),
                status: ConsultationStatus::Cancelled,
            }))
        );
    }

    #[test]
    fn nothing_to_review_in_an_empty_queue() {
        let store = EntityStore::with_demo_data();
        let mut dashboard = HospitalDashboard::new(identity("h-staff", "Front Desk", Role::Hospital));
        assert_eq!(
            dashboard.handle_input(key(KeyCode::Char('a')), &store).unwrap(),
            None
        );
        let screen = render_to_text(120, 30, |frame| dashboard.render(frame, &store));
        assert!(screen.contains("All caught up! No pending appointments."));
    }

    #[test]
    fn selection_is_clamped_after_the_queue_shrinks() {
        let (mut store, ids) = store_with_two_bookings();
        let mut dashboard = HospitalDashboard::new(identity("h-staff", "Front Desk", Role::Hospital));
        dashboard.handle_input(key(KeyCode::Down), &store).unwrap();
        store
            .update_consultation_status(&ids[1], ConsultationStatus::Confirmed)
            .unwrap();

        assert_eq!(
            dashboard.handle_input(key(KeyCode::Char('a')), &store).unwrap(),
            Some(DashboardAction::Apply(Command::ReviewConsultation {
                id: ids[0].clone(),
                status: ConsultationStatus::Confirmed,
            }))
        );
    }

    #[test]
    fn emergency_feed_shows_inbound_rides() {
        let mut store = EntityStore::new();
        store.add_ride(
            &identity("p1", "Asha", Role::Patient),
            NewRide {
                vehicle: VehicleType::Ambulance,
            },
        );
        let mut dashboard = HospitalDashboard::new(identity("h-staff", "Front Desk", Role::Hospital));
        dashboard.handle_input(key(KeyCode::Tab), &store).unwrap();

        let screen = render_to_text(140, 30, |frame| dashboard.render(frame, &store));
        assert!(screen.contains("Inbound Ambulance"));
        assert!(screen.contains("Asha"));
        assert!(screen.contains("Apollo ER"));
    }
}
