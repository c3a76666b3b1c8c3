//! Emergency dispatch request form.

use super::{panel, FormEvent};
use crate::components::theme;
use crate::models::VehicleType;
use crate::store::{Command, NewRide};
use crate::tui::Frame;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::Paragraph};

const DETECTED_LOCATION: &str = "12.9716° N, 77.5946° E";

#[derive(Debug, Clone)]
pub struct EmergencyForm {
    vehicle_index: usize,
}

impl Default for EmergencyForm {
    fn default() -> Self {
        Self::new()
    }
}

impl EmergencyForm {
    pub fn new() -> Self {
        Self {
            vehicle_index: VehicleType::ALL.len() - 1,
        }
    }

    pub fn vehicle(&self) -> VehicleType {
        VehicleType::ALL[self.vehicle_index]
    }

    pub fn handle_input(&mut self, key: KeyEvent) -> Option<FormEvent> {
        let n = VehicleType::ALL.len();
        match key.code {
            KeyCode::Left => self.vehicle_index = (self.vehicle_index + n - 1) % n,
            KeyCode::Right | KeyCode::Tab => self.vehicle_index = (self.vehicle_index + 1) % n,
            KeyCode::Enter => {
                return Some(FormEvent::Submit(Command::RequestRide(NewRide {
                    vehicle: self.vehicle(),
                })))
            }
            KeyCode::Esc => return Some(FormEvent::Back),
            _ => {}
        }
        None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = panel(Line::from(Span::styled(
            " Emergency Dispatch ",
            Style::default()
                .fg(theme::DANGER)
                .add_modifier(Modifier::BOLD),
        )));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Intro
                Constraint::Length(1), // Label
                Constraint::Length(3), // Vehicles
                Constraint::Length(3), // Location
                Constraint::Length(1), // Confirm
                Constraint::Min(0),
            ])
            .margin(1)
            .split(inner);

        frame.render_widget(
            Paragraph::new("Immediate response unit will be sent to your location.")
                .style(Style::default().fg(theme::TEXT_DIM))
                .alignment(Alignment::Center),
            rows[0],
        );
        frame.render_widget(
            Paragraph::new(Span::styled(
                "SELECT RESPONSE VEHICLE",
                Style::default()
                    .fg(theme::TEXT_DIM)
                    .add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            rows[1],
        );

        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(rows[2]);
        for (i, vehicle) in VehicleType::ALL.iter().enumerate() {
            let selected = i == self.vehicle_index;
            let (name_style, eta_style) = if selected {
                (
                    Style::default()
                        .fg(Color::White)
                        .bg(Color::Rgb(200, 40, 40))
                        .add_modifier(Modifier::BOLD),
                    Style::default().fg(Color::Rgb(255, 200, 200)).bg(Color::Rgb(200, 40, 40)),
                )
            } else {
                (
                    Style::default().fg(theme::TEXT_DIM),
                    Style::default().fg(theme::HELP),
                )
            };
            let card = Paragraph::new(vec![
                Line::from(Span::styled(format!(" {vehicle} "), name_style)),
                Line::from(Span::styled(
                    format!(" {}m away ", vehicle.eta_minutes()),
                    eta_style,
                )),
            ])
            .alignment(Alignment::Center);
            frame.render_widget(card, cards[i]);
        }

        let location = Paragraph::new(vec![
            Line::from(Span::styled(
                "DETECTED LOCATION",
                Style::default()
                    .fg(theme::HELP)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                DETECTED_LOCATION,
                Style::default().fg(theme::TEXT),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(location, rows[3]);

        frame.render_widget(
            Paragraph::new(Span::styled(
                " CONFIRM REQUEST ",
                Style::default()
                    .fg(Color::White)
                    .bg(Color::Rgb(200, 40, 40))
                    .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
            ))
            .alignment(Alignment::Center),
            rows[4],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::render_to_text;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn defaults_to_ambulance() {
        let mut form = EmergencyForm::new();
        assert_eq!(
            form.handle_input(key(KeyCode::Enter)),
            Some(FormEvent::Submit(Command::RequestRide(NewRide {
                vehicle: VehicleType::Ambulance
            })))
        );
    }

    #[test]
    fn arrows_cycle_vehicles() {
        let mut form = EmergencyForm::new();
        form.handle_input(key(KeyCode::Right));
        assert_eq!(form.vehicle(), VehicleType::Bike);
        form.handle_input(key(KeyCode::Left));
        form.handle_input(key(KeyCode::Left));
        assert_eq!(form.vehicle(), VehicleType::Car);
    }

    #[test]
    fn shows_quoted_arrival_times() {
        let form = EmergencyForm::new();
        let screen = render_to_text(90, 20, |frame| {
            let area = frame.area();
            form.render(frame, area);
        });
        assert!(screen.contains("3m away"));
        assert!(screen.contains("12m away"));
    }
}
