//! Consultation booking form.

use super::{panel, FormEvent};
use crate::components::theme;
use crate::models::{ConsultationType, HOSPITALS};
use crate::store::{Command, NewConsultation};
use crate::tui::Frame;
use crate::utils::format_currency;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{
        calendar::{CalendarEventStore, Monthly},
        Block, BorderType, Borders, Paragraph,
    },
};
use time::{Date, Duration};

const HOSPITAL_FIELD: usize = 0;
const DATE_FIELD: usize = 1;
const TYPE_FIELD: usize = 2;
const SYMPTOMS_FIELD: usize = 3;
const CONFIRM_BUTTON: usize = 4;
const FIELD_COUNT: usize = 5;

#[derive(Debug, Clone)]
pub struct BookingForm {
    hospital_index: usize,
    pub date: Date,
    earliest: Date,
    type_index: usize,
    pub symptoms: String,
    focus: usize,
}

impl BookingForm {
    /// A form defaulting to the first hospital, a video call and `today`.
    pub fn new(today: Date) -> Self {
        Self {
            hospital_index: 0,
            date: today,
            earliest: today,
            type_index: 1,
            symptoms: String::new(),
            focus: HOSPITAL_FIELD,
        }
    }

    pub fn kind(&self) -> ConsultationType {
        ConsultationType::ALL[self.type_index]
    }

    fn step(&mut self, forward: bool) {
        match self.focus {
            HOSPITAL_FIELD => {
                let n = HOSPITALS.len();
                self.hospital_index = if forward {
                    (self.hospital_index + 1) % n
                } else {
                    (self.hospital_index + n - 1) % n
                };
            }
            DATE_FIELD => {
                let next = if forward {
                    self.date.checked_add(Duration::days(1))
                } else {
                    self.date.checked_sub(Duration::days(1))
                };
                if let Some(next) = next.filter(|d| *d >= self.earliest) {
                    self.date = next;
                }
            }
            TYPE_FIELD => {
                let n = ConsultationType::ALL.len();
                self.type_index = if forward {
                    (self.type_index + 1) % n
                } else {
                    (self.type_index + n - 1) % n
                };
            }
            _ => {}
        }
    }

    fn submission(&self) -> Command {
        Command::BookConsultation(NewConsultation {
            hospital_id: HOSPITALS[self.hospital_index].id.to_string(),
            date: self.date,
            symptoms: self.symptoms.clone(),
            kind: self.kind(),
        })
    }

    pub fn handle_input(&mut self, key: KeyEvent) -> Option<FormEvent> {
        match key.code {
            KeyCode::Esc => return Some(FormEvent::Back),
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % FIELD_COUNT,
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + FIELD_COUNT - 1) % FIELD_COUNT
            }
            KeyCode::Left => self.step(false),
            KeyCode::Right => self.step(true),
            KeyCode::Char(c) if self.focus == SYMPTOMS_FIELD => self.symptoms.push(c),
            KeyCode::Backspace if self.focus == SYMPTOMS_FIELD => {
                self.symptoms.pop();
            }
            KeyCode::Enter if self.focus == CONFIRM_BUTTON => {
                return Some(FormEvent::Submit(self.submission()))
            }
            KeyCode::Enter => self.focus += 1,
            _ => {}
        }
        None
    }

    fn label(&self, text: &'static str, index: usize) -> Line<'static> {
        let style = if self.focus == index {
            Style::default()
                .fg(theme::BORDER_FOCUS)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(theme::TEXT_DIM)
                .add_modifier(Modifier::BOLD)
        };
        Line::from(Span::styled(text, style))
    }

    fn option_spans<'a>(&self, labels: &[String], selected: usize, field: usize) -> Line<'a> {
        let mut spans = Vec::new();
        for (i, label) in labels.iter().enumerate() {
            let style = if i == selected {
                let fg = if self.focus == field {
                    theme::BACKGROUND
                } else {
                    theme::TEXT
                };
                let bg = if self.focus == field {
                    theme::ACCENT
                } else {
                    theme::HIGHLIGHT
                };
                Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::TEXT_DIM)
            };
            spans.push(Span::styled(format!(" {label} "), style));
            spans.push(Span::raw("  "));
        }
        Line::from(spans)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = panel(" Book Appointment ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(26)])
            .spacing(2)
            .margin(1)
            .split(inner);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // Hospital
                Constraint::Length(3), // Date
                Constraint::Length(3), // Type
                Constraint::Length(4), // Symptoms
                Constraint::Length(1), // Confirm
                Constraint::Min(0),
            ])
            .split(columns[0]);

        let mut hospital_lines = vec![self.label("SELECT HOSPITAL", HOSPITAL_FIELD)];
        for (i, hospital) in HOSPITALS.iter().enumerate() {
            let selected = i == self.hospital_index;
            hospital_lines.push(Line::from(vec![
                Span::styled(
                    if selected { " ► " } else { "   " },
                    Style::default().fg(theme::ACCENT),
                ),
                Span::styled(
                    hospital.name,
                    Style::default()
                        .fg(if selected { theme::TEXT } else { theme::TEXT_DIM })
                        .add_modifier(if selected {
                            Modifier::BOLD
                        } else {
                            Modifier::empty()
                        }),
                ),
                Span::styled(
                    format!("  {}", hospital.location),
                    Style::default().fg(theme::HELP),
                ),
            ]));
        }
        frame.render_widget(Paragraph::new(hospital_lines), rows[0]);

        let date_lines = vec![
            self.label("PREFERRED DATE", DATE_FIELD),
            Line::from(vec![
                Span::styled(" ◄ ", Style::default().fg(theme::HELP)),
                Span::styled(
                    self.date.to_string(),
                    Style::default()
                        .fg(theme::TEXT)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" ► ", Style::default().fg(theme::HELP)),
            ]),
        ];
        frame.render_widget(Paragraph::new(date_lines), rows[1]);

        let type_labels: Vec<String> = ConsultationType::ALL
            .iter()
            .map(|t| format!("{} {}", t.label(), format_currency(t.fee())))
            .collect();
        let type_lines = vec![
            self.label("CONSULTATION TYPE", TYPE_FIELD),
            self.option_spans(&type_labels, self.type_index, TYPE_FIELD),
        ];
        frame.render_widget(Paragraph::new(type_lines), rows[2]);

        let symptoms_text = if self.symptoms.is_empty() && self.focus != SYMPTOMS_FIELD {
            Span::styled("e.g. Headache, Fever", Style::default().fg(theme::HELP))
        } else {
            Span::styled(self.symptoms.as_str(), Style::default().fg(theme::TEXT))
        };
        let symptoms = Paragraph::new(Line::from(symptoms_text)).block(
            Block::default()
                .title(self.label(" Symptoms ", SYMPTOMS_FIELD))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(if self.focus == SYMPTOMS_FIELD {
                    theme::BORDER_FOCUS
                } else {
                    theme::BORDER
                })),
        );
        frame.render_widget(symptoms, rows[3]);

        let confirm_style = if self.focus == CONFIRM_BUTTON {
            Style::default()
                .fg(theme::BACKGROUND)
                .bg(theme::SUCCESS)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(theme::SUCCESS)
                .add_modifier(Modifier::BOLD)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!(" Pay {} & Confirm Booking ", format_currency(self.kind().fee())),
                confirm_style,
            ))
            .alignment(Alignment::Center),
            rows[4],
        );

        let mut events = CalendarEventStore::default();
        events.add(
            self.earliest,
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::UNDERLINED),
        );
        events.add(
            self.date,
            Style::default()
                .fg(theme::BACKGROUND)
                .bg(theme::BORDER_FOCUS)
                .add_modifier(Modifier::BOLD),
        );
        let calendar = Monthly::new(self.date, events)
            .show_month_header(
                Style::default()
                    .fg(theme::TEXT)
                    .add_modifier(Modifier::BOLD),
            )
            .show_weekdays_header(Style::default().fg(theme::HELP))
            .default_style(Style::default().fg(theme::TEXT_DIM));
        frame.render_widget(calendar, columns[1]);
    }
}
