//! Patient dashboard: symptom assistant, bookings, emergency rides and pharmacy.

use super::booking::BookingForm;
use super::emergency::EmergencyForm;
use super::{
    empty_state, handle_logout_dialog, header_row, highlight_style, logout_dialog, panel,
    render_chrome, FormEvent, Notice,
};
use crate::components::dialog::ConfirmDialog;
use crate::components::{status_style, step_selection, theme, Dashboard, DashboardAction};
use crate::models::{ChatMessage, Identity, Sender, Severity, TriageReport};
use crate::store::{Command, EntityStore, NewOrder};
use crate::triage::PatientFlow;
use crate::tui::Frame;
use crate::utils::{clock_time, format_currency, today};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Cell, Padding, Paragraph, Row, Table, TableState, Wrap},
};

const QUICK_PRESCRIPTION: [&str; 3] = ["Paracetamol 500mg", "Cough Syrup", "Vitamin C"];
const QUICK_PRESCRIPTION_TOTAL: u32 = 1250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientTab {
    Assistant,
    Consultations,
    Emergency,
    Pharmacy,
}

impl PatientTab {
    const ALL: [PatientTab; 4] = [
        PatientTab::Assistant,
        PatientTab::Consultations,
        PatientTab::Emergency,
        PatientTab::Pharmacy,
    ];

    fn help(&self) -> &'static str {
        match self {
            PatientTab::Assistant => {
                "Type symptoms + Enter: Analyze | F2: Suggested action | Tab: Switch | Esc: Logout"
            }
            PatientTab::Consultations => "↑↓: Scroll | N: New booking | Tab: Switch | Esc: Logout",
            PatientTab::Emergency => "↑↓: Scroll | N: Request now | Tab: Switch | Esc: Logout",
            PatientTab::Pharmacy => "Enter / O: Order now | Tab: Switch | Esc: Logout",
        }
    }
}

enum PatientForm {
    Booking(BookingForm),
    Emergency(EmergencyForm),
}

pub struct PatientDashboard {
    identity: Identity,
    tab: PatientTab,
    messages: Vec<ChatMessage>,
    pub input: String,
    /// Set while a triage request is in flight.
    pub loading: bool,
    form: Option<PatientForm>,
    list_state: TableState,
    logout: ConfirmDialog,
    notice: Notice,
}

impl PatientDashboard {
    pub fn new(identity: Identity) -> Self {
        let greeting = ChatMessage::greeting(&identity.display_name);
        Self {
            identity,
            tab: PatientTab::Assistant,
            messages: vec![greeting],
            input: String::new(),
            loading: false,
            form: None,
            list_state: TableState::default(),
            logout: logout_dialog(),
            notice: Notice::default(),
        }
    }

    pub fn tab(&self) -> PatientTab {
        self.tab
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_form_open(&self) -> bool {
        self.form.is_some()
    }

    /// Appends the assistant's reply to a triage request.
    pub fn receive_report(&mut self, report: &TriageReport) {
        self.messages.push(ChatMessage::from_report(report));
        self.loading = false;
    }

    /// Flow suggested by the latest assistant reply, if it carries one.
    pub fn suggested_flow(&self) -> Option<PatientFlow> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.sender == Sender::Assistant)
            .and_then(|m| m.severity)
            .and_then(PatientFlow::for_severity)
    }

    fn open_flow(&mut self, flow: PatientFlow) {
        match flow {
            PatientFlow::BookConsultation => self.open_booking(),
            PatientFlow::EmergencyDispatch => self.open_emergency(),
        }
    }

    fn open_booking(&mut self) {
        self.tab = PatientTab::Consultations;
        self.form = Some(PatientForm::Booking(BookingForm::new(today())));
    }

    fn open_emergency(&mut self) {
        self.tab = PatientTab::Emergency;
        self.form = Some(PatientForm::Emergency(EmergencyForm::new()));
    }

    fn switch_tab(&mut self, forward: bool) {
        let index = PatientTab::ALL
            .iter()
            .position(|t| *t == self.tab)
            .unwrap_or(0);
        let next = step_selection(Some(index), PatientTab::ALL.len(), forward).unwrap_or(0);
        self.tab = PatientTab::ALL[next];
        self.list_state = TableState::default();
    }

    fn handle_form_input(&mut self, key: KeyEvent) -> Option<DashboardAction> {
        let event = match self.form.as_mut()? {
            PatientForm::Booking(form) => form.handle_input(key),
            PatientForm::Emergency(form) => form.handle_input(key),
        };
        match event? {
            FormEvent::Back => {
                self.form = None;
                None
            }
            FormEvent::Submit(command) => {
                self.form = None;
                Some(DashboardAction::Apply(command))
            }
        }
    }

    fn send_message(&mut self) -> Option<DashboardAction> {
        let text = self.input.trim().to_string();
        if self.loading || text.is_empty() {
            return None;
        }
        self.messages.push(ChatMessage::from_patient(text.clone()));
        self.input.clear();
        self.loading = true;
        Some(DashboardAction::Analyze(text))
    }

    fn quick_order() -> Command {
        Command::PlaceOrder(NewOrder {
            items: QUICK_PRESCRIPTION.iter().map(|s| s.to_string()).collect(),
            total_amount: QUICK_PRESCRIPTION_TOTAL,
        })
    }

    fn scroll(&mut self, len: usize, forward: bool) {
        let next = step_selection(self.list_state.selected(), len, forward);
        self.list_state.select(next);
    }

    fn render_assistant(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(1), Constraint::Length(3)])
            .split(area);

        let block = panel(" MedX AI Assistant ");
        let inner = block.inner(layout[0]);
        let width = inner.width.max(1) as usize;

        let mut lines: Vec<Line> = Vec::new();
        for message in self.messages() {
            let (who, color, alignment) = match message.sender {
                Sender::Patient => ("You", theme::DANGER, Alignment::Right),
                Sender::Assistant => ("MedX AI", theme::ACCENT, Alignment::Left),
            };
            let mut header = vec![
                Span::styled(who, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!("  {}", clock_time(message.timestamp)),
                    Style::default().fg(theme::HELP),
                ),
            ];
            if let Some(severity) = message.severity {
                header.push(Span::raw("  "));
                header.push(Span::styled(
                    format!("[{}]", severity.to_string().to_uppercase()),
                    severity_style(severity),
                ));
            }
            lines.push(Line::from(header).alignment(alignment));
            for text_line in message.text.lines() {
                lines.push(
                    Line::from(Span::styled(
                        text_line.to_string(),
                        Style::default().fg(theme::TEXT),
                    ))
                    .alignment(alignment),
                );
            }
            lines.push(Line::from(""));
        }
        if self.loading {
            lines.push(Line::from(Span::styled(
                "MedX AI is analyzing • • •",
                Style::default()
                    .fg(theme::HELP)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        let wrapped: usize = lines
            .iter()
            .map(|l| l.width().max(1).div_ceil(width))
            .sum();
        let scroll = wrapped.saturating_sub(inner.height as usize) as u16;

        frame.render_widget(
            Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0)),
            layout[0],
        );

        if let Some(flow) = self.suggested_flow() {
            let style = match flow {
                PatientFlow::EmergencyDispatch => Style::default()
                    .fg(theme::DANGER)
                    .add_modifier(Modifier::BOLD),
                PatientFlow::BookConsultation => Style::default()
                    .fg(theme::INFO)
                    .add_modifier(Modifier::BOLD),
            };
            frame.render_widget(
                Paragraph::new(Span::styled(format!("F2: {}", flow.label()), style))
                    .alignment(Alignment::Center),
                layout[1],
            );
        }

        let input = Paragraph::new(if self.input.is_empty() {
            Span::styled("Describe your symptoms...", Style::default().fg(theme::HELP))
        } else {
            Span::styled(self.input.as_str(), Style::default().fg(theme::TEXT))
        })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(if self.loading {
                    theme::BORDER
                } else {
                    Color::Cyan
                })),
        );
        frame.render_widget(input, layout[2]);
    }

    fn render_consultations(&self, frame: &mut Frame, area: Rect, store: &EntityStore) {
        let mine = store.consultations_for(&self.identity.id);
        let block = panel(" Your Consultations ");
        if mine.is_empty() {
            frame.render_widget(
                empty_state("No consultations found.", "Press N to book one.").block(block),
                area,
            );
            return;
        }

        let rows = mine.iter().map(|c| {
            Row::new(vec![
                Cell::from(c.doctor_name.clone()),
                Cell::from(c.hospital_name.clone()),
                Cell::from(c.kind.label()),
                Cell::from(c.date.to_string()),
                Cell::from(Span::styled(c.status.to_string(), status_style(&c.status.to_string()))),
                Cell::from(format_currency(c.amount)),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(22),
                Constraint::Percentage(22),
                Constraint::Percentage(12),
                Constraint::Percentage(14),
                Constraint::Percentage(15),
                Constraint::Percentage(15),
            ],
        )
        .header(header_row(&["Doctor", "Hospital", "Type", "Date", "Status", "Amount"]))
        .block(block)
        .row_highlight_style(highlight_style())
        .highlight_symbol("► ");
        frame.render_stateful_widget(table, area, &mut self.list_state.clone());
    }

    fn render_rides(&self, frame: &mut Frame, area: Rect, store: &EntityStore) {
        let mine = store.rides_for(&self.identity.id);
        let block = panel(" Emergency Rides ");
        if mine.is_empty() {
            frame.render_widget(
                empty_state("No ride history.", "Press N to request emergency transport.")
                    .block(block),
                area,
            );
            return;
        }

        let rows = mine.iter().map(|r| {
            Row::new(vec![
                Cell::from(format!("{} Request", r.vehicle)),
                Cell::from(clock_time(r.request_time)),
                Cell::from(format!("{} → {}", r.pickup_location, r.drop_location)),
                Cell::from(r.driver_name.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(format!("{}m", r.eta_minutes)),
                Cell::from(Span::styled(r.status.to_string(), status_style(&r.status.to_string()))),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(16),
                Constraint::Percentage(9),
                Constraint::Percentage(40),
                Constraint::Percentage(14),
                Constraint::Percentage(7),
                Constraint::Percentage(14),
            ],
        )
        .header(header_row(&["Vehicle", "Time", "Route", "Driver", "ETA", "Status"]))
        .block(block)
        .row_highlight_style(highlight_style())
        .highlight_symbol("► ");
        frame.render_stateful_widget(table, area, &mut self.list_state.clone());
    }

    fn render_pharmacy(&self, frame: &mut Frame, area: Rect, store: &EntityStore) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .spacing(2)
            .split(area);

        let mut card = vec![
            Line::from(Span::styled(
                "Instantly order medicines prescribed in your last consultation.",
                Style::default().fg(theme::TEXT_DIM),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Prescription #8839",
                Style::default()
                    .fg(theme::TEXT)
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        for item in QUICK_PRESCRIPTION {
            card.push(Line::from(Span::styled(
                format!("  • {item}"),
                Style::default().fg(theme::TEXT_DIM),
            )));
        }
        card.push(Line::from(""));
        card.push(Line::from(vec![
            Span::styled("Total Bill  ", Style::default().fg(theme::HELP)),
            Span::styled(
                format_currency(QUICK_PRESCRIPTION_TOTAL),
                Style::default()
                    .fg(theme::TEXT)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
        card.push(Line::from(""));
        card.push(Line::from(Span::styled(
            " Order Now ",
            Style::default()
                .fg(theme::BACKGROUND)
                .bg(Color::Rgb(180, 160, 250))
                .add_modifier(Modifier::BOLD),
        )));
        frame.render_widget(
            Paragraph::new(card)
                .block(panel(" Quick Prescription Order ").padding(Padding::horizontal(2)))
                .wrap(Wrap { trim: true }),
            columns[0],
        );

        let mine = store.orders_for(&self.identity.id);
        let block = panel(" Recent Orders ");
        if mine.is_empty() {
            frame.render_widget(
                empty_state("No past orders found", "").block(block),
                columns[1],
            );
            return;
        }
        let rows = mine.iter().map(|o| {
            Row::new(vec![
                Cell::from(format!("{} Items", o.items.len())),
                Cell::from(o.date.date().to_string()),
                Cell::from(Span::styled(o.status.to_string(), status_style(&o.status.to_string()))),
                Cell::from(format_currency(o.total_amount)),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(25),
                Constraint::Percentage(30),
                Constraint::Percentage(22),
                Constraint::Percentage(23),
            ],
        )
        .header(header_row(&["Items", "Date", "Status", "Total"]))
        .block(block);
        frame.render_widget(table, columns[1]);
    }
}

fn severity_style(severity: Severity) -> Style {
    let color = match severity {
        Severity::Normal => theme::SUCCESS,
        Severity::Moderate => theme::WARNING,
        Severity::Severe => theme::DANGER,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

impl Dashboard for PatientDashboard {
    fn handle_input(
        &mut self,
        key: KeyEvent,
        store: &EntityStore,
    ) -> Result<Option<DashboardAction>> {
        if let Some(action) = handle_logout_dialog(&mut self.logout, key) {
            return Ok(action);
        }
        if self.form.is_some() {
            return Ok(self.handle_form_input(key));
        }

        match key.code {
            KeyCode::Esc => self.logout.show(),
            KeyCode::Tab => self.switch_tab(true),
            KeyCode::BackTab => self.switch_tab(false),
            _ => {
                return Ok(match self.tab {
                    PatientTab::Assistant => match key.code {
                        KeyCode::Char(c) => {
                            self.input.push(c);
                            None
                        }
                        KeyCode::Backspace => {
                            self.input.pop();
                            None
                        }
                        KeyCode::Enter => self.send_message(),
                        KeyCode::F(2) => {
                            if let Some(flow) = self.suggested_flow() {
                                self.open_flow(flow);
                            }
                            None
                        }
                        _ => None,
                    },
                    PatientTab::Consultations => {
                        match key.code {
                            KeyCode::Char('n') | KeyCode::Char('N') => self.open_booking(),
                            KeyCode::Down => {
                                self.scroll(store.consultations_for(&self.identity.id).len(), true)
                            }
                            KeyCode::Up => {
                                self.scroll(store.consultations_for(&self.identity.id).len(), false)
                            }
                            _ => {}
                        }
                        None
                    }
                    PatientTab::Emergency => {
                        match key.code {
                            KeyCode::Char('n') | KeyCode::Char('N') => self.open_emergency(),
                            KeyCode::Down => self.scroll(store.rides_for(&self.identity.id).len(), true),
                            KeyCode::Up => self.scroll(store.rides_for(&self.identity.id).len(), false),
                            _ => {}
                        }
                        None
                    }
                    PatientTab::Pharmacy => match key.code {
                        KeyCode::Enter | KeyCode::Char('o') | KeyCode::Char('O') => {
                            Some(DashboardAction::Apply(Self::quick_order()))
                        }
                        _ => None,
                    },
                });
            }
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, store: &EntityStore) {
        let tabs = vec![
            "AI Assistant".to_string(),
            format!("Consultations ({})", store.consultations_for(&self.identity.id).len()),
            format!("Emergency ({})", store.rides_for(&self.identity.id).len()),
            "Pharmacy".to_string(),
        ];
        let selected = PatientTab::ALL
            .iter()
            .position(|t| *t == self.tab())
            .unwrap_or(0);
        let help = if self.is_form_open() {
            "↑↓/Tab: Field | ←→: Change | Enter: Confirm | Esc: Cancel"
        } else {
            self.tab().help()
        };
        let body = render_chrome(
            frame,
            "MedX",
            &self.identity,
            &tabs,
            selected,
            help,
            &self.notice,
        );

        match &self.form {
            Some(PatientForm::Booking(form)) => form.render(frame, body),
            Some(PatientForm::Emergency(form)) => form.render(frame, body),
            None => match self.tab {
                PatientTab::Assistant => self.render_assistant(frame, body),
                PatientTab::Consultations => self.render_consultations(frame, body, store),
                PatientTab::Emergency => self.render_rides(frame, body, store),
                PatientTab::Pharmacy => self.render_pharmacy(frame, body, store),
            },
        }

        self.logout.render(frame);
    }

    fn report_error(&mut self, message: String) {
        self.loading = false;
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
    use crate::models::{ConsultationType, Role};
    use crate::store::NewConsultation;
    use crossterm::event::KeyModifiers;
    use time::macros::date;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn patient() -> Identity {
        Identity {
            id: "p1".to_string(),
            display_name: "Asha".to_string(),
            email: "asha@medx.test".to_string(),
            role: Role::Patient,
        }
    }

    fn press(dashboard: &mut PatientDashboard, store: &EntityStore, code: KeyCode) -> Option<DashboardAction> {
        dashboard.handle_input(key(code), store).unwrap()
    }

    #[test]
    fn opens_with_a_greeting() {
        let dashboard = PatientDashboard::new(patient());
        assert_eq!(dashboard.messages().len(), 1);
        assert!(dashboard.messages()[0].text.starts_with("Hello Asha, I'm your MedX Health Assistant."));
    }

    #[test]
    fn sending_symptoms_requests_triage_once() {
        let store = EntityStore::new();
        let mut dashboard = PatientDashboard::new(patient());
        for c in "chest pain".chars() {
            press(&mut dashboard, &store, KeyCode::Char(c));
        }
        assert_eq!(
            press(&mut dashboard, &store, KeyCode::Enter),
            Some(DashboardAction::Analyze("chest pain".to_string()))
        );
        assert!(dashboard.loading);
        assert!(dashboard.input.is_empty());

        press(&mut dashboard, &store, KeyCode::Char('x'));
        assert_eq!(press(&mut dashboard, &store, KeyCode::Enter), None);
    }

    #[test]
    fn blank_message_is_not_sent() {
        let store = EntityStore::new();
        let mut dashboard = PatientDashboard::new(patient());
        press(&mut dashboard, &store, KeyCode::Char(' '));
        assert_eq!(press(&mut dashboard, &store, KeyCode::Enter), None);
        assert_eq!(dashboard.messages().len(), 1);
    }

    #[test]
    fn severe_report_offers_emergency_dispatch() {
        let store = EntityStore::new();
        let mut dashboard = PatientDashboard::new(patient());
        dashboard.loading = true;
        dashboard.receive_report(&TriageReport {
            severity: Severity::Severe,
            advice: "Stay calm.".to_string(),
            suggested_action: "Request ambulance".to_string(),
        });
        assert!(!dashboard.loading);
        assert_eq!(dashboard.suggested_flow(), Some(PatientFlow::EmergencyDispatch));

        press(&mut dashboard, &store, KeyCode::F(2));
        assert!(dashboard.is_form_open());
        assert_eq!(dashboard.tab(), PatientTab::Emergency);
        let screen = render_to_text(140, 40, |frame| dashboard.render(frame, &store));
        assert!(screen.contains("Enter: Confirm | Esc: Cancel"));

        let action = press(&mut dashboard, &store, KeyCode::Enter);
        assert!(matches!(
            action,
            Some(DashboardAction::Apply(Command::RequestRide(_)))
        ));
        assert!(!dashboard.is_form_open());
    }

    #[test]
    fn normal_report_has_no_suggested_flow() {
        let store = EntityStore::new();
        let mut dashboard = PatientDashboard::new(patient());
        dashboard.receive_report(&crate::triage::fallback_report());
        assert_eq!(dashboard.suggested_flow(), None);
        press(&mut dashboard, &store, KeyCode::F(2));
        assert!(!dashboard.is_form_open());
    }

    #[test]
    fn pharmacy_tab_places_the_quick_prescription() {
        let store = EntityStore::new();
        let mut dashboard = PatientDashboard::new(patient());
        for _ in 0..3 {
            press(&mut dashboard, &store, KeyCode::Tab);
        }
        assert_eq!(dashboard.tab(), PatientTab::Pharmacy);
        match press(&mut dashboard, &store, KeyCode::Enter) {
            Some(DashboardAction::Apply(Command::PlaceOrder(order))) => {
                assert_eq!(order.items, vec!["Paracetamol 500mg", "Cough Syrup", "Vitamin C"]);
                assert_eq!(order.total_amount, 1250);
            }
            other => panic!("expected an order, got {other:?}"),
        }
    }

    #[test]
    fn escape_asks_before_logging_out() {
        let store = EntityStore::new();
        let mut dashboard = PatientDashboard::new(patient());
        assert_eq!(press(&mut dashboard, &store, KeyCode::Esc), None);
        assert_eq!(
            press(&mut dashboard, &store, KeyCode::Enter),
            Some(DashboardAction::Logout)
        );
    }

    #[test]
    fn consultations_tab_lists_only_own_bookings() {
        let mut store = EntityStore::with_demo_data();
        store
            .add_consultation(
                &patient(),
                NewConsultation {
                    hospital_id: "h3".to_string(),
                    date: date!(2024 - 01 - 01),
                    symptoms: "fever".to_string(),
                    kind: ConsultationType::Audio,
                },
            )
            .unwrap();
        let mut dashboard = PatientDashboard::new(patient());
        press(&mut dashboard, &store, KeyCode::Tab);

        let screen = render_to_text(120, 30, |frame| dashboard.render(frame, &store));
        assert!(screen.contains("KIMS"));
        assert!(screen.contains("₹299"));
        assert!(!screen.contains("Dr. Sarah Smith"));
    }
}
