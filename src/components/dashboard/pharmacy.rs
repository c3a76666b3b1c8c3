//! Pharmacy dashboard: the active order queue.

use super::{
    empty_state, handle_logout_dialog, header_row, highlight_style, logout_dialog, panel,
    render_chrome, Notice,
};
use crate::components::dialog::ConfirmDialog;
use crate::components::{status_style, step_selection, theme, Dashboard, DashboardAction};
use crate::models::{Identity, MedicineOrder, OrderStatus};
use crate::store::{Command, EntityStore};
use crate::tui::Frame;
use crate::utils::{format_currency, today};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Cell, Gauge, Paragraph, Row, Table, TableState},
};

/// Short order reference: the last six characters of the id.
fn order_reference(id: &str) -> String {
    let tail: String = id.chars().rev().take(6).collect::<Vec<_>>().into_iter().rev().collect();
    format!("#{}", tail.to_uppercase())
}

fn progress_color(status: OrderStatus) -> Color {
    match status {
        OrderStatus::Placed => Color::Rgb(99, 102, 241),
        OrderStatus::Preparing => theme::WARNING,
        OrderStatus::Ready => theme::INFO,
        OrderStatus::Delivered => theme::SUCCESS,
    }
}

pub struct PharmacyDashboard {
    identity: Identity,
    table_state: TableState,
    logout: ConfirmDialog,
    notice: Notice,
}

impl PharmacyDashboard {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            table_state: TableState::default().with_selected(Some(0)),
            logout: logout_dialog(),
            notice: Notice::default(),
        }
    }

    fn selected_order<'a>(&self, active: &[&'a MedicineOrder]) -> Option<&'a MedicineOrder> {
        if active.is_empty() {
            return None;
        }
        let index = self.table_state.selected().unwrap_or(0).min(active.len() - 1);
        Some(active[index])
    }

    fn advance_selected(&self, store: &EntityStore) -> Option<DashboardAction> {
        let active = store.active_orders();
        let order = self.selected_order(&active)?;
        order.status.next().map(|status| {
            DashboardAction::Apply(Command::AdvanceOrder {
                id: order.id.clone(),
                status,
            })
        })
    }

    fn render_queue(&self, frame: &mut Frame, area: Rect, active: &[&MedicineOrder]) {
        let rows = active.iter().map(|o| {
            Row::new(vec![
                Cell::from(order_reference(&o.id)),
                Cell::from(o.patient_name.clone()),
                Cell::from(format!("{} Items", o.items.len())),
                Cell::from(format_currency(o.total_amount)),
                Cell::from(Span::styled(o.status.to_string(), status_style(&o.status.to_string()))),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(18),
                Constraint::Percentage(28),
                Constraint::Percentage(16),
                Constraint::Percentage(18),
                Constraint::Percentage(20),
            ],
        )
        .header(header_row(&["Order", "Patient", "Items", "Total", "Status"]))
        .block(panel(" Active Orders "))
        .row_highlight_style(highlight_style())
        .highlight_symbol("► ");

        let mut state = self.table_state.clone();
        if state.selected().is_some_and(|i| i >= active.len()) {
            state.select(Some(active.len() - 1));
        }
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect, order: &MedicineOrder) {
        let block = panel(format!(" {} {} ", order.patient_name, order_reference(&order.id)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Items
                Constraint::Length(2), // Total
                Constraint::Length(1), // Action
                Constraint::Length(1),
                Constraint::Length(1), // Progress
            ])
            .margin(1)
            .split(inner);

        let mut items = vec![Line::from(Span::styled(
            "PRESCRIPTION ITEMS",
            Style::default()
                .fg(theme::HELP)
                .add_modifier(Modifier::BOLD),
        ))];
        for item in &order.items {
            items.push(Line::from(vec![
                Span::styled("✓ ", Style::default().fg(theme::SUCCESS)),
                Span::styled(item.as_str(), Style::default().fg(theme::TEXT)),
            ]));
        }
        frame.render_widget(Paragraph::new(items), layout[0]);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("TOTAL  ", Style::default().fg(theme::HELP)),
                Span::styled(
                    format_currency(order.total_amount),
                    Style::default()
                        .fg(theme::TEXT)
                        .add_modifier(Modifier::BOLD),
                ),
            ])),
            layout[1],
        );

        if let Some(action) = order.status.action_label() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!(" Enter: {action} "),
                    Style::default()
                        .fg(theme::BACKGROUND)
                        .bg(progress_color(order.status))
                        .add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Right),
                layout[2],
            );
        }

        let gauge = Gauge::default()
            .gauge_style(
                Style::default()
                    .fg(progress_color(order.status))
                    .bg(theme::HEADER_ROW),
            )
            .percent(order.status.progress_percent())
            .label(Span::styled(
                format!("{}%", order.status.progress_percent()),
                Style::default().fg(theme::TEXT),
            ));
        frame.render_widget(gauge, layout[4]);
    }
}

impl Dashboard for PharmacyDashboard {
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
            KeyCode::Up | KeyCode::Down => {
                let len = store.active_orders().len();
                let next = step_selection(self.table_state.selected(), len, key.code == KeyCode::Down);
                self.table_state.select(next.or(Some(0)));
            }
            KeyCode::Enter => return Ok(self.advance_selected(store)),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, store: &EntityStore) {
        let active = store.active_orders();
        let tabs = vec![format!("Active Orders ({})", active.len())];
        let body = render_chrome(
            frame,
            "MedX Pharma",
            &self.identity,
            &tabs,
            0,
            "↑↓: Select order | Enter: Advance order | Esc: Logout",
            &self.notice,
        );

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(6)])
            .split(body);

        let date = today();
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(
                    "Order Management",
                    Style::default()
                        .fg(theme::TEXT)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    "  Process prescriptions and dispatch deliveries.",
                    Style::default().fg(theme::TEXT_DIM),
                ),
                Span::styled(
                    format!("   {}, {} {}", date.weekday(), date.month(), date.day()),
                    Style::default().fg(theme::HELP),
                ),
            ])),
            layout[0],
        );

        let Some(order) = self.selected_order(&active) else {
            frame.render_widget(
                empty_state("No active orders", "New prescriptions will appear here.")
                    .block(panel(" Active Orders ")),
                layout[1],
            );
            self.logout.render(frame);
            return;
        };

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .spacing(1)
            .split(layout[1]);
        self.render_queue(frame, columns[0], &active);
        self.render_detail(frame, columns[1], order);

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
    use crate::models::Role;
    use crate::store::NewOrder;
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

    fn store_with_order() -> (EntityStore, String) {
        let mut store = EntityStore::new();
        let id = store
            .add_order(
                &identity("p1", "Asha", Role::Patient),
                NewOrder {
                    items: vec!["Paracetamol 500mg".to_string(), "Vitamin C".to_string()],
                    total_amount: 1250,
                },
            )
            .unwrap()
            .id
            .clone();
        (store, id)
    }

    #[test]
    fn reference_uses_the_id_tail() {
        assert_eq!(order_reference("1700000123456"), "#123456");
        assert_eq!(order_reference("ab"), "#AB");
    }

    #[test]
    fn enter_advances_the_selected_order_one_step() {
        let (mut store, id) = store_with_order();
        let mut dashboard = PharmacyDashboard::new(identity("ph1", "Counter", Role::Pharmacy));

        assert_eq!(
            dashboard.handle_input(key(KeyCode::Enter), &store).unwrap(),
            Some(DashboardAction::Apply(Command::AdvanceOrder {
                id: id.clone(),
                status: OrderStatus::Preparing,
            }))
        );

        store.update_order_status(&id, OrderStatus::Preparing).unwrap();
        assert_eq!(
            dashboard.handle_input(key(KeyCode::Enter), &store).unwrap(),
            Some(DashboardAction::Apply(Command::AdvanceOrder {
                id,
                status: OrderStatus::Ready,
            }))
        );
    }

    #[test]
    fn detail_shows_items_action_and_progress() {
        let (store, _) = store_with_order();
        let dashboard = PharmacyDashboard::new(identity("ph1", "Counter", Role::Pharmacy));
        let screen = render_to_text(140, 30, |frame| dashboard.render(frame, &store));
        assert!(screen.contains("Order Management"));
        assert!(screen.contains("Paracetamol 500mg"));
        assert!(screen.contains("Accept & Prepare"));
        assert!(screen.contains("₹1,250"));
        assert!(screen.contains("10%"));
    }

    #[test]
    fn delivered_orders_leave_the_queue() {
        let (mut store, id) = store_with_order();
        for status in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Delivered] {
            store.update_order_status(&id, status).unwrap();
        }
        let mut dashboard = PharmacyDashboard::new(identity("ph1", "Counter", Role::Pharmacy));
        assert_eq!(dashboard.handle_input(key(KeyCode::Enter), &store).unwrap(), None);
        let screen = render_to_text(140, 30, |frame| dashboard.render(frame, &store));
        assert!(screen.contains("No active orders"));
    }
}
