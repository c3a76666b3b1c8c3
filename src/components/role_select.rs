//! Portal picker shown after sign-in.

use crate::components::{theme, Component};
use crate::models::Role;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAction {
    Select(Role),
}

#[derive(Debug, Default)]
pub struct RoleSelect {
    user_name: String,
    selected: usize,
    pub error_message: Option<String>,
}

impl RoleSelect {
    pub fn new(user_name: &str) -> Self {
        Self {
            user_name: user_name.to_string(),
            ..Default::default()
        }
    }

    pub fn selected_role(&self) -> Role {
        Role::ALL[self.selected]
    }

    fn render_card(&self, frame: &mut Frame, area: Rect, index: usize) {
        let role = Role::ALL[index];
        let focused = index == self.selected;
        let border = if focused {
            theme::BORDER_FOCUS
        } else {
            theme::BORDER
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(theme::PANEL))
            .padding(Padding::new(2, 2, 1, 0));

        let mut lines = vec![
            Line::from(Span::styled(
                role.title(),
                Style::default()
                    .fg(if focused { theme::BORDER_FOCUS } else { theme::TEXT })
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                role.description(),
                Style::default().fg(theme::TEXT_DIM),
            )),
        ];
        if role != Role::Patient {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Access code required",
                Style::default().fg(theme::HELP),
            )));
        }

        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
            area,
        );
    }
}

impl Component for RoleSelect {
    type Action = RoleAction;

    fn handle_input(&mut self, event: KeyEvent) -> Result<Option<RoleAction>> {
        let count = Role::ALL.len();
        match event.code {
            KeyCode::Right | KeyCode::Tab => self.selected = (self.selected + 1) % count,
            KeyCode::Left | KeyCode::BackTab => self.selected = (self.selected + count - 1) % count,
            KeyCode::Down => self.selected = (self.selected + 2) % count,
            KeyCode::Up => self.selected = (self.selected + count - 2) % count,
            KeyCode::Char(c @ '1'..='4') => {
                self.selected = c as usize - '1' as usize;
                return Ok(Some(RoleAction::Select(self.selected_role())));
            }
            KeyCode::Enter => return Ok(Some(RoleAction::Select(self.selected_role()))),
            _ => {}
        }
        self.error_message = None;
        Ok(None)
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BACKGROUND)),
            area,
        );

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(1), // Instruction
                Constraint::Min(12),   // Cards
                Constraint::Length(1), // Error
                Constraint::Length(1), // Help
            ])
            .margin(1)
            .split(area);

        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                "Welcome to MedX, ",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.user_name.as_str(),
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

        let instruction = Paragraph::new("Select your portal:")
            .style(Style::default().fg(Color::Rgb(180, 190, 254)))
            .alignment(Alignment::Center);
        frame.render_widget(instruction, layout[1]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .margin(1)
            .split(layout[2]);
        for (row_index, row) in rows.iter().enumerate() {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .spacing(2)
                .split(*row);
            for (col_index, cell) in cols.iter().enumerate() {
                self.render_card(frame, *cell, row_index * 2 + col_index);
            }
        }

        if let Some(error) = &self.error_message {
            frame.render_widget(
                Paragraph::new(error.as_str())
                    .style(Style::default().fg(Color::Red))
                    .alignment(Alignment::Center),
                layout[3],
            );
        }

        let help = Paragraph::new("←→↑↓: Choose | Enter / 1-4: Open portal | Ctrl+Q: Quit")
            .style(Style::default().fg(theme::HELP))
            .alignment(Alignment::Center);
        frame.render_widget(help, layout[4]);
    }
}
