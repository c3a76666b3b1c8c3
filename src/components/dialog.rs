//! Yes/No confirmation popup shared by the login and dashboard screens.

use crate::components::theme;
use crate::tui::Frame;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

/// What the user did with an open dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogChoice {
    Confirmed,
    Dismissed,
}

#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    title: &'static str,
    question: &'static str,
    pub open: bool,
    /// 0: Yes, 1: No
    selected: usize,
}

impl ConfirmDialog {
    pub fn new(title: &'static str, question: &'static str) -> Self {
        Self {
            title,
            question,
            open: false,
            selected: 0,
        }
    }

    pub fn show(&mut self) {
        self.open = true;
        self.selected = 0;
    }

    /// Handles a key while the dialog is open.
    pub fn handle_input(&mut self, key: KeyEvent) -> Option<DialogChoice> {
        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                self.selected = 1 - self.selected;
                None
            }
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.open = false;
                Some(DialogChoice::Confirmed)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.open = false;
                Some(DialogChoice::Dismissed)
            }
            KeyCode::Enter => {
                self.open = false;
                if self.selected == 0 {
                    Some(DialogChoice::Confirmed)
                } else {
                    Some(DialogChoice::Dismissed)
                }
            }
            _ => None,
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        if !self.open {
            return;
        }

        let area = frame.area();
        let dialog_area = Rect::new(
            area.width.saturating_sub(44) / 2,
            area.height.saturating_sub(8) / 2,
            44.min(area.width),
            8.min(area.height),
        );
        frame.render_widget(Clear, dialog_area);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(
                Style::default()
                    .fg(theme::TEXT)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Rgb(140, 140, 200)))
            .style(Style::default().bg(Color::Rgb(30, 30, 46)));

        let button = |label: &'static str, active: bool, color: Color| {
            if active {
                Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD))
            } else {
                Span::styled(label, Style::default().fg(Color::Rgb(180, 180, 200)))
            }
        };

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                self.question,
                Style::default()
                    .fg(Color::Rgb(220, 220, 240))
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                button(" Yes ", self.selected == 0, theme::SUCCESS),
                Span::raw("    "),
                button(" No ", self.selected == 1, theme::DANGER),
            ]),
        ];

        frame.render_widget(
            Paragraph::new(text).block(block).alignment(Alignment::Center),
            dialog_area,
        );
    }
}
