//! Access-code prompt for the privileged portals.

use crate::components::{centered_rect, theme, Component};
use crate::gate::IssuedCode;
use crate::models::Role;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

const CODE_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeAction {
    Verify(String),
    Cancel,
}

#[derive(Debug, Default)]
pub struct CodeVerify {
    pub input: String,
    pub error_message: Option<String>,
    /// Code generated by this visit, shown once. Email delivery is not wired up.
    issued_notice: Option<String>,
    /// The portal the stored code opens.
    portal: Option<Role>,
}

impl CodeVerify {
    /// Prepares the prompt for a freshly looked-up code.
    pub fn new(issued: &IssuedCode) -> Self {
        Self {
            issued_notice: issued.newly_issued.then(|| issued.code.clone()),
            portal: Some(issued.role),
            ..Default::default()
        }
    }

    /// Shows a rejected attempt and clears the field.
    pub fn reject(&mut self, message: &str) {
        self.error_message = Some(message.to_string());
        self.input.clear();
    }
}

impl Component for CodeVerify {
    type Action = CodeAction;

    fn handle_input(&mut self, event: KeyEvent) -> Result<Option<CodeAction>> {
        match event.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if self.input.len() < CODE_LENGTH {
                    self.input.push(c);
                }
                self.error_message = None;
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.error_message = None;
            }
            KeyCode::Enter => return Ok(Some(CodeAction::Verify(self.input.clone()))),
            KeyCode::Esc => return Ok(Some(CodeAction::Cancel)),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BACKGROUND)),
            area,
        );

        let card = centered_rect(60, 70, area);
        frame.render_widget(Clear, card);
        let block = Block::default()
            .title(" Enter Permanent Access Code ")
            .title_alignment(Alignment::Center)
            .title_style(
                Style::default()
                    .fg(theme::TEXT)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::BORDER))
            .style(Style::default().bg(theme::PANEL));
        let inner = block.inner(card);
        frame.render_widget(block, card);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Portal
                Constraint::Length(4), // Issued code notice
                Constraint::Length(3), // Input
                Constraint::Length(2), // Error
                Constraint::Min(0),
                Constraint::Length(1), // Help
            ])
            .margin(1)
            .split(inner);

        if let Some(role) = self.portal {
            let portal = Paragraph::new(Line::from(vec![
                Span::styled("Portal: ", Style::default().fg(theme::TEXT_DIM)),
                Span::styled(
                    role.title(),
                    Style::default()
                        .fg(theme::ACCENT)
                        .add_modifier(Modifier::BOLD),
                ),
            ]))
            .alignment(Alignment::Center);
            frame.render_widget(portal, layout[0]);
        }

        if let Some(code) = &self.issued_notice {
            let notice = Paragraph::new(vec![
                Line::from(vec![
                    Span::styled(
                        "Your permanent access code is: ",
                        Style::default().fg(theme::TEXT),
                    ),
                    Span::styled(
                        code.as_str(),
                        Style::default()
                            .fg(theme::WARNING)
                            .add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(Span::styled(
                    "In production this will be sent to your email.",
                    Style::default().fg(theme::HELP),
                )),
            ])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            frame.render_widget(notice, layout[1]);
        }

        let input = Paragraph::new(self.input.as_str())
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title(" Access Code ")
                    .border_style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(
            input,
            layout[2].inner(Margin {
                vertical: 0,
                horizontal: 4,
            }),
        );

        if let Some(error) = &self.error_message {
            frame.render_widget(
                Paragraph::new(error.as_str())
                    .style(Style::default().fg(Color::Red))
                    .alignment(Alignment::Center),
                layout[3],
            );
        }

        let help = Paragraph::new("Enter: Verify | Esc: Back to portals")
            .style(Style::default().fg(theme::HELP))
            .alignment(Alignment::Center);
        frame.render_widget(help, layout[5]);
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

    fn issued(newly_issued: bool) -> IssuedCode {
        IssuedCode {
            code: "482913".to_string(),
            role: Role::Hospital,
            newly_issued,
        }
    }

    #[test]
    fn accepts_at_most_six_digits() {
        let mut prompt = CodeVerify::new(&issued(false));
        for c in "12a34567".chars() {
            prompt.handle_input(key(KeyCode::Char(c))).unwrap();
        }
        assert_eq!(prompt.input, "123456");
        assert_eq!(
            prompt.handle_input(key(KeyCode::Enter)).unwrap(),
            Some(CodeAction::Verify("123456".to_string()))
        );
    }

    #[test]
    fn escape_cancels() {
        let mut prompt = CodeVerify::new(&issued(false));
        assert_eq!(
            prompt.handle_input(key(KeyCode::Esc)).unwrap(),
            Some(CodeAction::Cancel)
        );
    }

    #[test]
    fn new_code_is_shown_once() {
        let fresh = CodeVerify::new(&issued(true));
        let screen = render_to_text(100, 30, |frame| fresh.render(frame));
        assert!(screen.contains("482913"));

        let returning = CodeVerify::new(&issued(false));
        let screen = render_to_text(100, 30, |frame| returning.render(frame));
        assert!(!screen.contains("482913"));
    }
}
