//! Login component for MedX.

use crate::auth::Credentials;
use crate::components::dialog::{ConfirmDialog, DialogChoice};
use crate::components::{theme, Component};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Paragraph},
};
use std::time::{Duration, Instant};

const EMAIL_FIELD: usize = 0;
const PASSWORD_FIELD: usize = 1;
const SIGN_IN_BUTTON: usize = 2;
const EXIT_BUTTON: usize = 3;
const FOCUS_COUNT: usize = 4;

const ERROR_TIMEOUT: Duration = Duration::from_secs(5);

/// What the login screen asks the app to do.
#[derive(Debug, Clone)]
pub enum LoginAction {
    /// Sign In: the local form check only.
    Submit(Credentials),
    /// F2: sign in through the identity provider.
    ProviderSignIn(Credentials),
    Quit,
}

/// Represents the login UI component.
#[derive(Debug)]
pub struct Login {
    pub email: String,
    pub password: String,
    /// Focused element (0: Email, 1: Password, 2: Sign In, 3: Exit)
    pub selected_index: usize,
    pub error_message: Option<String>,
    exit_dialog: ConfirmDialog,
    /// Time when the error message was last shown.
    error_message_time: Option<Instant>,
}

impl Default for Login {
    fn default() -> Self {
        Self::new()
    }
}

impl Login {
    pub fn new() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            selected_index: EMAIL_FIELD,
            error_message: None,
            exit_dialog: ConfirmDialog::new("Confirm Exit", "Are you sure you want to quit?"),
            error_message_time: None,
        }
    }

    /// Clears the form for the next sign-in.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn clear_error_message(&mut self) {
        self.error_message = None;
        self.error_message_time = None;
    }

    /// Shows an error under the form; it clears on typing or after five seconds.
    pub fn set_error_message(&mut self, message: String) {
        self.error_message = Some(message);
        self.error_message_time = Some(Instant::now());
    }

    /// Checks if the error message should be hidden (timeout).
    pub fn check_error_timeout(&mut self) {
        if let Some(time) = self.error_message_time {
            if time.elapsed() >= ERROR_TIMEOUT {
                self.clear_error_message();
            }
        }
    }

    fn credentials(&self) -> Credentials {
        Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }

    fn input_block(&self, title: &'static str, index: usize) -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(title)
            .style(Style::default().fg(if self.selected_index == index {
                Color::Cyan
            } else {
                Color::White
            }))
    }

    fn button(&self, label: &'static str, index: usize, active: Color) -> Paragraph<'static> {
        Paragraph::new(Span::styled(
            label,
            Style::default()
                .fg(if self.selected_index == index {
                    active
                } else {
                    Color::Gray
                })
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
    }
}

impl Component for Login {
    type Action = LoginAction;

    fn handle_input(&mut self, event: KeyEvent) -> Result<Option<LoginAction>> {
        self.check_error_timeout();

        if self.exit_dialog.open {
            if let Some(DialogChoice::Confirmed) = self.exit_dialog.handle_input(event) {
                return Ok(Some(LoginAction::Quit));
            }
            return Ok(None);
        }

        match event.code {
            KeyCode::Char(c) => {
                match self.selected_index {
                    EMAIL_FIELD => self.email.push(c),
                    PASSWORD_FIELD => self.password.push(c),
                    _ => {}
                }
                self.clear_error_message();
            }
            KeyCode::Backspace => {
                match self.selected_index {
                    EMAIL_FIELD => {
                        self.email.pop();
                    }
                    PASSWORD_FIELD => {
                        self.password.pop();
                    }
                    _ => {}
                }
                self.clear_error_message();
            }
            KeyCode::Tab | KeyCode::Down => {
                self.selected_index = (self.selected_index + 1) % FOCUS_COUNT;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.selected_index = (self.selected_index + FOCUS_COUNT - 1) % FOCUS_COUNT;
            }
            KeyCode::Enter => {
                if self.selected_index == EXIT_BUTTON {
                    self.exit_dialog.show();
                } else {
                    return Ok(Some(LoginAction::Submit(self.credentials())));
                }
            }
            KeyCode::F(2) => return Ok(Some(LoginAction::ProviderSignIn(self.credentials()))),
            KeyCode::Esc => self.exit_dialog.show(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame) {
        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BACKGROUND)),
            frame.area(),
        );

        let vertical_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(7), // Title
                Constraint::Length(2), // Slogan
                Constraint::Length(1), // Spacing
                Constraint::Length(1), // "Welcome Back"
                Constraint::Length(1), // Spacing
                Constraint::Length(3), // Email
                Constraint::Length(3), // Password
                Constraint::Length(2), // Error message
                Constraint::Length(1), // Sign In
                Constraint::Length(1), // Exit
                Constraint::Length(2), // Spacing
                Constraint::Length(1), // Footer
                Constraint::Length(1), // Help
                Constraint::Min(0),
            ])
            .margin(1)
            .split(frame.area());

        let title = Paragraph::new(Text::from(vec![
            Line::from("███╗   ███╗███████╗██████╗ ██╗  ██╗"),
            Line::from("████╗ ████║██╔════╝██╔══██╗╚██╗██╔╝"),
            Line::from("██╔████╔██║█████╗  ██║  ██║ ╚███╔╝ "),
            Line::from("██║╚██╔╝██║██╔══╝  ██║  ██║ ██╔██╗ "),
            Line::from("██║ ╚═╝ ██║███████╗██████╔╝██╔╝ ██╗"),
            Line::from("╚═╝     ╚═╝╚══════╝╚═════╝ ╚═╝  ╚═╝"),
        ]))
        .alignment(Alignment::Center)
        .style(Style::default().fg(theme::DANGER));
        frame.render_widget(title, vertical_layout[0]);

        let slogan = Paragraph::new(Text::from(vec![
            Line::from(Span::styled(
                "Healthcare Reimagined.",
                Style::default()
                    .fg(theme::DANGER)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::ITALIC),
            )),
            Line::from(Span::styled(
                "AI-powered diagnostics, instant emergency response, and seamless care.",
                Style::default().fg(Color::Gray),
            )),
        ]))
        .alignment(Alignment::Center);
        frame.render_widget(slogan, vertical_layout[1]);

        let subtitle = Paragraph::new(Span::styled(
            "Welcome Back",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center);
        frame.render_widget(subtitle, vertical_layout[3]);

        let field_margin = Margin {
            vertical: 0,
            horizontal: 1,
        };

        let email_input = Paragraph::new(self.email.as_str())
            .block(self.input_block(" Email Address (press `TAB` or `Arrow Keys` to switch) ", EMAIL_FIELD));
        frame.render_widget(email_input, vertical_layout[5].inner(field_margin));

        let password_input = Paragraph::new("•".repeat(self.password.chars().count()))
            .block(self.input_block(" Password ", PASSWORD_FIELD));
        frame.render_widget(password_input, vertical_layout[6].inner(field_margin));

        if let Some(error) = &self.error_message {
            let error_paragraph = Paragraph::new(error.as_str())
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center);
            frame.render_widget(error_paragraph, vertical_layout[7]);
        }

        frame.render_widget(
            self.button("Sign In", SIGN_IN_BUTTON, theme::SUCCESS),
            vertical_layout[8],
        );
        frame.render_widget(
            self.button("Exit", EXIT_BUTTON, Color::Yellow),
            vertical_layout[9],
        );

        let footer = Paragraph::new("Protected by MedX Secure Health Cloud")
            .style(Style::default().fg(theme::HELP))
            .alignment(Alignment::Center);
        frame.render_widget(footer, vertical_layout[11]);

        let help = Paragraph::new("Enter: Sign In | F2: Continue with identity provider | Esc: Exit")
            .style(Style::default().fg(theme::HELP))
            .alignment(Alignment::Center);
        frame.render_widget(help, vertical_layout[12]);

        self.exit_dialog.render(frame);
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

    fn type_text(login: &mut Login, text: &str) {
        for c in text.chars() {
            login.handle_input(key(KeyCode::Char(c))).unwrap();
        }
    }

    #[test]
    fn enter_submits_the_typed_credentials() {
        let mut login = Login::new();
        type_text(&mut login, "asha@medx.test");
        login.handle_input(key(KeyCode::Tab)).unwrap();
        type_text(&mut login, "secret");

        match login.handle_input(key(KeyCode::Enter)).unwrap() {
            Some(LoginAction::Submit(credentials)) => {
                assert_eq!(credentials.email, "asha@medx.test");
                assert_eq!(credentials.password, "secret");
            }
            other => panic!("expected a submit, got {other:?}"),
        }
    }

    #[test]
    fn f2_hands_the_form_to_the_identity_provider() {
        let mut login = Login::new();
        type_text(&mut login, "asha@medx.test");

        match login.handle_input(key(KeyCode::F(2))).unwrap() {
            Some(LoginAction::ProviderSignIn(credentials)) => {
                assert_eq!(credentials.email, "asha@medx.test");
                assert!(credentials.password.is_empty());
            }
            other => panic!("expected a provider sign-in, got {other:?}"),
        }
    }

    #[test]
    fn typing_clears_the_error() {
        let mut login = Login::new();
        login.set_error_message("Please enter email and password".to_string());
        type_text(&mut login, "a");
        assert!(login.error_message.is_none());
    }

    #[test]
    fn exit_needs_confirmation() {
        let mut login = Login::new();
        assert!(login.handle_input(key(KeyCode::Esc)).unwrap().is_none());
        assert!(matches!(
            login.handle_input(key(KeyCode::Enter)).unwrap(),
            Some(LoginAction::Quit)
        ));
    }

    #[test]
    fn password_is_masked() {
        let mut login = Login::new();
        login.handle_input(key(KeyCode::Down)).unwrap();
        type_text(&mut login, "hunter2");
        let screen = render_to_text(100, 40, |frame| login.render(frame));
        assert!(!screen.contains("hunter2"));
        assert!(screen.contains("Welcome Back"));
        assert!(screen.contains("F2: Continue with identity provider"));
    }
}
