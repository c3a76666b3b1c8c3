//! The main application state and logic for MedX.
//!
//! [`App`] owns the entity store, the document store and the identity provider, and
//! routes input to whichever screen the router is on. Dashboards never write to the
//! store themselves; they hand back a [`DashboardAction`] and the app applies it on
//! behalf of the session identity.

use crate::auth::{self, Credentials, IdentityProfile, IdentityProvider};
use crate::components::code_verify::{CodeAction, CodeVerify};
use crate::components::dashboard::ActiveDashboard;
use crate::components::login::{Login, LoginAction};
use crate::components::role_select::{RoleAction, RoleSelect};
use crate::components::{Component, DashboardAction};
use crate::db::DocumentStore;
use crate::gate;
use crate::models::{Identity, Role, TriageReport};
use crate::router::{Screen, Transition};
use crate::store::{Command, EntityStore};
use crate::triage::{fallback_report, TriageAdvisor};
use crate::tui::{self, Frame, Tui};
use anyhow::Result;
use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

pub struct App {
    screen: Screen,
    /// Flag indicating if the application should quit.
    pub should_quit: bool,
    store: EntityStore,
    provider: Box<dyn IdentityProvider>,
    documents: Box<dyn DocumentStore>,
    advisor: Arc<TriageAdvisor>,
    single_session: bool,
    /// The signed-in account, from sign-in until sign-out.
    profile: Option<IdentityProfile>,
    /// The identity the open dashboard acts as.
    session: Option<Identity>,
    login: Login,
    role_select: RoleSelect,
    code_verify: CodeVerify,
    dashboard: Option<ActiveDashboard>,
    /// Pending triage result from the worker thread.
    triage_rx: Option<Receiver<TriageReport>>,
}

impl App {
    pub fn new(
        provider: Box<dyn IdentityProvider>,
        documents: Box<dyn DocumentStore>,
        advisor: Arc<TriageAdvisor>,
        single_session: bool,
    ) -> Self {
        Self {
            screen: Screen::Auth,
            should_quit: false,
            store: EntityStore::with_demo_data(),
            provider,
            documents,
            advisor,
            single_session,
            profile: None,
            session: None,
            login: Login::new(),
            role_select: RoleSelect::default(),
            code_verify: CodeVerify::default(),
            dashboard: None,
            triage_rx: None,
        }
    }

    #[cfg(test)]
    fn screen(&self) -> Screen {
        self.screen
    }

    #[cfg(test)]
    fn store(&self) -> &EntityStore {
        &self.store
    }

    #[cfg(test)]
    fn session(&self) -> Option<&Identity> {
        self.session.as_ref()
    }

    /// Runs the application's main loop until a quit is requested.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing or reading terminal events fails.
    pub fn run(&mut self, tui: &mut Tui) -> Result<()> {
        while !self.should_quit {
            tui.draw(|frame| self.render(frame))?;

            match tui.next_event()? {
                tui::Event::Input(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    self.handle_key(key)?
                }
                tui::Event::Input(_) => {}
                tui::Event::Tick => self.tick(),
            }
        }
        Ok(())
    }

    /// Routes a key press to the current screen.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Global keybinding: Ctrl+Q to quit
        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return Ok(());
        }

        match self.screen {
            Screen::Auth => match self.login.handle_input(key)? {
                Some(LoginAction::Submit(credentials)) => self.check_form(&credentials),
                Some(LoginAction::ProviderSignIn(credentials)) => self.sign_in(credentials),
                Some(LoginAction::Quit) => self.quit(),
                None => {}
            },
            Screen::RoleSelection => {
                if let Some(RoleAction::Select(role)) = self.role_select.handle_input(key)? {
                    self.select_role(role);
                }
            }
            Screen::CodeVerification => match self.code_verify.handle_input(key)? {
                Some(CodeAction::Verify(code)) => self.verify_code(&code),
                Some(CodeAction::Cancel) => self.cancel_verification(),
                None => {}
            },
            Screen::Dashboard(_) => {
                let action = match self.dashboard.as_mut() {
                    Some(dashboard) => dashboard.as_dashboard_mut().handle_input(key, &self.store)?,
                    None => None,
                };
                match action {
                    Some(DashboardAction::Apply(command)) => self.dispatch(command),
                    Some(DashboardAction::Analyze(symptoms)) => self.request_triage(symptoms),
                    Some(DashboardAction::Logout) => self.sign_out(),
                    None => {}
                }
            }
        }
        Ok(())
    }

    /// Periodic work between key presses.
    pub fn tick(&mut self) {
        match self.screen {
            Screen::Auth => self.login.check_error_timeout(),
            Screen::Dashboard(_) => {
                self.poll_triage();
                if let Some(dashboard) = self.dashboard.as_mut() {
                    dashboard.as_dashboard_mut().tick();
                }
            }
            Screen::RoleSelection | Screen::CodeVerification => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        match self.screen {
            Screen::Auth => self.login.render(frame),
            Screen::RoleSelection => self.role_select.render(frame),
            Screen::CodeVerification => self.code_verify.render(frame),
            Screen::Dashboard(_) => {
                if let Some(dashboard) = &self.dashboard {
                    dashboard.as_dashboard().render(frame, &self.store);
                }
            }
        }
    }

    /// Moves the router; a transition missing from the table is logged and ignored.
    fn go(&mut self, transition: Transition) -> bool {
        match self.screen.apply(transition) {
            Ok(next) => {
                debug!(from = ?self.screen, to = ?next, "screen change");
                self.screen = next;
                true
            }
            Err(err) => {
                warn!(error = %err, "screen transition rejected");
                false
            }
        }
    }

    /// Sign In on the form: passes on non-blank fields without a provider session.
    fn check_form(&mut self, credentials: &Credentials) {
        match auth::check_credentials(credentials) {
            Ok(()) => {
                info!("form sign-in without an identity provider session");
                self.role_select = RoleSelect::new("User");
                self.login.reset();
                self.go(Transition::LoggedIn);
            }
            Err(err) => self.login.set_error_message(err.to_string()),
        }
    }

    fn sign_in(&mut self, credentials: Credentials) {
        let result = auth::login(
            self.provider.as_mut(),
            self.documents.as_mut(),
            &credentials,
            self.single_session,
        );
        match result {
            Ok(profile) => {
                self.role_select = RoleSelect::new(profile.name());
                self.login.reset();
                self.profile = Some(profile);
                self.go(Transition::LoggedIn);
            }
            Err(err) => {
                warn!(error = %err, "sign-in failed");
                self.login.set_error_message(err.to_string());
            }
        }
    }

    fn select_role(&mut self, role: Role) {
        let Some(profile) = self.profile.clone() else {
            warn!(%role, "portal picked without a signed-in account");
            self.role_select.error_message =
                Some("Continue with the identity provider to open a portal".to_string());
            return;
        };

        if !gate::requires_code(role) {
            if self.go(Transition::PatientSelected) {
                self.open_dashboard(&profile, Role::Patient);
            }
            return;
        }

        match gate::issue_code_if_absent(self.documents.as_mut(), &profile.uid, &profile.email, role)
        {
            Ok(issued) => {
                if issued.role != role {
                    info!(picked = %role, stored = %issued.role, "access code belongs to another portal");
                }
                self.code_verify = CodeVerify::new(&issued);
                self.go(Transition::PrivilegedSelected);
            }
            Err(err) => {
                error!(error = %err, "access code lookup failed");
                self.role_select.error_message = Some(err.to_string());
            }
        }
    }

    fn verify_code(&mut self, entered: &str) {
        let Some(profile) = self.profile.clone() else {
            warn!("code entered without a signed-in account");
            return;
        };

        match gate::verify(self.documents.as_mut(), &profile.uid, entered) {
            Ok(Some(role)) => {
                if self.go(Transition::CodeAccepted(role)) {
                    self.open_dashboard(&profile, role);
                }
            }
            Ok(None) => {
                self.go(Transition::CodeRejected);
                self.code_verify.reject("Invalid access code");
            }
            Err(err) => {
                error!(error = %err, "access code check failed");
                self.code_verify.reject(&err.to_string());
            }
        }
    }

    fn cancel_verification(&mut self) {
        if self.go(Transition::Cancelled) {
            self.code_verify = CodeVerify::default();
        }
    }

    fn open_dashboard(&mut self, profile: &IdentityProfile, role: Role) {
        let identity = Identity {
            id: profile.uid.clone(),
            display_name: profile.name().to_string(),
            email: profile.email.clone(),
            role,
        };
        info!(uid = %identity.id, %role, "dashboard opened");
        self.dashboard = Some(ActiveDashboard::for_identity(&identity));
        self.session = Some(identity);
    }

    /// Applies a dashboard command as the session identity.
    fn dispatch(&mut self, command: Command) {
        let Some(identity) = self.session.as_ref() else {
            warn!(?command, "command without a session dropped");
            return;
        };

        match self.store.apply(identity, command) {
            Ok(outcome) => debug!(?outcome, "command applied"),
            Err(err) => {
                warn!(error = %err, "command rejected");
                if let Some(dashboard) = self.dashboard.as_mut() {
                    dashboard.as_dashboard_mut().report_error(err.to_string());
                }
            }
        }
    }

    /// Runs the triage model off the UI thread; the result is picked up on a tick.
    fn request_triage(&mut self, symptoms: String) {
        let advisor = Arc::clone(&self.advisor);
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let report = advisor.analyze(&symptoms);
            if tx.send(report).is_err() {
                debug!("triage result dropped, session ended");
            }
        });
        self.triage_rx = Some(rx);
    }

    fn poll_triage(&mut self) {
        let Some(rx) = &self.triage_rx else {
            return;
        };
        let report = match rx.try_recv() {
            Ok(report) => report,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                error!("triage worker exited without a result");
                fallback_report()
            }
        };
        self.triage_rx = None;

        if let Some(ActiveDashboard::Patient(dashboard)) = self.dashboard.as_mut() {
            dashboard.receive_report(&report);
        }
    }

    fn clear_session(&mut self) {
        auth::logout(self.provider.as_mut(), self.documents.as_mut());
        self.profile = None;
        self.session = None;
        self.dashboard = None;
        self.triage_rx = None;
        self.role_select = RoleSelect::default();
        self.code_verify = CodeVerify::default();
    }

    fn sign_out(&mut self) {
        self.clear_session();
        self.login.reset();
        self.go(Transition::LoggedOut);
    }

    /// Quits, releasing the active session first so the account can sign in again.
    fn quit(&mut self) {
        if self.profile.is_some() {
            self.clear_session();
        }
        info!("quit requested");
        self.should_quit = true;
    }
}
