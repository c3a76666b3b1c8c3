//! Top-level screen routing.
//!
//! The app is always on exactly one [`Screen`]. Moving between screens goes through
//! [`Screen::apply`], which holds the full transition table; a transition that is not
//! in the table is rejected and the caller keeps its current screen.

use crate::models::Role;
use thiserror::Error;

/// The screen the application is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Email/password sign-in.
    Auth,
    /// Portal picker shown after sign-in.
    RoleSelection,
    /// Access-code prompt for privileged portals.
    CodeVerification,
    /// A role-specific dashboard.
    Dashboard(Role),
}

/// Events that move the router between screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    LoggedIn,
    PatientSelected,
    PrivilegedSelected,
    /// The entered code matched; carries the role stored with the code.
    CodeAccepted(Role),
    CodeRejected,
    Cancelled,
    LoggedOut,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no transition from {from:?} on {transition:?}")]
pub struct RouterError {
    pub from: Screen,
    pub transition: Transition,
}

impl Screen {
    /// Returns the screen reached from `self` on `transition`.
    pub fn apply(self, transition: Transition) -> Result<Screen, RouterError> {
        use Transition::*;

        let next = match (self, transition) {
            (Screen::Auth, LoggedIn) => Screen::RoleSelection,
            (Screen::RoleSelection, PatientSelected) => Screen::Dashboard(Role::Patient),
            (Screen::RoleSelection, PrivilegedSelected) => Screen::CodeVerification,
            (Screen::CodeVerification, CodeAccepted(role)) => Screen::Dashboard(role),
            (Screen::CodeVerification, CodeRejected) => Screen::CodeVerification,
            (Screen::CodeVerification, Cancelled) => Screen::RoleSelection,
            (Screen::Dashboard(_), LoggedOut) => Screen::Auth,
            _ => {
                return Err(RouterError {
                    from: self,
                    transition,
                })
            }
        };
        Ok(next)
    }
}
