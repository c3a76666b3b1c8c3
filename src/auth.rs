//! Sign-in, sign-out and the single-active-session check.

use crate::db::{ActiveUser, DbError, DocumentStore};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// The account a provider session belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: String,
}

impl IdentityProfile {
    /// Name to show for this account.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("User")
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please enter email and password")]
    MissingCredentials,

    #[error("Sign-in failed: {0}")]
    Provider(String),

    #[error("This account is already logged in on another device.")]
    SessionActive,

    #[error(transparent)]
    Store(#[from] DbError),
}

/// External identity provider.
pub trait IdentityProvider {
    /// Starts a session for the credentials' account.
    fn sign_in(&mut self, credentials: &Credentials) -> Result<IdentityProfile, AuthError>;

    /// Ends the current session, if any.
    fn sign_out(&mut self) -> Result<(), AuthError>;

    /// The account with a live session.
    fn current(&self) -> Option<&IdentityProfile>;
}

/// Offline provider that accepts any credentials and derives a stable uid from the
/// email address, so the same person maps to the same records across runs.
#[derive(Debug, Default)]
pub struct LocalIdentityProvider {
    session: Option<IdentityProfile>,
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn uid_for(email: &str) -> String {
        let slug: String = email
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        format!("local-{slug}")
    }

    fn display_name_for(email: &str) -> Option<String> {
        let local = email.trim().split('@').next()?.trim();
        let mut chars = local.chars();
        let first = chars.next()?;
        Some(first.to_uppercase().chain(chars).collect())
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn sign_in(&mut self, credentials: &Credentials) -> Result<IdentityProfile, AuthError> {
        let email = credentials.email.trim();
        if email.is_empty() || credentials.password.trim().is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let profile = IdentityProfile {
            uid: Self::uid_for(email),
            display_name: Self::display_name_for(email),
            email: email.to_string(),
        };
        self.session = Some(profile.clone());
        Ok(profile)
    }

    fn sign_out(&mut self) -> Result<(), AuthError> {
        self.session = None;
        Ok(())
    }

    fn current(&self) -> Option<&IdentityProfile> {
        self.session.as_ref()
    }
}

/// The local form check: both fields must be non-blank.
///
/// Passing it starts no provider session.
pub fn check_credentials(credentials: &Credentials) -> Result<(), AuthError> {
    if credentials.email.trim().is_empty() || credentials.password.trim().is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(())
}

/// Signs in and claims the account's single active session.
///
/// When `single_session` is set and the account is already marked active, the new
/// provider session is ended again and [`AuthError::SessionActive`] is returned. The
/// check and the claim are separate reads and writes, so two devices signing in at the
/// same moment can both get through.
pub fn login(
    provider: &mut dyn IdentityProvider,
    store: &mut dyn DocumentStore,
    credentials: &Credentials,
    single_session: bool,
) -> Result<IdentityProfile, AuthError> {
    check_credentials(credentials)?;

    let profile = provider.sign_in(credentials)?;

    if single_session {
        let active = store.active_user(&profile.uid).map_err(|e| {
            error!(error = %e, "active session lookup failed");
            abandon_session(provider);
            e
        })?;
        if active.is_some_and(|record| record.is_active) {
            warn!(uid = %profile.uid, "sign-in refused: session active elsewhere");
            abandon_session(provider);
            return Err(AuthError::SessionActive);
        }
    }

    let record = ActiveUser {
        email: profile.email.clone(),
        is_active: true,
    };
    if let Err(e) = store.set_active_user(&profile.uid, &record) {
        error!(error = %e, "failed to claim active session");
        abandon_session(provider);
        return Err(e.into());
    }

    info!(uid = %profile.uid, "signed in");
    Ok(profile)
}

fn abandon_session(provider: &mut dyn IdentityProvider) {
    if let Err(e) = provider.sign_out() {
        error!(error = %e, "sign-out after refused sign-in failed");
    }
}

/// Releases the active session and ends the provider session.
///
/// Failures are logged and do not stop the sign-out.
pub fn logout(provider: &mut dyn IdentityProvider, store: &mut dyn DocumentStore) {
    if let Some(profile) = provider.current().cloned() {
        let record = ActiveUser {
            email: profile.email.clone(),
            is_active: false,
        };
        if let Err(e) = store.set_active_user(&profile.uid, &record) {
            error!(uid = %profile.uid, error = %e, "failed to release active session");
        }
        info!(uid = %profile.uid, "signed out");
    }

    if let Err(e) = provider.sign_out() {
        error!(error = %e, "provider sign-out failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// Provider that refuses every sign-in.
    struct DownProvider;

    impl IdentityProvider for DownProvider {
        fn sign_in(&mut self, _: &Credentials) -> Result<IdentityProfile, AuthError> {
            Err(AuthError::Provider("popup closed".to_string()))
        }
        fn sign_out(&mut self) -> Result<(), AuthError> {
            Ok(())
        }
        fn current(&self) -> Option<&IdentityProfile> {
            None
        }
    }

    #[test]
    fn blank_credentials_are_rejected_before_the_provider() {
        let mut provider = LocalIdentityProvider::new();
        let mut store = SqliteStore::open_in_memory().unwrap();
        for (email, password) in [("", "pw"), ("a@b.c", ""), ("   ", "  ")] {
            let err = login(&mut provider, &mut store, &credentials(email, password), true)
                .unwrap_err();
            assert!(matches!(err, AuthError::MissingCredentials));
        }
        assert!(provider.current().is_none());
    }

    #[test]
    fn form_check_needs_both_fields() {
        assert!(check_credentials(&credentials(" asha@medx.test ", "pw")).is_ok());
        assert!(matches!(
            check_credentials(&credentials("asha@medx.test", " ")),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn local_provider_derives_stable_identity() {
        let mut provider = LocalIdentityProvider::new();
        let first = provider.sign_in(&credentials(" Asha.R@Medx.test ", "pw")).unwrap();
        let second = provider.sign_in(&credentials("asha.r@medx.test", "other")).unwrap();
        assert_eq!(first.uid, second.uid);
        assert_eq!(first.uid, "local-asha-r-medx-test");
        assert_eq!(first.name(), "Asha.R");
    }

    #[test]
    fn login_marks_the_account_active() {
        let mut provider = LocalIdentityProvider::new();
        let mut store = SqliteStore::open_in_memory().unwrap();
        let profile = login(&mut provider, &mut store, &credentials("asha@medx.test", "pw"), true)
            .unwrap();

        let record = store.active_user(&profile.uid).unwrap().unwrap();
        assert!(record.is_active);
        assert_eq!(provider.current(), Some(&profile));
    }

    #[test]
    fn second_login_is_refused_while_active() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut first_device = LocalIdentityProvider::new();
        let mut second_device = LocalIdentityProvider::new();
        let creds = credentials("asha@medx.test", "pw");

        login(&mut first_device, &mut store, &creds, true).unwrap();
        let err = login(&mut second_device, &mut store, &creds, true).unwrap_err();
        assert!(matches!(err, AuthError::SessionActive));
        assert!(second_device.current().is_none());

        logout(&mut first_device, &mut store);
        assert!(login(&mut second_device, &mut store, &creds, true).is_ok());
    }

    #[test]
    fn single_session_check_can_be_disabled() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let creds = credentials("asha@medx.test", "pw");
        login(&mut LocalIdentityProvider::new(), &mut store, &creds, false).unwrap();
        assert!(login(&mut LocalIdentityProvider::new(), &mut store, &creds, false).is_ok());
    }

    #[test]
    fn provider_failure_leaves_store_untouched() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let err = login(&mut DownProvider, &mut store, &credentials("a@b.c", "pw"), true)
            .unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));
        assert!(store.active_user("local-a-b-c").unwrap().is_none());
    }

    #[test]
    fn logout_releases_the_session() {
        let mut provider = LocalIdentityProvider::new();
        let mut store = SqliteStore::open_in_memory().unwrap();
        let profile = login(&mut provider, &mut store, &credentials("ravi@medx.test", "pw"), true)
            .unwrap();

        logout(&mut provider, &mut store);
        assert!(provider.current().is_none());
        assert!(!store.active_user(&profile.uid).unwrap().unwrap().is_active);
    }
}
