//! Access gate for the privileged portals.
//!
//! Hospital, driver and pharmacy accounts get a permanent 6-digit code the first time
//! they pick one of those portals, and must enter it before the dashboard opens. Patients
//! skip the gate.

use crate::db::{AccessCodeRecord, DbError, DocumentStore};
use crate::models::Role;
use rand::Rng;
use tracing::{info, warn};

/// Result of [`issue_code_if_absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    pub code: String,
    /// The role stored with the code, which is the portal the code opens.
    pub role: Role,
    /// `true` when this call generated the code.
    pub newly_issued: bool,
}

/// Whether `role` must pass the access-code check.
pub fn requires_code(role: Role) -> bool {
    !matches!(role, Role::Patient)
}

fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Returns the identity's access code, generating and storing one if none exists.
///
/// An existing record is returned untouched, role included.
pub fn issue_code_if_absent(
    store: &mut dyn DocumentStore,
    uid: &str,
    email: &str,
    role: Role,
) -> Result<IssuedCode, DbError> {
    if let Some(existing) = store.access_code(uid)? {
        return Ok(IssuedCode {
            code: existing.code,
            role: existing.role,
            newly_issued: false,
        });
    }

    let record = AccessCodeRecord {
        email: email.to_string(),
        role,
        code: generate_code(),
        verified: false,
    };
    store.set_access_code(uid, &record)?;
    info!(uid, %role, "access code issued");

    Ok(IssuedCode {
        code: record.code,
        role,
        newly_issued: true,
    })
}

/// Checks `entered` against the stored code.
///
/// Returns the role stored with the code on a match and marks the record verified.
/// Returns `None` on a mismatch or when the identity has no code.
pub fn verify(
    store: &mut dyn DocumentStore,
    uid: &str,
    entered: &str,
) -> Result<Option<Role>, DbError> {
    let Some(mut record) = store.access_code(uid)? else {
        warn!(uid, "verification attempted without an issued code");
        return Ok(None);
    };

    if record.code != entered {
        warn!(uid, "access code mismatch");
        return Ok(None);
    }

    if !record.verified {
        record.verified = true;
        store.set_access_code(uid, &record)?;
    }
    Ok(Some(record.role))
}
