//! Database module for MedX.
//!
//! This module provides the document store the sign-in and access-code flows talk to.
//! It holds two record kinds keyed by identity uid: `activeUsers/{uid}` tracks whether an
//! account currently has a live session, and `accessCodes/{uid}` holds the permanent code
//! a privileged portal asks for. Callers go through the [`DocumentStore`] trait; the
//! shipped implementation keeps the records in SQLite.
//!
//! Reads and writes are independent statements. There is no transaction around a
//! read-then-write sequence, so two processes can both observe "no record" before either
//! writes.

use crate::models::Role;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

/// Errors raised by the document store.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt {kind} record for {uid}: {reason}")]
    CorruptRecord {
        kind: &'static str,
        uid: String,
        reason: String,
    },
}

/// `activeUsers/{uid}` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUser {
    pub email: String,
    pub is_active: bool,
}

/// `accessCodes/{uid}` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCodeRecord {
    pub email: String,
    pub role: Role,
    pub code: String,
    pub verified: bool,
}

/// Storage for session and access-code records.
///
/// Writes overwrite the whole record, the way a document `set` does.
pub trait DocumentStore {
    /// Fetches the active-session record for `uid`, if one exists.
    fn active_user(&self, uid: &str) -> Result<Option<ActiveUser>, DbError>;

    /// Creates or replaces the active-session record for `uid`.
    fn set_active_user(&mut self, uid: &str, record: &ActiveUser) -> Result<(), DbError>;

    /// Fetches the access-code record for `uid`, if one exists.
    fn access_code(&self, uid: &str) -> Result<Option<AccessCodeRecord>, DbError>;

    /// Creates or replaces the access-code record for `uid`.
    fn set_access_code(&mut self, uid: &str, record: &AccessCodeRecord) -> Result<(), DbError>;
}

/// SQLite-backed [`DocumentStore`].
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file and applies the schema.
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the SQLite database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema cannot be executed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database. Records vanish when the store is dropped.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, DbError> {
        // Read the schema from the schema.sql file
        let schema = include_str!("schema.sql");
        conn.execute_batch(schema)?;
        Ok(Self { conn })
    }
}

impl DocumentStore for SqliteStore {
    fn active_user(&self, uid: &str) -> Result<Option<ActiveUser>, DbError> {
        let record = self
            .conn
            .query_row(
                "SELECT email, is_active FROM active_users WHERE uid = ?",
                params![uid],
                |row| {
                    Ok(ActiveUser {
                        email: row.get(0)?,
                        is_active: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn set_active_user(&mut self, uid: &str, record: &ActiveUser) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO active_users (uid, email, is_active) VALUES (?, ?, ?)",
            params![uid, record.email, record.is_active],
        )?;
        Ok(())
    }

    /// Fetches the access-code record for `uid`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::CorruptRecord`] if the stored role is not one this build knows.
    fn access_code(&self, uid: &str) -> Result<Option<AccessCodeRecord>, DbError> {
        let row: Option<(String, String, String, bool)> = self
            .conn
            .query_row(
                "SELECT email, role, code, verified FROM access_codes WHERE uid = ?",
                params![uid],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        let Some((email, role, code, verified)) = row else {
            return Ok(None);
        };

        let role = Role::parse(&role).ok_or_else(|| DbError::CorruptRecord {
            kind: "access code",
            uid: uid.to_string(),
            reason: format!("unknown role `{role}`"),
        })?;

        Ok(Some(AccessCodeRecord {
            email,
            role,
            code,
            verified,
        }))
    }

    fn set_access_code(&mut self, uid: &str, record: &AccessCodeRecord) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO access_codes (uid, email, role, code, verified) VALUES (?, ?, ?, ?, ?)",
            params![
                uid,
                record.email,
                record.role.as_str(),
                record.code,
                record.verified,
            ],
        )?;
        Ok(())
    }
}
