//! # cfms-db
//!
//! libSQL persistence for the course folder pipeline.
//!
//! Stores users, folders, audit assignments, status history, deadlines,
//! access requests and shares. [`service::FolderService`] enforces the
//! workflow rules from `cfms-core` against stored state: each mutation reads
//! the folder, applies the pure rule, and writes back under an optimistic
//! `version` check inside one transaction.

pub mod error;
pub mod helpers;
mod migrations;
pub mod notify;
pub mod repos;
pub mod service;
pub mod trail;

mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle.
///
/// Wraps a libSQL database and connection. Repository methods live on
/// [`service::FolderService`].
pub struct FolderDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl FolderDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let folder_db = Self { db, conn };
        folder_db.run_migrations().await?;
        Ok(folder_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"fld-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn test_db() -> FolderDb {
        FolderDb::open_local(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;
        let tables = [
            "users",
            "course_folders",
            "audit_assignments",
            "folder_status_history",
            "folder_deadlines",
            "folder_access_requests",
            "folder_shares",
        ];
        for table in &tables {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [*table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap();
            assert!(row.is_some(), "table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn generate_id_has_prefix_and_is_unique() {
        let db = test_db().await;
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let id = db.generate_id("fld").await.unwrap();
            assert!(id.starts_with("fld-"));
            assert_eq!(id.len(), 12);
            assert!(seen.insert(id));
        }
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let db = test_db().await;
        let result = db
            .conn()
            .execute(
                "INSERT INTO folder_shares (folder_id, role, shared_by) VALUES ('fld-missing', 'HOD', 'usr-1')",
                (),
            )
            .await;
        assert!(result.is_err());
    }
}
