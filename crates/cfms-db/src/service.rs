//! Service layer orchestrating folder mutations with history, trail and
//! notifications.
//!
//! `FolderService` wraps `FolderDb` (raw database access), `TrailWriter`
//! (JSONL persistence), a `NotificationSink`, and the workflow settings.
//! All repo methods are implemented as `impl FolderService` blocks.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use cfms_config::WorkflowConfig;
use cfms_core::deadline::DeadlineGate;
use cfms_core::lifecycle::TransitionEnv;

use crate::FolderDb;
use crate::error::DatabaseError;
use crate::notify::{Notification, NotificationSink, TracingNotifier};
use crate::trail::writer::TrailWriter;

/// Orchestrates folder mutations.
///
/// Every mutating method follows this protocol:
/// 1. Load the folder and resolve the actor's effective roles
/// 2. Apply the pure rule from `cfms-core` to a copy
/// 3. Begin transaction, write with a `version` check, append history
/// 4. Commit
/// 5. Append the JSONL trail operation and deliver notifications
pub struct FolderService {
    db: FolderDb,
    trail: TrailWriter,
    notifier: Box<dyn NotificationSink>,
    workflow: WorkflowConfig,
}

impl FolderService {
    /// Create a new service wrapping a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    /// * `trail_dir` - Directory for JSONL trail files. `None` disables the trail.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or the trail
    /// directory cannot be created.
    pub async fn new_local(
        db_path: &str,
        trail_dir: Option<PathBuf>,
    ) -> Result<Self, DatabaseError> {
        let db = FolderDb::open_local(db_path).await?;
        let trail = match trail_dir {
            Some(dir) => TrailWriter::new(dir)?,
            None => TrailWriter::disabled(),
        };
        Ok(Self::from_db(db, trail))
    }

    /// Create from an existing `FolderDb` with default workflow settings and
    /// the tracing notifier.
    #[must_use]
    pub fn from_db(db: FolderDb, trail: TrailWriter) -> Self {
        Self {
            db,
            trail,
            notifier: Box::new(TracingNotifier),
            workflow: WorkflowConfig::default(),
        }
    }

    /// Replace the workflow settings.
    #[must_use]
    pub fn with_workflow(mut self, workflow: WorkflowConfig) -> Self {
        self.workflow = workflow;
        self
    }

    /// Replace the notification sink.
    #[must_use]
    pub fn with_notifier(mut self, notifier: impl NotificationSink + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &FolderDb {
        &self.db
    }

    /// Access the trail writer.
    #[must_use]
    pub const fn trail(&self) -> &TrailWriter {
        &self.trail
    }

    #[must_use]
    pub const fn workflow(&self) -> &WorkflowConfig {
        &self.workflow
    }

    /// Build the request-scoped rule inputs for `now` and a resolved gate.
    pub(crate) const fn transition_env(&self, now: DateTime<Utc>, gate: DeadlineGate) -> TransitionEnv {
        let mut env = TransitionEnv::new(now, gate);
        env.require_rejection_remarks = self.workflow.require_rejection_remarks;
        env.max_auditors = self.workflow.max_auditors_per_folder;
        env
    }

    pub(crate) fn notify_all(&self, notifications: &[Notification]) {
        for n in notifications {
            self.notifier.deliver(n);
        }
    }
}
