//! Outbound notifications.
//!
//! Delivery is external to this crate. The service hands each
//! [`Notification`] to a [`NotificationSink`] after the mutation commits;
//! a sink must not fail the mutation, so `deliver` returns nothing.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// What happened to the folder, from the recipient's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    FolderSubmitted,
    FolderApproved,
    FolderReturned,
    AuditAssigned,
    FolderShared,
    AccessRequested,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FolderSubmitted => "FOLDER_SUBMITTED",
            Self::FolderApproved => "FOLDER_APPROVED",
            Self::FolderReturned => "FOLDER_RETURNED",
            Self::AuditAssigned => "AUDIT_ASSIGNED",
            Self::FolderShared => "FOLDER_SHARED",
            Self::AccessRequested => "ACCESS_REQUESTED",
        }
    }
}

/// One message for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    pub kind: NotificationKind,
    pub folder_id: String,
    pub title: String,
    pub message: String,
}

/// Receives notifications for delivery.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: &Notification);
}

/// Default sink: logs each notification at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn deliver(&self, n: &Notification) {
        tracing::info!(
            recipient = %n.recipient,
            kind = n.kind.as_str(),
            folder = %n.folder_id,
            "{}: {}",
            n.title,
            n.message
        );
    }
}

/// Collects notifications in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Recipients of every notification of `kind`.
    #[must_use]
    pub fn recipients_of(&self, kind: NotificationKind) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|n| n.kind == kind)
            .map(|n| n.recipient)
            .collect()
    }
}

impl NotificationSink for MemoryNotifier {
    fn deliver(&self, notification: &Notification) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
    }
}
