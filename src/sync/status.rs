//! Observable sync status and the notification seam.
//!
//! The engine never hands raw errors to its caller's presentation layer; it
//! translates outcomes into a status line and ephemeral toast messages and
//! pushes them through the `Notifier` trait.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// The overall sync state. Observable, not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Synced,
    Offline,
    Error,
}

serde_plain::derive_display_from_serialize!(SyncStatus);
serde_plain::derive_fromstr_from_deserialize!(SyncStatus);

/// Toast classes, mirroring how the notifications read to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toast {
    Success,
    Error,
    Info,
}

/// Sink for status updates and one-line user messages.
pub trait Notifier: Send {
    fn status(&mut self, status: SyncStatus);
    fn toast(&mut self, kind: Toast, message: &str);
}

/// Production notifier: statuses to the debug log, toasts to the user-facing
/// log the way command output is printed.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn status(&mut self, status: SyncStatus) {
        debug!("sync status: {status}");
    }

    fn toast(&mut self, kind: Toast, message: &str) {
        match kind {
            Toast::Success | Toast::Info => info!("{message}"),
            Toast::Error => warn!("{message}"),
        }
    }
}
