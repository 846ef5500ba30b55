//! Status notifications for export and import.
//!
//! This module only selects what to tell the user; presentation belongs to
//! whatever implements [`NotificationSender`].

use serde::Serialize;
use tracing::info;

/// The closed set of notifications this subsystem can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ImportInProgress,
    ImportComplete,
    ImportUnsuccessfulGenericError,
    ImportUnsuccessfulInvalidFile,
    ImportUnsuccessfulVersionMismatch,
    ExportUnsuccessfulGenericError,
    ExportUnsuccessfulLostFileAccess,
}

/// What tapping the notification should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    OpenImportExportSettings,
    ChooseNewDestination,
    RetryImport,
    UpdateApp,
}

/// Rendered notification content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationType,
    pub title: &'static str,
    pub text: &'static str,
    pub action: Option<NotificationAction>,
    /// Ongoing notifications cannot be dismissed while the work runs.
    pub ongoing: bool,
}

/// Maps a notification type to its content.
pub struct NotificationFactory;

impl NotificationFactory {
    #[must_use]
    pub const fn create(kind: NotificationType) -> Notification {
        let (title, text, action, ongoing) = match kind {
            NotificationType::ImportInProgress => (
                "Importing health data",
                "Your data is being merged into this device",
                None,
                true,
            ),
            NotificationType::ImportComplete => (
                "Import complete",
                "Your health data has been imported",
                Some(NotificationAction::OpenImportExportSettings),
                false,
            ),
            NotificationType::ImportUnsuccessfulGenericError => (
                "Couldn't import data",
                "Something went wrong. Try again.",
                Some(NotificationAction::RetryImport),
                false,
            ),
            NotificationType::ImportUnsuccessfulInvalidFile => (
                "Couldn't import data",
                "The chosen file isn't a health data export",
                Some(NotificationAction::RetryImport),
                false,
            ),
            NotificationType::ImportUnsuccessfulVersionMismatch => (
                "Couldn't import data",
                "The export was made by a newer version. Update to import it.",
                Some(NotificationAction::UpdateApp),
                false,
            ),
            NotificationType::ExportUnsuccessfulGenericError => (
                "Couldn't export data",
                "Something went wrong. The next scheduled export will try again.",
                Some(NotificationAction::OpenImportExportSettings),
                false,
            ),
            NotificationType::ExportUnsuccessfulLostFileAccess => (
                "Couldn't export data",
                "The export location is no longer available. Choose a new one.",
                Some(NotificationAction::ChooseNewDestination),
                false,
            ),
        };
        Notification {
            kind,
            title,
            text,
            action,
            ongoing,
        }
    }
}

/// Delivers notifications to a user.
pub trait NotificationSender: Send + Sync {
    fn send_notification(&self, kind: NotificationType, user: u32);
}

/// Sender that emits each notification as a tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotificationSender;

impl NotificationSender for TracingNotificationSender {
    fn send_notification(&self, kind: NotificationType, user: u32) {
        let notification = NotificationFactory::create(kind);
        info!(
            user,
            kind = ?notification.kind,
            title = notification.title,
            text = notification.text,
            action = ?notification.action,
            "Notification"
        );
    }
}

/// Sender that remembers what it was asked to send.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingNotificationSender {
    sent: parking_lot::Mutex<Vec<NotificationType>>,
}

#[cfg(test)]
impl RecordingNotificationSender {
    pub(crate) fn sent(&self) -> Vec<NotificationType> {
        self.sent.lock().clone()
    }
}

#[cfg(test)]
impl NotificationSender for RecordingNotificationSender {
    fn send_notification(&self, kind: NotificationType, _user: u32) {
        self.sent.lock().push(kind);
    }
}
