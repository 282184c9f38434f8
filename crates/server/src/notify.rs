//! Durable notices to the filing citizen.
//!
//! Emission is best-effort: a failed insert is logged and never surfaces to
//! the operation that triggered it.

use std::sync::Arc;

use shared_types::{AppError, Case, NewNotification, Notification, NotificationType};

use crate::storage::Storage;

#[derive(Clone)]
pub struct NotificationEmitter {
    store: Arc<dyn Storage>,
}

impl NotificationEmitter {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Record a notice. Returns `None` if it could not be stored.
    pub async fn emit(
        &self,
        recipient_id: i64,
        case_id: i64,
        kind: NotificationType,
        message: String,
    ) -> Option<Notification> {
        let result = self
            .store
            .insert_notification(NewNotification {
                recipient_id,
                case_id,
                kind,
                message,
            })
            .await;

        match result {
            Ok(notification) => {
                tracing::debug!(
                    notification_id = notification.id,
                    recipient_id,
                    case_id,
                    kind = %kind,
                    "Notification recorded"
                );
                Some(notification)
            }
            Err(e) => {
                tracing::warn!(
                    recipient_id,
                    case_id,
                    kind = %kind,
                    error = %e,
                    "Failed to record notification"
                );
                None
            }
        }
    }

    /// Tell the filer their case reached the station.
    pub async fn case_filed(&self, case: &Case, station_name: &str) -> Option<Notification> {
        let message = format!(
            "Your case '{}' has been filed with {}.",
            case.title, station_name
        );
        self.emit(case.filed_by, case.id, NotificationType::CaseFiled, message)
            .await
    }

    /// Notify the filer of a status change that concerns them.
    ///
    /// `court_name` is used for the `sent_to_court` message.
    pub async fn case_transitioned(
        &self,
        case: &Case,
        kind: NotificationType,
        court_name: Option<&str>,
    ) -> Option<Notification> {
        let message = transition_message(&case.title, kind, court_name);
        self.emit(case.filed_by, case.id, kind, message).await
    }

    /// Newest first.
    pub async fn list(&self, recipient_id: i64) -> Result<Vec<Notification>, AppError> {
        self.store.list_notifications(recipient_id).await
    }

    pub async fn find(&self, id: i64) -> Result<Notification, AppError> {
        self.store
            .find_notification(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {} not found", id)))
    }

    /// Idempotent. Returns the notification as stored afterwards.
    pub async fn mark_read(&self, id: i64) -> Result<Notification, AppError> {
        if !self.store.mark_notification_read(id).await? {
            return Err(AppError::not_found(format!("Notification {} not found", id)));
        }
        self.find(id).await
    }

    pub async fn unread_count(&self, recipient_id: i64) -> Result<i64, AppError> {
        let list = self.store.list_notifications(recipient_id).await?;
        Ok(list.iter().filter(|n| !n.is_read).count() as i64)
    }
}

fn transition_message(title: &str, kind: NotificationType, court_name: Option<&str>) -> String {
    match kind {
        NotificationType::CaseFiled => format!("Your case '{}' has been filed.", title),
        NotificationType::SentToCourt => format!(
            "Your case '{}' has been processed and sent to {} for legal review.",
            title,
            court_name.unwrap_or("the court")
        ),
        NotificationType::CaseApproved => format!("The court has approved your case '{}'.", title),
        NotificationType::CaseRejected => format!("The court has rejected your case '{}'.", title),
        NotificationType::CaseResolved => format!("Your case '{}' has been resolved.", title),
    }
}
