use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which lifecycle event a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    CaseFiled,
    SentToCourt,
    CaseApproved,
    CaseRejected,
    CaseResolved,
}

impl NotificationType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "case_filed" => Some(NotificationType::CaseFiled),
            "sent_to_court" => Some(NotificationType::SentToCourt),
            "case_approved" => Some(NotificationType::CaseApproved),
            "case_rejected" => Some(NotificationType::CaseRejected),
            "case_resolved" => Some(NotificationType::CaseResolved),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::CaseFiled => "case_filed",
            NotificationType::SentToCourt => "sent_to_court",
            NotificationType::CaseApproved => "case_approved",
            NotificationType::CaseRejected => "case_rejected",
            NotificationType::CaseResolved => "case_resolved",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A citizen-facing notice produced by a case transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub case_id: i64,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields of a notification before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recipient_id: i64,
    pub case_id: i64,
    pub kind: NotificationType,
    pub message: String,
}

/// Response for the unread badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UnreadCountResponse {
    pub unread: i64,
}
