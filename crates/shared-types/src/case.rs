use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(feature = "validation")]
use validator::Validate;

use crate::evidence::{Evidence, EvidenceUpload};

// ── Status ──────────────────────────────────────────────────────────

/// Procedural state of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Pending,
    UnderReview,
    SentToCourt,
    Approved,
    Rejected,
    Resolved,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 6] = [
        CaseStatus::Pending,
        CaseStatus::UnderReview,
        CaseStatus::SentToCourt,
        CaseStatus::Approved,
        CaseStatus::Rejected,
        CaseStatus::Resolved,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CaseStatus::Pending),
            "under_review" => Some(CaseStatus::UnderReview),
            "sent_to_court" => Some(CaseStatus::SentToCourt),
            "approved" => Some(CaseStatus::Approved),
            "rejected" => Some(CaseStatus::Rejected),
            "resolved" => Some(CaseStatus::Resolved),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::UnderReview => "under_review",
            CaseStatus::SentToCourt => "sent_to_court",
            CaseStatus::Approved => "approved",
            CaseStatus::Rejected => "rejected",
            CaseStatus::Resolved => "resolved",
        }
    }

    /// Statuses in which `assigned_court` must be set.
    pub fn has_court(&self) -> bool {
        matches!(
            self,
            CaseStatus::SentToCourt | CaseStatus::Approved | CaseStatus::Rejected | CaseStatus::Resolved
        )
    }

    /// Position along the lifecycle; every legal edge strictly increases it.
    pub fn rank(&self) -> u8 {
        match self {
            CaseStatus::Pending => 0,
            CaseStatus::UnderReview => 1,
            CaseStatus::SentToCourt => 2,
            CaseStatus::Approved | CaseStatus::Rejected => 3,
            CaseStatus::Resolved => 4,
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Record ──────────────────────────────────────────────────────────

/// A citizen-filed incident report routed through police to a court.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Case {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub incident_date: NaiveDate,
    pub filed_by: i64,
    pub assigned_station: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_court: Option<i64>,
    /// Directory name of the station, resolved on read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_name: Option<String>,
    /// Directory name of the court. Absent until the case reaches a court.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court_name: Option<String>,
    pub status: CaseStatus,
    pub evidence: Vec<Evidence>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Case {
    /// Whether `assigned_court` agrees with `status`.
    pub fn court_assignment_consistent(&self) -> bool {
        self.assigned_court.is_some() == self.status.has_court()
    }
}

// ── Request types ───────────────────────────────────────────────────

/// Request to file a new case with its evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct FileCaseRequest {
    pub station_id: i64,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Title is required"))
    )]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub incident_date: NaiveDate,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "At least one evidence file is required"))
    )]
    pub evidence: Vec<EvidenceUpload>,
}

/// Request to move a case to another status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TransitionRequest {
    pub status: CaseStatus,
    /// Required when the target is `sent_to_court`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub court_id: Option<i64>,
}

/// Optional parameters of a transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionOpts {
    pub court_id: Option<i64>,
}

impl TransitionOpts {
    pub fn with_court(court_id: i64) -> Self {
        Self {
            court_id: Some(court_id),
        }
    }
}

impl From<&TransitionRequest> for TransitionOpts {
    fn from(req: &TransitionRequest) -> Self {
        Self {
            court_id: req.court_id,
        }
    }
}
