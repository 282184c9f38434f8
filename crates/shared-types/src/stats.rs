use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dashboard counts for a citizen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CitizenStats {
    pub total_cases: i64,
    pub pending_cases: i64,
    /// Approved or resolved.
    pub approved_cases: i64,
}

/// Dashboard counts for a police station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PoliceStats {
    pub active_cases: i64,
    pub evidence_uploaded: i64,
    pub sent_to_court: i64,
    pub pending_review: i64,
}

/// Dashboard counts for a court.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CourtStats {
    pub assigned_cases: i64,
    pub awaiting_decision: i64,
    pub approved: i64,
    pub rejected: i64,
    pub resolved: i64,
    pub evidence_analyzed: i64,
    /// Completed analyses that judged the file not authentic.
    pub evidence_flagged: i64,
}

/// Platform-wide counts for the administrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AdminStats {
    pub total_cases: i64,
    pub cases_by_status: BTreeMap<String, i64>,
    pub accounts_by_role: BTreeMap<String, i64>,
}

/// Stats for whichever scope the caller belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ScopedStats {
    Citizen(CitizenStats),
    Police(PoliceStats),
    Court(CourtStats),
    Admin(AdminStats),
}
