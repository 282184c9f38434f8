//! Persistence for cases, evidence, notifications and the actor directory.
//!
//! Writes that race with other writers are conditional: they carry the status
//! the caller observed and report `None`/`false` when the row has moved on.
//! Callers hold the entity's [`KeyedLocks`](crate::locks::KeyedLocks) guard,
//! so a failed condition means another process or a deletion got there first.

use async_trait::async_trait;
use chrono::NaiveDate;
use shared_types::{
    Account, AccountStatus, Actor, AnalysisStatus, AppError, Case, CaseStatus, Evidence, FileType,
    NewNotification, Notification, Role,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A case about to be inserted, with its evidence.
#[derive(Debug, Clone)]
pub struct NewCase {
    pub title: String,
    pub description: String,
    pub incident_date: NaiveDate,
    pub filed_by: i64,
    pub assigned_station: i64,
    pub evidence: Vec<NewEvidence>,
}

#[derive(Debug, Clone)]
pub struct NewEvidence {
    pub file_path: String,
    pub file_type: FileType,
}

/// Which cases a listing should return. `None` fields do not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseFilter {
    pub filed_by: Option<i64>,
    pub station: Option<i64>,
    pub court: Option<i64>,
}

impl CaseFilter {
    /// The cases an actor is responsible for. Admins see everything.
    pub fn for_actor(actor: Actor) -> Self {
        match actor.role {
            Role::Citizen => Self {
                filed_by: Some(actor.id),
                ..Self::default()
            },
            Role::Police => Self {
                station: Some(actor.id),
                ..Self::default()
            },
            Role::Court => Self {
                court: Some(actor.id),
                ..Self::default()
            },
            Role::Admin => Self::default(),
        }
    }

    pub fn matches(&self, case: &Case) -> bool {
        self.filed_by.map_or(true, |id| case.filed_by == id)
            && self.station.map_or(true, |id| case.assigned_station == id)
            && self.court.map_or(true, |id| case.assigned_court == Some(id))
    }
}

#[async_trait]
pub trait Storage: Send + Sync {
    // Directory
    async fn upsert_account(&self, account: Account) -> Result<Account, AppError>;
    async fn find_account(&self, id: i64) -> Result<Option<Account>, AppError>;
    async fn list_accounts(&self, role: Option<Role>) -> Result<Vec<Account>, AppError>;
    /// Returns the updated entry, or `None` if there is no such account.
    async fn set_account_status(
        &self,
        id: i64,
        status: AccountStatus,
    ) -> Result<Option<Account>, AppError>;
    /// Returns true if an entry was removed. Cases keep their references.
    async fn delete_account(&self, id: i64) -> Result<bool, AppError>;

    // Cases
    //
    // Every case returned carries its evidence and the directory names of its
    // station and court.

    /// Insert a case and all its evidence as one unit.
    async fn insert_case(&self, new_case: NewCase) -> Result<Case, AppError>;
    async fn find_case(&self, id: i64) -> Result<Option<Case>, AppError>;
    /// Cases matching `filter`, ordered by id, each with its evidence.
    async fn list_cases(&self, filter: CaseFilter) -> Result<Vec<Case>, AppError>;
    /// Set `status` (and `assigned_court` when given) if the case is still in
    /// `expected`. Returns the updated case, or `None` if the condition failed.
    async fn update_case_status(
        &self,
        id: i64,
        expected: CaseStatus,
        status: CaseStatus,
        assigned_court: Option<i64>,
    ) -> Result<Option<Case>, AppError>;
    /// Delete a case and its evidence. Returns true if a row was deleted.
    async fn delete_case(&self, id: i64) -> Result<bool, AppError>;

    // Evidence
    async fn find_evidence(&self, id: i64) -> Result<Option<Evidence>, AppError>;
    /// Persist the analysis fields of `evidence` if its stored status is still
    /// `expected`. Returns false if the condition failed or the row is gone.
    async fn save_analysis(
        &self,
        evidence: &Evidence,
        expected: AnalysisStatus,
    ) -> Result<bool, AppError>;

    // Notifications
    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, AppError>;
    async fn find_notification(&self, id: i64) -> Result<Option<Notification>, AppError>;
    /// Newest first.
    async fn list_notifications(&self, recipient_id: i64) -> Result<Vec<Notification>, AppError>;
    /// Returns false if the notification does not exist.
    async fn mark_notification_read(&self, id: i64) -> Result<bool, AppError>;

    /// Cheap round-trip used by the health check.
    async fn ping(&self) -> Result<(), AppError>;
}
