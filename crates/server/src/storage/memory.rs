//! In-process store used by tests and single-node demo runs.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use shared_types::{
    Account, AccountStatus, AnalysisStatus, AppError, Case, CaseStatus, Evidence, NewNotification,
    Notification, Role,
};

use super::{CaseFilter, NewCase, Storage};

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<i64, Account>,
    /// Cases are kept without their evidence or names; both are joined on read.
    cases: BTreeMap<i64, Case>,
    evidence: BTreeMap<i64, Evidence>,
    notifications: BTreeMap<i64, Notification>,
    next_case_id: i64,
    next_evidence_id: i64,
    next_notification_id: i64,
}

impl Tables {
    fn hydrate(&self, case: &Case) -> Case {
        let mut case = case.clone();
        case.evidence = self
            .evidence
            .values()
            .filter(|e| e.case_id == case.id)
            .cloned()
            .collect();
        case.station_name = self.account_name(Some(case.assigned_station));
        case.court_name = self.account_name(case.assigned_court);
        case
    }

    fn account_name(&self, id: Option<i64>) -> Option<String> {
        id.and_then(|id| self.accounts.get(&id)).map(|a| a.name.clone())
    }
}

/// All tables behind one `RwLock`, so multi-row writes are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[async_trait]
impl Storage for MemoryStore {
    async fn upsert_account(&self, account: Account) -> Result<Account, AppError> {
        let mut t = self.tables.write().await;
        t.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_account(&self, id: i64) -> Result<Option<Account>, AppError> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn list_accounts(&self, role: Option<Role>) -> Result<Vec<Account>, AppError> {
        let t = self.tables.read().await;
        Ok(t.accounts
            .values()
            .filter(|a| role.map_or(true, |r| a.role == r))
            .cloned()
            .collect())
    }

    async fn set_account_status(
        &self,
        id: i64,
        status: AccountStatus,
    ) -> Result<Option<Account>, AppError> {
        let mut t = self.tables.write().await;
        Ok(t.accounts.get_mut(&id).map(|a| {
            a.status = status;
            a.clone()
        }))
    }

    async fn delete_account(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.write().await.accounts.remove(&id).is_some())
    }

    async fn insert_case(&self, new_case: NewCase) -> Result<Case, AppError> {
        let mut t = self.tables.write().await;
        let now = Utc::now();
        let case_id = next(&mut t.next_case_id);

        for upload in new_case.evidence {
            let id = next(&mut t.next_evidence_id);
            t.evidence.insert(
                id,
                Evidence {
                    id,
                    case_id,
                    file_path: upload.file_path,
                    file_type: upload.file_type,
                    analysis_status: AnalysisStatus::NotStarted,
                    is_authentic: None,
                    confidence_score: None,
                    failure_reason: None,
                    uploaded_at: now,
                },
            );
        }

        let case = Case {
            id: case_id,
            title: new_case.title,
            description: new_case.description,
            incident_date: new_case.incident_date,
            filed_by: new_case.filed_by,
            assigned_station: new_case.assigned_station,
            assigned_court: None,
            station_name: None,
            court_name: None,
            status: CaseStatus::Pending,
            evidence: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        t.cases.insert(case_id, case.clone());
        Ok(t.hydrate(&case))
    }

    async fn find_case(&self, id: i64) -> Result<Option<Case>, AppError> {
        let t = self.tables.read().await;
        Ok(t.cases.get(&id).map(|c| t.hydrate(c)))
    }

    async fn list_cases(&self, filter: CaseFilter) -> Result<Vec<Case>, AppError> {
        let t = self.tables.read().await;
        Ok(t.cases
            .values()
            .filter(|c| filter.matches(c))
            .map(|c| t.hydrate(c))
            .collect())
    }

    async fn update_case_status(
        &self,
        id: i64,
        expected: CaseStatus,
        status: CaseStatus,
        assigned_court: Option<i64>,
    ) -> Result<Option<Case>, AppError> {
        let mut t = self.tables.write().await;
        let Some(case) = t.cases.get_mut(&id) else {
            return Ok(None);
        };
        if case.status != expected {
            return Ok(None);
        }
        case.status = status;
        if assigned_court.is_some() {
            case.assigned_court = assigned_court;
        }
        case.updated_at = Utc::now();
        let case = case.clone();
        Ok(Some(t.hydrate(&case)))
    }

    async fn delete_case(&self, id: i64) -> Result<bool, AppError> {
        let mut t = self.tables.write().await;
        if t.cases.remove(&id).is_none() {
            return Ok(false);
        }
        t.evidence.retain(|_, e| e.case_id != id);
        Ok(true)
    }

    async fn find_evidence(&self, id: i64) -> Result<Option<Evidence>, AppError> {
        Ok(self.tables.read().await.evidence.get(&id).cloned())
    }

    async fn save_analysis(
        &self,
        evidence: &Evidence,
        expected: AnalysisStatus,
    ) -> Result<bool, AppError> {
        let mut t = self.tables.write().await;
        let Some(stored) = t.evidence.get_mut(&evidence.id) else {
            return Ok(false);
        };
        if stored.analysis_status != expected {
            return Ok(false);
        }
        stored.analysis_status = evidence.analysis_status;
        stored.is_authentic = evidence.is_authentic;
        stored.confidence_score = evidence.confidence_score;
        stored.failure_reason = evidence.failure_reason.clone();
        Ok(true)
    }

    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, AppError> {
        let mut t = self.tables.write().await;
        let id = next(&mut t.next_notification_id);
        let row = Notification {
            id,
            recipient_id: notification.recipient_id,
            case_id: notification.case_id,
            message: notification.message,
            kind: notification.kind,
            is_read: false,
            created_at: Utc::now(),
        };
        t.notifications.insert(id, row.clone());
        Ok(row)
    }

    async fn find_notification(&self, id: i64) -> Result<Option<Notification>, AppError> {
        Ok(self.tables.read().await.notifications.get(&id).cloned())
    }

    async fn list_notifications(&self, recipient_id: i64) -> Result<Vec<Notification>, AppError> {
        let t = self.tables.read().await;
        // Ids grow with creation time, so reverse id order is newest first.
        Ok(t.notifications
            .values()
            .rev()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(&self, id: i64) -> Result<bool, AppError> {
        let mut t = self.tables.write().await;
        match t.notifications.get_mut(&id) {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
