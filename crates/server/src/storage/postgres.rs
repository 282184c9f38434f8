//! PostgreSQL store. Enum columns are TEXT and converted at the row boundary.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Pool, Postgres};
use std::collections::HashMap;

use shared_types::{
    Account, AccountStatus, AnalysisStatus, AppError, Case, CaseStatus, Evidence, FileType, NewNotification,
    Notification, NotificationType, Role,
};

use super::{CaseFilter, NewCase, Storage};
use crate::error_convert::SqlxErrorExt;

const CASE_COLUMNS: &str = "id, title, description, incident_date, filed_by, assigned_station, \
     assigned_court, status, created_at, updated_at";

const EVIDENCE_COLUMNS: &str = "id, case_id, file_path, file_type, analysis_status, \
     is_authentic, confidence_score, failure_reason, uploaded_at";

const ACCOUNT_COLUMNS: &str = "id, name, role, status";

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, case_id, message, type, is_read, created_at";

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    name: String,
    role: String,
    status: String,
}

impl TryFrom<AccountRow> for Account {
    type Error = AppError;

    fn try_from(row: AccountRow) -> Result<Self, AppError> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| AppError::database(format!("unknown role '{}'", row.role)))?;
        let status = AccountStatus::parse(&row.status).ok_or_else(|| {
            AppError::database(format!("unknown account status '{}'", row.status))
        })?;
        Ok(Account {
            id: row.id,
            name: row.name,
            role,
            status,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CaseRow {
    id: i64,
    title: String,
    description: String,
    incident_date: NaiveDate,
    filed_by: i64,
    assigned_station: i64,
    assigned_court: Option<i64>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CaseRow {
    fn into_case(self, evidence: Vec<Evidence>) -> Result<Case, AppError> {
        let status = CaseStatus::parse(&self.status)
            .ok_or_else(|| AppError::database(format!("unknown case status '{}'", self.status)))?;
        Ok(Case {
            id: self.id,
            title: self.title,
            description: self.description,
            incident_date: self.incident_date,
            filed_by: self.filed_by,
            assigned_station: self.assigned_station,
            assigned_court: self.assigned_court,
            station_name: None,
            court_name: None,
            status,
            evidence,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EvidenceRow {
    id: i64,
    case_id: i64,
    file_path: String,
    file_type: String,
    analysis_status: String,
    is_authentic: Option<bool>,
    confidence_score: Option<f64>,
    failure_reason: Option<String>,
    uploaded_at: DateTime<Utc>,
}

impl TryFrom<EvidenceRow> for Evidence {
    type Error = AppError;

    fn try_from(row: EvidenceRow) -> Result<Self, AppError> {
        let file_type = FileType::parse(&row.file_type)
            .ok_or_else(|| AppError::database(format!("unknown file type '{}'", row.file_type)))?;
        let analysis_status = AnalysisStatus::parse(&row.analysis_status).ok_or_else(|| {
            AppError::database(format!("unknown analysis status '{}'", row.analysis_status))
        })?;
        Ok(Evidence {
            id: row.id,
            case_id: row.case_id,
            file_path: row.file_path,
            file_type,
            analysis_status,
            is_authentic: row.is_authentic,
            confidence_score: row.confidence_score,
            failure_reason: row.failure_reason,
            uploaded_at: row.uploaded_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    recipient_id: i64,
    case_id: i64,
    message: String,
    #[sqlx(rename = "type")]
    kind: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self, AppError> {
        let kind = NotificationType::parse(&row.kind).ok_or_else(|| {
            AppError::database(format!("unknown notification type '{}'", row.kind))
        })?;
        Ok(Notification {
            id: row.id,
            recipient_id: row.recipient_id,
            case_id: row.case_id,
            message: row.message,
            kind,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

/// [`Storage`] over a Postgres pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    async fn evidence_for_cases(&self, case_ids: &[i64]) -> Result<Vec<Evidence>, AppError> {
        if case_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, EvidenceRow>(&format!(
            "SELECT {EVIDENCE_COLUMNS} FROM evidence WHERE case_id = ANY($1) ORDER BY id"
        ))
        .bind(case_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        rows.into_iter().map(Evidence::try_from).collect()
    }

    async fn assemble(&self, rows: Vec<CaseRow>) -> Result<Vec<Case>, AppError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut by_case: HashMap<i64, Vec<Evidence>> = HashMap::new();
        for ev in self.evidence_for_cases(&ids).await? {
            by_case.entry(ev.case_id).or_default().push(ev);
        }
        let mut cases = rows
            .into_iter()
            .map(|row| {
                let evidence = by_case.remove(&row.id).unwrap_or_default();
                row.into_case(evidence)
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.attach_names(&mut cases).await?;
        Ok(cases)
    }

    /// Fill in station and court names from the directory.
    async fn attach_names(&self, cases: &mut [Case]) -> Result<(), AppError> {
        let mut ids: Vec<i64> = cases
            .iter()
            .flat_map(|c| std::iter::once(c.assigned_station).chain(c.assigned_court))
            .collect();
        if ids.is_empty() {
            return Ok(());
        }
        ids.sort_unstable();
        ids.dedup();

        let names: HashMap<i64, String> =
            sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM accounts WHERE id = ANY($1)")
                .bind(ids.as_slice())
                .fetch_all(&self.pool)
                .await
                .map_err(SqlxErrorExt::into_app_error)?
                .into_iter()
                .collect();

        for case in cases.iter_mut() {
            case.station_name = names.get(&case.assigned_station).cloned();
            case.court_name = case.assigned_court.and_then(|id| names.get(&id).cloned());
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for PgStore {
    async fn upsert_account(&self, account: Account) -> Result<Account, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            INSERT INTO accounts (id, name, role, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name, role = EXCLUDED.role, status = EXCLUDED.status
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(account.id)
        .bind(&account.name)
        .bind(account.role.as_str())
        .bind(account.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Account::try_from(row)
    }

    async fn find_account(&self, id: i64) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        row.map(Account::try_from).transpose()
    }

    async fn list_accounts(&self, role: Option<Role>) -> Result<Vec<Account>, AppError> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            SELECT {ACCOUNT_COLUMNS} FROM accounts
            WHERE ($1::TEXT IS NULL OR role = $1)
            ORDER BY id
            "#
        ))
        .bind(role.map(|r| r.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        rows.into_iter().map(Account::try_from).collect()
    }

    async fn set_account_status(
        &self,
        id: i64,
        status: AccountStatus,
    ) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "UPDATE accounts SET status = $2 WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        row.map(Account::try_from).transpose()
    }

    async fn delete_account(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_case(&self, new_case: NewCase) -> Result<Case, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

        let case_row = sqlx::query_as::<_, CaseRow>(&format!(
            r#"
            INSERT INTO cases (title, description, incident_date, filed_by, assigned_station)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CASE_COLUMNS}
            "#
        ))
        .bind(&new_case.title)
        .bind(&new_case.description)
        .bind(new_case.incident_date)
        .bind(new_case.filed_by)
        .bind(new_case.assigned_station)
        .fetch_one(&mut *tx)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        let mut evidence = Vec::with_capacity(new_case.evidence.len());
        for upload in &new_case.evidence {
            let row = sqlx::query_as::<_, EvidenceRow>(&format!(
                r#"
                INSERT INTO evidence (case_id, file_path, file_type)
                VALUES ($1, $2, $3)
                RETURNING {EVIDENCE_COLUMNS}
                "#
            ))
            .bind(case_row.id)
            .bind(&upload.file_path)
            .bind(upload.file_type.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;
            evidence.push(Evidence::try_from(row)?);
        }

        tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;

        let mut case = case_row.into_case(evidence)?;
        self.attach_names(std::slice::from_mut(&mut case)).await?;
        Ok(case)
    }

    async fn find_case(&self, id: i64) -> Result<Option<Case>, AppError> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_cases(&self, filter: CaseFilter) -> Result<Vec<Case>, AppError> {
        let rows = sqlx::query_as::<_, CaseRow>(&format!(
            r#"
            SELECT {CASE_COLUMNS} FROM cases
            WHERE ($1::BIGINT IS NULL OR filed_by = $1)
              AND ($2::BIGINT IS NULL OR assigned_station = $2)
              AND ($3::BIGINT IS NULL OR assigned_court = $3)
            ORDER BY id
            "#
        ))
        .bind(filter.filed_by)
        .bind(filter.station)
        .bind(filter.court)
        .fetch_all(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        self.assemble(rows).await
    }

    async fn update_case_status(
        &self,
        id: i64,
        expected: CaseStatus,
        status: CaseStatus,
        assigned_court: Option<i64>,
    ) -> Result<Option<Case>, AppError> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            r#"
            UPDATE cases
            SET status = $3,
                assigned_court = COALESCE($4, assigned_court),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {CASE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(expected.as_str())
        .bind(status.as_str())
        .bind(assigned_court)
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn delete_case(&self, id: i64) -> Result<bool, AppError> {
        // Evidence goes with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM cases WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_evidence(&self, id: i64) -> Result<Option<Evidence>, AppError> {
        let row = sqlx::query_as::<_, EvidenceRow>(&format!(
            "SELECT {EVIDENCE_COLUMNS} FROM evidence WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        row.map(Evidence::try_from).transpose()
    }

    async fn save_analysis(
        &self,
        evidence: &Evidence,
        expected: AnalysisStatus,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE evidence
            SET analysis_status = $3,
                is_authentic = $4,
                confidence_score = $5,
                failure_reason = $6
            WHERE id = $1 AND analysis_status = $2
            "#,
        )
        .bind(evidence.id)
        .bind(expected.as_str())
        .bind(evidence.analysis_status.as_str())
        .bind(evidence.is_authentic)
        .bind(evidence.confidence_score)
        .bind(evidence.failure_reason.as_deref())
        .execute(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, AppError> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            INSERT INTO notifications (recipient_id, case_id, message, type)
            VALUES ($1, $2, $3, $4)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification.recipient_id)
        .bind(notification.case_id)
        .bind(&notification.message)
        .bind(notification.kind.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        Notification::try_from(row)
    }

    async fn find_notification(&self, id: i64) -> Result<Option<Notification>, AppError> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        row.map(Notification::try_from).transpose()
    }

    async fn list_notifications(&self, recipient_id: i64) -> Result<Vec<Notification>, AppError> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn mark_notification_read(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;
        Ok(())
    }
}
