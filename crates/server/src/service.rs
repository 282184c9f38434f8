//! The service facade every surface (REST, binaries, tests) goes through.
//!
//! Each operation takes the verified [`Actor`] making the request.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use shared_types::{
    Account, AccountStatus, Actor, AppError, Case, CaseStatus, Evidence, FileCaseRequest, Notification, Role,
    ScopedStats, TransitionOpts,
};

use crate::analysis::{AnalysisOutcome, AnalysisTracker, Analyzer};
use crate::lifecycle::CaseLifecycle;
use crate::locks::KeyedLocks;
use crate::notify::NotificationEmitter;
use crate::stats::StatsAggregator;
use crate::storage::{CaseFilter, Storage};

struct CoreInner {
    store: Arc<dyn Storage>,
    lifecycle: CaseLifecycle,
    analysis: AnalysisTracker,
    notifier: NotificationEmitter,
    stats: StatsAggregator,
}

#[derive(Clone)]
pub struct Core {
    inner: Arc<CoreInner>,
}

impl Core {
    /// `analysis_deadline` bounds each analyzer call; `None` waits indefinitely.
    pub fn new(
        store: Arc<dyn Storage>,
        analyzer: Arc<dyn Analyzer>,
        analysis_deadline: Option<Duration>,
    ) -> Self {
        let case_locks = Arc::new(KeyedLocks::new());
        let evidence_locks = Arc::new(KeyedLocks::new());
        let notifier = NotificationEmitter::new(store.clone());

        let lifecycle = CaseLifecycle::new(
            store.clone(),
            notifier.clone(),
            case_locks,
            evidence_locks.clone(),
        );
        let analysis =
            AnalysisTracker::new(store.clone(), analyzer, evidence_locks, analysis_deadline);
        let stats = StatsAggregator::new(store.clone());

        Self {
            inner: Arc::new(CoreInner {
                store,
                lifecycle,
                analysis,
                notifier,
                stats,
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn Storage> {
        &self.inner.store
    }

    // ── Cases ───────────────────────────────────────────────────────

    pub async fn file_case(&self, actor: Actor, req: FileCaseRequest) -> Result<Case, AppError> {
        self.inner.lifecycle.file_case(actor, req).await
    }

    pub async fn transition(
        &self,
        actor: Actor,
        case_id: i64,
        target: CaseStatus,
        opts: TransitionOpts,
    ) -> Result<Case, AppError> {
        self.inner
            .lifecycle
            .transition(actor, case_id, target, opts)
            .await
    }

    pub async fn delete_case(&self, actor: Actor, case_id: i64) -> Result<(), AppError> {
        self.inner.lifecycle.delete_case(actor, case_id).await
    }

    pub async fn get_case(&self, actor: Actor, case_id: i64) -> Result<Case, AppError> {
        self.inner.lifecycle.get_case(actor, case_id).await
    }

    pub async fn list_cases(&self, actor: Actor) -> Result<Vec<Case>, AppError> {
        self.inner.lifecycle.list_cases(actor).await
    }

    // ── Evidence ────────────────────────────────────────────────────

    /// Evidence and the case it belongs to, if `actor` has a stake in it.
    async fn evidence_for(&self, actor: Actor, evidence_id: i64) -> Result<(Evidence, Case), AppError> {
        let not_found = || AppError::not_found(format!("Evidence {} not found", evidence_id));

        let evidence = self
            .inner
            .store
            .find_evidence(evidence_id)
            .await?
            .ok_or_else(not_found)?;
        let case = self
            .inner
            .store
            .find_case(evidence.case_id)
            .await?
            .ok_or_else(not_found)?;

        if !CaseFilter::for_actor(actor).matches(&case) {
            return Err(AppError::unauthorized(format!(
                "{} has no access to evidence {}",
                actor, evidence_id
            )));
        }
        Ok((evidence, case))
    }

    /// Start authenticity analysis. Only the assigned court or an admin may.
    pub async fn start_analysis(&self, actor: Actor, evidence_id: i64) -> Result<Evidence, AppError> {
        let (_, case) = self.evidence_for(actor, evidence_id).await?;
        let allowed = actor.role == Role::Admin
            || case
                .assigned_court
                .is_some_and(|court| actor.is(Role::Court, court));
        if !allowed {
            return Err(AppError::unauthorized(
                "Only the assigned court can request evidence analysis",
            ));
        }
        self.inner.analysis.start(evidence_id).await
    }

    pub async fn get_evidence_status(&self, actor: Actor, evidence_id: i64) -> Result<Evidence, AppError> {
        self.evidence_for(actor, evidence_id).await?;
        self.inner.analysis.status(evidence_id).await
    }

    pub fn subscribe_analysis(&self) -> broadcast::Receiver<AnalysisOutcome> {
        self.inner.analysis.subscribe()
    }

    // ── Notifications ───────────────────────────────────────────────

    /// The actor's own notifications, newest first.
    pub async fn list_notifications(&self, actor: Actor) -> Result<Vec<Notification>, AppError> {
        self.inner.notifier.list(actor.id).await
    }

    pub async fn unread_count(&self, actor: Actor) -> Result<i64, AppError> {
        self.inner.notifier.unread_count(actor.id).await
    }

    pub async fn mark_notification_read(
        &self,
        actor: Actor,
        notification_id: i64,
    ) -> Result<Notification, AppError> {
        let notification = self.inner.notifier.find(notification_id).await?;
        if notification.recipient_id != actor.id {
            return Err(AppError::unauthorized(format!(
                "Notification {} belongs to another recipient",
                notification_id
            )));
        }
        self.inner.notifier.mark_read(notification_id).await
    }

    // ── Stats & directory ───────────────────────────────────────────

    pub async fn stats(&self, actor: Actor) -> Result<ScopedStats, AppError> {
        self.inner.stats.for_actor(actor).await
    }

    /// Directory entries with `role`. Admins see every entry, everyone else
    /// only the approved ones.
    pub async fn list_accounts(&self, actor: Actor, role: Role) -> Result<Vec<Account>, AppError> {
        let mut accounts = self.inner.store.list_accounts(Some(role)).await?;
        if actor.role != Role::Admin {
            accounts.retain(Account::is_active);
        }
        Ok(accounts)
    }

    /// Add or rename a directory entry. Admins only.
    pub async fn register_account(&self, actor: Actor, account: Account) -> Result<Account, AppError> {
        require_admin(actor)?;
        if account.name.trim().is_empty() {
            return Err(AppError::invalid_field("name", "Name is required"));
        }
        let account = self.inner.store.upsert_account(account).await?;
        tracing::info!(account_id = account.id, role = %account.role, "Directory entry saved");
        Ok(account)
    }

    /// Approve or reject a directory entry. Admins only.
    pub async fn set_account_status(
        &self,
        actor: Actor,
        account_id: i64,
        status: AccountStatus,
    ) -> Result<Account, AppError> {
        require_admin(actor)?;
        let account = self
            .inner
            .store
            .set_account_status(account_id, status)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Account {} not found", account_id)))?;
        tracing::info!(account_id, status = %status, "Directory entry reviewed");
        Ok(account)
    }

    /// Remove a directory entry. Cases that name it keep the id.
    pub async fn delete_account(&self, actor: Actor, account_id: i64) -> Result<(), AppError> {
        require_admin(actor)?;
        if !self.inner.store.delete_account(account_id).await? {
            return Err(AppError::not_found(format!("Account {} not found", account_id)));
        }
        tracing::info!(account_id, "Directory entry deleted");
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.inner.store.ping().await
    }
}

fn require_admin(actor: Actor) -> Result<(), AppError> {
    if actor.role != Role::Admin {
        return Err(AppError::unauthorized("Only admins can manage the directory"));
    }
    Ok(())
}
