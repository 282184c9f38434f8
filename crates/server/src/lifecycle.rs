//! Case lifecycle engine.
//!
//! ```text
//! pending ──▶ under_review ──▶ sent_to_court ──▶ approved ──┐
//!                                            └─▶ rejected ──┴─▶ resolved
//! ```
//!
//! Every transition runs under the case's lock. Checks are applied in a fixed
//! order: existence, same-status no-op, edge exists, actor, preconditions.

use std::sync::Arc;

use shared_types::{
    Account, Actor, AppError, Case, CaseStatus, FileCaseRequest, NotificationType, Role,
    TransitionOpts,
};

use crate::error_convert::ValidateRequest;
use crate::locks::KeyedLocks;
use crate::notify::NotificationEmitter;
use crate::storage::{CaseFilter, NewCase, NewEvidence, Storage};

/// Who may take an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredActor {
    /// The citizen who filed the case.
    Filer,
    /// The police station the case was filed with.
    OwningStation,
    /// The court the case was sent to.
    AssignedCourt,
    AssignedCourtOrAdmin,
}

impl RequiredActor {
    pub fn permits(&self, actor: Actor, case: &Case) -> bool {
        match self {
            RequiredActor::Filer => actor.is(Role::Citizen, case.filed_by),
            RequiredActor::OwningStation => actor.is(Role::Police, case.assigned_station),
            RequiredActor::AssignedCourt => case
                .assigned_court
                .is_some_and(|court| actor.is(Role::Court, court)),
            RequiredActor::AssignedCourtOrAdmin => {
                actor.role == Role::Admin || RequiredActor::AssignedCourt.permits(actor, case)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Edge {
    /// `None` for the creation edge into `pending`.
    pub from: Option<CaseStatus>,
    pub to: CaseStatus,
    pub actor: RequiredActor,
    pub notify: Option<NotificationType>,
}

pub const EDGES: &[Edge] = &[
    Edge {
        from: None,
        to: CaseStatus::Pending,
        actor: RequiredActor::Filer,
        notify: Some(NotificationType::CaseFiled),
    },
    Edge {
        from: Some(CaseStatus::Pending),
        to: CaseStatus::UnderReview,
        actor: RequiredActor::OwningStation,
        notify: None,
    },
    Edge {
        from: Some(CaseStatus::UnderReview),
        to: CaseStatus::SentToCourt,
        actor: RequiredActor::OwningStation,
        notify: Some(NotificationType::SentToCourt),
    },
    Edge {
        from: Some(CaseStatus::SentToCourt),
        to: CaseStatus::Approved,
        actor: RequiredActor::AssignedCourt,
        notify: Some(NotificationType::CaseApproved),
    },
    Edge {
        from: Some(CaseStatus::SentToCourt),
        to: CaseStatus::Rejected,
        actor: RequiredActor::AssignedCourt,
        notify: Some(NotificationType::CaseRejected),
    },
    Edge {
        from: Some(CaseStatus::Approved),
        to: CaseStatus::Resolved,
        actor: RequiredActor::AssignedCourtOrAdmin,
        notify: Some(NotificationType::CaseResolved),
    },
    Edge {
        from: Some(CaseStatus::Rejected),
        to: CaseStatus::Resolved,
        actor: RequiredActor::AssignedCourtOrAdmin,
        notify: Some(NotificationType::CaseResolved),
    },
];

pub fn edge(from: CaseStatus, to: CaseStatus) -> Option<&'static Edge> {
    EDGES.iter().find(|e| e.from == Some(from) && e.to == to)
}

/// Any edge leading into `to`. Edges into the same status share their actor.
pub fn edge_into(to: CaseStatus) -> Option<&'static Edge> {
    EDGES.iter().find(|e| e.to == to)
}

#[derive(Clone)]
pub struct CaseLifecycle {
    store: Arc<dyn Storage>,
    notifier: NotificationEmitter,
    case_locks: Arc<KeyedLocks>,
    evidence_locks: Arc<KeyedLocks>,
}

impl CaseLifecycle {
    pub fn new(
        store: Arc<dyn Storage>,
        notifier: NotificationEmitter,
        case_locks: Arc<KeyedLocks>,
        evidence_locks: Arc<KeyedLocks>,
    ) -> Self {
        Self {
            store,
            notifier,
            case_locks,
            evidence_locks,
        }
    }

    /// An approved directory entry with `role`, else a validation error on `field`.
    async fn directory_entry(&self, id: i64, role: Role, field: &str) -> Result<Account, AppError> {
        match self.store.find_account(id).await? {
            Some(account) if account.role == role && account.is_active() => Ok(account),
            Some(account) if account.role == role => Err(AppError::invalid_field(
                field,
                format!("{} {} is {}", role, id, account.status),
            )),
            _ => Err(AppError::invalid_field(
                field,
                format!("{} is not a registered {}", id, role),
            )),
        }
    }

    /// File a new case in `pending` with the given station.
    #[tracing::instrument(skip(self, req), fields(actor = %actor, station_id = req.station_id))]
    pub async fn file_case(&self, actor: Actor, req: FileCaseRequest) -> Result<Case, AppError> {
        if actor.role != Role::Citizen {
            return Err(AppError::unauthorized("Only citizens can file cases"));
        }
        req.validate_request()?;
        if req.title.trim().is_empty() {
            return Err(AppError::invalid_field("title", "Title is required"));
        }
        if req.evidence.iter().any(|e| e.file_path.trim().is_empty()) {
            return Err(AppError::invalid_field("evidence", "Evidence file path is required"));
        }
        let station = self
            .directory_entry(req.station_id, Role::Police, "station_id")
            .await?;

        let case = self
            .store
            .insert_case(NewCase {
                title: req.title.trim().to_string(),
                description: req.description,
                incident_date: req.incident_date,
                filed_by: actor.id,
                assigned_station: station.id,
                evidence: req
                    .evidence
                    .iter()
                    .map(|e| NewEvidence {
                        file_path: e.file_path.clone(),
                        file_type: e.resolved_type(),
                    })
                    .collect(),
            })
            .await?;

        tracing::info!(
            case_id = case.id,
            evidence = case.evidence.len(),
            "Case filed"
        );
        self.notifier.case_filed(&case, &station.name).await;

        Ok(case)
    }

    /// Move a case to `target` on behalf of `actor`.
    #[tracing::instrument(skip(self), fields(actor = %actor))]
    pub async fn transition(
        &self,
        actor: Actor,
        case_id: i64,
        target: CaseStatus,
        opts: TransitionOpts,
    ) -> Result<Case, AppError> {
        let _guard = self.case_locks.lock(case_id).await;

        let case = self
            .store
            .find_case(case_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Case {} not found", case_id)))?;

        if case.status == target {
            let authorized = edge_into(target).is_some_and(|e| e.actor.permits(actor, &case));
            if !authorized {
                return Err(unauthorized(actor, &case, target));
            }
            if target == CaseStatus::SentToCourt
                && opts.court_id.is_some()
                && opts.court_id != case.assigned_court
            {
                return Err(AppError::invalid_transition(format!(
                    "Case {} was already sent to another court",
                    case_id
                )));
            }
            return Ok(case);
        }

        let edge = edge(case.status, target).ok_or_else(|| {
            AppError::invalid_transition(format!(
                "Case {} cannot move from {} to {}",
                case_id, case.status, target
            ))
        })?;

        if !edge.actor.permits(actor, &case) {
            return Err(unauthorized(actor, &case, target));
        }

        let court = if target == CaseStatus::SentToCourt {
            let court_id = opts
                .court_id
                .ok_or_else(|| AppError::invalid_field("court_id", "court_id is required"))?;
            Some(self.directory_entry(court_id, Role::Court, "court_id").await?)
        } else {
            None
        };

        let updated = self
            .store
            .update_case_status(case_id, case.status, target, court.as_ref().map(|c| c.id))
            .await?
            .ok_or_else(|| {
                AppError::invalid_transition(format!("Case {} changed concurrently", case_id))
            })?;

        tracing::info!(case_id, from = %case.status, to = %target, "Case transitioned");

        if let Some(kind) = edge.notify {
            let court_name = court.as_ref().map(|c| c.name.as_str());
            self.notifier
                .case_transitioned(&updated, kind, court_name)
                .await;
        }

        Ok(updated)
    }

    /// Remove a case and its evidence. Only the filer may do this.
    #[tracing::instrument(skip(self), fields(actor = %actor))]
    pub async fn delete_case(&self, actor: Actor, case_id: i64) -> Result<(), AppError> {
        let _case_guard = self.case_locks.lock(case_id).await;

        let case = self
            .store
            .find_case(case_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Case {} not found", case_id)))?;

        if !RequiredActor::Filer.permits(actor, &case) {
            return Err(AppError::unauthorized("Only the filing citizen can delete a case"));
        }

        let evidence_ids: Vec<i64> = case.evidence.iter().map(|e| e.id).collect();
        let _evidence_guards = self.evidence_locks.lock_many(&evidence_ids).await;

        if !self.store.delete_case(case_id).await? {
            return Err(AppError::not_found(format!("Case {} not found", case_id)));
        }

        tracing::info!(case_id, evidence = evidence_ids.len(), "Case deleted");
        Ok(())
    }

    /// A case with its evidence, for anyone with a stake in it.
    pub async fn get_case(&self, actor: Actor, case_id: i64) -> Result<Case, AppError> {
        let case = self
            .store
            .find_case(case_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Case {} not found", case_id)))?;

        if !CaseFilter::for_actor(actor).matches(&case) {
            return Err(AppError::unauthorized(format!(
                "{} has no access to case {}",
                actor, case_id
            )));
        }
        Ok(case)
    }

    pub async fn list_cases(&self, actor: Actor) -> Result<Vec<Case>, AppError> {
        self.store.list_cases(CaseFilter::for_actor(actor)).await
    }
}

fn unauthorized(actor: Actor, case: &Case, target: CaseStatus) -> AppError {
    AppError::unauthorized(format!(
        "{} may not move case {} to {}",
        actor, case.id, target
    ))
}
