//! Read-only per-actor counts.

use std::collections::BTreeMap;
use std::sync::Arc;

use shared_types::{
    Actor, AdminStats, AnalysisStatus, AppError, Case, CaseStatus, CitizenStats, CourtStats,
    PoliceStats, Role, ScopedStats,
};

use crate::storage::{CaseFilter, Storage};

#[derive(Clone)]
pub struct StatsAggregator {
    store: Arc<dyn Storage>,
}

fn count(cases: &[Case], pred: impl Fn(&Case) -> bool) -> i64 {
    cases.iter().filter(|c| pred(c)).count() as i64
}

fn citizen(cases: &[Case]) -> CitizenStats {
    CitizenStats {
        total_cases: cases.len() as i64,
        pending_cases: count(cases, |c| c.status == CaseStatus::Pending),
        approved_cases: count(cases, |c| {
            matches!(c.status, CaseStatus::Approved | CaseStatus::Resolved)
        }),
    }
}

fn police(cases: &[Case]) -> PoliceStats {
    PoliceStats {
        active_cases: cases.len() as i64,
        evidence_uploaded: cases.iter().map(|c| c.evidence.len() as i64).sum(),
        sent_to_court: count(cases, |c| c.status == CaseStatus::SentToCourt),
        pending_review: count(cases, |c| c.status == CaseStatus::Pending),
    }
}

fn court(cases: &[Case]) -> CourtStats {
    let evidence = cases.iter().flat_map(|c| c.evidence.iter());
    let analyzed: Vec<_> = evidence
        .filter(|e| e.analysis_status == AnalysisStatus::Completed)
        .collect();

    CourtStats {
        assigned_cases: cases.len() as i64,
        awaiting_decision: count(cases, |c| c.status == CaseStatus::SentToCourt),
        approved: count(cases, |c| c.status == CaseStatus::Approved),
        rejected: count(cases, |c| c.status == CaseStatus::Rejected),
        resolved: count(cases, |c| c.status == CaseStatus::Resolved),
        evidence_analyzed: analyzed.len() as i64,
        evidence_flagged: analyzed
            .iter()
            .filter(|e| e.is_authentic == Some(false))
            .count() as i64,
    }
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Counts over the cases in `actor`'s scope.
    pub async fn for_actor(&self, actor: Actor) -> Result<ScopedStats, AppError> {
        let cases = self.store.list_cases(CaseFilter::for_actor(actor)).await?;
        let stats = match actor.role {
            Role::Citizen => ScopedStats::Citizen(citizen(&cases)),
            Role::Police => ScopedStats::Police(police(&cases)),
            Role::Court => ScopedStats::Court(court(&cases)),
            Role::Admin => ScopedStats::Admin(self.admin(&cases).await?),
        };
        Ok(stats)
    }

    async fn admin(&self, cases: &[Case]) -> Result<AdminStats, AppError> {
        let mut cases_by_status: BTreeMap<String, i64> = CaseStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        for case in cases {
            *cases_by_status.entry(case.status.as_str().to_string()).or_default() += 1;
        }

        let mut accounts_by_role: BTreeMap<String, i64> = Role::ALL
            .iter()
            .map(|r| (r.as_str().to_string(), 0))
            .collect();
        for account in self.store.list_accounts(None).await? {
            *accounts_by_role.entry(account.role.as_str().to_string()).or_default() += 1;
        }

        Ok(AdminStats {
            total_cases: cases.len() as i64,
            cases_by_status,
            accounts_by_role,
        })
    }
}
