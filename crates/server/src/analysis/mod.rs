//! Evidence analysis job tracker.
//!
//! `start` flips an evidence item to `processing` and hands the file to the
//! [`Analyzer`] on a spawned task. The worker writes the terminal state
//! (`completed` or `failed`) under the evidence lock, only if the item is still
//! `processing`, so each start produces exactly one terminal write. A panic in
//! the analyzer ends the job in `failed` like any other analyzer error. Callers
//! poll [`AnalysisTracker::status`]; in-process listeners may also
//! [`subscribe`](AnalysisTracker::subscribe) to terminal outcomes.

pub mod analyzer;

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use shared_types::{AnalysisStatus, AppError, Evidence, Verdict};

pub use analyzer::{AnalysisError, Analyzer, HttpAnalyzer, StaticAnalyzer, UnavailableAnalyzer};

use crate::locks::KeyedLocks;
use crate::storage::Storage;

const OUTCOME_CHANNEL_CAPACITY: usize = 256;

/// A terminal analysis result, as published to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub evidence_id: i64,
    pub case_id: i64,
    pub status: AnalysisStatus,
    pub verdict: Option<Verdict>,
    pub failure_reason: Option<String>,
}

impl AnalysisOutcome {
    fn from_evidence(ev: &Evidence) -> Self {
        Self {
            evidence_id: ev.id,
            case_id: ev.case_id,
            status: ev.analysis_status,
            verdict: ev.verdict(),
            failure_reason: ev.failure_reason.clone(),
        }
    }
}

struct TrackerInner {
    store: Arc<dyn Storage>,
    analyzer: Arc<dyn Analyzer>,
    locks: Arc<KeyedLocks>,
    deadline: Option<Duration>,
    outcomes: broadcast::Sender<AnalysisOutcome>,
}

#[derive(Clone)]
pub struct AnalysisTracker {
    inner: Arc<TrackerInner>,
}

impl AnalysisTracker {
    /// `locks` must be the evidence lock table shared with case deletion.
    pub fn new(
        store: Arc<dyn Storage>,
        analyzer: Arc<dyn Analyzer>,
        locks: Arc<KeyedLocks>,
        deadline: Option<Duration>,
    ) -> Self {
        let (outcomes, _) = broadcast::channel(OUTCOME_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(TrackerInner {
                store,
                analyzer,
                locks,
                deadline,
                outcomes,
            }),
        }
    }

    /// Move the evidence to `processing` and schedule the analyzer.
    ///
    /// Returns the `processing` snapshot without waiting for the verdict.
    /// Restarting from `completed` or `failed` clears the earlier outcome.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self, evidence_id: i64) -> Result<Evidence, AppError> {
        let inner = &self.inner;
        let guard = inner.locks.lock(evidence_id).await;

        let mut evidence = inner
            .store
            .find_evidence(evidence_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Evidence {} not found", evidence_id)))?;

        if evidence.analysis_status == AnalysisStatus::Processing {
            return Err(already_processing(evidence_id));
        }

        let previous = evidence.analysis_status;
        evidence.mark_processing();
        if !inner.store.save_analysis(&evidence, previous).await? {
            // Another process wrote first, or the row vanished.
            return match inner.store.find_evidence(evidence_id).await? {
                Some(_) => Err(already_processing(evidence_id)),
                None => Err(AppError::not_found(format!("Evidence {} not found", evidence_id))),
            };
        }
        drop(guard);

        tracing::info!(
            evidence_id,
            case_id = evidence.case_id,
            file_type = %evidence.file_type,
            "Analysis started"
        );

        let worker = self.inner.clone();
        let job = evidence.clone();
        tokio::spawn(async move { worker.run(job).await });

        Ok(evidence)
    }

    /// Current snapshot of the evidence. Never blocks on a running analysis.
    pub async fn status(&self, evidence_id: i64) -> Result<Evidence, AppError> {
        self.inner
            .store
            .find_evidence(evidence_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Evidence {} not found", evidence_id)))
    }

    /// Receive every terminal outcome published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<AnalysisOutcome> {
        self.inner.outcomes.subscribe()
    }
}

fn already_processing(evidence_id: i64) -> AppError {
    AppError::already_processing(format!(
        "Evidence {} is already being analyzed",
        evidence_id
    ))
}

/// Store writes tried per terminal outcome before giving up.
const RECORD_ATTEMPTS: u32 = 3;
const RECORD_BACKOFF: Duration = Duration::from_millis(50);

impl TrackerInner {
    async fn run(&self, job: Evidence) {
        let analyzer = self.analyzer.clone();
        let file_path = job.file_path.clone();
        let file_type = job.file_type;
        // Own task: a panicking analyzer surfaces here as a JoinError.
        let mut task = tokio::spawn(async move { analyzer.analyze(&file_path, file_type).await });

        let joined = match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, &mut task).await {
                Ok(joined) => joined,
                Err(_) => {
                    task.abort();
                    Ok(Err(AnalysisError::Timeout))
                }
            },
            None => task.await,
        };

        let result = match joined {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(evidence_id = job.id, error = %e, "Analyzer task did not finish");
                Err(AnalysisError::Crashed)
            }
        };

        let result = result.and_then(|verdict| {
            if verdict.is_in_range() {
                Ok(verdict)
            } else {
                Err(AnalysisError::Rejected(format!(
                    "confidence score {} out of range",
                    verdict.confidence_score
                )))
            }
        });

        self.finish(job.id, result).await;
    }

    /// Record the terminal state, retrying store errors. The last attempt
    /// records `failed` so the item does not stay `processing`.
    async fn finish(&self, evidence_id: i64, mut result: Result<Verdict, AnalysisError>) {
        for attempt in 1..=RECORD_ATTEMPTS {
            match self.record(evidence_id, &result).await {
                Ok(Some(evidence)) => {
                    match &result {
                        Ok(verdict) => tracing::info!(
                            evidence_id,
                            is_authentic = verdict.is_authentic,
                            confidence_score = verdict.confidence_score,
                            "Analysis completed"
                        ),
                        Err(e) => tracing::warn!(evidence_id, reason = %e, "Analysis failed"),
                    }
                    // No subscribers is fine.
                    let _ = self.outcomes.send(AnalysisOutcome::from_evidence(&evidence));
                    return;
                }
                Ok(None) => return,
                Err(e) => {
                    tracing::error!(evidence_id, attempt, error = %e, "Failed to record analysis result");
                    if attempt == RECORD_ATTEMPTS {
                        break;
                    }
                    if attempt + 1 == RECORD_ATTEMPTS {
                        result = Err(AnalysisError::Rejected(format!(
                            "result not recorded: {}",
                            e.message
                        )));
                    }
                    tokio::time::sleep(RECORD_BACKOFF * attempt).await;
                }
            }
        }

        tracing::error!(evidence_id, "Giving up on analysis result; evidence left processing");
    }

    /// One conditional terminal write under the evidence lock. `None` means the
    /// result was discarded because the evidence moved on or was deleted.
    async fn record(
        &self,
        evidence_id: i64,
        result: &Result<Verdict, AnalysisError>,
    ) -> Result<Option<Evidence>, AppError> {
        let _guard = self.locks.lock(evidence_id).await;

        let Some(mut evidence) = self.store.find_evidence(evidence_id).await? else {
            tracing::info!(evidence_id, "Evidence deleted during analysis; discarding result");
            return Ok(None);
        };

        if evidence.analysis_status != AnalysisStatus::Processing {
            tracing::warn!(
                evidence_id,
                status = %evidence.analysis_status,
                "Evidence no longer processing; discarding result"
            );
            return Ok(None);
        }

        match result {
            Ok(verdict) => evidence.mark_completed(*verdict),
            Err(e) => evidence.mark_failed(e.to_string()),
        }

        if self.store.save_analysis(&evidence, AnalysisStatus::Processing).await? {
            Ok(Some(evidence))
        } else {
            tracing::info!(evidence_id, "Evidence changed during analysis; discarding result");
            Ok(None)
        }
    }
}
