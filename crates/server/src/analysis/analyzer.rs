//! Clients for the external authenticity analyzer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use shared_types::{AppError, FileType, Verdict};

/// Why an analysis run produced no verdict. The `Display` text is what ends up
/// in the evidence's `failure_reason`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    Timeout,
    /// The analyzer found nothing it could assess (no face, empty frames).
    NoContent,
    /// No analyzer is configured.
    Unavailable,
    /// The analyzer task panicked or was cancelled.
    Crashed,
    /// The analyzer answered, but the answer is unusable.
    Rejected(String),
    /// The analyzer could not be reached or returned an error status.
    Transport(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Timeout => write!(f, "timeout"),
            AnalysisError::NoContent => write!(f, "no content detected"),
            AnalysisError::Unavailable => write!(f, "analyzer unavailable"),
            AnalysisError::Crashed => write!(f, "analyzer crashed"),
            AnalysisError::Rejected(reason) => write!(f, "rejected: {}", reason),
            AnalysisError::Transport(reason) => write!(f, "transport error: {}", reason),
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Produces an authenticity verdict for one evidence file.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, file_path: &str, file_type: FileType) -> Result<Verdict, AnalysisError>;
}

// ── HTTP ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    file_path: &'a str,
    file_type: FileType,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    is_authentic: Option<bool>,
    #[serde(default)]
    confidence_score: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

impl AnalyzeResponse {
    fn into_verdict(self) -> Result<Verdict, AnalysisError> {
        match (self.error.as_deref(), self.is_authentic, self.confidence_score) {
            (Some("no_content"), _, _) => Err(AnalysisError::NoContent),
            (Some(other), _, _) => Err(AnalysisError::Rejected(other.to_string())),
            (None, Some(is_authentic), Some(score)) => Ok(Verdict::new(is_authentic, score)),
            _ => Err(AnalysisError::Rejected("incomplete response".to_string())),
        }
    }
}

/// Calls an analyzer service over HTTP.
///
/// Sends `{file_path, file_type}` and expects `{is_authentic, confidence_score}`.
pub struct HttpAnalyzer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnalyzer {
    pub fn new(endpoint: impl Into<String>, request_timeout: Option<Duration>) -> Result<Self, AppError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build analyzer client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Analyzer for HttpAnalyzer {
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn analyze(&self, file_path: &str, file_type: FileType) -> Result<Verdict, AnalysisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnalyzeRequest {
                file_path,
                file_type,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout
                } else {
                    AnalysisError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            return Err(AnalysisError::NoContent);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Transport(format!(
                "analyzer returned {}: {}",
                status, body
            )));
        }

        let body: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Rejected(format!("malformed response: {}", e)))?;
        body.into_verdict()
    }
}

// ── Fallbacks ───────────────────────────────────────────────────────

/// Used when no analyzer endpoint is configured.
pub struct UnavailableAnalyzer;

#[async_trait]
impl Analyzer for UnavailableAnalyzer {
    async fn analyze(&self, _file_path: &str, _file_type: FileType) -> Result<Verdict, AnalysisError> {
        Err(AnalysisError::Unavailable)
    }
}

/// Answers from a fixed table. For tests and local runs without a model.
///
/// A gate makes every call wait for a permit, so callers can hold a job in
/// `processing` for as long as they need.
pub struct StaticAnalyzer {
    default: Result<Verdict, AnalysisError>,
    by_path: HashMap<String, Result<Verdict, AnalysisError>>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
    calls: AtomicUsize,
}

impl StaticAnalyzer {
    pub fn new(default: Result<Verdict, AnalysisError>) -> Self {
        Self {
            default,
            by_path: HashMap::new(),
            delay: None,
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn verdict(is_authentic: bool, confidence_score: f64) -> Self {
        Self::new(Ok(Verdict::new(is_authentic, confidence_score)))
    }

    pub fn failing(err: AnalysisError) -> Self {
        Self::new(Err(err))
    }

    /// Answer `result` for one specific file.
    pub fn with_path(mut self, path: impl Into<String>, result: Result<Verdict, AnalysisError>) -> Self {
        self.by_path.insert(path.into(), result);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Block each call until a permit is added to `gate`.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// How many times `analyze` has been entered.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyzer for StaticAnalyzer {
    async fn analyze(&self, file_path: &str, _file_type: FileType) -> Result<Verdict, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return Err(AnalysisError::Unavailable),
            }
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.by_path
            .get(file_path)
            .unwrap_or(&self.default)
            .clone()
    }
}
