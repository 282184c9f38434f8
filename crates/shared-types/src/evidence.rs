use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Extensions treated as still images. Everything else is analyzed as video.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Media kind of an evidence file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Image,
    Video,
}

impl FileType {
    /// Infer the media kind from a file path's extension.
    pub fn from_path(path: &str) -> Self {
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            FileType::Image
        } else {
            FileType::Video
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(FileType::Image),
            "video" => Some(FileType::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Image => "image",
            FileType::Video => "video",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of the authenticity analysis for one evidence item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    #[default]
    NotStarted,
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(AnalysisStatus::NotStarted),
            "processing" => Some(AnalysisStatus::Processing),
            "completed" => Some(AnalysisStatus::Completed),
            "failed" => Some(AnalysisStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::NotStarted => "not_started",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }

    /// `completed` and `failed` are sticky until an explicit restart.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The analyzer's answer for one file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Verdict {
    pub is_authentic: bool,
    /// Confidence in the verdict, 0 to 100.
    pub confidence_score: f64,
}

impl Verdict {
    pub fn new(is_authentic: bool, confidence_score: f64) -> Self {
        Self {
            is_authentic,
            confidence_score,
        }
    }

    pub fn is_in_range(&self) -> bool {
        self.confidence_score.is_finite() && (0.0..=100.0).contains(&self.confidence_score)
    }
}

/// A media file attached to a case, plus its analysis outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Evidence {
    pub id: i64,
    pub case_id: i64,
    pub file_path: String,
    pub file_type: FileType,
    pub analysis_status: AnalysisStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_authentic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl Evidence {
    /// The verdict, present only once analysis has completed.
    pub fn verdict(&self) -> Option<Verdict> {
        match (self.analysis_status, self.is_authentic, self.confidence_score) {
            (AnalysisStatus::Completed, Some(is_authentic), Some(score)) => {
                Some(Verdict::new(is_authentic, score))
            }
            _ => None,
        }
    }

    pub(crate) fn clear_outcome(&mut self) {
        self.is_authentic = None;
        self.confidence_score = None;
        self.failure_reason = None;
    }

    /// Move into `processing`, dropping any earlier outcome.
    pub fn mark_processing(&mut self) {
        self.clear_outcome();
        self.analysis_status = AnalysisStatus::Processing;
    }

    pub fn mark_completed(&mut self, verdict: Verdict) {
        self.clear_outcome();
        self.analysis_status = AnalysisStatus::Completed;
        self.is_authentic = Some(verdict.is_authentic);
        self.confidence_score = Some(verdict.confidence_score);
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.clear_outcome();
        self.analysis_status = AnalysisStatus::Failed;
        self.failure_reason = Some(reason.into());
    }
}

/// One file reference supplied when filing a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EvidenceUpload {
    pub file_path: String,
    /// Inferred from the extension when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
}

impl EvidenceUpload {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            file_type: None,
        }
    }

    pub fn resolved_type(&self) -> FileType {
        self.file_type
            .unwrap_or_else(|| FileType::from_path(&self.file_path))
    }
}

/// Response to `POST /api/evidence/{id}/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnalysisStartedResponse {
    pub evidence_id: i64,
    pub analysis_status: AnalysisStatus,
}
