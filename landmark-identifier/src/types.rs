use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use interfaces::defs::{
    Candidate, ClarificationRequest, ClarificationResult, Confidence, EncodedImage, IdentificationRequest,
    IdentificationResult, ImageMediaType,
};
pub use interfaces::ContractError;

use crate::state::TransitionError;

/// Monotonic identifier for one submission. `RunId(0)` is the idle slot
/// before anything was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    InvalidImage,
    ModelUnavailable,
    ContractViolation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl RunFailure {
    pub fn new(kind: FailureKind, cause: impl fmt::Display) -> Self {
        Self {
            kind,
            message: format!("Failed to identify landmark: {}", cause),
        }
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// The landmark a run settled on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkRecord {
    pub landmark: String,
    pub confidence: Confidence,
    /// True when the identification fell below the threshold and the
    /// clarification call chose among `candidates`.
    pub clarified: bool,
    pub candidates: Vec<Candidate>,
    pub identified_at: DateTime<Utc>,
}

impl LandmarkRecord {
    pub fn accepted(result: &IdentificationResult) -> Self {
        Self {
            landmark: result.name.clone(),
            confidence: result.confidence,
            clarified: false,
            candidates: Vec::new(),
            identified_at: Utc::now(),
        }
    }

    pub fn clarified(selected: &Candidate, candidates: Vec<Candidate>) -> Self {
        Self {
            landmark: selected.name.clone(),
            confidence: selected.confidence,
            clarified: true,
            candidates,
            identified_at: Utc::now(),
        }
    }
}

impl fmt::Display for LandmarkRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Confidence: {})", self.landmark, self.confidence)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Succeeded(LandmarkRecord),
    Failed(RunFailure),
}

impl PipelineOutcome {
    pub fn landmark(&self) -> Option<&str> {
        match self {
            PipelineOutcome::Succeeded(record) => Some(&record.landmark),
            PipelineOutcome::Failed(_) => None,
        }
    }

    pub fn confidence(&self) -> Option<Confidence> {
        match self {
            PipelineOutcome::Succeeded(record) => Some(record.confidence),
            PipelineOutcome::Failed(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Succeeded(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Model response violated its contract: {0}")]
    ContractViolation(#[from] ContractError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Illegal run transition: {0}")]
    IllegalTransition(#[from] TransitionError),

    #[error("{run} was superseded by a newer submission")]
    Superseded { run: RunId },
}

impl IdentifierError {
    /// Which user-facing failure this error becomes. Internal errors are
    /// reported as contract violations since the run cannot trust its state.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            IdentifierError::InvalidImage(_) => FailureKind::InvalidImage,
            IdentifierError::ModelUnavailable(_)
            | IdentifierError::Config(_)
            | IdentifierError::Superseded { .. } => FailureKind::ModelUnavailable,
            IdentifierError::ContractViolation(_) | IdentifierError::IllegalTransition(_) => {
                FailureKind::ContractViolation
            }
        }
    }

    pub fn to_failure(&self) -> RunFailure {
        RunFailure::new(self.failure_kind(), self)
    }
}

impl From<reqwest::Error> for IdentifierError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            IdentifierError::ModelUnavailable(format!("request timed out: {}", error))
        } else {
            IdentifierError::ModelUnavailable(error.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, IdentifierError>;
