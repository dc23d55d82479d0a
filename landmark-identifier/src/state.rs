use crate::policy::Decision;
use crate::types::{Candidate, Confidence, IdentificationResult, LandmarkRecord, PipelineOutcome, RunFailure, RunId};
use serde::{Deserialize, Serialize};

/// Where one run is. Transitions are computed by [`RunPhase::apply`] and
/// never mutate a phase in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    EncodingImage,
    AwaitingIdentification,
    AwaitingClarification { candidates: Vec<Candidate> },
    Succeeded { record: LandmarkRecord },
    Failed { failure: RunFailure },
}

#[derive(Debug, Clone)]
pub enum RunEvent {
    Submitted,
    ImageEncoded,
    Identified { result: IdentificationResult, decision: Decision },
    Clarified { selected: String },
    Failed(RunFailure),
}

impl RunEvent {
    fn name(&self) -> &'static str {
        match self {
            RunEvent::Submitted => "submitted",
            RunEvent::ImageEncoded => "image_encoded",
            RunEvent::Identified { .. } => "identified",
            RunEvent::Clarified { .. } => "clarified",
            RunEvent::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot apply `{event}` while {from}")]
    Illegal { from: &'static str, event: &'static str },

    #[error("clarified to {0:?}, which was not a pending candidate")]
    SelectionNotPending(String),
}

impl RunPhase {
    pub fn name(&self) -> &'static str {
        match self {
            RunPhase::Idle => "idle",
            RunPhase::EncodingImage => "encoding_image",
            RunPhase::AwaitingIdentification => "awaiting_identification",
            RunPhase::AwaitingClarification { .. } => "awaiting_clarification",
            RunPhase::Succeeded { .. } => "succeeded",
            RunPhase::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Succeeded { .. } | RunPhase::Failed { .. })
    }

    pub fn apply(self, event: RunEvent) -> Result<RunPhase, TransitionError> {
        let from = self.name();
        match (self, event) {
            (RunPhase::Idle, RunEvent::Submitted) => Ok(RunPhase::EncodingImage),
            (RunPhase::EncodingImage, RunEvent::ImageEncoded) => Ok(RunPhase::AwaitingIdentification),
            (RunPhase::AwaitingIdentification, RunEvent::Identified { result, decision }) => Ok(match decision {
                Decision::Accept => RunPhase::Succeeded {
                    record: LandmarkRecord::accepted(&result),
                },
                Decision::Clarify => RunPhase::AwaitingClarification {
                    candidates: result.candidates(),
                },
            }),
            (RunPhase::AwaitingClarification { candidates }, RunEvent::Clarified { selected }) => {
                let chosen = candidates
                    .iter()
                    .find(|c| c.name == selected)
                    .cloned()
                    .ok_or(TransitionError::SelectionNotPending(selected))?;
                Ok(RunPhase::Succeeded {
                    record: LandmarkRecord::clarified(&chosen, candidates),
                })
            }
            (
                RunPhase::EncodingImage | RunPhase::AwaitingIdentification | RunPhase::AwaitingClarification { .. },
                RunEvent::Failed(failure),
            ) => Ok(RunPhase::Failed { failure }),
            (_, event) => Err(TransitionError::Illegal {
                from,
                event: event.name(),
            }),
        }
    }

    /// Candidates waiting on a clarification call, if that is where the run is.
    pub fn pending_candidates(&self) -> Option<&[Candidate]> {
        match self {
            RunPhase::AwaitingClarification { candidates } => Some(candidates),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<PipelineOutcome> {
        match self {
            RunPhase::Succeeded { record } => Some(PipelineOutcome::Succeeded(record.clone())),
            RunPhase::Failed { failure } => Some(PipelineOutcome::Failed(failure.clone())),
            _ => None,
        }
    }

    pub fn presentation(&self) -> PresentationState {
        match self {
            RunPhase::Idle => PresentationState::Idle,
            RunPhase::EncodingImage
            | RunPhase::AwaitingIdentification
            | RunPhase::AwaitingClarification { .. } => PresentationState::Loading,
            RunPhase::Succeeded { record } => PresentationState::Succeeded {
                landmark: record.landmark.clone(),
                confidence: record.confidence,
            },
            RunPhase::Failed { failure } => PresentationState::Failed {
                message: failure.message.clone(),
            },
        }
    }
}

/// The four states a renderer cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PresentationState {
    Idle,
    Loading,
    Succeeded { landmark: String, confidence: Confidence },
    Failed { message: String },
}

/// What the orchestrator publishes: the phase of the run currently holding
/// the display slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub run: RunId,
    pub phase: RunPhase,
}

impl StatusUpdate {
    pub fn idle() -> Self {
        Self {
            run: RunId(0),
            phase: RunPhase::Idle,
        }
    }

    pub fn presentation(&self) -> PresentationState {
        self.phase.presentation()
    }
}
