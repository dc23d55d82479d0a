//! Wire shapes the model must answer with, and the decode step that turns its
//! text into validated results.
//!
//! Field names follow the JSON the model is instructed to produce
//! (`landmarkName`, `confidence`, `selectedLandmark`), not the Rust names.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::defs::{Candidate, ClarificationRequest, ClarificationResult, Confidence, IdentificationResult};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContractError {
    #[error("{schema} response is not valid JSON of the expected shape: {reason}")]
    Malformed { schema: &'static str, reason: String },

    #[error("field `{field}` must not be empty")]
    EmptyField { field: &'static str },

    #[error("confidence {value} is not a number in [0, 1]")]
    ConfidenceOutOfRange { value: f64 },

    #[error("selected landmark {selected:?} is not one of the offered candidates {offered:?}")]
    UnknownSelection { selected: String, offered: Vec<String> },

    #[error("clarification needs at least one candidate")]
    NoCandidates,

    #[error("unsupported image media type: {0}")]
    UnsupportedMediaType(String),

    #[error("malformed data URI: {0}")]
    MalformedDataUri(String),
}

pub const IDENTIFY_SCHEMA: &str = "identifyLandmark";
pub const CLARIFY_SCHEMA: &str = "clarifyLandmarkIdentification";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyLandmarkOutput {
    pub landmark_name: String,
    pub confidence: f64,
    #[serde(default)]
    pub alternatives: Vec<PossibleMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PossibleMatch {
    pub landmark_name: String,
    pub confidence_score: f64,
}

impl From<&Candidate> for PossibleMatch {
    fn from(candidate: &Candidate) -> Self {
        Self {
            landmark_name: candidate.name.clone(),
            confidence_score: candidate.confidence.value(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarifyLandmarkOutput {
    pub selected_landmark: String,
}

/// Response schema for the identification call, in the OpenAPI subset that
/// generative model APIs accept for structured output.
pub fn identify_response_schema(max_candidates: usize) -> Value {
    let mut schema = json!({
        "type": "OBJECT",
        "properties": {
            "landmarkName": { "type": "STRING", "description": "The name of the identified landmark." },
            "confidence": { "type": "NUMBER", "description": "The confidence level of the landmark identification (0-1)." }
        },
        "required": ["landmarkName", "confidence"]
    });
    if max_candidates > 1 {
        schema["properties"]["alternatives"] = json!({
            "type": "ARRAY",
            "description": "Other plausible landmarks, most likely first.",
            "maxItems": max_candidates - 1,
            "items": {
                "type": "OBJECT",
                "properties": {
                    "landmarkName": { "type": "STRING" },
                    "confidenceScore": { "type": "NUMBER" }
                },
                "required": ["landmarkName", "confidenceScore"]
            }
        });
    }
    schema
}

pub fn clarify_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "selectedLandmark": { "type": "STRING", "description": "The landmark selected from the list." }
        },
        "required": ["selectedLandmark"]
    })
}

/// Models sometimes wrap JSON in a Markdown fence even when asked not to.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return trimmed;
    };
    // Drop an info string such as `json` on the opening line.
    match inner.split_once('\n') {
        Some((info, body)) if !info.trim().contains(['{', '[']) => body.trim(),
        _ => inner.trim(),
    }
}

fn parse<T: for<'de> Deserialize<'de>>(schema: &'static str, text: &str) -> Result<T, ContractError> {
    serde_json::from_str(strip_code_fence(text)).map_err(|e| ContractError::Malformed {
        schema,
        reason: e.to_string(),
    })
}

pub fn decode_identification(text: &str) -> Result<IdentificationResult, ContractError> {
    let output: IdentifyLandmarkOutput = parse(IDENTIFY_SCHEMA, text)?;
    let primary = Candidate::new(output.landmark_name, Confidence::new(output.confidence)?)?;
    let alternatives = output
        .alternatives
        .into_iter()
        .map(|m| Candidate::new(m.landmark_name, Confidence::new(m.confidence_score)?))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(IdentificationResult {
        name: primary.name,
        confidence: primary.confidence,
        alternatives,
    })
}

/// Decode a clarification answer and check it names one of the offered
/// candidates exactly.
pub fn decode_clarification(text: &str, request: &ClarificationRequest) -> Result<ClarificationResult, ContractError> {
    let output: ClarifyLandmarkOutput = parse(CLARIFY_SCHEMA, text)?;
    if output.selected_landmark.is_empty() {
        return Err(ContractError::EmptyField { field: "selectedLandmark" });
    }
    if request.find(&output.selected_landmark).is_none() {
        return Err(ContractError::UnknownSelection {
            selected: output.selected_landmark,
            offered: request.candidates().iter().map(|c| c.name.clone()).collect(),
        });
    }
    Ok(ClarificationResult {
        selected: output.selected_landmark,
    })
}
