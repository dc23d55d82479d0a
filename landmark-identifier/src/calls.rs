//! The two model calls of a run. Each renders its instruction, makes exactly
//! one request through a [`GenerativeModel`], and decodes the answer against
//! its contract before anything downstream sees it.

use crate::model_adapter::{CallKind, GenerativeModel, ModelRequest};
use crate::prompt::{clarification_instruction, identification_instruction};
use crate::types::{ClarificationRequest, ClarificationResult, IdentificationRequest, IdentificationResult, Result};
use interfaces::schema::{clarify_response_schema, decode_clarification, decode_identification, identify_response_schema};
use tracing::{debug, info};

pub async fn identify(model: &dyn GenerativeModel, request: &IdentificationRequest) -> Result<IdentificationResult> {
    let max_candidates = request.max_candidates();
    let model_request = ModelRequest {
        kind: CallKind::Identify,
        instruction: identification_instruction(max_candidates),
        image: &request.image,
        response_schema: identify_response_schema(max_candidates),
    };

    debug!("Identification prompt for {}: {}", model.model_name(), model_request.instruction);
    let text = model.generate(&model_request).await?;
    let result = decode_identification(&text)?;

    info!(
        "Identified {:?} at confidence {:.2} ({} alternatives)",
        result.name,
        result.confidence.value(),
        result.alternatives.len()
    );
    Ok(result)
}

pub async fn clarify(model: &dyn GenerativeModel, request: &ClarificationRequest) -> Result<ClarificationResult> {
    let model_request = ModelRequest {
        kind: CallKind::Clarify,
        instruction: clarification_instruction(request.candidates()),
        image: &request.image,
        response_schema: clarify_response_schema(),
    };

    debug!("Clarification prompt for {}: {}", model.model_name(), model_request.instruction);
    let text = model.generate(&model_request).await?;
    let result = decode_clarification(&text, request)?;

    info!(
        "Clarification selected {:?} out of {} candidates",
        result.selected,
        request.candidates().len()
    );
    Ok(result)
}
