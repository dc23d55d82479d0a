use landmark_identifier::state::TransitionError;
use landmark_identifier::{
    Candidate, Confidence, Decision, FailureKind, IdentificationResult, IdentifierError, PresentationState, Result,
    RunEvent, RunFailure, RunPhase,
};

fn result(name: &str, confidence: f64) -> IdentificationResult {
    IdentificationResult {
        name: name.to_string(),
        confidence: Confidence::new(confidence).unwrap(),
        alternatives: Vec::new(),
    }
}

fn awaiting_identification() -> RunPhase {
    RunPhase::Idle
        .apply(RunEvent::Submitted)
        .and_then(|p| p.apply(RunEvent::ImageEncoded))
        .unwrap()
}

#[test]
fn test_accept_path_transitions() -> Result<()> {
    let phase = RunPhase::Idle.apply(RunEvent::Submitted)?;
    assert_eq!(phase, RunPhase::EncodingImage);
    assert_eq!(phase.presentation(), PresentationState::Loading);

    let phase = phase.apply(RunEvent::ImageEncoded)?;
    assert_eq!(phase, RunPhase::AwaitingIdentification);

    let phase = phase.apply(RunEvent::Identified {
        result: result("Sydney Opera House", 0.91),
        decision: Decision::Accept,
    })?;
    assert!(phase.is_terminal());
    let outcome = phase.outcome().expect("terminal phase has an outcome");
    assert_eq!(outcome.landmark(), Some("Sydney Opera House"));

    match phase.presentation() {
        PresentationState::Succeeded { landmark, confidence } => {
            assert_eq!(landmark, "Sydney Opera House");
            assert_eq!(confidence.percent(), 91);
        }
        other => panic!("unexpected presentation {:?}", other),
    }
    Ok(())
}

#[test]
fn test_clarify_path_keeps_selected_confidence() -> Result<()> {
    let identified = IdentificationResult {
        name: "Arc de Triomphe".to_string(),
        confidence: Confidence::new(0.45)?,
        alternatives: vec![Candidate::new("Brandenburg Gate", Confidence::new(0.3)?)?],
    };
    let phase = awaiting_identification().apply(RunEvent::Identified {
        result: identified,
        decision: Decision::Clarify,
    })?;

    let pending: Vec<_> = phase.pending_candidates().unwrap().iter().map(|c| c.name.clone()).collect();
    assert_eq!(pending, ["Arc de Triomphe", "Brandenburg Gate"]);
    assert_eq!(phase.presentation(), PresentationState::Loading);

    let phase = phase.apply(RunEvent::Clarified {
        selected: "Brandenburg Gate".to_string(),
    })?;
    let RunPhase::Succeeded { record } = phase else {
        panic!("expected success");
    };
    assert!(record.clarified);
    assert_eq!(record.confidence.value(), 0.3);
    assert_eq!(record.to_string(), "Brandenburg Gate (Confidence: 30%)");
    Ok(())
}

#[test]
fn test_clarified_selection_must_be_pending() {
    let phase = awaiting_identification()
        .apply(RunEvent::Identified {
            result: result("Arc de Triomphe", 0.4),
            decision: Decision::Clarify,
        })
        .unwrap();

    let error = phase
        .apply(RunEvent::Clarified {
            selected: "Colosseum".to_string(),
        })
        .unwrap_err();
    assert_eq!(error, TransitionError::SelectionNotPending("Colosseum".to_string()));
}

#[test]
fn test_illegal_transitions_are_rejected() {
    let error = RunPhase::Idle.apply(RunEvent::ImageEncoded).unwrap_err();
    assert_eq!(
        error,
        TransitionError::Illegal {
            from: "idle",
            event: "image_encoded"
        }
    );

    let failure = RunFailure::new(FailureKind::ModelUnavailable, "HTTP 503");
    assert!(RunPhase::Idle.apply(RunEvent::Failed(failure.clone())).is_err());

    let failed = awaiting_identification().apply(RunEvent::Failed(failure.clone())).unwrap();
    assert!(failed.is_terminal());
    // Terminal phases never move again.
    assert!(failed.clone().apply(RunEvent::Submitted).is_err());
    assert!(failed.apply(RunEvent::Failed(failure)).is_err());
}

#[test]
fn test_failure_presentation() {
    let failure = RunFailure::new(FailureKind::InvalidImage, "image is empty");
    assert_eq!(failure.message, "Failed to identify landmark: image is empty");

    let phase = RunPhase::EncodingImage.apply(RunEvent::Failed(failure)).unwrap();
    assert_eq!(
        phase.presentation(),
        PresentationState::Failed {
            message: "Failed to identify landmark: image is empty".to_string()
        }
    );
    assert_eq!(RunPhase::Idle.presentation(), PresentationState::Idle);
}

#[test]
fn test_error_kinds() {
    assert_eq!(
        IdentifierError::InvalidImage("x".into()).failure_kind(),
        FailureKind::InvalidImage
    );
    assert_eq!(
        IdentifierError::ModelUnavailable("x".into()).failure_kind(),
        FailureKind::ModelUnavailable
    );
    let violation: IdentifierError = landmark_identifier::ContractError::NoCandidates.into();
    assert_eq!(violation.failure_kind(), FailureKind::ContractViolation);
    assert!(violation.to_failure().message.starts_with("Failed to identify landmark: "));
}
