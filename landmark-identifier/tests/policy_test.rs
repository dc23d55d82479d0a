use landmark_identifier::{Confidence, ConfidencePolicy, Decision, IdentificationResult, IdentifierError};

fn result(name: &str, confidence: f64) -> IdentificationResult {
    IdentificationResult {
        name: name.to_string(),
        confidence: Confidence::new(confidence).unwrap(),
        alternatives: Vec::new(),
    }
}

#[test]
fn test_default_threshold_boundary() {
    let policy = ConfidencePolicy::default();
    assert_eq!(policy.threshold(), 0.70);

    assert_eq!(policy.decide(&result("Eiffel Tower", 0.69)), Decision::Clarify);
    assert_eq!(policy.decide(&result("Eiffel Tower", 0.70)), Decision::Accept);
    assert_eq!(policy.decide(&result("Eiffel Tower", 0.0)), Decision::Clarify);
    assert_eq!(policy.decide(&result("Eiffel Tower", 1.0)), Decision::Accept);
}

#[test]
fn test_decision_is_deterministic() {
    let policy = ConfidencePolicy::new(0.5).unwrap();
    let candidate = result("Big Ben", 0.49);
    let decisions: Vec<_> = (0..10).map(|_| policy.decide(&candidate)).collect();
    assert!(decisions.iter().all(|d| *d == Decision::Clarify));
}

#[test]
fn test_threshold_must_be_a_probability() {
    for bad in [-0.1, 1.01, f64::NAN, f64::INFINITY] {
        let error = ConfidencePolicy::new(bad).unwrap_err();
        assert!(matches!(error, IdentifierError::Config(_)), "{:?}", error);
    }
    assert!(ConfidencePolicy::new(0.0).is_ok());
    assert!(ConfidencePolicy::new(1.0).is_ok());
}
