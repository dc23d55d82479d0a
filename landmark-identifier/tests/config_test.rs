use landmark_identifier::{IdentifierConfig, IdentifierError, PipelineConfig, Result};
use std::collections::HashMap;
use std::time::Duration;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults() -> Result<()> {
    let config = IdentifierConfig::default();
    config.validate()?;

    assert_eq!(config.pipeline.confidence_threshold, 0.70);
    assert_eq!(config.pipeline.max_candidates, 1);
    assert_eq!(config.pipeline.call_timeout(), Duration::from_secs(30));
    assert_eq!(config.pipeline.max_image_bytes, 10 * 1024 * 1024);
    assert_eq!(config.model.endpoint, "https://generativelanguage.googleapis.com");
    assert!(config.model.api_key.is_none());
    Ok(())
}

#[test]
fn test_toml_file_overrides_defaults() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("landmark.toml");
    std::fs::write(
        &path,
        r#"
[model]
model = "gemini-1.5-pro"
timeout_seconds = 10

[pipeline]
confidence_threshold = 0.8
max_candidates = 3
"#,
    )
    .unwrap();

    let config = IdentifierConfig::from_file(&path)?;
    assert_eq!(config.model.model, "gemini-1.5-pro");
    assert_eq!(config.model.timeout_seconds, 10);
    assert_eq!(config.pipeline.confidence_threshold, 0.8);
    assert_eq!(config.pipeline.max_candidates, 3);
    // Untouched keys keep their defaults.
    assert_eq!(config.pipeline.call_timeout_seconds, 30);
    Ok(())
}

#[test]
fn test_broken_toml_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[pipeline\nconfidence_threshold = ").unwrap();

    let error = IdentifierConfig::from_file(&path).unwrap_err();
    assert!(matches!(error, IdentifierError::Config(_)));
}

#[test]
fn test_environment_overrides() -> Result<()> {
    let mut config = IdentifierConfig::default();
    config.apply_env(env(&[
        ("LANDMARK_CONFIDENCE_THRESHOLD", "0.55"),
        ("LANDMARK_MAX_CANDIDATES", " 4 "),
        ("LANDMARK_MODEL", "gemini-2.5-flash"),
        ("LANDMARK_MODEL_ENDPOINT", "http://localhost:8080/proxy"),
        ("GEMINI_API_KEY", "primary-key"),
        ("GOOGLE_API_KEY", "fallback-key"),
    ]))?;
    config.validate()?;

    assert_eq!(config.pipeline.confidence_threshold, 0.55);
    assert_eq!(config.pipeline.max_candidates, 4);
    assert_eq!(config.model.model, "gemini-2.5-flash");
    assert_eq!(config.model.endpoint, "http://localhost:8080/proxy");
    assert_eq!(config.model.api_key.as_deref(), Some("primary-key"));
    assert!(!format!("{:?}", config).contains("primary-key"));
    Ok(())
}

#[test]
fn test_google_api_key_fallback() -> Result<()> {
    let mut config = IdentifierConfig::default();
    config.apply_env(env(&[("GOOGLE_API_KEY", "fallback-key")]))?;
    assert_eq!(config.model.api_key.as_deref(), Some("fallback-key"));
    Ok(())
}

#[test]
fn test_unparseable_environment_values() {
    let mut config = IdentifierConfig::default();
    let error = config
        .apply_env(env(&[("LANDMARK_CONFIDENCE_THRESHOLD", "high")]))
        .unwrap_err();
    assert!(matches!(error, IdentifierError::Config(_)));

    let error = config.apply_env(env(&[("LANDMARK_MAX_CANDIDATES", "-1")])).unwrap_err();
    assert!(matches!(error, IdentifierError::Config(_)));
}

#[test]
fn test_validation_rejects_bad_values() {
    let mut config = IdentifierConfig::default();
    config.pipeline.confidence_threshold = 1.5;
    assert!(config.validate().is_err());

    let mut config = IdentifierConfig::default();
    config.pipeline.max_candidates = 0;
    assert!(config.validate().is_err());

    let mut config = IdentifierConfig::default();
    config.pipeline.call_timeout_seconds = 0;
    assert!(config.validate().is_err());

    let mut config = IdentifierConfig::default();
    config.model.endpoint = "not a url".to_string();
    assert!(matches!(config.validate(), Err(IdentifierError::Config(_))));

    let mut config = IdentifierConfig::default();
    config.model.model = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_pipeline_section_validates_on_its_own() {
    let config = PipelineConfig::default();
    assert!(config.validate().is_ok());

    let zero_timeout = PipelineConfig {
        call_timeout_seconds: 0,
        ..PipelineConfig::default()
    };
    assert!(matches!(zero_timeout.validate(), Err(IdentifierError::Config(_))));

    let mut config = IdentifierConfig::default();
    config.model.timeout_seconds = 0;
    assert!(config.validate().is_err());
}
