use crate::image::DEFAULT_MAX_IMAGE_BYTES;
use crate::policy::{ConfidencePolicy, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::types::{IdentifierError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    pub model: ModelConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub temperature: Option<f32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            user_agent: "Landmark-Identifier/0.1".to_string(),
            timeout_seconds: 30,
            temperature: Some(0.2),
        }
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("user_agent", &self.user_agent)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub confidence_threshold: f64,
    /// How many ranked answers the identification call may return. With 1,
    /// clarification is offered the single identified landmark.
    pub max_candidates: usize,
    pub call_timeout_seconds: u64,
    pub max_image_bytes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_candidates: 1,
            call_timeout_seconds: 30,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl PipelineConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }

    pub fn policy(&self) -> Result<ConfidencePolicy> {
        ConfidencePolicy::new(self.confidence_threshold)
    }

    pub fn validate(&self) -> Result<()> {
        self.policy()?;
        if self.max_candidates == 0 {
            return Err(IdentifierError::Config("max_candidates must be at least 1".to_string()));
        }
        if self.call_timeout_seconds == 0 {
            return Err(IdentifierError::Config("call_timeout_seconds must be greater than zero".to_string()));
        }
        if self.max_image_bytes == 0 {
            return Err(IdentifierError::Config("max_image_bytes must be greater than zero".to_string()));
        }
        Ok(())
    }
}

impl IdentifierConfig {
    /// Defaults, then the TOML file if given, then environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| IdentifierError::Config(format!("could not read {}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| IdentifierError::Config(format!("invalid config {}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from an environment-like lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("LANDMARK_CONFIDENCE_THRESHOLD") {
            self.pipeline.confidence_threshold = value.trim().parse().map_err(|_| {
                IdentifierError::Config(format!("LANDMARK_CONFIDENCE_THRESHOLD is not a number: {:?}", value))
            })?;
        }
        if let Some(value) = lookup("LANDMARK_MAX_CANDIDATES") {
            self.pipeline.max_candidates = value.trim().parse().map_err(|_| {
                IdentifierError::Config(format!("LANDMARK_MAX_CANDIDATES is not a count: {:?}", value))
            })?;
        }
        if let Some(value) = lookup("LANDMARK_MODEL") {
            self.model.model = value;
        }
        if let Some(value) = lookup("LANDMARK_MODEL_ENDPOINT") {
            self.model.endpoint = value;
        }
        if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")) {
            self.model.api_key = Some(key);
        }
        debug!("Configuration after environment overrides: {:?}", self);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        if self.model.timeout_seconds == 0 {
            return Err(IdentifierError::Config("timeout_seconds must be greater than zero".to_string()));
        }
        if self.model.model.trim().is_empty() {
            return Err(IdentifierError::Config("model name must not be empty".to_string()));
        }
        Url::parse(&self.model.endpoint)
            .map_err(|e| IdentifierError::Config(format!("invalid model endpoint {:?}: {}", self.model.endpoint, e)))?;
        Ok(())
    }
}
