use crate::config::ModelConfig;
use crate::model_adapter::{GenerativeModel, ModelRequest};
use crate::types::{ContractError, IdentifierError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

const ERROR_BODY_PREVIEW_CHARS: usize = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<ResponseCandidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCandidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

/// `GenerativeModel` backed by the Google Generative Language REST API.
pub struct GeminiClient {
    client: Client,
    config: ModelConfig,
    url: Url,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| IdentifierError::Config("no API key configured (set GEMINI_API_KEY)".to_string()))?;

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .map_err(|e| IdentifierError::Config(format!("failed to create HTTP client: {}", e)))?;

        let url = Self::generate_content_url(&config)?;
        info!("Using model {} at {}", config.model, url);

        Ok(Self {
            client,
            config,
            url,
            api_key,
        })
    }

    /// `{endpoint}/v1beta/models/{model}:generateContent`, keeping any path
    /// prefix the endpoint already has.
    pub fn generate_content_url(config: &ModelConfig) -> Result<Url> {
        let mut base = Url::parse(&config.endpoint)
            .map_err(|e| IdentifierError::Config(format!("invalid model endpoint {:?}: {}", config.endpoint, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(&format!("v1beta/models/{}:generateContent", config.model))
            .map_err(|e| IdentifierError::Config(format!("invalid model name {:?}: {}", config.model, e)))
    }

    pub fn build_request_body(&self, request: &ModelRequest<'_>) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part {
                        text: Some(request.instruction.clone()),
                        inline_data: None,
                    },
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: request.image.media_type().to_string(),
                            data: request.image.data().to_string(),
                        }),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: request.response_schema.clone(),
                temperature: self.config.temperature,
            },
        }
    }

    /// Concatenated text of the first candidate. A response without any text
    /// is the model breaking its contract, not a transport problem.
    pub fn extract_text(response: GenerateContentResponse) -> Result<String> {
        let block_reason = response.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = response.candidates.into_iter().next() else {
            let reason = block_reason.map(|r| format!("prompt blocked: {}", r));
            return Err(no_content(reason.unwrap_or_else(|| "no candidates returned".to_string())));
        };

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate
                .finish_reason
                .map(|r| format!("empty answer (finish reason {})", r))
                .unwrap_or_else(|| "empty answer".to_string());
            return Err(no_content(reason));
        }
        Ok(text)
    }
}

fn no_content(reason: String) -> IdentifierError {
    IdentifierError::ContractViolation(ContractError::Malformed {
        schema: "generateContent",
        reason,
    })
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn model_name(&self) -> String {
        format!("Gemini ({})", self.config.model)
    }

    async fn generate(&self, request: &ModelRequest<'_>) -> Result<String> {
        let start_time = Instant::now();
        let body = self.build_request_body(request);
        debug!(
            "Sending {:?} request to {} ({} chars of image data)",
            request.kind,
            self.url,
            request.image.data().len()
        );

        let response = self
            .client
            .post(self.url.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
            warn!("Model request failed with HTTP {}: {}", status, preview);
            return Err(IdentifierError::ModelUnavailable(format!(
                "HTTP {}: {}",
                status,
                preview.trim()
            )));
        }

        let text = response.text().await?;
        debug!(
            "Model answered in {} ms ({} bytes)",
            start_time.elapsed().as_millis(),
            text.len()
        );

        let parsed: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            IdentifierError::ContractViolation(ContractError::Malformed {
                schema: "generateContent",
                reason: e.to_string(),
            })
        })?;
        Self::extract_text(parsed)
    }
}
