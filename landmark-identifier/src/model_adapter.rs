use crate::types::{EncodedImage, IdentifierError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Identify,
    Clarify,
}

/// One single-turn request to a vision-language model: an instruction, an
/// inline image, and the JSON shape the answer must take.
#[derive(Debug, Clone)]
pub struct ModelRequest<'a> {
    pub kind: CallKind,
    pub instruction: String,
    pub image: &'a EncodedImage,
    pub response_schema: Value,
}

/// Trait for generative model backends that can look at an image and answer
/// in text. Implementations make exactly one outbound request per call, with
/// no retries or caching.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Get the name of this model backend
    fn model_name(&self) -> String;

    /// Send the request and return the raw text of the model's answer
    async fn generate(&self, request: &ModelRequest<'_>) -> Result<String>;
}

/// What a [`ScriptedModel`] saw for one call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub instruction: String,
    pub media_type: String,
}

struct ScriptedReply {
    delay: Duration,
    reply: Result<String>,
}

/// Mock model for development and testing.
///
/// Replies are handed out in the order calls arrive, each after its own delay,
/// which makes it easy to stage a slow run racing a fast one.
pub struct ScriptedModel {
    name: String,
    replies: Mutex<VecDeque<ScriptedReply>>,
    calls: Mutex<Vec<RecordedCall>>,
    call_count: AtomicUsize,
}

impl ScriptedModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.with_delayed_reply(text, Duration::ZERO)
    }

    pub fn with_delayed_reply(self, text: impl Into<String>, delay: Duration) -> Self {
        self.push(ScriptedReply {
            delay,
            reply: Ok(text.into()),
        })
    }

    pub fn with_failure(self, error: IdentifierError) -> Self {
        self.push(ScriptedReply {
            delay: Duration::ZERO,
            reply: Err(error),
        })
    }

    fn push(mut self, reply: ScriptedReply) -> Self {
        self.replies.get_mut().push_back(reply);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    fn model_name(&self) -> String {
        format!("Scripted model ({})", self.name)
    }

    async fn generate(&self, request: &ModelRequest<'_>) -> Result<String> {
        let call_number = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.lock().await.push(RecordedCall {
            kind: request.kind,
            instruction: request.instruction.clone(),
            media_type: request.image.media_type().to_string(),
        });

        let next = self.replies.lock().await.pop_front();
        let Some(ScriptedReply { delay, reply }) = next else {
            return Err(IdentifierError::ModelUnavailable(format!(
                "{} has no reply scripted for call {}",
                self.name, call_number
            )));
        };

        debug!("{} answering {:?} call {} after {:?}", self.name, request.kind, call_number, delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}
