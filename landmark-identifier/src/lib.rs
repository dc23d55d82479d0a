pub mod types;
pub mod config;
pub mod image;
pub mod prompt;
pub mod model_adapter;
pub mod gemini;
pub mod calls;
pub mod policy;
pub mod state;
pub mod pipeline;

pub use types::*;
pub use config::{IdentifierConfig, ModelConfig, PipelineConfig};
pub use image::{encode_image, ImageUpload};
pub use model_adapter::{CallKind, GenerativeModel, ModelRequest, ScriptedModel};
pub use gemini::GeminiClient;
pub use policy::{ConfidencePolicy, Decision};
pub use state::{PresentationState, RunEvent, RunPhase, StatusUpdate};
pub use pipeline::{Orchestrator, PipelineBuilder, Submission};
