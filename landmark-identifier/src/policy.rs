use crate::types::{IdentificationResult, IdentifierError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Accept,
    Clarify,
}

/// Decides whether an identification is good enough to show as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidencePolicy {
    threshold: f64,
}

impl ConfidencePolicy {
    pub fn new(threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(IdentifierError::Config(format!(
                "confidence threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `Clarify` strictly below the threshold; the threshold itself is accepted.
    pub fn decide(&self, result: &IdentificationResult) -> Decision {
        if result.confidence.value() < self.threshold {
            Decision::Clarify
        } else {
            Decision::Accept
        }
    }
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}
