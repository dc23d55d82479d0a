use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ContractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ImageMediaType {
    Png,
    Jpeg,
    Gif,
}

impl ImageMediaType {
    pub const ALL: [ImageMediaType; 3] = [ImageMediaType::Png, ImageMediaType::Jpeg, ImageMediaType::Gif];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMediaType::Png => "image/png",
            ImageMediaType::Jpeg => "image/jpeg",
            ImageMediaType::Gif => "image/gif",
        }
    }

    /// Map a file extension (without the dot, any case) to a media type.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(ImageMediaType::Png),
            "jpg" | "jpeg" => Some(ImageMediaType::Jpeg),
            "gif" => Some(ImageMediaType::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for ImageMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageMediaType {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image/png" => Ok(ImageMediaType::Png),
            "image/jpeg" | "image/jpg" => Ok(ImageMediaType::Jpeg),
            "image/gif" => Ok(ImageMediaType::Gif),
            _ => Err(ContractError::UnsupportedMediaType(s.to_owned())),
        }
    }
}

impl TryFrom<String> for ImageMediaType {
    type Error = ContractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ImageMediaType> for String {
    fn from(value: ImageMediaType) -> Self {
        value.as_str().to_owned()
    }
}

/// A base64 image payload tagged with its media type.
///
/// Only constructible through [`EncodedImage::new`] or by parsing a data URI,
/// so a value in hand always has a supported media type and non-empty data.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    media_type: ImageMediaType,
    data: String,
}

impl EncodedImage {
    pub const ENCODING_MARKER: &'static str = "base64";

    pub fn new(media_type: ImageMediaType, data: String) -> Result<Self, ContractError> {
        if data.is_empty() {
            return Err(ContractError::EmptyField { field: "image.data" });
        }
        Ok(Self { media_type, data })
    }

    pub fn media_type(&self) -> ImageMediaType {
        self.media_type
    }

    /// The base64 payload without any prefix.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// `data:<media-type>;base64,<data>`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};{},{}", self.media_type, Self::ENCODING_MARKER, self.data)
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("media_type", &self.media_type)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl FromStr for EncodedImage {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("data:")
            .ok_or_else(|| ContractError::MalformedDataUri("missing `data:` prefix".to_owned()))?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| ContractError::MalformedDataUri("missing `,` before payload".to_owned()))?;
        let (media_type, marker) = header
            .split_once(';')
            .ok_or_else(|| ContractError::MalformedDataUri("missing encoding marker".to_owned()))?;
        if marker != Self::ENCODING_MARKER {
            return Err(ContractError::MalformedDataUri(format!("unsupported encoding `{}`", marker)));
        }
        Self::new(media_type.parse()?, data.to_owned())
    }
}

/// A model-reported certainty in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Result<Self, ContractError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ContractError::ConfidenceOutOfRange { value });
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Whole percent, rounded half away from zero.
    pub fn percent(&self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}

impl TryFrom<f64> for Confidence {
    type Error = ContractError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(value: Confidence) -> Self {
        value.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CandidateFields")]
pub struct Candidate {
    pub name: String,
    pub confidence: Confidence,
}

/// Unchecked shape read back from JSON; goes through [`Candidate::new`].
#[derive(Deserialize)]
struct CandidateFields {
    name: String,
    confidence: Confidence,
}

impl TryFrom<CandidateFields> for Candidate {
    type Error = ContractError;

    fn try_from(fields: CandidateFields) -> Result<Self, Self::Error> {
        Self::new(fields.name, fields.confidence)
    }
}

impl Candidate {
    pub fn new(name: impl Into<String>, confidence: Confidence) -> Result<Self, ContractError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ContractError::EmptyField { field: "landmarkName" });
        }
        Ok(Self { name, confidence })
    }
}

#[derive(Debug, Clone)]
pub struct IdentificationRequest {
    pub image: EncodedImage,
    max_candidates: usize,
}

impl IdentificationRequest {
    pub fn new(image: EncodedImage) -> Self {
        Self { image, max_candidates: 1 }
    }

    /// Ask for up to `max_candidates` ranked answers in one call. Zero is treated as one.
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates.max(1);
        self
    }

    pub fn max_candidates(&self) -> usize {
        self.max_candidates
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IdentificationFields")]
pub struct IdentificationResult {
    pub name: String,
    pub confidence: Confidence,
    pub alternatives: Vec<Candidate>,
}

#[derive(Deserialize)]
struct IdentificationFields {
    name: String,
    confidence: Confidence,
    #[serde(default)]
    alternatives: Vec<Candidate>,
}

impl TryFrom<IdentificationFields> for IdentificationResult {
    type Error = ContractError;

    fn try_from(fields: IdentificationFields) -> Result<Self, Self::Error> {
        let primary = Candidate::new(fields.name, fields.confidence)?;
        Ok(Self {
            name: primary.name,
            confidence: primary.confidence,
            alternatives: fields.alternatives,
        })
    }
}

impl IdentificationResult {
    /// The primary answer followed by the alternatives, dropping any name
    /// already seen and keeping the model's order.
    pub fn candidates(&self) -> Vec<Candidate> {
        let mut candidates = vec![Candidate {
            name: self.name.clone(),
            confidence: self.confidence,
        }];
        for alternative in &self.alternatives {
            if !candidates.iter().any(|c| c.name == alternative.name) {
                candidates.push(alternative.clone());
            }
        }
        candidates
    }
}

#[derive(Debug, Clone)]
pub struct ClarificationRequest {
    pub image: EncodedImage,
    candidates: Vec<Candidate>,
}

impl ClarificationRequest {
    pub fn new(image: EncodedImage, candidates: Vec<Candidate>) -> Result<Self, ContractError> {
        if candidates.is_empty() {
            return Err(ContractError::NoCandidates);
        }
        Ok(Self { image, candidates })
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Exact, case-sensitive lookup.
    pub fn find(&self, name: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.name == name)
    }
}

/// Only built by `decode_clarification`, which checks the selection against
/// the offered candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClarificationResult {
    pub selected: String,
}
