use crate::types::{EncodedImage, IdentifierError, ImageMediaType, Result};
use base64::{engine::general_purpose, Engine as _};
use std::path::Path;
use tracing::debug;

/// Largest accepted upload, 10MB.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Raw bytes as submitted by the user, plus the media type they claim to be.
#[derive(Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub declared_media_type: String,
    pub file_name: Option<String>,
}

impl ImageUpload {
    pub fn new(bytes: Vec<u8>, declared_media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            declared_media_type: declared_media_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Read an image from disk, declaring its media type from the extension.
    /// Files larger than `max_bytes` are rejected before they are read.
    pub async fn from_path(path: &Path, max_bytes: usize) -> Result<Self> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let media_type = ImageMediaType::from_extension(extension).ok_or_else(|| {
            IdentifierError::InvalidImage(format!(
                "{} does not have a supported image extension (png, jpg, jpeg, gif)",
                path.display()
            ))
        })?;

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| IdentifierError::InvalidImage(format!("could not read {}: {}", path.display(), e)))?;
        if metadata.len() > max_bytes as u64 {
            return Err(IdentifierError::InvalidImage(format!(
                "{} is {} bytes, limit is {} bytes",
                path.display(),
                metadata.len(),
                max_bytes
            )));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| IdentifierError::InvalidImage(format!("could not read {}: {}", path.display(), e)))?;

        let upload = Self::new(bytes, media_type.as_str());
        Ok(match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => upload.with_file_name(name),
            None => upload,
        })
    }
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("len", &self.bytes.len())
            .field("declared_media_type", &self.declared_media_type)
            .field("file_name", &self.file_name)
            .finish()
    }
}

/// Validate an upload and turn it into a self-describing base64 payload.
///
/// Checks, in order: non-empty, within `max_bytes`, a supported declared media
/// type, content recognisable as an image, and content matching the
/// declaration. Nothing here touches the network.
pub fn encode_image(upload: &ImageUpload, max_bytes: usize) -> Result<EncodedImage> {
    if upload.bytes.is_empty() {
        return Err(IdentifierError::InvalidImage("image is empty".to_string()));
    }

    if upload.bytes.len() > max_bytes {
        return Err(IdentifierError::InvalidImage(format!(
            "image is {} bytes, limit is {} bytes",
            upload.bytes.len(),
            max_bytes
        )));
    }

    let declared: ImageMediaType = upload
        .declared_media_type
        .parse()
        .map_err(|e| IdentifierError::InvalidImage(format!("{}", e)))?;

    let sniffed = infer::get(&upload.bytes)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .ok_or_else(|| IdentifierError::InvalidImage("content is not a recognisable image".to_string()))?;

    let actual: ImageMediaType = sniffed.mime_type().parse().map_err(|_| {
        IdentifierError::InvalidImage(format!("{} images are not supported", sniffed.mime_type()))
    })?;

    if actual != declared {
        return Err(IdentifierError::InvalidImage(format!(
            "declared {} but content is {}",
            declared, actual
        )));
    }

    let data = general_purpose::STANDARD.encode(&upload.bytes);
    debug!(
        "Encoded {} byte {} image into {} base64 chars",
        upload.bytes.len(),
        actual,
        data.len()
    );

    EncodedImage::new(actual, data).map_err(|e| IdentifierError::InvalidImage(e.to_string()))
}
