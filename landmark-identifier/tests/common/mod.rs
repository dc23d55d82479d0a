#![allow(dead_code)]

// Shared fixtures for the integration tests
pub use landmark_identifier::{ImageUpload, PipelineBuilder, PipelineConfig, ScriptedModel};

/// Smallest prefix `infer` recognises as a PNG.
pub const PNG_BYTES: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R', 0x00, 0x00, 0x00,
    0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00,
];

pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01];

pub const GIF_BYTES: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00";

pub fn png_upload() -> ImageUpload {
    ImageUpload::new(PNG_BYTES.to_vec(), "image/png").with_file_name("landmark.png")
}

pub fn identification(name: &str, confidence: f64) -> String {
    format!(r#"{{"landmarkName": "{}", "confidence": {}}}"#, name, confidence)
}

pub fn selection(name: &str) -> String {
    format!(r#"{{"selectedLandmark": "{}"}}"#, name)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
