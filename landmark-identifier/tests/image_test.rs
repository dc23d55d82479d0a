mod common;

use base64::{engine::general_purpose, Engine as _};
use common::*;
use landmark_identifier::{encode_image, IdentifierError, ImageMediaType, Result};
use std::io::Write;

const LIMIT: usize = 1024;

fn assert_invalid(upload: ImageUpload, needle: &str) {
    match encode_image(&upload, LIMIT) {
        Err(IdentifierError::InvalidImage(message)) => {
            assert!(message.contains(needle), "{:?} does not mention {:?}", message, needle)
        }
        other => panic!("expected InvalidImage, got {:?}", other),
    }
}

#[test]
fn test_supported_images_are_encoded() -> Result<()> {
    let cases = [
        (PNG_BYTES, "image/png", ImageMediaType::Png),
        (JPEG_BYTES, "image/jpeg", ImageMediaType::Jpeg),
        (GIF_BYTES, "image/gif", ImageMediaType::Gif),
    ];

    for (bytes, declared, expected) in cases {
        let encoded = encode_image(&ImageUpload::new(bytes.to_vec(), declared), LIMIT)?;
        assert_eq!(encoded.media_type(), expected);
        assert_eq!(general_purpose::STANDARD.decode(encoded.data()).unwrap(), bytes);
        assert!(encoded.to_data_uri().starts_with(&format!("data:{};base64,", declared)));
    }
    Ok(())
}

#[test]
fn test_jpg_alias_is_accepted() -> Result<()> {
    let encoded = encode_image(&ImageUpload::new(JPEG_BYTES.to_vec(), "image/jpg"), LIMIT)?;
    assert_eq!(encoded.media_type(), ImageMediaType::Jpeg);
    Ok(())
}

#[test]
fn test_empty_image() {
    assert_invalid(ImageUpload::new(Vec::new(), "image/png"), "empty");
}

#[test]
fn test_oversized_image() {
    let mut bytes = PNG_BYTES.to_vec();
    bytes.resize(LIMIT + 1, 0);
    assert_invalid(ImageUpload::new(bytes, "image/png"), "limit");
}

#[test]
fn test_unsupported_declared_type() {
    assert_invalid(ImageUpload::new(PNG_BYTES.to_vec(), "image/bmp"), "image/bmp");
}

#[test]
fn test_content_must_be_an_image() {
    assert_invalid(ImageUpload::new(b"%PDF-1.4\n%\xe2\xe3".to_vec(), "image/png"), "recognisable");
    assert_invalid(ImageUpload::new(b"hello world".to_vec(), "image/jpeg"), "recognisable");
}

#[test]
fn test_declared_type_must_match_content() {
    assert_invalid(ImageUpload::new(JPEG_BYTES.to_vec(), "image/png"), "declared image/png");
}

#[test]
fn test_unsupported_image_format() {
    let webp = b"RIFF\x24\x00\x00\x00WEBPVP8 ".to_vec();
    assert_invalid(ImageUpload::new(webp, "image/png"), "image/webp");
}

#[tokio::test]
async fn test_upload_from_path() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("colosseum.JPG");
    std::fs::File::create(&path).unwrap().write_all(JPEG_BYTES).unwrap();

    let upload = ImageUpload::from_path(&path, LIMIT).await?;
    assert_eq!(upload.declared_media_type, "image/jpeg");
    assert_eq!(upload.file_name.as_deref(), Some("colosseum.JPG"));
    assert_eq!(upload.bytes, JPEG_BYTES);

    let debug = format!("{:?}", upload);
    assert!(debug.contains("len"));
    assert!(!debug.contains("255"));
    Ok(())
}

#[tokio::test]
async fn test_upload_from_path_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"not an image").unwrap();

    let error = ImageUpload::from_path(&path, LIMIT).await.unwrap_err();
    assert!(matches!(error, IdentifierError::InvalidImage(_)));

    let missing = dir.path().join("missing.png");
    let error = ImageUpload::from_path(&missing, LIMIT).await.unwrap_err();
    assert!(matches!(error, IdentifierError::InvalidImage(_)));
}

#[tokio::test]
async fn test_upload_from_path_checks_size_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("panorama.png");
    let mut bytes = PNG_BYTES.to_vec();
    bytes.resize(LIMIT + 1, 0);
    std::fs::write(&path, &bytes).unwrap();

    match ImageUpload::from_path(&path, LIMIT).await {
        Err(IdentifierError::InvalidImage(message)) => assert!(message.contains("limit"), "{}", message),
        other => panic!("expected InvalidImage, got {:?}", other),
    }

    let upload = ImageUpload::from_path(&path, LIMIT + 1).await.unwrap();
    assert_eq!(upload.bytes.len(), LIMIT + 1);
}
