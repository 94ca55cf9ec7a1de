use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use deckforge_core::contract::{ImageGeneration, MockImageGeneration};
use deckforge_core::images::{ImageAcquirer, PROMPT_SUFFIX};
use deckforge_core::store::FileStore;
use tempfile::tempdir;

fn png_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::new_rgb8(8, 6)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn webp_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::new_rgba8(8, 6)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::WebP)
        .unwrap();
    bytes
}

fn files_in(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn acquirer_with(service: MockImageGeneration, root: &Path) -> ImageAcquirer {
    let client: Arc<dyn ImageGeneration> = Arc::new(service);
    ImageAcquirer::new(Some(client), "test-model", FileStore::new(root), "images")
}

fn service_returning(payload: Option<Vec<u8>>) -> MockImageGeneration {
    let mut service = MockImageGeneration::new();
    service
        .expect_generate()
        .times(1)
        .returning(move |prompt, model_id| {
            assert!(prompt.ends_with(PROMPT_SUFFIX));
            assert_eq!(model_id, "test-model");
            Ok(payload.clone())
        });
    service
}

#[tokio::test]
async fn test_no_image_from_service_creates_no_file() {
    let tmp = tempdir().unwrap();
    let acquirer = acquirer_with(service_returning(None), tmp.path());

    let image = acquirer.acquire("A wind turbine at dawn", 1).await;

    assert!(image.is_none());
    assert!(files_in(&tmp.path().join("images")).is_empty());
}

#[tokio::test]
async fn test_zero_byte_payload_is_rejected_after_writing() {
    let tmp = tempdir().unwrap();
    let acquirer = acquirer_with(service_returning(Some(Vec::new())), tmp.path());

    let image = acquirer.acquire("A wind turbine at dawn", 2).await;

    assert!(image.is_none());
    let files = files_in(&tmp.path().join("images"));
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("slide_2_"));
}

#[tokio::test]
async fn test_corrupt_payload_is_rejected_after_writing() {
    let tmp = tempdir().unwrap();
    let mut corrupt = png_bytes();
    corrupt.truncate(20);
    let acquirer = acquirer_with(service_returning(Some(corrupt)), tmp.path());

    let image = acquirer.acquire("A wind turbine at dawn", 3).await;

    assert!(image.is_none());
    assert_eq!(files_in(&tmp.path().join("images")).len(), 1);
}

#[tokio::test]
async fn test_valid_png_is_saved_and_referenced() {
    let tmp = tempdir().unwrap();
    let acquirer = acquirer_with(service_returning(Some(png_bytes())), tmp.path());

    let image = acquirer.acquire("A wind turbine at dawn", 4).await.unwrap();

    assert!(image.as_str().starts_with("images/slide_4_"));
    assert!(image.as_str().ends_with(".png"));
    let path = FileStore::new(tmp.path()).resolve(&image);
    assert!(path.is_file());
    assert_eq!(std::fs::read(path).unwrap(), png_bytes());
}

#[tokio::test]
async fn test_webp_is_transcoded_to_png_beside_original() {
    let tmp = tempdir().unwrap();
    let acquirer = acquirer_with(service_returning(Some(webp_bytes())), tmp.path());

    let image = acquirer.acquire("A wind turbine at dawn", 1).await.unwrap();

    assert!(image.as_str().starts_with("images/slide_1_"));
    assert!(image.as_str().ends_with(".png"));
    let png = FileStore::new(tmp.path()).resolve(&image);
    let decoded = image::open(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (8, 6));
    assert_eq!(image::guess_format(&std::fs::read(&png).unwrap()).unwrap(), image::ImageFormat::Png);

    let original = png.with_extension("webp");
    assert!(original.is_file());
    let mut files = files_in(&tmp.path().join("images"));
    files.sort();
    assert_eq!(files.len(), 2);
}

#[tokio::test]
async fn test_service_error_yields_no_image() {
    let tmp = tempdir().unwrap();
    let mut service = MockImageGeneration::new();
    service
        .expect_generate()
        .returning(|_, _| Err("503 model loading".into()));
    let acquirer = acquirer_with(service, tmp.path());

    assert!(acquirer.acquire("A wind turbine at dawn", 1).await.is_none());
}

#[tokio::test]
async fn test_without_client_nothing_is_requested() {
    let tmp = tempdir().unwrap();
    let acquirer = ImageAcquirer::new(None, "test-model", FileStore::new(tmp.path()), "images");

    assert!(!acquirer.is_available());
    assert!(acquirer.acquire("A wind turbine at dawn", 1).await.is_none());
    assert!(!tmp.path().join("images").exists());
}
