use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use deckforge_core::assemble::{DocumentAssembler, SlideCanvas, SlideLayout};
use deckforge_core::config::GeneratorConfig;
use deckforge_core::contract::{ImageGeneration, MockImageGeneration, MockTextCompletion, TextCompletion};
use deckforge_core::error::AssemblyError;
use deckforge_core::pipeline::{PresentationPipeline, FAILURE_MESSAGE, SUCCESS_MESSAGE};
use deckforge_core::slide::{LayoutKind, SlideRecord};
use deckforge_core::store::FileStore;
use tempfile::tempdir;

const OUTLINE: &str = r#"```json
[
    {"slide_number": 1, "title": "Renewable Energy", "design_type": "title", "key_points": ["Why now"]},
    {"slide_number": 2, "title": "Solar Power", "design_type": "content", "key_points": ["Panels"]},
    {"slide_number": 3, "title": "Wind Farms", "design_type": "image_focus", "key_points": ["Turbines"]},
    {"slide_number": 4, "title": "Storage", "design_type": "content", "key_points": ["Batteries"]},
    {"slide_number": 5, "title": "Looking Ahead", "design_type": "conclusion", "key_points": ["Policy"]}
]
```"#;

fn png_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::new_rgb8(8, 8)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn config_in(root: &std::path::Path) -> GeneratorConfig {
    GeneratorConfig {
        output_dir: root.to_path_buf(),
        image_model: "test-model".to_string(),
        ..GeneratorConfig::default()
    }
}

fn failing_text() -> Arc<dyn TextCompletion> {
    let mut model = MockTextCompletion::new();
    model
        .expect_complete()
        .returning(|_| Err("service unavailable".into()));
    Arc::new(model)
}

/// Outline from [`OUTLINE`], then echoes which kind of copy was requested.
fn working_text() -> Arc<dyn TextCompletion> {
    let mut model = MockTextCompletion::new();
    model.expect_complete().returning(|prompt| {
        if prompt.contains("Return ONLY a valid JSON array") {
            Ok(OUTLINE.to_string())
        } else if prompt.starts_with("Create a detailed image prompt") {
            Ok("A clean flat illustration of green energy".to_string())
        } else {
            Ok("Generated paragraph about the slide.".to_string())
        }
    });
    Arc::new(model)
}

fn layouts(slides: &[SlideRecord]) -> Vec<LayoutKind> {
    slides.iter().map(|s| s.layout()).collect()
}

#[tokio::test]
async fn test_everything_failing_still_produces_a_deck() {
    let tmp = tempdir().unwrap();
    let mut images = MockImageGeneration::new();
    images
        .expect_generate()
        .times(3)
        .returning(|_, _| Err("image service down".into()));
    let images: Arc<dyn ImageGeneration> = Arc::new(images);
    let pipeline = PresentationPipeline::new(failing_text(), Some(images), &config_in(tmp.path()));

    let result = pipeline.run_pipeline("Renewable Energy", 3).await;

    assert!(result.succeeded, "{:?}", result.error);
    assert_eq!(result.message, SUCCESS_MESSAGE);
    assert_eq!(result.slides.len(), 3);
    assert_eq!(result.slides[0].layout(), LayoutKind::Title);
    assert!(matches!(
        result.slides[1].layout(),
        LayoutKind::Content | LayoutKind::ImageFocus
    ));
    assert_eq!(result.slides[2].layout(), LayoutKind::Conclusion);
    assert!(result.slides.iter().all(|s| s.image.is_none()));
    assert_eq!(
        result.slides[0].body,
        "Content about Introduction to Renewable Energy related to Renewable Energy. This slide covers Overview, Objectives, Key Topics."
    );
    assert_eq!(
        result.slides[2].image_prompt,
        "Professional illustration about Renewable Energy, modern design, high quality, business presentation style"
    );

    let document = result.document.unwrap();
    assert!(pipeline.store().resolve(&document).is_file());
    assert!(result.slide_failures.is_empty());
}

#[tokio::test]
async fn test_one_image_failure_affects_only_its_slide() {
    let tmp = tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let png = png_bytes();
    let mut images = MockImageGeneration::new();
    images.expect_generate().returning(move |_, _| {
        let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
        if call == 3 {
            Ok(None)
        } else {
            Ok(Some(png.clone()))
        }
    });
    let images: Arc<dyn ImageGeneration> = Arc::new(images);
    let pipeline = PresentationPipeline::new(working_text(), Some(images), &config_in(tmp.path()));

    let result = pipeline.run_pipeline("Renewable Energy", 5).await;

    assert!(result.succeeded);
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(result.slides.len(), 5);
    assert_eq!(
        layouts(&result.slides),
        vec![
            LayoutKind::Title,
            LayoutKind::Content,
            LayoutKind::ImageFocus,
            LayoutKind::Content,
            LayoutKind::Conclusion,
        ]
    );
    for slide in &result.slides {
        if slide.index() == 3 {
            assert!(slide.image.is_none());
        } else {
            let image = slide.image.as_ref().unwrap();
            assert!(pipeline.store().resolve(image).is_file());
        }
        assert_eq!(slide.body, "Generated paragraph about the slide.");
        assert_eq!(slide.image_prompt, "A clean flat illustration of green energy");
    }
    assert!(pipeline
        .store()
        .resolve(result.document.as_ref().unwrap())
        .is_file());
}

#[tokio::test]
async fn test_parallel_slides_preserve_order() {
    let tmp = tempdir().unwrap();
    let config = GeneratorConfig {
        parallel_slides: true,
        ..config_in(tmp.path())
    };
    let png = png_bytes();
    let mut images = MockImageGeneration::new();
    images
        .expect_generate()
        .returning(move |_, _| Ok(Some(png.clone())));
    let images: Arc<dyn ImageGeneration> = Arc::new(images);
    let pipeline = PresentationPipeline::new(working_text(), Some(images), &config);

    let result = pipeline.run_pipeline("Renewable Energy", 5).await;

    assert!(result.succeeded);
    let indexes: Vec<usize> = result.slides.iter().map(|s| s.index()).collect();
    assert_eq!(indexes, vec![1, 2, 3, 4, 5]);
    assert!(result.slides.iter().all(|s| s.image.is_some()));
    for slide in &result.slides {
        let name = slide.image.as_ref().unwrap().file_name().to_string();
        assert!(name.starts_with(&format!("slide_{}_", slide.index())));
    }
}

#[tokio::test]
async fn test_without_image_client_deck_has_no_images() {
    let tmp = tempdir().unwrap();
    let pipeline = PresentationPipeline::new(working_text(), None, &config_in(tmp.path()));

    let result = pipeline.run_pipeline("Renewable Energy", 5).await;

    assert!(result.succeeded);
    assert!(result.slides.iter().all(|s| s.image.is_none()));
    assert!(!pipeline.store().has_dir("images"));
}

#[tokio::test]
async fn test_invalid_requests_fail_without_calling_services() {
    let tmp = tempdir().unwrap();
    let mut model = MockTextCompletion::new();
    model.expect_complete().never();
    let pipeline = PresentationPipeline::new(Arc::new(model), None, &config_in(tmp.path()));

    let blank = pipeline.run_pipeline("   ", 5).await;
    assert!(!blank.succeeded);
    assert_eq!(blank.error.as_deref(), Some("Topic is required"));
    assert_eq!(blank.message, FAILURE_MESSAGE);
    assert!(blank.document.is_none());

    let too_few = pipeline.run_pipeline("Renewable Energy", 2).await;
    assert!(!too_few.succeeded);
    assert_eq!(
        too_few.error.as_deref(),
        Some("Slides count must be between 3 and 20, got 2")
    );

    let too_many = pipeline.run_pipeline("Renewable Energy", 21).await;
    assert!(!too_many.succeeded);
}

#[tokio::test]
async fn test_unwritable_output_fails_the_run() {
    let tmp = tempdir().unwrap();
    let blocker = tmp.path().join("not_a_dir");
    std::fs::write(&blocker, b"file").unwrap();
    let pipeline = PresentationPipeline::new(failing_text(), None, &config_in(&blocker));

    let result = pipeline.run_pipeline("Renewable Energy", 3).await;

    assert!(!result.succeeded);
    assert!(result.document.is_none());
    assert_eq!(result.slides.len(), 3);
    assert!(result
        .error
        .unwrap()
        .starts_with("could not prepare output directory"));
}

struct BrokenConclusion;

impl SlideLayout for BrokenConclusion {
    fn render(&self, _canvas: &mut SlideCanvas<'_>, record: &SlideRecord) -> Result<(), AssemblyError> {
        Err(AssemblyError::Layout {
            index: record.index(),
            layout: record.layout().to_string(),
            reason: "accent shape unsupported".to_string(),
        })
    }
}

#[tokio::test]
async fn test_layout_failure_is_reported_per_slide() {
    let tmp = tempdir().unwrap();
    let config = config_in(tmp.path());
    let assembler = DocumentAssembler::new(FileStore::new(tmp.path()), config.presentations_dir.clone())
        .with_layout(LayoutKind::Conclusion, Box::new(BrokenConclusion));
    let pipeline =
        PresentationPipeline::new(failing_text(), None, &config).with_assembler(assembler);

    let result = pipeline.run_pipeline("Renewable Energy", 4).await;

    assert!(result.succeeded);
    assert_eq!(result.slide_failures.len(), 1);
    assert_eq!(result.slide_failures[0].index, 4);
    assert!(result.slide_failures[0].reason.contains("accent shape unsupported"));
    assert!(result.document.is_some());
}
