//! Document assembly: slide records in, a saved `.pptx` out.
//!
//! Every slide starts blank with the shared title box; the rest is drawn by the
//! [`SlideLayout`] registered for its [`LayoutKind`]. A layout that fails only costs its
//! own slide, which is rolled back to title-only and reported in the
//! [`AssemblyReport`]. Saving is the one failure that aborts assembly.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use crate::deck::{inches, Align, Picture, PictureFormat, Presentation, Rect, Rgb, Shape, Slide, TextBox, TextStyle};
use crate::error::{AssemblyError, PersistenceError};
use crate::images::{decode_check, short_id};
use crate::slide::{AssetRef, LayoutKind, SlideRecord};
use crate::store::FileStore;

pub const SLIDE_WIDTH_IN: f64 = 16.0;
pub const SLIDE_HEIGHT_IN: f64 = 9.0;

pub const ACCENT_COLOR: Rgb = Rgb(31, 78, 121);
const SUBTITLE_COLOR: Rgb = Rgb(89, 89, 89);
const BODY_COLOR: Rgb = Rgb(51, 51, 51);
const CAPTION_COLOR: Rgb = Rgb(102, 102, 102);

const SUBTITLE_LIMIT: usize = 100;
const CAPTION_LIMIT: usize = 150;

static PATH_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s/\\]").expect("static pattern"));

/// Cut `text` to at most `limit` characters, appending `...` when something was cut.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte, _)) => format!("{}...", &text[..byte]),
        None => text.to_string(),
    }
}

/// Topic as a file-name stem: whitespace and path separators become `_`.
pub fn sanitize_topic(topic: &str) -> String {
    PATH_UNSAFE.replace_all(topic, "_").into_owned()
}

/// Drawing surface handed to a layout for one slide.
pub struct SlideCanvas<'a> {
    slide: &'a mut Slide,
    store: &'a FileStore,
    index: usize,
    images_embedded: usize,
}

impl<'a> SlideCanvas<'a> {
    fn new(slide: &'a mut Slide, store: &'a FileStore, index: usize) -> Self {
        Self {
            slide,
            store,
            index,
            images_embedded: 0,
        }
    }

    pub fn add_text(&mut self, rect: Rect, text: impl Into<String>, style: TextStyle) {
        self.slide.add(Shape::Text(TextBox::new(rect, text, style)));
    }

    pub fn add_accent(&mut self, rect: Rect, fill: Rgb) {
        self.slide.add(Shape::Accent { rect, fill });
    }

    /// Embed the slide's illustration. Returns `false`, leaving the slide untouched,
    /// when there is none or the file is no longer a usable image.
    pub fn add_image(&mut self, image: Option<&AssetRef>, rect: Rect, description: &str) -> bool {
        let Some(asset) = image else {
            debug!(slide = self.index, "[ASSEMBLE] No image for slide");
            return false;
        };
        match self.load_picture(asset, rect, description) {
            Ok(picture) => {
                self.slide.add(Shape::Picture(picture));
                self.images_embedded += 1;
                true
            }
            Err(reason) => {
                warn!(slide = self.index, image = %asset, reason = %reason, "[ASSEMBLE] Skipping image");
                false
            }
        }
    }

    fn load_picture(&self, asset: &AssetRef, rect: Rect, description: &str) -> Result<Picture, String> {
        let path = self.store.resolve(asset);
        if !self.store.exists(&path) {
            return Err("file not found".to_string());
        }
        let detected = decode_check(&path).map_err(|e| e.to_string())?;
        let format = PictureFormat::try_from(detected)
            .map_err(|other| format!("{other:?} cannot be embedded"))?;
        let data = self.store.read(asset).map_err(|e| e.to_string())?;
        Ok(Picture {
            rect,
            data,
            format,
            description: description.to_string(),
        })
    }

    pub fn shape_count(&self) -> usize {
        self.slide.shape_count()
    }

    pub fn images_embedded(&self) -> usize {
        self.images_embedded
    }
}

/// Draws everything below the title for one kind of slide.
pub trait SlideLayout: Send + Sync {
    fn render(&self, canvas: &mut SlideCanvas<'_>, record: &SlideRecord) -> Result<(), AssemblyError>;
}

pub struct TitleLayout;
pub struct ContentLayout;
pub struct ImageFocusLayout;
pub struct ConclusionLayout;

impl SlideLayout for TitleLayout {
    fn render(&self, canvas: &mut SlideCanvas<'_>, record: &SlideRecord) -> Result<(), AssemblyError> {
        canvas.add_text(
            Rect::inches(2.0, 2.5, 12.0, 1.0),
            truncate_chars(&record.body, SUBTITLE_LIMIT),
            TextStyle {
                size_pt: 24.0,
                color: SUBTITLE_COLOR,
                align: Align::Center,
                ..TextStyle::default()
            },
        );
        canvas.add_image(
            record.image.as_ref(),
            Rect::inches(6.0, 4.0, 4.0, 3.0),
            &record.image_prompt,
        );
        Ok(())
    }
}

impl SlideLayout for ContentLayout {
    fn render(&self, canvas: &mut SlideCanvas<'_>, record: &SlideRecord) -> Result<(), AssemblyError> {
        canvas.add_text(
            Rect::inches(0.5, 2.0, 7.0, 6.0),
            record.body.clone(),
            TextStyle {
                size_pt: 16.0,
                color: BODY_COLOR,
                ..TextStyle::default()
            },
        );
        canvas.add_image(
            record.image.as_ref(),
            Rect::inches(8.5, 2.0, 6.5, 5.0),
            &record.image_prompt,
        );
        Ok(())
    }
}

impl SlideLayout for ImageFocusLayout {
    fn render(&self, canvas: &mut SlideCanvas<'_>, record: &SlideRecord) -> Result<(), AssemblyError> {
        canvas.add_image(
            record.image.as_ref(),
            Rect::inches(2.0, 2.0, 12.0, 6.0),
            &record.image_prompt,
        );
        canvas.add_text(
            Rect::inches(1.0, 8.2, 14.0, 0.8),
            truncate_chars(&record.body, CAPTION_LIMIT),
            TextStyle {
                size_pt: 14.0,
                italic: true,
                color: CAPTION_COLOR,
                align: Align::Center,
                ..TextStyle::default()
            },
        );
        Ok(())
    }
}

impl SlideLayout for ConclusionLayout {
    fn render(&self, canvas: &mut SlideCanvas<'_>, record: &SlideRecord) -> Result<(), AssemblyError> {
        canvas.add_text(
            Rect::inches(2.0, 2.5, 12.0, 4.0),
            record.body.clone(),
            TextStyle {
                size_pt: 20.0,
                color: ACCENT_COLOR,
                align: Align::Center,
                ..TextStyle::default()
            },
        );
        canvas.add_image(
            record.image.as_ref(),
            Rect::inches(6.0, 6.5, 4.0, 2.0),
            &record.image_prompt,
        );
        canvas.add_accent(Rect::inches(7.0, 7.0, 2.0, 0.5), ACCENT_COLOR);
        Ok(())
    }
}

/// What ended up on a slide whose layout succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideOutcome {
    pub index: usize,
    pub layout: LayoutKind,
    pub image_embedded: bool,
}

#[derive(Debug)]
pub struct AssemblyReport {
    pub document: AssetRef,
    pub slides: Vec<Result<SlideOutcome, AssemblyError>>,
}

impl AssemblyReport {
    pub fn failures(&self) -> impl Iterator<Item = &AssemblyError> {
        self.slides.iter().filter_map(|r| r.as_ref().err())
    }

    pub fn succeeded_count(&self) -> usize {
        self.slides.iter().filter(|r| r.is_ok()).count()
    }
}

pub struct DocumentAssembler {
    store: FileStore,
    presentations_dir: String,
    layouts: HashMap<LayoutKind, Box<dyn SlideLayout>>,
}

impl DocumentAssembler {
    /// Assembler with the built-in layout for every kind (`default` draws like `content`).
    pub fn new(store: FileStore, presentations_dir: impl Into<String>) -> Self {
        let mut layouts: HashMap<LayoutKind, Box<dyn SlideLayout>> = HashMap::new();
        layouts.insert(LayoutKind::Title, Box::new(TitleLayout));
        layouts.insert(LayoutKind::Content, Box::new(ContentLayout));
        layouts.insert(LayoutKind::ImageFocus, Box::new(ImageFocusLayout));
        layouts.insert(LayoutKind::Conclusion, Box::new(ConclusionLayout));
        layouts.insert(LayoutKind::Default, Box::new(ContentLayout));
        Self {
            store,
            presentations_dir: presentations_dir.into(),
            layouts,
        }
    }

    /// Replace the layout used for `kind`.
    pub fn with_layout(mut self, kind: LayoutKind, layout: Box<dyn SlideLayout>) -> Self {
        self.layouts.insert(kind, layout);
        self
    }

    pub fn assemble(&self, slides: &[SlideRecord], topic: &str) -> Result<AssemblyReport, PersistenceError> {
        info!(slides = slides.len(), topic, "[ASSEMBLE] Building presentation");
        let mut presentation =
            Presentation::new(inches(SLIDE_WIDTH_IN), inches(SLIDE_HEIGHT_IN)).with_title(topic);
        let mut outcomes = Vec::with_capacity(slides.len());

        for record in slides {
            let (slide, outcome) = self.build_slide(record);
            presentation.push_slide(slide);
            outcomes.push(outcome);
        }

        let document = self.save(&presentation, topic)?;
        let report = AssemblyReport {
            document,
            slides: outcomes,
        };
        info!(
            document = %report.document,
            slides = report.slides.len(),
            failed = report.failures().count(),
            "[ASSEMBLE] Presentation saved"
        );
        Ok(report)
    }

    fn build_slide(&self, record: &SlideRecord) -> (Slide, Result<SlideOutcome, AssemblyError>) {
        let layout = record.layout();
        let mut slide = Slide::new(layout.as_str());
        slide.add(Shape::Text(TextBox::new(
            Rect::inches(0.5, 0.5, 15.0, 1.5),
            record.title(),
            TextStyle {
                size_pt: 36.0,
                bold: true,
                color: ACCENT_COLOR,
                align: Align::Center,
                ..TextStyle::default()
            },
        )));
        let checkpoint = slide.shape_count();

        let rendered = {
            let mut canvas = SlideCanvas::new(&mut slide, &self.store, record.index());
            let result = match self.layouts.get(&layout) {
                Some(routine) => routine.render(&mut canvas, record),
                None => ContentLayout.render(&mut canvas, record),
            };
            result.map(|()| canvas.images_embedded() > 0)
        };

        let outcome = match rendered {
            Ok(image_embedded) => {
                debug!(slide = record.index(), %layout, image_embedded, "[ASSEMBLE] Slide laid out");
                Ok(SlideOutcome {
                    index: record.index(),
                    layout,
                    image_embedded,
                })
            }
            Err(e) => {
                error!(slide = record.index(), %layout, error = %e, "[ASSEMBLE] Layout failed, keeping title only");
                slide.truncate(checkpoint);
                Err(e)
            }
        };
        (slide, outcome)
    }

    fn save(&self, presentation: &Presentation, topic: &str) -> Result<AssetRef, PersistenceError> {
        let dir = self
            .store
            .dir(&self.presentations_dir)
            .map_err(|source| PersistenceError::Directory {
                path: self.store.root().join(&self.presentations_dir),
                source,
            })?;
        let file_name = format!("{}_{}.pptx", sanitize_topic(topic), short_id());
        let path = dir.join(&file_name);

        let tmp = NamedTempFile::new_in(&dir)?;
        let tmp = presentation.write_to(tmp)?;
        tmp.persist(&path).map_err(|e| PersistenceError::Io(e.error))?;

        if !self.store.exists(&path) {
            return Err(PersistenceError::Missing { path });
        }
        Ok(self.store.asset_ref(&self.presentations_dir, &file_name))
    }
}
