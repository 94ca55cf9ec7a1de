//! Slide data model: what is planned, what is written, and what ends up on the deck.
//!
//! A slide moves through the pipeline by consuming transforms only:
//! [`SlideSpec`] --[`SlideSpec::into_record`]--> [`SlideRecord`]
//! --[`SlideRecord::with_image`]--> [`SlideRecord`] with its illustration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Visual template of a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    Title,
    Content,
    ImageFocus,
    Conclusion,
    Default,
}

impl LayoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutKind::Title => "title",
            LayoutKind::Content => "content",
            LayoutKind::ImageFocus => "image_focus",
            LayoutKind::Conclusion => "conclusion",
            LayoutKind::Default => "default",
        }
    }
}

impl From<&str> for LayoutKind {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => LayoutKind::Title,
            "content" => LayoutKind::Content,
            "image_focus" | "image-focus" | "imagefocus" => LayoutKind::ImageFocus,
            "conclusion" => LayoutKind::Conclusion,
            "default" => LayoutKind::Default,
            other => {
                tracing::warn!(kind = other, "Unknown layout kind, using default layout");
                LayoutKind::Default
            }
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative, `/`-separated reference to a generated file under the output root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(dir: &str, file_name: &str) -> Self {
        Self(format!("{}/{}", dir.trim_matches('/'), file_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment, i.e. the file name.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Planned metadata for one slide, before any content exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSpec {
    /// 1-based position in the deck.
    pub index: usize,
    pub title: String,
    pub layout: LayoutKind,
    pub key_points: Vec<String>,
}

/// Generated copy for one slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideContent {
    pub body: String,
    pub image_prompt: String,
}

/// A slide spec enriched with its prose, image prompt and (maybe) an illustration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideRecord {
    #[serde(flatten)]
    pub spec: SlideSpec,
    pub body: String,
    pub image_prompt: String,
    /// Set only by the image acquirer, and only for a verified image file.
    pub image: Option<AssetRef>,
}

impl SlideSpec {
    pub fn into_record(self, content: SlideContent) -> SlideRecord {
        SlideRecord {
            spec: self,
            body: content.body,
            image_prompt: content.image_prompt,
            image: None,
        }
    }
}

impl SlideRecord {
    pub fn with_image(self, image: Option<AssetRef>) -> Self {
        Self { image, ..self }
    }

    pub fn index(&self) -> usize {
        self.spec.index
    }

    pub fn title(&self) -> &str {
        &self.spec.title
    }

    pub fn layout(&self) -> LayoutKind {
        self.spec.layout
    }
}
