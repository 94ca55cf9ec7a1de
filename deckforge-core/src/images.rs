//! Illustration acquisition: prompt in, verified image file out (or nothing).
//!
//! A returned [`AssetRef`] always points at a file that exists, is non-empty and decodes
//! as an image in a format the deck writer can embed. Everything else is reported as
//! `None` and logged; the pipeline treats a missing illustration as a normal outcome.

use std::path::Path;
use std::sync::Arc;

use image::{ImageFormat, ImageReader};
use tracing::{info, warn};

use crate::contract::ImageGeneration;
use crate::error::ImageUnavailable;
use crate::slide::AssetRef;
use crate::store::FileStore;

pub const PROMPT_SUFFIX: &str =
    ", high quality, professional, clean design, presentation style, no text";

pub struct ImageAcquirer {
    client: Option<Arc<dyn ImageGeneration>>,
    model_id: String,
    store: FileStore,
    images_dir: String,
}

impl ImageAcquirer {
    pub fn new(
        client: Option<Arc<dyn ImageGeneration>>,
        model_id: impl Into<String>,
        store: FileStore,
        images_dir: impl Into<String>,
    ) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            store,
            images_dir: images_dir.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    /// Generate, save and verify the illustration for one slide.
    pub async fn acquire(&self, prompt: &str, slide_index: usize) -> Option<AssetRef> {
        match self.try_acquire(prompt, slide_index).await {
            Ok(asset) => {
                info!(slide = slide_index, image = %asset, "[IMAGE] Image saved and verified");
                Some(asset)
            }
            Err(e) => {
                warn!(slide = slide_index, error = %e, "[IMAGE] No image for slide");
                None
            }
        }
    }

    async fn try_acquire(&self, prompt: &str, slide_index: usize) -> Result<AssetRef, ImageUnavailable> {
        let client = self.client.as_ref().ok_or(ImageUnavailable::NoClient)?;
        let enhanced = format!("{prompt}{PROMPT_SUFFIX}");
        info!(
            slide = slide_index,
            prompt = %enhanced.chars().take(100).collect::<String>(),
            "[IMAGE] Requesting image"
        );

        let bytes = client
            .generate(&enhanced, &self.model_id)
            .await
            .map_err(ImageUnavailable::Service)?
            .ok_or(ImageUnavailable::NoImage)?;

        let dir = self
            .store
            .dir(&self.images_dir)
            .map_err(|source| ImageUnavailable::Write {
                path: self.store.root().join(&self.images_dir),
                source,
            })?;
        let stem = format!("slide_{}_{}", slide_index, short_id());
        let file_name = format!("{stem}.{}", extension_for(&bytes));
        let path = dir.join(&file_name);
        self.store
            .write(&path, &bytes)
            .map_err(|source| ImageUnavailable::Write {
                path: path.clone(),
                source,
            })?;

        let format = self.verify(&path)?;
        if is_embeddable(format) {
            return Ok(self.store.asset_ref(&self.images_dir, &file_name));
        }

        let png_name = format!("{stem}.png");
        transcode_to_png(&path, &dir.join(&png_name))?;
        info!(slide = slide_index, from = ?format, "[IMAGE] Transcoded image to PNG");
        Ok(self.store.asset_ref(&self.images_dir, &png_name))
    }

    /// Re-open a written file and make sure it is a real, non-empty image.
    fn verify(&self, path: &Path) -> Result<ImageFormat, ImageUnavailable> {
        if !self.store.exists(path) {
            return Err(ImageUnavailable::Missing {
                path: path.to_path_buf(),
            });
        }
        let size = self.store.size(path).map_err(|source| ImageUnavailable::Write {
            path: path.to_path_buf(),
            source,
        })?;
        if size == 0 {
            return Err(ImageUnavailable::EmptyFile {
                path: path.to_path_buf(),
            });
        }
        decode_check(path)
    }
}

/// Decode the whole file, returning its detected format.
pub(crate) fn decode_check(path: &Path) -> Result<ImageFormat, ImageUnavailable> {
    let invalid = |source| ImageUnavailable::Invalid {
        path: path.to_path_buf(),
        source,
    };
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| invalid(image::ImageError::IoError(e)))?;
    let format = reader
        .format()
        .ok_or_else(|| invalid(unsupported_format()))?;
    reader.decode().map_err(invalid)?;
    Ok(format)
}

fn unsupported_format() -> image::ImageError {
    image::ImageError::Unsupported(image::error::UnsupportedError::from_format_and_kind(
        image::error::ImageFormatHint::Unknown,
        image::error::UnsupportedErrorKind::Format(image::error::ImageFormatHint::Unknown),
    ))
}

fn transcode_to_png(from: &Path, to: &Path) -> Result<(), ImageUnavailable> {
    let decoded = image::open(from).map_err(|source| ImageUnavailable::Invalid {
        path: from.to_path_buf(),
        source,
    })?;
    decoded
        .save_with_format(to, ImageFormat::Png)
        .map_err(|source| ImageUnavailable::Invalid {
            path: to.to_path_buf(),
            source,
        })
}

/// Formats a PresentationML package can carry as-is.
pub fn is_embeddable(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::Bmp
    )
}

/// File extension from the payload's magic bytes; `png` when unrecognised.
fn extension_for(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => "jpg",
        Ok(ImageFormat::Gif) => "gif",
        Ok(ImageFormat::Bmp) => "bmp",
        Ok(ImageFormat::WebP) => "webp",
        _ => "png",
    }
}

/// Eight random hex characters for collision-resistant file names.
pub(crate) fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
