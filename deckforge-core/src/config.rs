use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_TEXT_MODEL: &str = "moonshotai/kimi-k2-instruct-0905";
pub const DEFAULT_TEXT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_IMAGE_MODEL: &str = "black-forest-labs/FLUX.1-dev";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Everything the pipeline needs that is not a secret.
///
/// Every field has a default so a partial YAML file (or none at all) is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Root of all generated assets; asset references are relative to it.
    pub output_dir: PathBuf,
    pub images_dir: String,
    pub presentations_dir: String,
    pub text_model: String,
    pub temperature: f32,
    pub text_base_url: String,
    pub image_model: String,
    pub image_base_url: String,
    /// Run per-slide writing and image acquisition as one future per slide.
    pub parallel_slides: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("static"),
            images_dir: "images".to_string(),
            presentations_dir: "presentations".to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            temperature: 0.7,
            text_base_url: DEFAULT_TEXT_BASE_URL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            parallel_slides: false,
        }
    }
}

impl GeneratorConfig {
    pub fn trace_loaded(&self) {
        info!(
            output_dir = %self.output_dir.display(),
            text_model = %self.text_model,
            image_model = %self.image_model,
            parallel_slides = self.parallel_slides,
            "Loaded GeneratorConfig"
        );
        debug!(?self, "GeneratorConfig loaded (full debug)");
    }
}
