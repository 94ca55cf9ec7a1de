//! Error taxonomy for the generation pipeline.
//!
//! Only [`PipelineError`] ever reaches the caller of
//! [`crate::pipeline::PresentationPipeline::run_pipeline`], and even then only as the
//! message of a failed result. Every other error here is recovered inside its stage:
//! planning and generation errors fall back to deterministic text, an unavailable image
//! leaves the slide without one, and an assembly error costs a single slide its layout.

use std::path::PathBuf;
use thiserror::Error;

use crate::contract::ServiceError;

/// The outline returned by the model could not be used.
#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("outline request failed: {0}")]
    Service(#[source] ServiceError),

    #[error("outline is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("outline must be a JSON array")]
    NotAnArray,

    #[error("outline is empty")]
    Empty,

    #[error("slide {position} is missing required key '{key}'")]
    MissingKey { position: usize, key: &'static str },

    #[error("slide {position} has a malformed '{key}'")]
    Malformed { position: usize, key: &'static str },
}

/// A single text field could not be generated.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{field} request failed: {source}")]
    Service {
        field: &'static str,
        #[source]
        source: ServiceError,
    },

    #[error("{field} response was empty")]
    EmptyResponse { field: &'static str },
}

/// No trustworthy image exists for a slide.
#[derive(Error, Debug)]
pub enum ImageUnavailable {
    #[error("no image client configured")]
    NoClient,

    #[error("image service failed: {0}")]
    Service(#[source] ServiceError),

    #[error("image service returned no image")]
    NoImage,

    #[error("could not write image {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image file {path} was not found after writing")]
    Missing { path: PathBuf },

    #[error("image file {path} is empty")]
    EmptyFile { path: PathBuf },

    #[error("image file {path} is not a valid image: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// One slide's layout routine failed; the slide is kept title-only.
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("slide {index} ({layout}) layout failed: {reason}")]
    Layout {
        index: usize,
        layout: String,
        reason: String,
    },
}

/// The finished presentation could not be saved.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("could not prepare output directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write presentation: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not package presentation: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("presentation {path} was not found after saving")]
    Missing { path: PathBuf },
}

/// A hosted-service client could not be built or got an unusable answer.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("environment variable {var} is not set")]
    MissingCredential { var: &'static str },

    #[error("{url} returned {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    Malformed(String),

    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures visible to the caller as `succeeded: false`.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Topic is required")]
    EmptyTopic,

    #[error("Slides count must be between {min} and {max}, got {got}")]
    SlideCount { min: usize, max: usize, got: usize },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_messages_are_user_facing() {
        assert_eq!(PipelineError::EmptyTopic.to_string(), "Topic is required");
        let err = PipelineError::SlideCount {
            min: 3,
            max: 20,
            got: 42,
        };
        assert_eq!(
            err.to_string(),
            "Slides count must be between 3 and 20, got 42"
        );
    }

    #[test]
    fn test_planning_error_names_missing_key() {
        let err = PlanningError::MissingKey {
            position: 2,
            key: "design_type",
        };
        assert_eq!(
            err.to_string(),
            "slide 2 is missing required key 'design_type'"
        );
    }
}
