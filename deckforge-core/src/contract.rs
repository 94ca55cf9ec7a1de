//! # contract: the two hosted services the pipeline depends on
//!
//! The pipeline never talks HTTP itself. It is handed a [`TextCompletion`] for the
//! outline and slide copy, and optionally an [`ImageGeneration`] for illustrations.
//! Real clients live in [`crate::providers`]; tests use the `mockall` mocks generated
//! here (`MockTextCompletion`, `MockImageGeneration`).
//!
//! Both traits are single-shot: no streaming, no conversation state.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Error type for service calls (simple boxed error, as returned by the HTTP clients).
pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;

/// A language model that turns one prompt into one completion.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Send `prompt` as a single user message and return the model's text.
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// A text-to-image service.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ImageGeneration: Send + Sync {
    /// Render `prompt` with the model `model_id`.
    ///
    /// `Ok(None)` means the service answered but produced no image (safety filter,
    /// model loading, ...). Raw bytes are returned as-is and are not validated here.
    async fn generate(&self, prompt: &str, model_id: &str)
        -> Result<Option<Vec<u8>>, ServiceError>;
}
