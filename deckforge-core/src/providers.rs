//! HTTP clients for the two hosted services.
//!
//! [`GroqClient`] speaks the OpenAI-compatible chat-completions API; [`HuggingFaceClient`]
//! calls the Hugging Face text-to-image inference endpoint. Response interpretation is
//! kept in free functions so it can be tested without a network.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::GeneratorConfig;
use crate::contract::{ImageGeneration, ServiceError, TextCompletion};
use crate::error::ProviderError;

pub const GROQ_API_KEY_VAR: &str = "GROQ_API_KEY";
pub const HF_TOKEN_VAR: &str = "HF_TOKEN";

/// How much of an error body is kept in [`ProviderError::Status`].
const ERROR_BODY_LIMIT: usize = 500;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// A credential from the environment; unset and blank values both count as missing.
pub fn read_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn status_error(url: &str, status: reqwest::StatusCode, body: &[u8]) -> ProviderError {
    let body = String::from_utf8_lossy(&body[..body.len().min(ERROR_BODY_LIMIT)]).into_owned();
    ProviderError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    }
}

/// Chat-completion client for Groq (or any OpenAI-compatible endpoint).
#[derive(Clone)]
pub struct GroqClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GroqClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
        }
    }

    /// Build from `GROQ_API_KEY` and the text settings of `config`.
    pub fn from_env(config: &GeneratorConfig) -> Result<Self, ProviderError> {
        let api_key = read_env(GROQ_API_KEY_VAR).ok_or(ProviderError::MissingCredential {
            var: GROQ_API_KEY_VAR,
        })?;
        Ok(Self::new(
            api_key,
            config.text_base_url.clone(),
            config.text_model.clone(),
            config.temperature,
        ))
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextCompletion for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let url = self.endpoint();
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        debug!(url = %url, model = %self.model, "Sending chat completion request");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            let err = status_error(&url, status, &body);
            error!(status = %status, url = %url, "Chat completion request failed");
            return Err(Box::new(err));
        }
        Ok(parse_chat_completion(&body)?)
    }
}

/// Text of the first choice of a chat-completion response.
pub fn parse_chat_completion(body: &[u8]) -> Result<String, ProviderError> {
    let response: ChatResponse = serde_json::from_slice(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::Malformed("no message content in choices".to_string()))
}

/// Text-to-image client for the Hugging Face inference API.
#[derive(Clone)]
pub struct HuggingFaceClient {
    http: Client,
    base_url: String,
    token: String,
}

impl HuggingFaceClient {
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Build from `HF_TOKEN`; `None` when the token is absent, meaning no illustrations.
    pub fn from_env(config: &GeneratorConfig) -> Option<Self> {
        read_env(HF_TOKEN_VAR).map(|token| Self::new(token, config.image_base_url.clone()))
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), model_id)
    }
}

#[async_trait]
impl ImageGeneration for HuggingFaceClient {
    async fn generate(&self, prompt: &str, model_id: &str) -> Result<Option<Vec<u8>>, ServiceError> {
        let url = self.endpoint(model_id);
        debug!(url = %url, "Sending text-to-image request");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "inputs": prompt }))
            .send()
            .await?;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().await?;
        if !status.is_success() {
            let err = status_error(&url, status, &body);
            error!(status = %status, url = %url, "Text-to-image request failed");
            return Err(Box::new(err));
        }
        Ok(interpret_image_response(content_type.as_deref(), body.to_vec()))
    }
}

/// Decide whether a successful text-to-image response carries an image.
///
/// An empty body, or a JSON/text body (status messages such as "model is loading"), is
/// no image. Anything else is handed on as raw bytes; validation happens when saving.
pub fn interpret_image_response(content_type: Option<&str>, body: Vec<u8>) -> Option<Vec<u8>> {
    if body.is_empty() {
        return None;
    }
    let mime = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .unwrap_or_default();
    if mime == "application/json" || mime.starts_with("text/") {
        debug!(
            content_type = %mime,
            body = %String::from_utf8_lossy(&body[..body.len().min(ERROR_BODY_LIMIT)]),
            "Image service answered without an image"
        );
        return None;
    }
    Some(body)
}
