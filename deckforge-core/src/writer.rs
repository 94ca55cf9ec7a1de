//! Slide copy: body prose and an illustration prompt for each planned slide.

use std::sync::Arc;

use tracing::{info, warn};

use crate::contract::TextCompletion;
use crate::error::GenerationError;
use crate::slide::{LayoutKind, SlideContent, SlideSpec};

pub struct SlideWriter {
    model: Arc<dyn TextCompletion>,
}

impl SlideWriter {
    pub fn new(model: Arc<dyn TextCompletion>) -> Self {
        Self { model }
    }

    /// Body and image prompt for one slide. The two requests are independent: either may
    /// fall back without affecting the other.
    pub async fn write(&self, spec: &SlideSpec, topic: &str) -> SlideContent {
        info!(slide = spec.index, title = %spec.title, "[WRITER] Generating slide content");
        let body = self.generate_body(spec, topic).await;
        let image_prompt = self.generate_image_prompt(spec, topic).await;
        SlideContent { body, image_prompt }
    }

    pub async fn generate_body(&self, spec: &SlideSpec, topic: &str) -> String {
        match self.ask("body", &body_prompt(spec, topic)).await {
            Ok(text) => text,
            Err(e) => {
                warn!(slide = spec.index, error = %e, "[WRITER] Using fallback body");
                fallback_body(spec, topic)
            }
        }
    }

    pub async fn generate_image_prompt(&self, spec: &SlideSpec, topic: &str) -> String {
        match self.ask("image prompt", &image_prompt_request(spec, topic)).await {
            Ok(text) => text,
            Err(e) => {
                warn!(slide = spec.index, error = %e, "[WRITER] Using fallback image prompt");
                fallback_image_prompt(topic)
            }
        }
    }

    async fn ask(&self, field: &'static str, prompt: &str) -> Result<String, GenerationError> {
        let text = self
            .model
            .complete(prompt)
            .await
            .map_err(|source| GenerationError::Service { field, source })?;
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse { field });
        }
        Ok(text.to_string())
    }
}

fn tone(layout: LayoutKind) -> &'static str {
    match layout {
        LayoutKind::Title => "energetic and inviting, as befits an introductory slide",
        LayoutKind::Conclusion => "visionary and forward-looking, as befits a closing slide",
        LayoutKind::Content | LayoutKind::ImageFocus | LayoutKind::Default => {
            "formal and informative"
        }
    }
}

fn body_prompt(spec: &SlideSpec, topic: &str) -> String {
    format!(
        r#"You are a professional presentation writer creating engaging, original slide content.

Topic: "{topic}"
Slide Title: {title}
Design Type: {layout}
Key Points to Cover: {points}

Instructions:
- Write 2-3 cohesive paragraphs that balance clarity with originality.
- Weave the key points into a narrative; do not repeat them verbatim as a list.
- Use vivid analogies, real-world examples or surprising insights.
- Keep the tone {tone}.
- Keep it concise enough for a slide, yet rich in substance.
- Return only the plain content text (no formatting, bullet points or markdown)."#,
        title = spec.title,
        layout = spec.layout,
        points = spec.key_points.join(", "),
        tone = tone(spec.layout),
    )
}

fn image_prompt_request(spec: &SlideSpec, topic: &str) -> String {
    format!(
        r#"Create a detailed image prompt for generating a professional image for a PowerPoint slide.

Slide title: {title}
Topic: {topic}
Design type: {layout}

The image should be:
- Professional and suitable for business presentations
- High quality and visually appealing
- Relevant to the slide topic
- Clean and modern design
- No text or words in the image

Write a concise but descriptive prompt (max 50 words) for an AI image generator.
Only return the prompt text, no quotes or extra formatting."#,
        title = spec.title,
        layout = spec.layout,
    )
}

pub fn fallback_body(spec: &SlideSpec, topic: &str) -> String {
    format!(
        "Content about {} related to {}. This slide covers {}.",
        spec.title,
        topic,
        spec.key_points.join(", ")
    )
}

pub fn fallback_image_prompt(topic: &str) -> String {
    format!(
        "Professional illustration about {topic}, modern design, high quality, business presentation style"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MockTextCompletion;

    fn spec() -> SlideSpec {
        SlideSpec {
            index: 1,
            title: "Wind Power".into(),
            layout: LayoutKind::Title,
            key_points: vec!["Turbines".into(), "Offshore farms".into()],
        }
    }

    #[test]
    fn test_body_prompt_tone_follows_layout() {
        let mut s = spec();
        assert!(body_prompt(&s, "Energy").contains("energetic"));
        s.layout = LayoutKind::Conclusion;
        assert!(body_prompt(&s, "Energy").contains("visionary"));
        s.layout = LayoutKind::Content;
        assert!(body_prompt(&s, "Energy").contains("formal"));
    }

    #[tokio::test]
    async fn test_failed_body_does_not_affect_image_prompt() {
        let mut model = MockTextCompletion::new();
        model.expect_complete().returning(|prompt: &str| {
            if prompt.contains("image prompt") {
                Ok("  Wind turbines at dawn over a calm sea  ".to_string())
            } else {
                Err("rate limited".into())
            }
        });
        let writer = SlideWriter::new(Arc::new(model));

        let content = writer.write(&spec(), "Energy").await;

        assert_eq!(
            content.body,
            "Content about Wind Power related to Energy. This slide covers Turbines, Offshore farms."
        );
        assert_eq!(content.image_prompt, "Wind turbines at dawn over a calm sea");
    }

    #[tokio::test]
    async fn test_blank_response_counts_as_failure() {
        let mut model = MockTextCompletion::new();
        model
            .expect_complete()
            .returning(|_prompt: &str| Ok("   \n".to_string()));
        let writer = SlideWriter::new(Arc::new(model));

        let content = writer.write(&spec(), "Energy").await;

        assert_eq!(content.image_prompt, fallback_image_prompt("Energy"));
        assert_eq!(content.body, fallback_body(&spec(), "Energy"));
    }
}
