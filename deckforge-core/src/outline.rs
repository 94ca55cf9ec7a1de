//! Outline planning: topic and slide count in, ordered slide specs out.
//!
//! The model is asked for a JSON array. Whatever comes back is extracted from an optional
//! code fence, parsed and validated; on any problem the planner switches to a fixed,
//! network-free outline so the rest of the pipeline always has something to work on.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::contract::TextCompletion;
use crate::error::PlanningError;
use crate::slide::{LayoutKind, SlideSpec};

const FENCE: &str = "```";
const REQUIRED_KEYS: [&str; 4] = ["slide_number", "title", "design_type", "key_points"];

pub struct OutlinePlanner {
    model: Arc<dyn TextCompletion>,
}

impl OutlinePlanner {
    pub fn new(model: Arc<dyn TextCompletion>) -> Self {
        Self { model }
    }

    /// Plan `slide_count` slides for `topic`. Never fails; degrades to [`fallback_outline`].
    pub async fn plan(&self, topic: &str, slide_count: usize) -> Vec<SlideSpec> {
        info!(topic, slide_count, "[OUTLINE] Requesting slide structure");
        match self.request(topic, slide_count).await {
            Ok(specs) => {
                info!(slides = specs.len(), "[OUTLINE] Model outline accepted");
                specs
            }
            Err(e) => {
                warn!(error = %e, "[OUTLINE] Falling back to deterministic outline");
                fallback_outline(topic, slide_count)
            }
        }
    }

    async fn request(&self, topic: &str, slide_count: usize) -> Result<Vec<SlideSpec>, PlanningError> {
        let response = self
            .model
            .complete(&outline_prompt(topic, slide_count))
            .await
            .map_err(PlanningError::Service)?;
        debug!(raw = %response, "[OUTLINE] Raw model response");
        parse_outline(&response)
    }
}

fn outline_prompt(topic: &str, slide_count: usize) -> String {
    format!(
        r#"Create a structure for a {slide_count}-slide PowerPoint presentation on "{topic}".

For each slide, provide:
1. Title (concise and engaging)
2. Design type (choose from: title, content, image_focus, conclusion)
3. Key points to cover

Make the presentation flow logically with:
- Slide 1: Always title slide introducing the topic
- Middle slides: Mix of content and image_focus slides
- Last slide: Always conclusion slide

Return ONLY a valid JSON array with this exact format:
[
    {{
        "slide_number": 1,
        "title": "Slide Title",
        "design_type": "title",
        "key_points": ["point1", "point2", "point3"]
    }}
]

Do not include any text before or after the JSON."#
    )
}

/// Candidate JSON text inside a model response.
///
/// With two or more fences the first fenced block wins; with a single fence the text
/// after it is used; without fences the whole response is used. A language tag on the
/// opening fence line (```` ```json ````) is dropped.
pub fn extract_json_block(response: &str) -> &str {
    if !response.contains(FENCE) {
        return response.trim();
    }
    let parts: Vec<&str> = response.split(FENCE).collect();
    let block = if parts.len() >= 3 {
        parts[1]
    } else {
        parts[parts.len() - 1]
    };
    strip_language_tag(block).trim()
}

fn strip_language_tag(block: &str) -> &str {
    match block.split_once('\n') {
        Some((first, rest))
            if !first.trim().is_empty()
                && first
                    .trim()
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') =>
        {
            rest
        }
        _ => block,
    }
}

/// Extract, parse and validate an outline response.
pub fn parse_outline(response: &str) -> Result<Vec<SlideSpec>, PlanningError> {
    let value: Value = serde_json::from_str(extract_json_block(response))?;
    let items = value.as_array().ok_or(PlanningError::NotAnArray)?;
    if items.is_empty() {
        return Err(PlanningError::Empty);
    }

    items
        .iter()
        .enumerate()
        .map(|(position, item)| spec_from_value(position, item))
        .collect()
}

fn spec_from_value(position: usize, item: &Value) -> Result<SlideSpec, PlanningError> {
    let malformed = |key| PlanningError::Malformed { position: position + 1, key };
    let object = item.as_object().ok_or(malformed("slide"))?;
    for key in REQUIRED_KEYS {
        if !object.contains_key(key) {
            return Err(PlanningError::MissingKey {
                position: position + 1,
                key,
            });
        }
    }

    let title = object["title"].as_str().ok_or(malformed("title"))?;
    let layout = object["design_type"]
        .as_str()
        .map(LayoutKind::from)
        .ok_or(malformed("design_type"))?;
    let key_points = object["key_points"]
        .as_array()
        .ok_or(malformed("key_points"))?
        .iter()
        .map(|point| match point {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    Ok(SlideSpec {
        index: position + 1,
        title: title.trim().to_string(),
        layout,
        key_points,
    })
}

/// Deterministic outline used whenever the model's outline cannot be trusted.
pub fn fallback_outline(topic: &str, slide_count: usize) -> Vec<SlideSpec> {
    let points = |items: [&str; 3]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    (0..slide_count)
        .map(|i| {
            if i == 0 {
                SlideSpec {
                    index: 1,
                    title: format!("Introduction to {topic}"),
                    layout: LayoutKind::Title,
                    key_points: points(["Overview", "Objectives", "Key Topics"]),
                }
            } else if i == slide_count - 1 {
                SlideSpec {
                    index: i + 1,
                    title: "Conclusion".to_string(),
                    layout: LayoutKind::Conclusion,
                    key_points: points(["Summary", "Key Takeaways", "Next Steps"]),
                }
            } else {
                SlideSpec {
                    index: i + 1,
                    title: format!("{topic} - Part {i}"),
                    layout: if i % 2 == 1 {
                        LayoutKind::Content
                    } else {
                        LayoutKind::ImageFocus
                    },
                    key_points: points(["Main concepts", "Examples", "Applications"]),
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_without_fence_uses_whole_text() {
        assert_eq!(extract_json_block("  [1, 2]\n"), "[1, 2]");
    }

    #[test]
    fn test_extract_takes_first_fenced_block() {
        let response = "Here you go:\n```\n[{\"a\": 1}]\n```\nand also\n```\n[2]\n```";
        assert_eq!(extract_json_block(response), "[{\"a\": 1}]");
    }

    #[test]
    fn test_extract_drops_language_tag() {
        let response = "```json\n[{\"a\": 1}]\n```";
        assert_eq!(extract_json_block(response), "[{\"a\": 1}]");
    }

    #[test]
    fn test_extract_single_fence_uses_trailing_segment() {
        let response = "Sure!\n```json\n[3]";
        assert_eq!(extract_json_block(response), "[3]");
    }

    #[test]
    fn test_parse_rejects_missing_key() {
        let err = parse_outline(r#"[{"slide_number": 1, "title": "T", "key_points": []}]"#)
            .unwrap_err();
        assert!(matches!(
            err,
            PlanningError::MissingKey { position: 1, key: "design_type" }
        ));
    }

    #[test]
    fn test_parse_rejects_object_and_empty_array() {
        assert!(matches!(
            parse_outline(r#"{"slides": []}"#),
            Err(PlanningError::NotAnArray)
        ));
        assert!(matches!(parse_outline("[]"), Err(PlanningError::Empty)));
    }

    #[test]
    fn test_parse_stringifies_non_string_points_and_defaults_unknown_layout() {
        let specs = parse_outline(
            r#"[{"slide_number": 7, "title": " Numbers ", "design_type": "chart", "key_points": ["a", 42]}]"#,
        )
        .unwrap();
        assert_eq!(specs[0].index, 1);
        assert_eq!(specs[0].title, "Numbers");
        assert_eq!(specs[0].layout, LayoutKind::Default);
        assert_eq!(specs[0].key_points, vec!["a".to_string(), "42".to_string()]);
    }
}
