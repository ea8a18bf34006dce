//! OpenAI chat-completions wire types.
//!
//! These are gateway-specific request/response structures. They are NOT the
//! generic LLM types from parley-types -- those are provider-agnostic.

use serde::{Deserialize, Serialize};

/// Request body for `POST {base_url}/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub n: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireMessage {
    pub role: String,
    pub content: WireContent,
}

/// Plain text, or a list of parts when images ride along.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl WireContent {
    /// The text portion of the message.
    pub fn text(&self) -> Option<&str> {
        match self {
            WireContent::Text(text) => Some(text),
            WireContent::Parts(parts) => parts.iter().find_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ImageUrl { .. } => None,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Response body of a non-streaming chat completion.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

/// Error envelope some gateways return alongside a non-2xx status.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts_serialize_openai_shape() {
        let msg = WireMessage {
            role: "user".to_string(),
            content: WireContent::Parts(vec![
                ContentPart::Text { text: "look".to_string() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: "https://img.example/a.png".to_string() },
                },
            ]),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "image_url");
        assert_eq!(json["content"][1]["image_url"]["url"], "https://img.example/a.png");
        assert_eq!(msg.content.text(), Some("look"));
    }

    #[test]
    fn test_text_content_serializes_as_string() {
        let msg = WireMessage {
            role: "system".to_string(),
            content: WireContent::Text("be brief".to_string()),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"], "be brief");
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let resp: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[{}]}"#).unwrap();
        assert!(resp.id.is_none());
        assert!(resp.choices[0].message.is_none());
        assert!(resp.usage.is_none());
    }
}
