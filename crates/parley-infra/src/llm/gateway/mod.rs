//! GatewayProvider -- [`LlmProvider`] for OpenAI-compatible chat-completion gateways.
//!
//! Sends non-streaming requests to `{base_url}/chat/completions` with bearer
//! auth and an `X-Title` header. The API key is wrapped in
//! [`secrecy::SecretString`] and never logged.

pub mod types;

use std::time::Duration;

use parley_core::llm::provider::LlmProvider;
use parley_observe::genai_attrs::{
    GEN_AI_RESPONSE_ID, GEN_AI_USAGE_INPUT_TOKENS, GEN_AI_USAGE_OUTPUT_TOKENS, OP_CHAT,
    PROVIDER_VSEGPT,
};
use parley_types::config::GatewayConfig;
use parley_types::llm::{
    Attachment, CompletionRequest, CompletionResponse, LlmError, MessageRole,
    ProviderCapabilities, StopReason, Usage,
};
use parley_types::model::find_model;
use secrecy::{ExposeSecret, SecretString};
use tracing::Instrument;

use self::types::{
    ChatCompletionRequest, ChatCompletionResponse, ContentPart, ErrorEnvelope, ImageUrl,
    WireContent, WireMessage,
};

/// System prompt prepended when a request carries none.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Reply in Russian if the user writes in Russian. \
If the user attached files, analyze their contents and answer based on the information they provide. \
You can read text in images and analyze PDF documents and other files.";

const ATTACHMENT_INSTRUCTION: &str =
    "Please analyze the contents of the attached files and answer based on what they contain.";

pub struct GatewayProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    app_title: String,
    default_model: String,
    temperature: f64,
    max_tokens: u32,
    timeout_secs: u64,
    capabilities: ProviderCapabilities,
}

impl GatewayProvider {
    pub fn new(config: &GatewayConfig, api_key: SecretString) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_title: config.app_title.clone(),
            default_model: config.default_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.timeout_secs,
            capabilities: ProviderCapabilities {
                vision: true,
                max_context_tokens: 128_000,
                max_output_tokens: config.max_tokens,
            },
        })
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Convert a generic [`CompletionRequest`] into the wire request.
    pub fn to_wire_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        let mut messages: Vec<WireMessage> = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(text_message(MessageRole::System, system.clone()));
        }
        messages.extend(
            request
                .messages
                .iter()
                .map(|m| text_message(m.role, m.content.clone())),
        );
        if messages.first().is_none_or(|m| m.role != "system") {
            messages.insert(
                0,
                text_message(MessageRole::System, DEFAULT_SYSTEM_PROMPT.to_string()),
            );
        }

        if !request.attachments.is_empty() {
            attach_files(&mut messages, &request.attachments);
        }

        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        ChatCompletionRequest {
            model,
            messages,
            temperature: request.temperature.unwrap_or(self.temperature),
            max_tokens: if request.max_tokens == 0 {
                self.max_tokens
            } else {
                request.max_tokens
            },
            n: 1,
        }
    }
}

fn text_message(role: MessageRole, content: String) -> WireMessage {
    WireMessage {
        role: role.to_string(),
        content: WireContent::Text(content),
    }
}

/// Describe the files on the last user message and add image parts for vision models.
fn attach_files(messages: &mut [WireMessage], attachments: &[Attachment]) {
    let Some(last_user) = messages.iter_mut().rev().find(|m| m.role == "user") else {
        return;
    };

    let described = attachments
        .iter()
        .map(Attachment::describe)
        .collect::<Vec<_>>()
        .join(", ");
    let text = format!(
        "{}\n\nAttached files: {described}\n\n{ATTACHMENT_INSTRUCTION}",
        last_user.content.text().unwrap_or_default()
    );

    let images: Vec<ContentPart> = attachments
        .iter()
        .filter(|a| a.is_image())
        .filter_map(|a| a.image_source())
        .map(|url| ContentPart::ImageUrl {
            image_url: ImageUrl { url: url.to_string() },
        })
        .collect();

    last_user.content = if images.is_empty() {
        WireContent::Text(text)
    } else {
        let mut parts = Vec::with_capacity(images.len() + 1);
        parts.push(ContentPart::Text { text });
        parts.extend(images);
        WireContent::Parts(parts)
    };
}

/// Map a non-2xx gateway status to an [`LlmError`].
pub(crate) fn map_status(status: u16, retry_after: Option<&str>, body: &str) -> LlmError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        401 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| secs * 1000),
        },
        503 | 529 => LlmError::Overloaded(message),
        400 | 422 => LlmError::InvalidRequest(message),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

/// Turn a parsed wire response into a [`CompletionResponse`].
pub(crate) fn from_wire_response(
    resp: ChatCompletionResponse,
    requested_model: &str,
) -> Result<CompletionResponse, LlmError> {
    let choice = resp.choices.into_iter().next().ok_or(LlmError::EmptyResponse)?;
    let content = choice
        .message
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)?;
    let usage = resp.usage.unwrap_or_default();

    Ok(CompletionResponse {
        id: resp.id.unwrap_or_default(),
        content,
        model: resp.model.unwrap_or_else(|| requested_model.to_string()),
        stop_reason: StopReason::from_finish_reason(choice.finish_reason.as_deref()),
        usage: Usage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        },
    })
}

// GatewayProvider does not derive Debug; the key stays out of any formatted output.

impl LlmProvider for GatewayProvider {
    fn name(&self) -> &str {
        PROVIDER_VSEGPT
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.to_wire_request(request);
        let vision = find_model(&body.model).is_some_and(|m| m.supports_vision());

        let span = tracing::info_span!(
            "chat",
            gen_ai.operation.name = OP_CHAT,
            gen_ai.provider.name = PROVIDER_VSEGPT,
            gen_ai.request.model = %body.model,
            gen_ai.request.max_tokens = body.max_tokens,
            gen_ai.request.temperature = body.temperature,
            gen_ai.response.id = tracing::field::Empty,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
        );

        async {
            tracing::debug!(
                messages = body.messages.len(),
                attachments = request.attachments.len(),
                vision,
                "Sending completion request"
            );

            let response = self
                .client
                .post(self.url())
                .bearer_auth(self.api_key.expose_secret())
                .header("X-Title", &self.app_title)
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        LlmError::Timeout(self.timeout_secs)
                    } else {
                        LlmError::Provider {
                            message: format!("HTTP request failed: {e}"),
                        }
                    }
                })?;

            let status = response.status();
            if !status.is_success() {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let error_body = response.text().await.unwrap_or_default();
                tracing::warn!(status = status.as_u16(), "Gateway returned an error");
                return Err(map_status(status.as_u16(), retry_after.as_deref(), &error_body));
            }

            let wire: ChatCompletionResponse = response.json().await.map_err(|e| {
                LlmError::Deserialization(format!("failed to parse response: {e}"))
            })?;
            let completion = from_wire_response(wire, &body.model)?;

            let span = tracing::Span::current();
            span.record(GEN_AI_RESPONSE_ID, completion.id.as_str());
            span.record(GEN_AI_USAGE_INPUT_TOKENS, completion.usage.input_tokens);
            span.record(GEN_AI_USAGE_OUTPUT_TOKENS, completion.usage.output_tokens);

            Ok(completion)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::types::{Choice, ChoiceMessage, WireUsage};
    use parley_types::llm::Message;

    fn provider() -> GatewayProvider {
        GatewayProvider::new(&GatewayConfig::default(), SecretString::from("test-key-not-real"))
            .unwrap()
    }

    fn request(messages: Vec<Message>) -> CompletionRequest {
        CompletionRequest {
            model: String::new(),
            messages,
            system: None,
            max_tokens: 0,
            temperature: None,
            attachments: Vec::new(),
        }
    }

    fn image(name: &str) -> Attachment {
        Attachment {
            name: name.to_string(),
            mime_type: "image/png".to_string(),
            size: 3,
            base64: Some("data:image/png;base64,AAA".to_string()),
            url: None,
        }
    }

    #[test]
    fn test_defaults_and_system_prompt() {
        let p = provider();
        let wire = p.to_wire_request(&request(vec![Message::new(MessageRole::User, "hi")]));
        assert_eq!(wire.model, "openai/gpt-4.1-mini");
        assert_eq!(wire.temperature, 0.7);
        assert_eq!(wire.max_tokens, 3000);
        assert_eq!(wire.n, 1);
        assert_eq!(wire.messages.len(), 2);
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[0].content.text(), Some(DEFAULT_SYSTEM_PROMPT));
        assert_eq!(p.url(), "https://api.vsegpt.ru/v1/chat/completions");
    }

    #[test]
    fn test_existing_system_message_is_kept() {
        let p = provider();
        let mut req = request(vec![
            Message::new(MessageRole::System, "Summarize."),
            Message::new(MessageRole::User, "transcript"),
        ]);
        req.model = "anthropic/claude-sonnet-4".to_string();
        req.temperature = Some(0.0);
        req.max_tokens = 512;

        let wire = p.to_wire_request(&req);
        assert_eq!(wire.messages.len(), 2);
        assert_eq!(wire.messages[0].content.text(), Some("Summarize."));
        assert_eq!(wire.model, "anthropic/claude-sonnet-4");
        assert_eq!(wire.temperature, 0.0);
        assert_eq!(wire.max_tokens, 512);
    }

    #[test]
    fn test_request_system_field_goes_first() {
        let p = provider();
        let mut req = request(vec![Message::new(MessageRole::User, "hi")]);
        req.system = Some("Be terse.".to_string());
        let wire = p.to_wire_request(&req);
        assert_eq!(wire.messages.len(), 2);
        assert_eq!(wire.messages[0].content.text(), Some("Be terse."));
    }

    #[test]
    fn test_attachments_land_on_last_user_message() {
        let p = provider();
        let mut req = request(vec![
            Message::new(MessageRole::User, "earlier"),
            Message::new(MessageRole::Assistant, "ok"),
            Message::new(MessageRole::User, "what is this?"),
        ]);
        req.attachments = vec![
            image("cat.png"),
            Attachment {
                name: "notes.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                size: 10,
                base64: None,
                url: None,
            },
        ];

        let wire = p.to_wire_request(&req);
        assert_eq!(wire.messages[1].content, WireContent::Text("earlier".to_string()));

        let WireContent::Parts(parts) = &wire.messages[3].content else {
            panic!("expected content parts on the last user message");
        };
        assert_eq!(parts.len(), 2);
        let text = wire.messages[3].content.text().unwrap();
        assert!(text.starts_with("what is this?\n\nAttached files: File: cat.png (image/png)"));
        assert!(text.contains("notes.pdf (application/pdf) - PDF document for analysis"));
        assert_eq!(
            parts[1],
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: "data:image/png;base64,AAA".to_string() }
            }
        );
    }

    #[test]
    fn test_non_image_attachments_stay_text() {
        let p = provider();
        let mut req = request(vec![Message::new(MessageRole::User, "read this")]);
        req.attachments = vec![Attachment {
            name: "a.txt".to_string(),
            mime_type: "text/plain".to_string(),
            size: 1,
            base64: None,
            url: None,
        }];
        let wire = p.to_wire_request(&req);
        assert!(matches!(wire.messages[1].content, WireContent::Text(_)));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(map_status(401, None, ""), LlmError::AuthenticationFailed));
        assert!(matches!(
            map_status(429, Some("3"), ""),
            LlmError::RateLimited { retry_after_ms: Some(3000) }
        ));
        assert!(matches!(map_status(503, None, "busy"), LlmError::Overloaded(_)));
        assert!(matches!(map_status(529, None, "busy"), LlmError::Overloaded(_)));
        match map_status(500, None, r#"{"error":{"message":"boom"}}"#) {
            LlmError::Provider { message } => assert_eq!(message, "HTTP 500: boom"),
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_from_wire_response() {
        let wire = ChatCompletionResponse {
            id: Some("gen-1".to_string()),
            model: None,
            choices: vec![Choice {
                message: Some(ChoiceMessage { content: Some("Hello!".to_string()) }),
                finish_reason: Some("length".to_string()),
            }],
            usage: Some(WireUsage { prompt_tokens: 12, completion_tokens: 3 }),
        };
        let resp = from_wire_response(wire, "openai/o3").unwrap();
        assert_eq!(resp.content, "Hello!");
        assert_eq!(resp.model, "openai/o3");
        assert_eq!(resp.stop_reason, StopReason::MaxTokens);
        assert_eq!(resp.usage.input_tokens, 12);
    }

    #[test]
    fn test_missing_reply_is_empty_response() {
        let wire: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":""}}]}"#).unwrap();
        assert!(matches!(from_wire_response(wire, "m"), Err(LlmError::EmptyResponse)));

        let wire: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(from_wire_response(wire, "m"), Err(LlmError::EmptyResponse)));
    }
}
