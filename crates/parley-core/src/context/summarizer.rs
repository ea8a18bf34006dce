//! Digest generation through the LLM gateway.
//!
//! `LlmSummarizer` condenses a run of turns into a single digest using a
//! dedicated summarizer model, independent of the model the user chats with.

use std::sync::Arc;

use parley_types::context::{Turn, TurnRole};
use parley_types::error::ContextError;
use parley_types::llm::{CompletionRequest, Message, MessageRole};

use crate::llm::box_provider::BoxLlmProvider;

/// System prompt for the summarization call.
const SUMMARY_SYSTEM_PROMPT: &str = r#"You condense chat transcripts. Preserve:
1. Key facts, names and numbers the user mentioned
2. Decisions and conclusions reached
3. The user's current goals and open questions

Write a compact summary in the language of the conversation. Refer to the participants as "the user" and "the assistant"."#;

/// Produces a digest for a non-empty run of turns.
pub trait Summarizer: Send + Sync {
    fn summarize(
        &self,
        turns: &[Turn],
    ) -> impl std::future::Future<Output = Result<String, ContextError>> + Send;
}

/// Render turns as a `User: ...` / `Assistant: ...` transcript.
pub fn format_transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| {
            let speaker = match t.role {
                TurnRole::User => "User",
                TurnRole::Assistant => "Assistant",
            };
            format!("{speaker}: {}", t.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Summarizer backed by an LLM provider.
pub struct LlmSummarizer {
    provider: Arc<BoxLlmProvider>,
    model: String,
    max_tokens: u32,
}

impl LlmSummarizer {
    pub fn new(provider: Arc<BoxLlmProvider>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Summarizer for LlmSummarizer {
    #[tracing::instrument(
        name = "summarize_turns",
        skip(self, turns),
        fields(model = %self.model, turn_count = turns.len())
    )]
    async fn summarize(&self, turns: &[Turn]) -> Result<String, ContextError> {
        if turns.is_empty() {
            return Err(ContextError::InvalidState(
                "nothing to summarize".to_string(),
            ));
        }

        let transcript = format_transcript(turns);
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message::new(MessageRole::System, SUMMARY_SYSTEM_PROMPT),
                Message::new(
                    MessageRole::User,
                    format!(
                        "Summarize this dialog:\n\n<conversation>\n{transcript}\n</conversation>"
                    ),
                ),
            ],
            system: None,
            max_tokens: self.max_tokens,
            temperature: Some(0.0),
            attachments: Vec::new(),
        };

        let response = self.provider.complete(&request).await?;
        let text = response.content.trim();
        if text.is_empty() {
            return Err(ContextError::TransientGateway(
                "summarizer returned empty text".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::LlmProvider;
    use parley_types::llm::{
        CompletionResponse, LlmError, ProviderCapabilities, StopReason, Usage,
    };
    use std::sync::Mutex;

    /// Records the last request and replies with a canned result.
    struct ScriptedProvider {
        reply: Result<String, ()>,
        last_request: Arc<Mutex<Option<CompletionRequest>>>,
        capabilities: ProviderCapabilities,
    }

    impl ScriptedProvider {
        fn new(reply: Result<&str, ()>) -> (Self, Arc<Mutex<Option<CompletionRequest>>>) {
            let last_request = Arc::new(Mutex::new(None));
            (
                Self {
                    reply: reply.map(str::to_string),
                    last_request: Arc::clone(&last_request),
                    capabilities: ProviderCapabilities {
                        vision: false,
                        max_context_tokens: 200_000,
                        max_output_tokens: 8_192,
                    },
                },
                last_request,
            )
        }
    }

    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn capabilities(&self) -> &ProviderCapabilities {
            &self.capabilities
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            match &self.reply {
                Ok(text) => Ok(CompletionResponse {
                    id: "sum-1".to_string(),
                    content: text.clone(),
                    model: request.model.clone(),
                    stop_reason: StopReason::EndTurn,
                    usage: Usage::default(),
                }),
                Err(()) => Err(LlmError::Provider {
                    message: "upstream 502".to_string(),
                }),
            }
        }
    }

    fn summarizer(reply: Result<&str, ()>) -> (LlmSummarizer, Arc<Mutex<Option<CompletionRequest>>>) {
        let (provider, last) = ScriptedProvider::new(reply);
        (
            LlmSummarizer::new(
                Arc::new(BoxLlmProvider::new(provider)),
                "anthropic/claude-sonnet-4",
                512,
            ),
            last,
        )
    }

    #[test]
    fn test_format_transcript() {
        let turns = vec![Turn::user("Hi"), Turn::assistant("Hello!")];
        assert_eq!(format_transcript(&turns), "User: Hi\n\nAssistant: Hello!");
    }

    #[tokio::test]
    async fn test_summarize_sends_transcript_to_summarizer_model() {
        let (summarizer, last) = summarizer(Ok("  The user greeted the assistant.  "));
        let turns = vec![Turn::user("Hi"), Turn::assistant("Hello!")];

        let digest = summarizer.summarize(&turns).await.unwrap();
        assert_eq!(digest, "The user greeted the assistant.");

        let request = last.lock().unwrap().clone().unwrap();
        assert_eq!(request.model, "anthropic/claude-sonnet-4");
        assert_eq!(request.max_tokens, 512);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert!(request.messages[1].content.contains("User: Hi\n\nAssistant: Hello!"));
    }

    #[tokio::test]
    async fn test_summarize_empty_input_is_invalid_state() {
        let (summarizer, last) = summarizer(Ok("unused"));
        let err = summarizer.summarize(&[]).await.unwrap_err();
        assert!(matches!(err, ContextError::InvalidState(_)));
        assert!(last.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_summarize_empty_output_is_transient() {
        let (summarizer, _) = summarizer(Ok("   \n"));
        let err = summarizer.summarize(&[Turn::user("x")]).await.unwrap_err();
        assert!(matches!(err, ContextError::TransientGateway(_)));
    }

    #[tokio::test]
    async fn test_summarize_upstream_failure_is_transient() {
        let (summarizer, _) = summarizer(Err(()));
        let err = summarizer.summarize(&[Turn::user("x")]).await.unwrap_err();
        assert!(matches!(err, ContextError::TransientGateway(msg) if msg.contains("502")));
    }
}
