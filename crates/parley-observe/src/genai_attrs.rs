//! OpenTelemetry GenAI Semantic Convention attribute names.
//!
//! Gateway and summarizer spans declare these fields up front and fill the
//! response-side ones with `Span::record` once the reply arrives.
//!
//! Span naming convention: `"{operation}"` with the model as an attribute.

// --- Required attributes ---

pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g., "vsegpt").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

// --- Recommended attributes ---

/// The model ID requested (e.g., "openai/gpt-4.1-mini").
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

pub const GEN_AI_REQUEST_TEMPERATURE: &str = "gen_ai.request.temperature";

pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";

pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The unique response ID from the gateway.
pub const GEN_AI_RESPONSE_ID: &str = "gen_ai.response.id";

// --- Conversation attributes ---

/// The chat or in-memory conversation the call belongs to.
pub const GEN_AI_CONVERSATION_ID: &str = "gen_ai.conversation.id";

// --- Operation name values ---

pub const OP_CHAT: &str = "chat";

/// History compaction into a digest.
pub const OP_SUMMARIZE_CONTEXT: &str = "summarize_context";

// --- Provider name values ---

pub const PROVIDER_VSEGPT: &str = "vsegpt";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_names_share_namespace() {
        for name in [
            GEN_AI_OPERATION_NAME,
            GEN_AI_PROVIDER_NAME,
            GEN_AI_REQUEST_MODEL,
            GEN_AI_REQUEST_TEMPERATURE,
            GEN_AI_REQUEST_MAX_TOKENS,
            GEN_AI_USAGE_INPUT_TOKENS,
            GEN_AI_USAGE_OUTPUT_TOKENS,
            GEN_AI_RESPONSE_ID,
            GEN_AI_CONVERSATION_ID,
        ] {
            assert!(name.starts_with("gen_ai."), "{name}");
        }
    }
}
