//! LlmProvider trait definition.
//!
//! This is the core abstraction that the gateway client implements.
//! Uses RPITIT for `complete`; see `BoxLlmProvider` for dynamic dispatch.

use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities};

/// Trait for LLM backends reachable through the gateway.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in parley-infra (e.g., `GatewayProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "vsegpt").
    fn name(&self) -> &str;

    /// What this provider supports.
    fn capabilities(&self) -> &ProviderCapabilities;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
