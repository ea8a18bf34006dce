//! Shared state for the HTTP proxy.

use std::sync::Arc;

use parley_core::chat::dialog::CompletionSettings;
use parley_core::context::{
    ContextManager, ContextManagerConfig, ConversationRegistry, InMemorySummaryStore,
    LlmSummarizer,
};
use parley_core::llm::box_provider::BoxLlmProvider;
use parley_types::config::GlobalConfig;

/// Conversations served over HTTP live in memory only.
pub type ProxyContextManager = ContextManager<LlmSummarizer, InMemorySummaryStore>;

#[derive(Clone)]
pub struct ProxyState {
    pub provider: Arc<BoxLlmProvider>,
    pub context: Arc<ProxyContextManager>,
    pub conversations: Arc<ConversationRegistry>,
    pub settings: CompletionSettings,
}

impl ProxyState {
    pub fn new(provider: Arc<BoxLlmProvider>, config: &GlobalConfig) -> Self {
        let summarizer = LlmSummarizer::new(
            Arc::clone(&provider),
            config.context.summarizer_model.clone(),
            config.context.summary_max_tokens,
        );
        let context = ContextManager::new(
            summarizer,
            InMemorySummaryStore::new(),
            ContextManagerConfig::from(&config.context),
        );
        Self {
            provider,
            context: Arc::new(context),
            conversations: Arc::new(ConversationRegistry::new()),
            settings: CompletionSettings::from(&config.gateway),
        }
    }
}
