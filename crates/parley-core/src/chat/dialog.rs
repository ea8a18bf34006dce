//! Dialog service: runs one user turn end to end.
//!
//! A turn locks the conversation, checks the user's quota, persists the user
//! message, lets the context manager compact and assemble the request, calls
//! the chat model, then persists and records the reply.

use std::sync::Arc;

use parley_types::config::GatewayConfig;
use parley_types::chat::ChatMessage;
use parley_types::context::{Digest, TurnRole};
use parley_types::error::{ChatError, ContextError};
use parley_types::llm::{Attachment, CompletionRequest, Usage};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::repository::{ChatRepository, FolderRepository};
use crate::chat::service::ChatService;
use crate::context::manager::{CompactionOutcome, ContextManager};
use crate::context::registry::{ConversationLease, ConversationRegistry};
use crate::context::store::SummaryStore;
use crate::context::summarizer::Summarizer;
use crate::llm::box_provider::BoxLlmProvider;
use crate::profile::repository::ProfileRepository;
use crate::profile::service::ProfileService;

/// Sampling settings for chat completions.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub default_model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl From<&GatewayConfig> for CompletionSettings {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            default_model: config.default_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// The assistant's answer to one user turn.
#[derive(Debug, Clone)]
pub struct DialogReply {
    pub message: ChatMessage,
    pub usage: Usage,
    /// Whether the history was folded into a new digest during this turn.
    pub compacted: bool,
}

pub struct DialogService<C, F, P, S, St>
where
    C: ChatRepository,
    F: FolderRepository,
    P: ProfileRepository,
    S: Summarizer,
    St: SummaryStore,
{
    chats: Arc<ChatService<C, F, St>>,
    profiles: Arc<ProfileService<P>>,
    context: ContextManager<S, St>,
    provider: Arc<BoxLlmProvider>,
    registry: ConversationRegistry,
    settings: CompletionSettings,
}

impl<C, F, P, S, St> DialogService<C, F, P, S, St>
where
    C: ChatRepository,
    F: FolderRepository,
    P: ProfileRepository,
    S: Summarizer,
    St: SummaryStore,
{
    pub fn new(
        chats: Arc<ChatService<C, F, St>>,
        profiles: Arc<ProfileService<P>>,
        context: ContextManager<S, St>,
        provider: Arc<BoxLlmProvider>,
        settings: CompletionSettings,
    ) -> Self {
        Self {
            chats,
            profiles,
            context,
            provider,
            registry: ConversationRegistry::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }

    /// Lock the chat's conversation, loading it from storage on first use.
    async fn lease(&self, user_id: Uuid, chat_id: Uuid) -> Result<ConversationLease, ChatError> {
        let chat = self.chats.get_chat(user_id, chat_id).await?;
        if let Some(lease) = self.registry.try_acquire(&chat.id)? {
            return Ok(lease);
        }
        let conversation = self
            .chats
            .load_conversation(&chat.id, &self.settings.default_model)
            .await?;
        let handle = self.registry.insert_if_absent(conversation);
        handle
            .try_lock_owned()
            .map_err(|_| ChatError::Context(ContextError::Busy(chat.id)))
    }

    /// Send a user message and return the assistant's reply.
    ///
    /// Passing a `model` different from the conversation's current one
    /// switches models first. If the completion call fails the user message
    /// stays recorded and the error is returned.
    #[tracing::instrument(
        name = "send_message",
        skip_all,
        fields(user_id = %user_id, chat_id = %chat_id, model = ?model)
    )]
    pub async fn send_message(
        &self,
        user_id: Uuid,
        chat_id: Uuid,
        text: &str,
        attachments: Vec<Attachment>,
        model: Option<&str>,
    ) -> Result<DialogReply, ChatError> {
        let text = text.trim();
        if text.is_empty() && attachments.is_empty() {
            return Err(ChatError::InvalidInput("message is empty".to_string()));
        }

        let mut conversation = self.lease(user_id, chat_id).await?;
        self.profiles.check_daily_limit(user_id).await?;

        if let Some(model) = model {
            let outcome = self.context.on_model_changed(&mut conversation, model).await;
            debug!(?outcome, "Model selection applied");
        }

        let mut user_message = ChatMessage::new(chat_id, TurnRole::User, text);
        user_message.attachments = attachments.clone();
        // Until the manager has appended the user turn, storage is one turn
        // ahead of the cached conversation.
        let eviction = EvictOnDrop::arm(&self.registry, chat_id);
        self.chats.save_message(&user_message).await?;

        let covered_before = conversation.covers_up_to();
        let request = self
            .context
            .get_context_for_next_turn(&mut conversation, user_message.to_turn())
            .await?;
        eviction.disarm();
        request.ensure_live_user_turn()?;

        let model = conversation.model().to_string();
        let completion = CompletionRequest {
            model: model.clone(),
            messages: request.to_messages(),
            system: None,
            max_tokens: self.settings.max_tokens,
            temperature: Some(self.settings.temperature),
            attachments,
        };
        let response = match self.provider.complete(&completion).await {
            Ok(response) => response,
            Err(e) => {
                warn!(model = %model, error = %e, "Completion failed");
                return Err(ChatError::Completion(e));
            }
        };

        let mut reply = ChatMessage::new(chat_id, TurnRole::Assistant, response.content);
        reply.model = Some(model.clone());
        self.chats.save_message(&reply).await?;
        self.context.record_turn(&mut conversation, reply.to_turn());

        if let Err(e) = self.profiles.record_model_usage(user_id, &model).await {
            warn!(error = %e, "Failed to record model usage");
        }
        if let Err(e) = self.profiles.record_message_sent(user_id).await {
            warn!(error = %e, "Failed to bump daily message counter");
        }
        if let Err(e) = self.chats.touch_chat(&chat_id).await {
            warn!(error = %e, "Failed to touch chat");
        }

        let compacted = conversation.covers_up_to() > covered_before;
        info!(
            model = %model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            compacted,
            "Turn completed"
        );

        Ok(DialogReply {
            message: reply,
            usage: response.usage,
            compacted,
        })
    }

    /// Switch the chat's model, compacting its history for the new model.
    pub async fn switch_model(
        &self,
        user_id: Uuid,
        chat_id: Uuid,
        model: &str,
    ) -> Result<CompactionOutcome, ChatError> {
        let mut conversation = self.lease(user_id, chat_id).await?;
        Ok(self.context.on_model_changed(&mut conversation, model).await)
    }

    /// Current model of the chat's conversation.
    pub async fn current_model(&self, user_id: Uuid, chat_id: Uuid) -> Result<String, ChatError> {
        let conversation = self.lease(user_id, chat_id).await?;
        Ok(conversation.model().to_string())
    }

    /// The digest currently standing in for older turns, if any.
    pub async fn digest(&self, user_id: Uuid, chat_id: Uuid) -> Result<Option<Digest>, ChatError> {
        let conversation = self.lease(user_id, chat_id).await?;
        Ok(conversation.digest().cloned())
    }

    /// Delete a chat and drop its cached conversation.
    pub async fn delete_chat(&self, user_id: Uuid, chat_id: Uuid) -> Result<(), ChatError> {
        let _lease = self.lease(user_id, chat_id).await?;
        self.chats.delete_chat(user_id, chat_id).await?;
        self.registry.remove(&chat_id);
        Ok(())
    }
}

/// Drops a conversation from the registry unless disarmed, so the next lease
/// reloads it from storage.
struct EvictOnDrop<'a> {
    registry: &'a ConversationRegistry,
    chat_id: Uuid,
    armed: bool,
}

impl<'a> EvictOnDrop<'a> {
    fn arm(registry: &'a ConversationRegistry, chat_id: Uuid) -> Self {
        Self {
            registry,
            chat_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for EvictOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed && self.registry.remove(&self.chat_id) {
            debug!(chat_id = %self.chat_id, "Cached conversation evicted; reloading on next turn");
        }
    }
}
