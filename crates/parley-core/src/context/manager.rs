//! Context manager: decides when to compact a conversation and builds the
//! request for each model call.
//!
//! Compaction runs in two situations: the live part of the history grows
//! past the configured threshold, or the user switched models. A failed or
//! timed-out summarization never surfaces to the user; the conversation keeps
//! working from raw history and the next turn retries.
//!
//! Operations take `&mut Conversation`, so at most one runs per conversation.
//! If an operation's future is dropped mid-flight, the conversation is rolled
//! back to its state before the call.

use std::time::Duration;

use parley_types::config::ContextConfig;
use parley_types::context::{ContextRequest, Digest, Turn, TurnRole};
use parley_types::error::ContextError;
use tracing::{debug, info, warn};

use super::assembler::assemble;
use super::conversation::{Conversation, ConversationState};
use super::estimator::SizeEstimator;
use super::store::SummaryStore;
use super::summarizer::Summarizer;

/// Tunables for [`ContextManager`].
#[derive(Debug, Clone)]
pub struct ContextManagerConfig {
    /// Live-history size above which the history is compacted.
    pub threshold: usize,
    /// Most recent turns left verbatim by a threshold compaction. At least 1.
    pub keep_recent: usize,
    pub estimator: SizeEstimator,
    pub summarize_timeout: Duration,
}

impl From<&ContextConfig> for ContextManagerConfig {
    fn from(config: &ContextConfig) -> Self {
        Self {
            threshold: config.threshold,
            keep_recent: config.keep_recent,
            estimator: config.estimator.into(),
            summarize_timeout: Duration::from_secs(config.summarize_timeout_secs),
        }
    }
}

impl Default for ContextManagerConfig {
    fn default() -> Self {
        Self::from(&ContextConfig::default())
    }
}

/// Result of a compaction attempt.
#[derive(Debug)]
pub enum CompactionOutcome {
    /// Nothing new to fold into the digest.
    Skipped,
    Compacted {
        covers_up_to: usize,
        /// False when the store rejected the digest; it is still used in memory.
        persisted: bool,
    },
    Failed(ContextError),
}

impl CompactionOutcome {
    pub fn is_compacted(&self) -> bool {
        matches!(self, CompactionOutcome::Compacted { .. })
    }
}

/// Restores a conversation to how it looked when the snapshot was taken,
/// unless released. The digest is only ever replaced as the final step of a
/// successful compaction, after which the snapshot is released.
struct Snapshot<'a> {
    conversation: &'a mut Conversation,
    turn_count: usize,
    state: ConversationState,
    model: String,
    compaction_requested: bool,
    armed: bool,
}

impl<'a> Snapshot<'a> {
    fn take(conversation: &'a mut Conversation) -> Self {
        Self {
            turn_count: conversation.turns.len(),
            state: conversation.state,
            model: conversation.model.clone(),
            compaction_requested: conversation.compaction_requested,
            armed: true,
            conversation,
        }
    }

    fn conversation(&mut self) -> &mut Conversation {
        &mut *self.conversation
    }

    fn release(mut self) {
        self.armed = false;
    }
}

impl Drop for Snapshot<'_> {
    fn drop(&mut self) {
        if self.armed {
            let conv = &mut *self.conversation;
            conv.turns.truncate(self.turn_count);
            conv.state = self.state;
            conv.model = std::mem::take(&mut self.model);
            conv.compaction_requested = self.compaction_requested;
            debug!(conversation_id = %conv.id, "Context operation abandoned; state rolled back");
        }
    }
}

/// Owns the compaction policy for conversations.
///
/// Generic over the `Summarizer` and `SummaryStore` so tests can inject
/// failing or slow implementations.
pub struct ContextManager<S: Summarizer, St: SummaryStore> {
    summarizer: S,
    store: St,
    config: ContextManagerConfig,
}

impl<S: Summarizer, St: SummaryStore> ContextManager<S, St> {
    pub fn new(summarizer: S, store: St, mut config: ContextManagerConfig) -> Self {
        config.keep_recent = config.keep_recent.max(1);
        Self {
            summarizer,
            store,
            config,
        }
    }

    pub fn config(&self) -> &ContextManagerConfig {
        &self.config
    }

    pub fn summarizer(&self) -> &S {
        &self.summarizer
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    /// Append the user's pending turn, compact if needed, and assemble the
    /// request for the next model call.
    #[tracing::instrument(
        name = "context_for_next_turn",
        skip(self, conversation, pending),
        fields(conversation_id = %conversation.id, turn_count = conversation.turns.len())
    )]
    pub async fn get_context_for_next_turn(
        &self,
        conversation: &mut Conversation,
        pending: Turn,
    ) -> Result<ContextRequest, ContextError> {
        if pending.role != TurnRole::User {
            return Err(ContextError::InvalidState(
                "pending turn must be a user turn".to_string(),
            ));
        }
        if conversation.state == ConversationState::Compacting {
            return Err(ContextError::InvalidState(format!(
                "conversation {} is already compacting",
                conversation.id
            )));
        }

        let mut snapshot = Snapshot::take(conversation);
        let conv = snapshot.conversation();
        conv.turns.push(pending);
        if conv.state == ConversationState::Ready {
            conv.state = ConversationState::Idle;
        }

        if let Some(boundary) = self.due_boundary(conv) {
            let outcome = self.compact(conv, boundary).await;
            debug!(?outcome, "Compaction attempted before turn");
        }

        let request = assemble(snapshot.conversation());
        snapshot.release();
        Ok(request)
    }

    /// Append a completed turn (usually the assistant reply). Never compacts.
    pub fn record_turn(&self, conversation: &mut Conversation, turn: Turn) {
        conversation.turns.push(turn);
        if conversation.state == ConversationState::Ready {
            conversation.state = ConversationState::Idle;
        }
    }

    /// Switch the conversation's model and fold every recorded turn into the
    /// digest so the new model starts from a compact history.
    ///
    /// If compaction fails the request stays pending and the next
    /// `get_context_for_next_turn` retries it.
    #[tracing::instrument(
        name = "model_changed",
        skip(self, conversation),
        fields(conversation_id = %conversation.id, from = %conversation.model)
    )]
    pub async fn on_model_changed(
        &self,
        conversation: &mut Conversation,
        new_model: &str,
    ) -> CompactionOutcome {
        if conversation.model == new_model {
            return CompactionOutcome::Skipped;
        }
        if conversation.state == ConversationState::Compacting {
            return CompactionOutcome::Failed(ContextError::InvalidState(format!(
                "conversation {} is already compacting",
                conversation.id
            )));
        }

        let mut snapshot = Snapshot::take(conversation);
        let conv = snapshot.conversation();
        conv.model = new_model.to_string();
        conv.compaction_requested = true;
        let boundary = conv.turns.len();
        let outcome = self.compact(conv, boundary).await;
        snapshot.release();
        outcome
    }

    /// Boundary to compact to before the next turn, if any trigger fired.
    fn due_boundary(&self, conversation: &Conversation) -> Option<usize> {
        let len = conversation.turns.len();
        if conversation.compaction_requested {
            // Everything except the pending user turn.
            return Some(len.saturating_sub(1));
        }
        let live_size = self.config.estimator.estimate(conversation.live_turns());
        if live_size > self.config.threshold {
            Some(len.saturating_sub(self.config.keep_recent))
        } else {
            None
        }
    }

    async fn compact(&self, conversation: &mut Conversation, boundary: usize) -> CompactionOutcome {
        let id = conversation.id;
        if boundary <= conversation.covers_up_to() {
            conversation.compaction_requested = false;
            return CompactionOutcome::Skipped;
        }

        let previous = conversation.state;
        conversation.state = ConversationState::Compacting;

        let timeout = self.config.summarize_timeout;
        let summarized = tokio::time::timeout(
            timeout,
            self.summarizer.summarize(&conversation.turns[..boundary]),
        )
        .await;

        let text = match summarized {
            Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(Ok(_)) => {
                return fail(
                    conversation,
                    previous,
                    ContextError::TransientGateway("summarizer returned empty text".to_string()),
                );
            }
            Ok(Err(e)) => return fail(conversation, previous, e),
            Err(_) => {
                return fail(
                    conversation,
                    previous,
                    ContextError::TransientGateway(format!(
                        "summarizer timed out after {}s",
                        timeout.as_secs_f32()
                    )),
                );
            }
        };

        let digest = Digest {
            text,
            covers_up_to: boundary,
        };
        let persisted = match self.store.save(&id, &digest).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    conversation_id = %id,
                    error = %ContextError::from(e),
                    "Failed to persist digest; keeping it in memory"
                );
                false
            }
        };

        conversation.digest = Some(digest);
        conversation.compaction_requested = false;
        conversation.state = ConversationState::Ready;
        info!(conversation_id = %id, covers_up_to = boundary, persisted, "Conversation compacted");

        CompactionOutcome::Compacted {
            covers_up_to: boundary,
            persisted,
        }
    }
}

fn fail(
    conversation: &mut Conversation,
    previous: ConversationState,
    error: ContextError,
) -> CompactionOutcome {
    conversation.state = previous;
    warn!(
        conversation_id = %conversation.id,
        error = %error,
        "Compaction failed; continuing with raw history"
    );
    CompactionOutcome::Failed(error)
}
