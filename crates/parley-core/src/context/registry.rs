//! Per-conversation locking.
//!
//! Each live conversation sits behind its own async mutex. Requests acquire
//! it with `try_acquire`, so a second request for a conversation that is
//! already in flight is rejected with `ContextError::Busy` instead of queuing.
//! Different conversations never contend.

use std::sync::Arc;

use dashmap::DashMap;
use parley_types::error::ContextError;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::conversation::Conversation;

pub type ConversationHandle = Arc<Mutex<Conversation>>;

/// Exclusive access to one conversation for the duration of a request.
pub type ConversationLease = OwnedMutexGuard<Conversation>;

#[derive(Debug, Default)]
pub struct ConversationRegistry {
    conversations: DashMap<Uuid, ConversationHandle>,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.conversations.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Register a conversation unless one with the same id is already
    /// present, in which case the existing handle wins.
    pub fn insert_if_absent(&self, conversation: Conversation) -> ConversationHandle {
        let id = conversation.id();
        Arc::clone(
            self.conversations
                .entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(conversation)))
                .value(),
        )
    }

    /// Lock the conversation, creating it with `create` when unknown.
    pub fn try_acquire_or_insert_with(
        &self,
        id: Uuid,
        create: impl FnOnce() -> Conversation,
    ) -> Result<ConversationLease, ContextError> {
        let handle = Arc::clone(
            self.conversations
                .entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(create())))
                .value(),
        );
        handle.try_lock_owned().map_err(|_| ContextError::Busy(id))
    }

    /// Lock a registered conversation without waiting.
    pub fn try_acquire(&self, id: &Uuid) -> Result<Option<ConversationLease>, ContextError> {
        // Clone the handle out so the shard guard is released before locking.
        let Some(handle) = self.conversations.get(id).map(|h| Arc::clone(h.value())) else {
            return Ok(None);
        };
        handle
            .try_lock_owned()
            .map(Some)
            .map_err(|_| ContextError::Busy(*id))
    }

    /// Forget a conversation. An in-flight lease keeps its copy alive until
    /// released.
    pub fn remove(&self, id: &Uuid) -> bool {
        self.conversations.remove(id).is_some()
    }
}
