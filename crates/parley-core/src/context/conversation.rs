//! In-memory conversation state owned by the context manager.

use parley_types::context::{Digest, Turn};
use parley_types::error::ContextError;
use serde::Serialize;
use uuid::Uuid;

/// Compaction lifecycle of a conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    #[default]
    Idle,
    Compacting,
    /// A fresh digest was installed and no turn has been recorded since.
    Ready,
}

/// Turns of one conversation plus the digest covering a prefix of them.
///
/// Only `ContextManager` mutates a conversation; everyone else reads it
/// through the accessors.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub(crate) id: Uuid,
    pub(crate) model: String,
    pub(crate) turns: Vec<Turn>,
    pub(crate) digest: Option<Digest>,
    pub(crate) state: ConversationState,
    pub(crate) compaction_requested: bool,
}

impl Conversation {
    pub fn new(id: Uuid, model: impl Into<String>) -> Self {
        Self {
            id,
            model: model.into(),
            turns: Vec::new(),
            digest: None,
            state: ConversationState::Idle,
            compaction_requested: false,
        }
    }

    /// Rebuild a conversation from persisted turns and digest.
    ///
    /// Fails when the digest claims to cover turns that do not exist.
    pub fn restore(
        id: Uuid,
        model: impl Into<String>,
        turns: Vec<Turn>,
        digest: Option<Digest>,
    ) -> Result<Self, ContextError> {
        if let Some(d) = &digest {
            if d.covers_up_to > turns.len() {
                return Err(ContextError::InvalidState(format!(
                    "digest covers {} turns but conversation {id} has {}",
                    d.covers_up_to,
                    turns.len()
                )));
            }
        }
        Ok(Self {
            id,
            model: model.into(),
            turns,
            digest,
            state: ConversationState::Idle,
            compaction_requested: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn digest(&self) -> Option<&Digest> {
        self.digest.as_ref()
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    /// Whether a model switch is still waiting for its compaction.
    pub fn compaction_requested(&self) -> bool {
        self.compaction_requested
    }

    /// Index of the first turn not covered by the digest.
    pub fn covers_up_to(&self) -> usize {
        self.digest.as_ref().map_or(0, |d| d.covers_up_to)
    }

    /// Turns that are sent verbatim.
    pub fn live_turns(&self) -> &[Turn] {
        &self.turns[self.covers_up_to()..]
    }
}
