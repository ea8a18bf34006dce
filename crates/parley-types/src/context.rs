//! Conversation context types.
//!
//! A conversation is an append-only list of [`Turn`]s plus an optional
//! [`Digest`] compressing a prefix of them. A [`ContextRequest`] is the
//! ephemeral message list built from both for one outbound model call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ContextError;
use crate::llm::{Message, MessageRole};

/// Who authored a turn. System prompts are never stored as turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TurnRole::User),
            "assistant" => Ok(TurnRole::Assistant),
            other => Err(format!("invalid turn role: '{other}'")),
        }
    }
}

impl From<TurnRole> for MessageRole {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => MessageRole::User,
            TurnRole::Assistant => MessageRole::Assistant,
        }
    }
}

/// One message in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }
}

/// Compressed text covering every turn strictly before `covers_up_to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    pub text: String,
    pub covers_up_to: usize,
}

/// Where a [`ContextEntry`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum EntrySource {
    Digest,
    Turn(usize),
}

/// A single entry of an outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub role: MessageRole,
    pub content: String,
    pub source: EntrySource,
}

/// The ordered message list sent to the model for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRequest {
    pub entries: Vec<ContextEntry>,
}

impl ContextRequest {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_digest(&self) -> bool {
        self.entries
            .first()
            .is_some_and(|e| e.source == EntrySource::Digest)
    }

    /// Indices of the turns carried verbatim, in order.
    pub fn turn_indices(&self) -> Vec<usize> {
        self.entries
            .iter()
            .filter_map(|e| match e.source {
                EntrySource::Turn(i) => Some(i),
                EntrySource::Digest => None,
            })
            .collect()
    }

    /// Fails when no verbatim user turn would reach the model.
    pub fn ensure_live_user_turn(&self) -> Result<(), ContextError> {
        let has_user_turn = self
            .entries
            .iter()
            .any(|e| matches!(e.source, EntrySource::Turn(_)) && e.role == MessageRole::User);
        if has_user_turn {
            Ok(())
        } else {
            Err(ContextError::InvalidState(
                "request carries no live user turn".to_string(),
            ))
        }
    }

    pub fn to_messages(&self) -> Vec<Message> {
        self.entries
            .iter()
            .map(|e| Message::new(e.role, e.content.clone()))
            .collect()
    }
}
