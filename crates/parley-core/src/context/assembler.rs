//! Builds the outbound message list from a conversation.

use parley_types::context::{ContextEntry, ContextRequest, EntrySource};
use parley_types::llm::MessageRole;

use super::conversation::Conversation;

/// Wraps the digest text in the synthetic leading entry.
pub fn digest_entry_content(digest_text: &str) -> String {
    format!("Context of previous dialog: {digest_text}")
}

/// Assemble the request for the next model call.
///
/// Without a digest every turn is sent. With one, a single digest entry
/// replaces the covered prefix and the remaining turns follow verbatim.
/// Pure: the same conversation always yields the same request.
pub fn assemble(conversation: &Conversation) -> ContextRequest {
    let start = conversation.covers_up_to();
    let mut entries = Vec::with_capacity(conversation.turns().len() - start + 1);

    if let Some(digest) = conversation.digest() {
        entries.push(ContextEntry {
            role: MessageRole::User,
            content: digest_entry_content(&digest.text),
            source: EntrySource::Digest,
        });
    }

    entries.extend(
        conversation.turns()[start..]
            .iter()
            .enumerate()
            .map(|(offset, turn)| ContextEntry {
                role: turn.role.into(),
                content: turn.content.clone(),
                source: EntrySource::Turn(start + offset),
            }),
    );

    ContextRequest { entries }
}
