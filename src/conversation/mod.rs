//! Conversation store: pure helpers over the append-only message log.


use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::document::{Citation, Conversation, Message, Role};

/// A message projected for use as language-model context: citations excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Start a new, empty conversation scoped to a document.
#[inline]
pub fn new_conversation(pdf_filename: &str) -> Conversation {
    let now = Utc::now();
    Conversation {
        id: Uuid::new_v4(),
        pdf_filename: pdf_filename.to_string(),
        messages: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

/// Append a message with the current timestamp, bumping the conversation's
/// updated timestamp.
#[inline]
pub fn add_message(
    conversation: &mut Conversation,
    role: Role,
    content: &str,
    citations: Vec<Citation>,
) {
    let now = Utc::now();
    conversation.messages.push(Message {
        role,
        content: content.to_string(),
        timestamp: now,
        citations,
    });
    conversation.updated_at = now;
}

/// Ordered view of the conversation for model context.
#[inline]
pub fn history_view(conversation: &Conversation) -> Vec<HistoryEntry> {
    conversation
        .messages
        .iter()
        .map(|message| HistoryEntry {
            role: message.role,
            content: message.content.clone(),
            timestamp: message.timestamp,
        })
        .collect()
}
