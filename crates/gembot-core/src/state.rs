//! UI-agnostic conversation state
//!
//! The message log and the in-progress question. Nothing here talks to the
//! network; the controller is the only writer.

use serde::{Deserialize, Serialize};

/// Number of whitespace-separated words kept in a history preview
pub const PREVIEW_WORDS: usize = 5;

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Bot,
}

/// One turn in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    display_text: String,
    is_formatted: bool,
    full_text: Option<String>,
}

impl Message {
    /// A user question. The display text is the preview; `full_text` keeps the original.
    pub fn user(full_text: &str) -> Self {
        Self {
            role: Role::User,
            display_text: preview(full_text),
            is_formatted: false,
            full_text: Some(full_text.to_string()),
        }
    }

    /// A bot answer that already went through the formatting pipeline
    pub fn bot_formatted(markup: String) -> Self {
        Self {
            role: Role::Bot,
            display_text: markup,
            is_formatted: true,
            full_text: None,
        }
    }

    /// A bot message shown as plain text
    pub fn bot_plain(text: &str) -> Self {
        Self {
            role: Role::Bot,
            display_text: text.to_string(),
            is_formatted: false,
            full_text: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub fn is_formatted(&self) -> bool {
        self.is_formatted
    }

    pub fn full_text(&self) -> Option<&str> {
        self.full_text.as_deref()
    }
}

/// A user question as listed in the history sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry<'a> {
    /// Position of the message in the conversation
    pub index: usize,
    pub preview: &'a str,
    pub full_text: &'a str,
}

/// Shorten a question to its first few words for the history sidebar.
///
/// Questions with more than [`PREVIEW_WORDS`] words are cut and get a
/// trailing `"..."`. Shorter questions are returned unchanged.
pub fn preview(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > PREVIEW_WORDS {
        format!("{}...", words[..PREVIEW_WORDS].join(" "))
    } else {
        text.to_string()
    }
}

/// Session-scoped conversation: append-only messages plus the pending question
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    pending_question: String,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn pending_question(&self) -> &str {
        &self.pending_question
    }

    pub(crate) fn set_pending_question(&mut self, text: &str) {
        self.pending_question = text.to_string();
    }

    pub(crate) fn clear_pending_question(&mut self) {
        self.pending_question.clear();
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// User questions in the order they were asked
    pub fn history(&self) -> impl Iterator<Item = HistoryEntry<'_>> {
        self.messages
            .iter()
            .enumerate()
            .filter(|(_, msg)| msg.role == Role::User)
            .filter_map(|(index, msg)| {
                msg.full_text.as_deref().map(|full_text| HistoryEntry {
                    index,
                    preview: &msg.display_text,
                    full_text,
                })
            })
    }
}
