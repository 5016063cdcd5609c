//! UI-agnostic conversation and upload state
//!
//! These types hold everything a front end renders. They are owned by a
//! [`crate::Session`] and only mutated through the coordinators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// First turn of every conversation.
pub const GREETING: &str = "Hello! I am your Corporate Policy Assistant. How can I help you today?";

/// Assistant turn appended when a question could not be answered.
pub const FALLBACK_ANSWER: &str = "Sorry, I encountered an error.";

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: ChatRole,
    content: String,
}

impl ChatMessage {
    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Append-only, ordered record of the conversation.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
}

impl MessageLog {
    /// A log holding a single assistant greeting.
    pub fn seeded(greeting: &str) -> Self {
        let mut log = Self::default();
        log.append(ChatRole::Assistant, greeting);
        log
    }

    /// Append a turn at the end of the log.
    ///
    /// User turns whose content is empty after trimming are dropped and
    /// `false` is returned. Assistant turns are always accepted.
    pub fn append(&mut self, role: ChatRole, content: impl Into<String>) -> bool {
        let content = content.into();
        if role == ChatRole::User && content.trim().is_empty() {
            return false;
        }
        self.messages.push(ChatMessage { role, content });
        true
    }

    pub fn snapshot(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    pub(crate) log: MessageLog,
    pub(crate) pending_query: String,
    pub(crate) awaiting_answer: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            log: MessageLog::seeded(GREETING),
            pending_query: String::new(),
            awaiting_answer: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.log.snapshot()
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Text currently being composed
    pub fn pending_query(&self) -> &str {
        &self.pending_query
    }

    pub fn is_awaiting_answer(&self) -> bool {
        self.awaiting_answer
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the most recent upload stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Ingested(String),
    Failed,
}

impl UploadStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, UploadStatus::Uploading)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStatus::Idle => Ok(()),
            UploadStatus::Uploading => f.write_str("uploading"),
            UploadStatus::Ingested(name) => write!(f, "ingested: {}", name),
            UploadStatus::Failed => f.write_str("failed"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadState {
    pub(crate) status: UploadStatus,
    pub(crate) ingested: Vec<String>,
}

impl UploadState {
    pub fn status(&self) -> &UploadStatus {
        &self.status
    }

    pub fn status_text(&self) -> String {
        self.status.to_string()
    }

    /// Names of documents ingested successfully this session, oldest first
    pub fn ingested(&self) -> &[String] {
        &self.ingested
    }
}
