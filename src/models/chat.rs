use chrono::{ Local, TimeZone };
use serde::{ Serialize, Deserialize };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A completed exchange archived in the history snapshot. Messages are
/// append-only while the conversation is active and frozen once archived.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub timestamp: i64,
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Human-readable label for listing past conversations.
    pub fn label(&self) -> String {
        match Local.timestamp_opt(self.timestamp, 0).single() {
            Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
            None => self.id.clone(),
        }
    }
}

/// One increment of a streamed assistant response.
///
/// Diagnostics are delivered in-band so the caller can surface them inline
/// without tearing down the rest of the stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Fragment {
    Content(String),
    Diagnostic(String),
}

impl Fragment {
    pub fn as_text(&self) -> &str {
        match self {
            Fragment::Content(text) => text,
            Fragment::Diagnostic(text) => text,
        }
    }
}
