mod file;
mod memory;

pub use file::FileHistoryBackend;
pub use memory::MemoryHistoryBackend;

use async_trait::async_trait;
use chrono::Utc;
use log::{ info, warn };
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::cli::Args;
use crate::models::chat::{ ChatMessage, Conversation };

/// Durable storage for the historical mapping. Writes are full-snapshot
/// rewrites; there is no incremental append and a single writer is assumed.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Read the snapshot taken at the last persist. A missing or corrupt
    /// snapshot is recoverable and loads as an empty history.
    async fn load(&self) -> Result<Vec<Conversation>, Box<dyn StdError + Send + Sync>>;

    async fn persist(
        &self,
        conversations: &[Conversation]
    ) -> Result<(), Box<dyn StdError + Send + Sync>>;
}

pub fn create_history_backend(
    args: &Args
) -> Result<Arc<dyn HistoryBackend>, Box<dyn StdError + Send + Sync>> {
    match args.history_type.to_lowercase().as_str() {
        "file" => Ok(Arc::new(FileHistoryBackend::new(args.history_path.clone().into()))),
        "memory" => Ok(Arc::new(MemoryHistoryBackend)),
        other =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported history store type: {}", other)
                    )
                )
            ),
    }
}

pub fn initialize_history_backend(
    args: &Args
) -> Result<Arc<dyn HistoryBackend>, Box<dyn StdError + Send + Sync>> {
    info!("Chat history will be stored in: {}", args.history_type);
    create_history_backend(args)
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a past conversation is open for review; start a new chat to continue")]
    ReadOnly,
    #[error("unknown conversation id: {0}")]
    UnknownConversation(String),
}

/// Session state for the chat: the active message list, the archived
/// conversations, and an optional read-only selection of a past one.
///
/// Initialized once per session from the backend snapshot and owned by the
/// agent; every mutation of the archive persists a full snapshot.
pub struct ConversationStore {
    backend: Arc<dyn HistoryBackend>,
    active: Vec<ChatMessage>,
    archive: Vec<Conversation>,
    selected: Option<String>,
}

impl ConversationStore {
    pub async fn open(backend: Arc<dyn HistoryBackend>) -> Self {
        let archive = match backend.load().await {
            Ok(conversations) => conversations,
            Err(e) => {
                warn!("failed to load chat history, starting empty: {}", e);
                Vec::new()
            }
        };
        Self { backend, active: Vec::new(), archive, selected: None }
    }

    /// Append to the active conversation. Rejected while a past conversation
    /// is selected for review.
    pub fn append(&mut self, message: ChatMessage) -> Result<(), StoreError> {
        if self.selected.is_some() {
            return Err(StoreError::ReadOnly);
        }
        self.active.push(message);
        Ok(())
    }

    /// Archive the active conversation (if non-empty) under a fresh id
    /// stamped with the current time, persist the snapshot, and reset.
    /// Always clears the review selection. Returns whether an entry was
    /// archived.
    pub async fn start_new(&mut self) -> Result<bool, Box<dyn StdError + Send + Sync>> {
        self.selected = None;
        if self.active.is_empty() {
            return Ok(false);
        }
        let conversation = Conversation {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp(),
            messages: std::mem::take(&mut self.active),
        };
        self.archive.push(conversation);
        self.backend.persist(&self.archive).await?;
        Ok(true)
    }

    /// Open a past conversation for read-only review. New input is rejected
    /// until `resume` or `start_new`.
    pub fn select(&mut self, id: &str) -> Result<&Conversation, StoreError> {
        let index = self.archive
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StoreError::UnknownConversation(id.to_string()))?;
        self.selected = Some(id.to_string());
        Ok(&self.archive[index])
    }

    /// Return to the live conversation.
    pub fn resume(&mut self) {
        self.selected = None;
    }

    /// Drop every archived conversation and persist the empty snapshot.
    pub async fn clear_all(&mut self) -> Result<(), Box<dyn StdError + Send + Sync>> {
        self.archive.clear();
        self.selected = None;
        self.backend.persist(&self.archive).await
    }

    /// The messages currently on display: the selected past conversation if
    /// one is open for review, otherwise the active list.
    pub fn messages(&self) -> &[ChatMessage] {
        match &self.selected {
            Some(id) =>
                self.archive
                    .iter()
                    .find(|c| c.id == *id)
                    .map(|c| c.messages.as_slice())
                    .unwrap_or(&[]),
            None => self.active.as_slice(),
        }
    }

    /// The active conversation, used as the context payload for the API.
    pub fn active_messages(&self) -> &[ChatMessage] {
        &self.active
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.archive
    }

    pub fn is_reviewing(&self) -> bool {
        self.selected.is_some()
    }
}

pub fn format_transcript(messages: &[ChatMessage]) -> String {
    let mut result = String::new();
    for msg in messages {
        result.push_str(&format!("{}: {}\n", msg.role.display_name(), msg.content));
    }
    result
}
