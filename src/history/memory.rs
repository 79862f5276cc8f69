use async_trait::async_trait;
use std::error::Error as StdError;

use super::HistoryBackend;
use crate::models::chat::Conversation;

/// Session-only variant: nothing survives past the process. Archiving and
/// review still work within the session; persist is a no-op.
pub struct MemoryHistoryBackend;

#[async_trait]
impl HistoryBackend for MemoryHistoryBackend {
    async fn load(&self) -> Result<Vec<Conversation>, Box<dyn StdError + Send + Sync>> {
        Ok(Vec::new())
    }

    async fn persist(
        &self,
        _conversations: &[Conversation]
    ) -> Result<(), Box<dyn StdError + Send + Sync>> {
        Ok(())
    }
}
