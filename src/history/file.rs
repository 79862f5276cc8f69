use async_trait::async_trait;
use log::warn;
use std::error::Error as StdError;
use std::path::PathBuf;
use tokio::fs;

use super::HistoryBackend;
use crate::models::chat::Conversation;

/// Stores the historical mapping as a JSON array at a fixed path, rewritten
/// whole on every persist.
pub struct FileHistoryBackend {
    path: PathBuf,
}

impl FileHistoryBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl HistoryBackend for FileHistoryBackend {
    async fn load(&self) -> Result<Vec<Conversation>, Box<dyn StdError + Send + Sync>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Box::new(e)),
        };
        match serde_json::from_slice(&bytes) {
            Ok(conversations) => Ok(conversations),
            Err(e) => {
                warn!(
                    "history file {} is not valid JSON, starting empty: {}",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    async fn persist(
        &self,
        conversations: &[Conversation]
    ) -> Result<(), Box<dyn StdError + Send + Sync>> {
        let json = serde_json::to_vec_pretty(conversations)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }
}
