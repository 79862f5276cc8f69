use log::info;
use std::error::Error;
use std::time::Duration;

use crate::cli::Args;
use crate::history::{ initialize_history_backend, ConversationStore, StoreError };
use crate::llm::LlmConfig;
use crate::llm::chat::{ DeepSeekChatClient, FragmentStream };
use crate::models::chat::ChatMessage;

/// Ties the chat client to the conversation store and drives one exchange
/// at a time: `send` opens the stream, the caller accumulates fragments,
/// `commit` records the assistant's reply.
pub struct ChatAgent {
    chat_client: DeepSeekChatClient,
    store: ConversationStore,
}

impl ChatAgent {
    pub async fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let config = LlmConfig {
            api_key: Some(args.api_key.clone()).filter(|key| !key.is_empty()),
            model: args.chat_model.clone(),
            base_url: args.chat_base_url.clone(),
            max_tokens: args.max_tokens,
            temperature: args.temperature,
            request_timeout: timeout_from_secs(args.request_timeout_secs),
            connect_timeout: timeout_from_secs(args.connect_timeout_secs),
        };
        let chat_client = DeepSeekChatClient::from_config(&config)?;
        info!("Chat client configured: Model={}, BaseURL={}", config.model, config.base_url);

        let backend = initialize_history_backend(args)?;
        let store = ConversationStore::open(backend).await;
        info!("Loaded {} past conversation(s)", store.conversations().len());

        Ok(Self { chat_client, store })
    }

    /// Append the user prompt and open the streaming response, with the full
    /// active conversation as API context.
    pub fn send(&mut self, prompt: &str) -> Result<FragmentStream, StoreError> {
        self.store.append(ChatMessage::user(prompt))?;
        Ok(self.chat_client.stream_chat(self.store.active_messages()))
    }

    /// Record the accumulated assistant response at the end of an exchange.
    pub fn commit(&mut self, response: String) -> Result<(), StoreError> {
        self.store.append(ChatMessage::assistant(response))
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConversationStore {
        &mut self.store
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
