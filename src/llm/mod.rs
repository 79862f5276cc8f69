pub mod chat;
pub mod sse;

use std::time::Duration;

/// Settings for the chat completion client.
#[derive(Clone, Debug)]
pub struct LlmConfig {
    /// Bearer token for the API. `None` (or empty) is not a startup error:
    /// the client reports it as an inline diagnostic on first use.
    pub api_key: Option<String>,
    pub model: String,
    /// Full URL of the chat completion endpoint.
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Cap on the whole request, streamed body included. `None` disables it.
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}
