use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// API key for the DeepSeek chat completion API. Leaving it unset is not
    /// fatal; the assistant reports it inline when a prompt is sent.
    #[arg(long, env = "DEEPSEEK_API_KEY", default_value = "")]
    pub api_key: String,

    /// Model name for chat completion.
    #[arg(long, env = "CHAT_MODEL", default_value = "deepseek-chat")]
    pub chat_model: String,

    /// Full URL of the chat completion endpoint.
    #[arg(long, env = "CHAT_BASE_URL", default_value = "https://api.deepseek.com/v1/chat/completions")]
    pub chat_base_url: String,

    /// Maximum tokens to generate per response.
    #[arg(long, env = "MAX_TOKENS", default_value = "1000")]
    pub max_tokens: u32,

    /// Sampling temperature.
    #[arg(long, env = "TEMPERATURE", default_value = "0.7")]
    pub temperature: f32,

    // --- History Store Args ---
    /// History store type (file, memory). "memory" keeps conversations for
    /// the session only.
    #[arg(long, env = "HISTORY_TYPE", default_value = "file")]
    pub history_type: String,

    /// Path of the JSON history snapshot (file store only).
    #[arg(long, env = "HISTORY_PATH", default_value = "chat_history.json")]
    pub history_path: String,

    // --- Network Args ---
    /// Cap in seconds on a whole exchange, streamed body included. 0 disables it.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "300")]
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds. 0 disables it.
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value = "10")]
    pub connect_timeout_secs: u64,
}
