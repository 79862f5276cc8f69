use futures::{ Stream, StreamExt };
use log::debug;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::LlmConfig;
use super::sse::{ decode_frame, FrameEvent, LineBuffer };
use crate::models::chat::{ ChatMessage, Fragment };

/// A lazy, finite, non-restartable sequence of response fragments.
/// Dropping it cancels the exchange: the transfer task sees the closed
/// channel on its next send and stops reading the socket.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Fragment> + Send>>;

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize, Default)]
struct ApiErrorResponse {
    #[serde(default)]
    error: ApiErrorBody,
}

#[derive(Deserialize, Default)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

pub struct DeepSeekChatClient {
    http: HttpClient,
    api_key: Option<String>,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
}

impl DeepSeekChatClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = HttpClient::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Open a streaming exchange using `messages` as the full context.
    ///
    /// Failure is always reported in-band: a missing credential, a non-success
    /// status, or a connection fault each yield exactly one diagnostic
    /// fragment and end the sequence. A malformed frame yields a diagnostic
    /// and streaming continues, so partial output is preserved.
    pub fn stream_chat(&self, messages: &[ChatMessage]) -> FragmentStream {
        let api_key = match &self.api_key {
            Some(key) => key.clone(),
            None => {
                return single_diagnostic(
                    "API key missing. Please set DEEPSEEK_API_KEY in environment variables."
                );
            }
        };

        let req = ChatRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            stream: true,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let url = self.base_url.clone();
        let client = self.http.clone();
        let auth_header = format!("Bearer {}", api_key);
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let resp = match client.post(&url)
                .header(AUTHORIZATION, auth_header)
                .json(&req)
                .send()
                .await {
                    Ok(r) => r,
                    Err(e) => {
                        let _ = tx.send(Fragment::Diagnostic(format!("Connection error: {}", e))).await;
                        return;
                    }
                };

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorResponse>(&body)
                    .ok()
                    .map(|parsed| parsed.error.message)
                    .filter(|msg| !msg.is_empty())
                    .unwrap_or(body);
                let _ = tx.send(
                    Fragment::Diagnostic(format!("API error ({}): {}", status.as_u16(), message))
                ).await;
                return;
            }

            let mut lines = LineBuffer::new();
            let mut stream = resp.bytes_stream();

            while let Some(chunk_result) = stream.next().await {
                let chunk = match chunk_result {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(Fragment::Diagnostic(format!("Connection error: {}", e))).await;
                        return;
                    }
                };
                for line in lines.push(&chunk) {
                    if forward_frame(&tx, &line).await.is_break() {
                        return;
                    }
                }
            }

            // The server should end with [DONE]; an unterminated trailing
            // line still gets decoded rather than silently dropped.
            if let Some(line) = lines.flush() {
                let _ = forward_frame(&tx, &line).await;
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }
}

async fn forward_frame(
    tx: &mpsc::Sender<Fragment>,
    line: &str
) -> std::ops::ControlFlow<()> {
    use std::ops::ControlFlow;

    let fragment = match decode_frame(line) {
        FrameEvent::Ignored => return ControlFlow::Continue(()),
        FrameEvent::Done => return ControlFlow::Break(()),
        FrameEvent::Delta(content) => Fragment::Content(content),
        FrameEvent::Malformed(detail) => {
            debug!("unparseable stream frame: {}", detail);
            Fragment::Diagnostic("decoding error".to_string())
        }
    };
    if tx.send(fragment).await.is_err() {
        // Receiver dropped: the exchange was cancelled.
        return ControlFlow::Break(());
    }
    ControlFlow::Continue(())
}

fn single_diagnostic(message: &str) -> FragmentStream {
    Box::pin(futures::stream::iter(vec![Fragment::Diagnostic(message.to_string())]))
}
