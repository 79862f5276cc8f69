use serde::Deserialize;

/// Outcome of decoding one line of the server-sent-event stream.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameEvent {
    /// Blank line, comment, or a non-`data:` field. Nothing to emit.
    Ignored,
    /// The `[DONE]` sentinel. The sequence ends here even if the transport
    /// still has frames queued behind it.
    Done,
    /// Incremental assistant text. Empty when the frame carried no content
    /// at any structural level.
    Delta(String),
    /// The payload was not valid JSON; carries the parse error description.
    Malformed(String),
}

#[derive(Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize, Default)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

/// Decode one complete line of the chat-completion event stream.
///
/// Every absent level of the payload (`choices`, `delta`, `content`) falls
/// back to empty text rather than an error.
pub fn decode_frame(line: &str) -> FrameEvent {
    let line = line.trim_end_matches('\r');
    if line.is_empty() {
        return FrameEvent::Ignored;
    }
    let payload = match line.strip_prefix("data:") {
        Some(rest) => rest.trim(),
        None => return FrameEvent::Ignored,
    };
    if payload == "[DONE]" {
        return FrameEvent::Done;
    }
    match serde_json::from_str::<StreamResponse>(payload) {
        Ok(response) => {
            let content = response.choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .unwrap_or_default();
            FrameEvent::Delta(content)
        }
        Err(e) => FrameEvent::Malformed(e.to_string()),
    }
}

/// Reassembles complete lines from network chunks. SSE frames are not
/// aligned to chunk boundaries, so a partial trailing line is carried over
/// until the next chunk (or `flush`) completes it.
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Feed one chunk of bytes; returns every line completed by it.
    ///
    /// Bytes stay buffered until their newline arrives and only complete
    /// lines are decoded, so a multi-byte character split across chunks
    /// comes out intact.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Drain the unterminated remainder after the transport closes.
    pub fn flush(&mut self) -> Option<String> {
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        if line.trim().is_empty() {
            return None;
        }
        Some(line)
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
