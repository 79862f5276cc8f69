use std::time::Duration;

use futures::StreamExt;
use wiremock::matchers::{ method, path };
use wiremock::{ Mock, MockServer, ResponseTemplate };

use deepchat::llm::LlmConfig;
use deepchat::llm::chat::DeepSeekChatClient;
use deepchat::models::chat::{ ChatMessage, Fragment };

fn config(base_url: String, api_key: Option<&str>) -> LlmConfig {
    LlmConfig {
        api_key: api_key.map(str::to_string),
        model: "deepseek-chat".to_string(),
        base_url,
        max_tokens: 64,
        temperature: 0.7,
        request_timeout: Some(Duration::from_secs(5)),
        connect_timeout: Some(Duration::from_secs(5)),
    }
}

fn sse_body(frames: &[&str]) -> String {
    let mut body = String::new();
    for frame in frames {
        body.push_str("data: ");
        body.push_str(frame);
        body.push_str("\n\n");
    }
    body
}

async fn collect(client: &DeepSeekChatClient) -> Vec<Fragment> {
    client.stream_chat(&[ChatMessage::user("hi")]).collect().await
}

#[tokio::test]
async fn well_formed_stream_yields_each_fragment_in_order() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        r#"{"choices":[{"delta":{"content":"Hel"}}]}"#,
        r#"{"choices":[{"delta":{"content":"lo"}}]}"#,
        r#"{"choices":[{"delta":{"content":"!"}}]}"#,
        "[DONE]",
    ]);
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let client = DeepSeekChatClient::from_config(
        &config(format!("{}/v1/chat/completions", server.uri()), Some("test-key"))
    ).unwrap();

    let fragments = collect(&client).await;
    assert_eq!(fragments, vec![
        Fragment::Content("Hel".to_string()),
        Fragment::Content("lo".to_string()),
        Fragment::Content("!".to_string()),
    ]);
}

#[tokio::test]
async fn done_sentinel_truncates_later_frames() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        r#"{"choices":[{"delta":{"content":"kept"}}]}"#,
        "[DONE]",
        r#"{"choices":[{"delta":{"content":"dropped"}}]}"#,
    ]);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = DeepSeekChatClient::from_config(&config(server.uri(), Some("test-key"))).unwrap();
    assert_eq!(collect(&client).await, vec![Fragment::Content("kept".to_string())]);
}

#[tokio::test]
async fn malformed_frame_yields_diagnostic_and_streaming_continues() {
    let server = MockServer::start().await;
    let body = sse_body(&[
        r#"{"choices":[{"delta":{"content":"before"}}]}"#,
        "{not json",
        r#"{"choices":[{"delta":{"content":"after"}}]}"#,
        "[DONE]",
    ]);
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = DeepSeekChatClient::from_config(&config(server.uri(), Some("test-key"))).unwrap();
    let fragments = collect(&client).await;
    assert_eq!(fragments.len(), 3);
    assert_eq!(fragments[0], Fragment::Content("before".to_string()));
    assert!(matches!(&fragments[1], Fragment::Diagnostic(msg) if msg.contains("decoding error")));
    assert_eq!(fragments[2], Fragment::Content("after".to_string()));
}

#[tokio::test]
async fn missing_credential_yields_one_diagnostic_and_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = DeepSeekChatClient::from_config(&config(server.uri(), None)).unwrap();
    let fragments = collect(&client).await;
    assert_eq!(fragments.len(), 1);
    assert!(matches!(&fragments[0], Fragment::Diagnostic(msg) if msg.contains("API key")));

    // expect(0) above verifies no request reached the server.
    server.verify().await;
}

#[tokio::test]
async fn empty_credential_counts_as_missing() {
    let server = MockServer::start().await;
    let client = DeepSeekChatClient::from_config(&config(server.uri(), Some(""))).unwrap();
    let fragments = collect(&client).await;
    assert_eq!(fragments.len(), 1);
    assert!(matches!(&fragments[0], Fragment::Diagnostic(_)));
}

#[tokio::test]
async fn http_error_yields_status_and_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429).set_body_string(r#"{"error":{"message":"rate limited"}}"#)
        )
        .mount(&server)
        .await;

    let client = DeepSeekChatClient::from_config(&config(server.uri(), Some("test-key"))).unwrap();
    let fragments = collect(&client).await;
    assert_eq!(fragments.len(), 1);
    match &fragments[0] {
        Fragment::Diagnostic(msg) => {
            assert!(msg.contains("429"), "missing status in: {}", msg);
            assert!(msg.contains("rate limited"), "missing server message in: {}", msg);
        }
        other => panic!("expected a diagnostic, got {:?}", other),
    }
}

#[tokio::test]
async fn unparseable_error_body_falls_back_to_raw_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = DeepSeekChatClient::from_config(&config(server.uri(), Some("test-key"))).unwrap();
    let fragments = collect(&client).await;
    assert_eq!(fragments.len(), 1);
    match &fragments[0] {
        Fragment::Diagnostic(msg) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("upstream exploded"));
        }
        other => panic!("expected a diagnostic, got {:?}", other),
    }
}

#[tokio::test]
async fn connection_fault_yields_one_diagnostic() {
    // Nothing is listening on this port.
    let client = DeepSeekChatClient::from_config(
        &config("http://127.0.0.1:9".to_string(), Some("test-key"))
    ).unwrap();
    let fragments = collect(&client).await;
    assert_eq!(fragments.len(), 1);
    assert!(matches!(&fragments[0], Fragment::Diagnostic(msg) if msg.contains("Connection error")));
}
