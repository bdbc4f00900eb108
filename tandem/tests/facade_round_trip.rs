use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tandem::{ClientConfig, FallbackChain, ProviderId, build_client, chat_orchestrator};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Answers one connection per canned response, in order, returning each request body.
async fn serve_sequence(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
    serve_paced(
        responses.into_iter().map(|response| vec![response]).collect(),
        Duration::ZERO,
    )
    .await
}

/// Like [`serve_sequence`], but writes each response in parts with `gap` between them.
async fn serve_paced(
    responses: Vec<Vec<String>>,
    gap: Duration,
) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let address = format!("http://{}", listener.local_addr().expect("local addr"));

    let handle = tokio::spawn(async move {
        let mut bodies = Vec::new();
        for parts in responses {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut received = Vec::new();
            let mut buffer = [0_u8; 4096];

            let body = loop {
                let read = socket.read(&mut buffer).await.expect("read request");
                received.extend_from_slice(&buffer[..read]);
                let text = String::from_utf8_lossy(&received).to_string();

                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    let body = &received[header_end + 4..];
                    if body.len() >= content_length {
                        break String::from_utf8_lossy(body).to_string();
                    }
                }

                if read == 0 {
                    break String::new();
                }
            };

            for (index, part) in parts.iter().enumerate() {
                if index > 0 {
                    tokio::time::sleep(gap).await;
                }
                if socket.write_all(part.as_bytes()).await.is_err() {
                    break;
                }
                let _ = socket.flush().await;
            }
            let _ = socket.shutdown().await;
            bodies.push(body);
        }
        bodies
    });

    (address, handle)
}

fn rate_limited_response() -> String {
    let body = "{\"type\":\"gemini_error_429\",\"message\":\"quota exhausted\",\"errorCode\":\"RESOURCE_EXHAUSTED\"}";
    format!(
        "HTTP/1.1 429 Too Many Requests\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}

const SSE_HEAD: &str =
    "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n";

fn sse_response(body: &str) -> String {
    format!("{SSE_HEAD}{body}")
}

fn groq_keys() -> Arc<HashMap<ProviderId, String>> {
    Arc::new(HashMap::from([(ProviderId::Groq, "gsk_test".to_string())]))
}

#[tokio::test]
async fn rate_limited_gemini_turn_is_answered_by_groq_over_http() {
    let (address, server) = serve_sequence(vec![
        rate_limited_response(),
        sse_response(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n\ndata: [DONE]\n\n",
        ),
    ])
    .await;

    let client = build_client(ClientConfig::new(address)).expect("client should build");
    let credentials = HashMap::from([
        (ProviderId::Gemini, "AIzaSy-test".to_string()),
        (ProviderId::Groq, "gsk_test".to_string()),
    ]);
    let chat = chat_orchestrator(&client, Arc::new(credentials), ProviderId::Gemini);

    let aborted = chat.send_message("hello").await.expect("send");

    assert!(!aborted);
    assert_eq!(chat.messages()[1].content, "Hello world");
    let info = chat.fallback_info().expect("fallback info");
    assert_eq!(info.from_provider, ProviderId::Gemini);
    assert_eq!(info.to_provider, ProviderId::Groq);
    assert_eq!(info.reason, "rate limit exceeded");
    assert_eq!(chat.selection().provider, ProviderId::Groq);

    let bodies = server.await.expect("server task");
    let first: serde_json::Value = serde_json::from_str(&bodies[0]).expect("first body");
    let second: serde_json::Value = serde_json::from_str(&bodies[1]).expect("second body");
    assert_eq!(first["provider"], "gemini");
    assert_eq!(first["apiKey"], "AIzaSy-test");
    assert!(first.get("allowFallback").is_none());
    assert_eq!(second["provider"], "groq");
    assert_eq!(second["model"], "llama-3.3-70b-versatile");
    assert_eq!(second["apiKey"], "gsk_test");
}

#[tokio::test]
async fn non_rate_limit_errors_surface_without_fallback() {
    let body = "{\"type\":\"invalid_api_key\",\"message\":\"key rejected\"}";
    let response = format!(
        "HTTP/1.1 401 Unauthorized\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    let (address, server) = serve_sequence(vec![response]).await;

    let client = build_client(
        ClientConfig::new(address).with_fallback_chain(FallbackChain::new(vec![
            ProviderId::Claude,
            ProviderId::Groq,
        ])),
    )
    .expect("client should build");
    let credentials = HashMap::from([
        (ProviderId::Claude, "sk-ant-test".to_string()),
        (ProviderId::Groq, "gsk_test".to_string()),
    ]);
    let chat = chat_orchestrator(&client, Arc::new(credentials), ProviderId::Claude);

    let error = chat.send_message("hello").await.expect_err("auth failure");

    assert_eq!(error.error_type(), Some("invalid_api_key"));
    assert_eq!(chat.messages().len(), 1);
    assert_eq!(server.await.expect("server task").len(), 1);
}

#[tokio::test]
async fn steady_streams_may_outlast_the_read_timeout() {
    let (address, _server) = serve_paced(
        vec![vec![
            SSE_HEAD.to_string(),
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n".to_string(),
            "data: {\"choices\":[{\"delta\":{\"content\":\" slow\"}}]}\n\n".to_string(),
            "data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n\n".to_string(),
            "data: [DONE]\n\n".to_string(),
        ]],
        Duration::from_millis(400),
    )
    .await;

    let client = build_client(
        ClientConfig::new(address).with_read_timeout(Duration::from_secs(1)),
    )
    .expect("client should build");
    let chat = chat_orchestrator(&client, groq_keys(), ProviderId::Groq);

    chat.send_message("take your time")
        .await
        .expect("a steady stream should complete");

    assert_eq!(chat.messages()[1].content, "Hello slow world");
}

#[tokio::test]
async fn stalled_streams_fail_once_the_read_timeout_passes() {
    let (address, _server) = serve_paced(
        vec![vec![
            format!(
                "{SSE_HEAD}data: {{\"choices\":[{{\"delta\":{{\"content\":\"Hello\"}}}}]}}\n\n"
            ),
            "data: [DONE]\n\n".to_string(),
        ]],
        Duration::from_secs(2),
    )
    .await;

    let client = build_client(
        ClientConfig::new(address).with_read_timeout(Duration::from_millis(300)),
    )
    .expect("client should build");
    let chat = chat_orchestrator(&client, groq_keys(), ProviderId::Groq);

    let error = chat.send_message("hello?").await.expect_err("stall");

    assert_eq!(
        error.provider_error.map(|error| error.kind),
        Some(tandem::ProviderErrorKind::Transport)
    );
    assert_eq!(chat.messages().len(), 1);
}
