use aozora_client_lib::api::ApiClient;
use aozora_client_lib::cli::{chat_loop, run_ask, run_upload};
use aozora_client_lib::config::ClientConfig;
use aozora_client_lib::session::chat::CHAT_ERROR_MESSAGE;
use aozora_client_lib::session::ConversationSession;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig {
        base_url: server.uri(),
        ..Default::default()
    }
}

async fn slow_answer(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/chat/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "responses": [{ "question": "What is X?", "answer": "X is Y." }]
                }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

// =============================================================================
// Interactive chat
// =============================================================================

#[tokio::test]
async fn test_line_typed_while_answering_is_ignored() {
    let server = MockServer::start().await;
    slow_answer(&server, 1).await;

    let config = config_for(&server);
    let client = ApiClient::new(&config).unwrap();
    let mut session = ConversationSession::new(&config);
    let mut out = Vec::new();

    chat_loop(&mut session, client, &b"What is X?\nsecond\n"[..], &mut out)
        .await
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Thinking..."));
    assert!(text.contains("(still answering the previous question)"));
    assert_eq!(text.matches("assistant> X is Y.").count(), 1);

    let entries = session.transcript().entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].content(), "What is X?");
    assert_eq!(entries[2].content(), "X is Y.");
    assert!(!session.is_in_flight());
}

#[tokio::test]
async fn test_end_of_input_waits_for_pending_answer() {
    let server = MockServer::start().await;
    slow_answer(&server, 1).await;

    let config = config_for(&server);
    let client = ApiClient::new(&config).unwrap();
    let mut session = ConversationSession::new(&config);
    let mut out = Vec::new();

    chat_loop(&mut session, client, &b"What is X?"[..], &mut out)
        .await
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.ends_with("assistant> X is Y.\n"));
    assert_eq!(session.transcript().len(), 3);
}

#[tokio::test]
async fn test_quit_sends_nothing() {
    let server = MockServer::start().await;
    slow_answer(&server, 0).await;

    let config = config_for(&server);
    let client = ApiClient::new(&config).unwrap();
    let mut session = ConversationSession::new(&config);
    let mut out = Vec::new();

    chat_loop(&mut session, client, &b"/quit\nWhat is X?\n"[..], &mut out)
        .await
        .unwrap();

    // greeting only
    assert_eq!(session.transcript().len(), 1);
}

#[tokio::test]
async fn test_failed_answer_prints_canned_reply_and_alert() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = ApiClient::new(&config).unwrap();
    let mut session = ConversationSession::new(&config);
    let mut out = Vec::new();

    chat_loop(&mut session, client, &b"q\n"[..], &mut out)
        .await
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(CHAT_ERROR_MESSAGE));
    assert!(text.contains("Connection Error"));
    assert!(!session.is_in_flight());
}

// =============================================================================
// One-shot commands
// =============================================================================

#[tokio::test]
async fn test_ask_reports_failure_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = ApiClient::new(&config).unwrap();
    let mut out = Vec::new();

    let ok = run_ask(&config, &client, "q", &mut out).await.unwrap();
    assert!(!ok);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(CHAT_ERROR_MESSAGE));
}

#[tokio::test]
async fn test_ask_prints_answer() {
    let server = MockServer::start().await;
    slow_answer(&server, 1).await;

    let config = config_for(&server);
    let client = ApiClient::new(&config).unwrap();
    let mut out = Vec::new();

    let ok = run_ask(&config, &client, "What is X?", &mut out).await.unwrap();
    assert!(ok);
    assert_eq!(String::from_utf8(out).unwrap(), "assistant> X is Y.\n");
}

#[tokio::test]
async fn test_ask_blank_question_sends_nothing() {
    let server = MockServer::start().await;
    slow_answer(&server, 0).await;

    let config = config_for(&server);
    let client = ApiClient::new(&config).unwrap();
    let mut out = Vec::new();

    let ok = run_ask(&config, &client, "   ", &mut out).await.unwrap();
    assert!(!ok);
    assert!(String::from_utf8(out).unwrap().contains("[warning]"));
}

#[tokio::test]
async fn test_upload_reports_failure_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("guide.md");
    std::fs::write(&file, "# Guide").unwrap();

    let client = ApiClient::new(&config_for(&server)).unwrap();
    let mut out = Vec::new();

    let ok = run_upload(&client, &file, "Guide", &mut out).await.unwrap();
    assert!(!ok);
    assert!(String::from_utf8(out).unwrap().contains("Upload Failed"));
}

#[tokio::test]
async fn test_upload_prints_processed_pages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "processed_pages": 12 })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("guide.md");
    std::fs::write(&file, "# Guide").unwrap();

    let client = ApiClient::new(&config_for(&server)).unwrap();
    let mut out = Vec::new();

    let ok = run_upload(&client, &file, "Guide", &mut out).await.unwrap();
    assert!(ok);
    assert!(String::from_utf8(out).unwrap().contains("12"));
}

#[tokio::test]
async fn test_upload_missing_file_is_error() {
    let server = MockServer::start().await;
    let client = ApiClient::new(&config_for(&server)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut out = Vec::new();

    let result = run_upload(&client, &dir.path().join("nope.pdf"), "t", &mut out).await;
    assert!(result.is_err());
}
