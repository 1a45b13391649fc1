//! OpenAI backend and note writer against a mock chat endpoint.

use paperloft_core::{Bookmark, Error, GenerationBackend, OpenAISettings, WorkSummary};
use paperloft_inference::openai::{OpenAIBackend, OpenAIConfig};
use paperloft_inference::{AiNoteMode, AiNoteStatus, NoteWriter};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-123",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

fn sample_bookmark() -> Bookmark {
    Bookmark::from_work(
        &WorkSummary {
            id: "W2".to_string(),
            title: "Deep Residual Learning for Image Recognition".to_string(),
            authors: "Kaiming He, Xiangyu Zhang".to_string(),
            year: Some(2016),
            publication_date: "2016-06-01".to_string(),
            doi: "10.1109/cvpr.2016.90".to_string(),
            cited_by_count: Some(1000),
            abstract_text: "Deeper neural networks are more difficult to train.".to_string(),
            source: "CVPR".to_string(),
            open_alex_url: "https://openalex.org/W2".to_string(),
        },
        0,
    )
}

#[tokio::test]
async fn test_generation_sends_settings_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-user"))
        .and(header("X-Title", "Paperloft"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o",
            "max_tokens": 200,
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response("Residual nets.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let settings = OpenAISettings {
        api_key: "sk-user".to_string(),
        model: "gpt-4o".to_string(),
        max_tokens: 200,
        ..Default::default()
    };
    let config = OpenAIConfig {
        base_url: mock_server.uri(),
        x_title: Some("Paperloft".to_string()),
        ..Default::default()
    }
    .with_settings(&settings);

    let backend = OpenAIBackend::new(config).expect("Failed to create backend");
    let text = backend.generate("Summarize.").await.unwrap();
    assert_eq!(text, "Residual nets.");
}

#[tokio::test]
async fn test_auth_failure_maps_to_config_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = OpenAIConfig {
        base_url: mock_server.uri(),
        api_key: Some("bad".to_string()),
        ..Default::default()
    };
    let backend = OpenAIBackend::new(config).unwrap();
    let err = backend.generate("hi").await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("Incorrect API key provided"));
}

#[tokio::test]
async fn test_note_writer_reports_failure_inline() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let writer = NoteWriter::new(OpenAIConfig {
        base_url: mock_server.uri(),
        ..Default::default()
    });
    let settings = OpenAISettings {
        api_key: "sk".to_string(),
        ..Default::default()
    };

    let note = writer
        .write(&settings, AiNoteMode::FindingsSummary, &sample_bookmark(), None)
        .await;

    match note.status {
        AiNoteStatus::Error { message } => assert!(message.contains("Unknown error")),
        other => panic!("expected error status, got {:?}", other),
    }
}

#[tokio::test]
async fn test_note_writer_fills_ai_abstract() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_response("Training very deep networks.")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let writer = NoteWriter::new(OpenAIConfig {
        base_url: mock_server.uri(),
        ..Default::default()
    });
    let settings = OpenAISettings {
        api_key: "sk".to_string(),
        ..Default::default()
    };

    let mut bookmark = sample_bookmark();
    let note = writer
        .write(&settings, AiNoteMode::RewriteAbstract, &bookmark, Some("Be brief."))
        .await;
    assert_eq!(note.status, AiNoteStatus::Ok);

    note.apply_to(&mut bookmark);
    assert_eq!(bookmark.ai_abstract, "Training very deep networks.");
    assert!(bookmark.ai_abstract_generated);
}
