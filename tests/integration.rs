use pretty_assertions::assert_eq;
use quiz_generator::{
    ai::{vertex::types::Part, MockGenerativeModel},
    app::{App, AppServices},
    client::{accumulator::PARSE_ERROR_MESSAGE, QuizClient, QuizStore, Status},
    credentials::CredentialReport,
    error::ProviderError,
    models::{Attachment, GenerationSettings, QuizForm},
};
use reqwest::multipart::{Form, Part as FormPart};
use std::sync::Arc;

const QUIZ_JSON: &str = r#"[{"id": 1, "question": "Which organelle produces ATP?", "description": "Cell biology", "options": {"a": "Nucleus", "b": "Mitochondrion", "c": "Ribosome", "d": "Vacuole"}, "answer": "b", "resources": [{"title": "Mitochondrion", "link": "https://en.wikipedia.org/wiki/Mitochondrion"}]}, {"id": 2, "question": "What does DNA stand for?", "options": {"a": "Deoxyribonucleic acid", "b": "Dinitrogen acid", "c": "Dual nucleic acid", "d": "Dense ribose acid"}, "answer": "a"}]"#;

/// Serve the router for `model` on an ephemeral port and return its base URL.
async fn spawn_server(model: MockGenerativeModel) -> String {
    spawn_server_with_limit(model, 20 * 1024 * 1024).await
}

async fn spawn_server_with_limit(model: MockGenerativeModel, max_upload_bytes: usize) -> String {
    let app = App::with_services(
        AppServices {
            model: Arc::new(model),
            settings: GenerationSettings::default(),
            credential_report: CredentialReport::inspect("AIzaSyTestKey123456"),
        },
        "127.0.0.1:0".to_string(),
        max_upload_bytes,
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn split_into_chunks(text: &str, pieces: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let size = chars.len().div_ceil(pieces);
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

#[tokio::test]
async fn test_missing_input_returns_400_without_provider_call() {
    let model = MockGenerativeModel::new().with_text_chunk("[]");
    let probe = model.clone();
    let base = spawn_server(model).await;

    let form = Form::new().text("difficulty", "Hard").text("notes", "   ");
    let response = reqwest::Client::new()
        .post(format!("{}/api/generate", base))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(
        response.text().await.unwrap(),
        "Please provide either a file or notes"
    );
    assert_eq!(probe.get_call_count(), 0);
}

#[tokio::test]
async fn test_permission_denied_maps_to_friendly_500() {
    let model = MockGenerativeModel::new().with_failure(ProviderError {
        http_status: 403,
        status: Some("PERMISSION_DENIED".to_string()),
        message: "Permission 'aiplatform.endpoints.predict' denied".to_string(),
    });
    let base = spawn_server(model).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/generate", base))
        .multipart(Form::new().text("notes", "Some notes"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(
        response.text().await.unwrap(),
        "Permission denied accessing Google Cloud project. Please check your API key and project configuration."
    );
}

#[tokio::test]
async fn test_quota_message_maps_to_quota_error() {
    let model = MockGenerativeModel::new().with_failure_message("Quota exceeded for aiplatform");
    let base = spawn_server(model).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/generate", base))
        .multipart(Form::new().text("notes", "Some notes"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(
        response.text().await.unwrap(),
        "API quota exceeded or rate limited. Please try again later."
    );
}

#[tokio::test]
async fn test_stream_relays_chunks_in_order_with_headers() {
    let chunks = split_into_chunks(&format!("```json\n{}\n```", QUIZ_JSON), 7);
    let model = chunks
        .iter()
        .fold(MockGenerativeModel::new(), |m, c| m.with_text_chunk(c.clone()));
    let base = spawn_server(model).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/generate", base))
        .multipart(Form::new().text("notes", "Cell biology notes"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
    assert_eq!(
        response.headers()["cache-control"].to_str().unwrap(),
        "no-cache"
    );
    assert_eq!(response.text().await.unwrap(), chunks.concat());
}

#[tokio::test]
async fn test_image_upload_builds_three_part_request() {
    let model = MockGenerativeModel::new().with_text_chunk(QUIZ_JSON);
    let probe = model.clone();
    let base = spawn_server(model).await;

    let form = QuizForm {
        files: vec![Attachment {
            file_name: "diagram.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            data: vec![0xFF, 0xD8, 0xFF].into(),
        }],
        quiz_count: Some(3),
        difficulty: Some("Hard".to_string()),
        ..Default::default()
    };
    let mut store = QuizStore::new();
    QuizClient::new(base).generate(&form, &mut store).await.unwrap();

    let requests = probe.get_requests();
    assert_eq!(requests.len(), 1);
    let parts = requests[0].parts();
    assert_eq!(parts.len(), 3);
    assert!(matches!(&parts[0], Part::Text { text } if text.contains("Hard")));
    match &parts[1] {
        Part::InlineData { inline_data } => {
            assert_eq!(inline_data.mime_type, "image/jpeg");
            assert_eq!(inline_data.data, "/9j/");
        }
        other => panic!("expected inline data, got {:?}", other),
    }
    assert!(matches!(&parts[2], Part::Text { text } if text.contains("Respond with 3 different questions")));
    assert_eq!(requests[0].safety_settings.len(), 4);
    assert_eq!(requests[0].generation_config.max_output_tokens, 8192);
}

#[tokio::test]
async fn test_octet_stream_upload_is_sniffed() {
    let model = MockGenerativeModel::new().with_text_chunk("[]");
    let probe = model.clone();
    let base = spawn_server(model).await;

    let file = FormPart::bytes(b"%PDF-1.4 lecture".to_vec())
        .file_name("lecture")
        .mime_str("application/octet-stream")
        .unwrap();
    let empty = FormPart::bytes(Vec::new()).file_name("empty.txt");
    let form = Form::new()
        .part("files", file)
        .part("files", empty)
        .text("quizCount", "not a number");

    let response = reqwest::Client::new()
        .post(format!("{}/api/generate", base))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let parts = probe.get_requests()[0].parts().to_vec();
    assert_eq!(parts.len(), 3);
    assert!(matches!(&parts[1], Part::InlineData { inline_data } if inline_data.mime_type == "application/pdf"));
    assert!(matches!(&parts[2], Part::Text { text } if text.contains("Respond with 5 different questions")));
}

#[tokio::test]
async fn test_fenced_and_bare_streams_parse_identically() {
    let fenced = spawn_server(
        MockGenerativeModel::new()
            .with_text_chunk("```json\n")
            .with_text_chunk(QUIZ_JSON)
            .with_text_chunk("\n```"),
    )
    .await;
    let bare = spawn_server(MockGenerativeModel::new().with_text_chunk(QUIZ_JSON)).await;

    let form = QuizForm {
        notes: Some("Cell biology".to_string()),
        ..Default::default()
    };

    let mut fenced_store = QuizStore::new();
    QuizClient::new(fenced)
        .generate(&form, &mut fenced_store)
        .await
        .unwrap();
    let mut bare_store = QuizStore::new();
    QuizClient::new(bare)
        .generate(&form, &mut bare_store)
        .await
        .unwrap();

    let quizzes = fenced_store.quizzes().unwrap();
    assert_eq!(quizzes.len(), 2);
    assert_eq!(quizzes, bare_store.quizzes().unwrap());
    assert_eq!(quizzes[0].resources.as_ref().unwrap().len(), 1);
    assert_eq!(quizzes[1].description, None);
}

#[tokio::test]
async fn test_malformed_stream_leaves_store_idle_with_parse_error() {
    let base = spawn_server(
        MockGenerativeModel::new()
            .with_text_chunk("[{\"id\": 1, \"question\": \"Unfinished")
            .with_text_chunk(" question"),
    )
    .await;

    let form = QuizForm {
        notes: Some("Notes".to_string()),
        ..Default::default()
    };
    let mut store = QuizStore::new();
    QuizClient::new(base).generate(&form, &mut store).await.unwrap();

    assert_eq!(store.status(), &Status::Idle);
    assert_eq!(store.error_message(), Some(PARSE_ERROR_MESSAGE));
}

#[tokio::test]
async fn test_mid_stream_failure_aborts_response() {
    let base = spawn_server(
        MockGenerativeModel::new()
            .with_text_chunk("[{\"id\": 1,")
            .with_mid_stream_failure("connection reset by peer"),
    )
    .await;

    let form = QuizForm {
        notes: Some("Notes".to_string()),
        ..Default::default()
    };
    let mut store = QuizStore::new();
    let result = QuizClient::new(base).generate(&form, &mut store).await;

    assert!(result.is_err());
    assert_eq!(store.status(), &Status::Idle);
    assert!(store
        .error_message()
        .unwrap()
        .starts_with("Error generating quizzes: "));
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let model = MockGenerativeModel::new().with_text_chunk("[]");
    let probe = model.clone();
    let base = spawn_server_with_limit(model, 1024).await;

    let file = FormPart::bytes(vec![b'a'; 4096]).file_name("big.txt");
    let response = reqwest::Client::new()
        .post(format!("{}/api/generate", base))
        .multipart(Form::new().part("files", file))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert_eq!(probe.get_call_count(), 0);
}

#[tokio::test]
async fn test_debug_reports_key_without_secret() {
    let base = spawn_server(MockGenerativeModel::new()).await;

    let body: serde_json::Value = reqwest::get(format!("{}/api/debug", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "API Key Check");
    assert_eq!(body["isBase64"], false);
    assert_eq!(body["keyType"], "API key");
    assert_eq!(body["keyFormat"], "Not JSON format");
    assert_eq!(body["keyPreview"], "AIzaSyTest...");
    assert!(!body.to_string().contains("AIzaSyTestKey123456"));
}

#[tokio::test]
async fn test_gemini_health_check_success_and_failure() {
    let model = MockGenerativeModel::new();
    let probe = model.clone();
    let base = spawn_server(model).await;

    let response = reqwest::get(format!("{}/api/test-gemini", base)).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["response"], "{\"greeting\": \"hello\"}");

    let request = &probe.get_requests()[0];
    assert_eq!(request.generation_config.max_output_tokens, 100);
    assert_eq!(request.safety_settings.len(), 1);
    assert!(matches!(&request.parts()[0], Part::Text { text } if text.contains("Say hello in JSON format")));

    let failing = spawn_server(MockGenerativeModel::new().with_failure_message("backend down")).await;
    let response = reqwest::get(format!("{}/api/test-gemini", failing)).await.unwrap();
    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains("backend down"));
}
