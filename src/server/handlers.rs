use super::form::read_quiz_form;
use super::AppState;
use crate::ai::vertex::types::{Content, GenerationConfig, Part, SafetySetting};
use crate::ai::GenerateContentRequest;
use crate::assembler::assemble;
use crate::classify::ErrorClass;
use crate::models::HarmCategory;
use crate::relay::relay;
use crate::{prompts, Error};
use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

const HEALTH_CHECK_MAX_TOKENS: u32 = 100;
const NO_RESPONSE_TEXT: &str = "No response text";

/// `POST /api/generate`: assemble the request, call the model, and relay
/// the generated text as it arrives.
pub async fn generate(State(state): State<AppState>, multipart: Multipart) -> Response {
    let request_id = Uuid::new_v4();

    let form = match read_quiz_form(multipart).await {
        Ok(form) => form,
        Err(e) => {
            warn!("[{}] Rejecting malformed form: {}", request_id, e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let request = match assemble(&form) {
        Ok(request) => request,
        Err(Error::MissingInput) => {
            info!("[{}] Rejecting form with neither files nor notes", request_id);
            return (StatusCode::BAD_REQUEST, Error::MissingInput.to_string()).into_response();
        }
        Err(e) => return failure(request_id, &e),
    };

    info!(
        "[{}] Generating {} {} quizzes from {} ({} parts)",
        request_id,
        form.quiz_count(),
        form.difficulty(),
        if form.files.is_empty() { "notes" } else { "files" },
        request.content.len() + 2
    );

    let wire = request.into_wire(&state.settings);
    match state.model.stream_generate_content(&wire).await {
        Ok(upstream) => {
            let mut response = Response::new(Body::from_stream(relay(upstream)));
            let headers = response.headers_mut();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
            response
        }
        Err(e) => failure(request_id, &e),
    }
}

fn failure(request_id: Uuid, err: &Error) -> Response {
    let class = ErrorClass::of(err);
    error!("[{}] Generation failed ({:?}): {}", request_id, class, err);
    (StatusCode::INTERNAL_SERVER_ERROR, class.user_message()).into_response()
}

/// `GET /api/debug`: describe the configured credential without revealing it.
pub async fn debug(State(state): State<AppState>) -> Response {
    info!(
        "Credential check: type={}, base64={}",
        state.credential_report.key_type, state.credential_report.is_base64
    );
    Json(state.credential_report.as_ref().clone()).into_response()
}

/// `GET /api/test-gemini`: one small unary call to prove the model answers.
pub async fn test_gemini(State(state): State<AppState>) -> Response {
    let request = GenerateContentRequest {
        contents: vec![Content::user(vec![Part::text(prompts::HEALTH_CHECK)])],
        generation_config: GenerationConfig {
            max_output_tokens: HEALTH_CHECK_MAX_TOKENS,
            temperature: state.settings.temperature,
            top_p: state.settings.top_p,
        },
        safety_settings: vec![SafetySetting {
            category: HarmCategory::HarmCategoryHateSpeech,
            threshold: state.settings.safety.hate_speech,
        }],
    };

    match state.model.generate_content(&request).await {
        Ok(response) => {
            info!("Model health check succeeded");
            Json(json!({
                "status": "success",
                "message": "Gemini API test successful",
                "response": response.first_text().unwrap_or(NO_RESPONSE_TEXT),
            }))
            .into_response()
        }
        Err(e) => {
            error!("Model health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": "Error testing Gemini API",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
