//! Axum route handlers for the Summarization API.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
        Multipart, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::llm_client::dispatch;
use crate::models::summary::{SummarizeRequest, SummarizeResponse};
use crate::state::AppState;
use crate::summarize::extract::{extract_text, UploadedFile};
use crate::summarize::prompts::build_prompt;
use crate::summarize::validation::{parse_max_words, validate, ValidatedRequest, MAX_TEXT_CHARS};

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Optional parameters for `/summarize-file`, accepted as query parameters
/// or as multipart text fields (form fields win).
#[derive(Debug, Default, Deserialize)]
pub struct FileParams {
    pub max_words: Option<String>,
    pub language: Option<String>,
    pub tone: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /summarize
///
/// Summarizes JSON-submitted text.
pub async fn handle_summarize(
    State(state): State<AppState>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("rejected summarize body: {rejection}");
        AppError::Validation("Request body must be JSON with a string 'text' field".to_string())
    })?;

    let validated = validate(request)?;
    summarize_validated(&state, validated).await.map(Json)
}

/// POST /summarize-file
///
/// Extracts text from an uploaded `.txt` or `.pdf` and summarizes it.
pub async fn handle_summarize_file(
    State(state): State<AppState>,
    query: Result<Query<FileParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SummarizeResponse>, AppError> {
    let Query(mut params) =
        query.map_err(|_| AppError::Validation("Invalid query parameters".to_string()))?;
    let mut multipart = multipart
        .map_err(|_| AppError::Validation("Expected a multipart/form-data body".to_string()))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().map(String::from);
                let content_type = field.content_type().map(String::from);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload = Some(UploadedFile {
                    bytes,
                    filename,
                    content_type,
                });
            }
            "max_words" => params.max_words = Some(field.text().await.map_err(multipart_error)?),
            "language" => params.language = Some(field.text().await.map_err(multipart_error)?),
            "tone" => params.tone = Some(field.text().await.map_err(multipart_error)?),
            _ => debug!(field = %name, "ignoring unknown multipart field"),
        }
    }

    let upload =
        upload.ok_or_else(|| AppError::Validation("A 'file' field is required".to_string()))?;
    let max_words = parse_max_words(params.max_words.as_deref())?;

    let filename = upload.filename.clone().unwrap_or_default();
    let size = upload.bytes.len();
    let text = truncate_chars(extract_text(upload).await?, MAX_TEXT_CHARS);
    info!(%filename, size, chars = text.chars().count(), "extracted upload text");

    let validated = validate(SummarizeRequest {
        text,
        max_words: Some(i64::from(max_words)),
        language: params.language,
        tone: params.tone,
    })?;
    summarize_validated(&state, validated).await.map(Json)
}

// ────────────────────────────────────────────────────────────────────────────
// Shared pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Prompt construction and dispatch for an already-validated request.
async fn summarize_validated(
    state: &AppState,
    request: ValidatedRequest,
) -> Result<SummarizeResponse, AppError> {
    let completer = state
        .completer
        .as_deref()
        .ok_or(AppError::ProviderUninitialized)?;
    if state.config.provider_unconfigured() {
        return Err(AppError::ProviderNotConfigured);
    }

    let prompt = build_prompt(
        &request.text,
        request.max_words,
        request.language.as_deref(),
        request.tone.as_deref(),
    );
    let model = state.config.openai_model.as_str();
    let summary = dispatch(completer, model, &prompt, request.max_words).await?;

    let response = SummarizeResponse::new(summary, model);
    info!(
        input_chars = request.text.chars().count(),
        max_words = request.max_words,
        words = response.words,
        "summary generated"
    );
    Ok(response)
}

/// Cuts `text` to at most `max` characters on a character boundary.
fn truncate_chars(mut text: String, max: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max) {
        warn!(limit = max, "extracted text truncated");
        text.truncate(idx);
    }
    text
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Validation("Uploaded file is too large".to_string())
    } else {
        debug!("malformed multipart body: {err}");
        AppError::Validation("Malformed multipart body".to_string())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::access::rate_limit::RateLimiter;
    use crate::config::Config;
    use crate::llm_client::testing::StubCompleter;
    use crate::llm_client::LlmError;

    fn state_with(completer: Option<Arc<StubCompleter>>, config: Config) -> AppState {
        AppState {
            config: Arc::new(config),
            completer: completer.map(|c| c as Arc<dyn crate::llm_client::Completer>),
            limiter: RateLimiter::new(),
        }
    }

    fn validated(text: &str) -> ValidatedRequest {
        validate(SummarizeRequest {
            text: text.to_string(),
            max_words: Some(50),
            language: None,
            tone: None,
        })
        .unwrap()
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef".into(), 3), "abc");
        assert_eq!(truncate_chars("æøå".into(), 2), "æø");
        assert_eq!(truncate_chars("short".into(), 10), "short");
    }

    #[tokio::test]
    async fn test_uninitialized_client_is_rejected() {
        let state = state_with(None, Config::for_tests());
        let err = summarize_validated(&state, validated("text")).await.unwrap_err();
        assert!(matches!(err, AppError::ProviderUninitialized));
    }

    #[tokio::test]
    async fn test_missing_provider_credentials_never_dispatch() {
        let stub = Arc::new(StubCompleter::replying("summary"));
        let mut config = Config::for_tests();
        config.openai_api_key.clear();
        let state = state_with(Some(stub.clone()), config);

        let err = summarize_validated(&state, validated("text")).await.unwrap_err();
        assert!(matches!(err, AppError::ProviderNotConfigured));
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_response_reports_model_and_words() {
        let stub = Arc::new(StubCompleter::replying(" A fox jumped. "));
        let state = state_with(Some(stub.clone()), Config::for_tests());

        let response = summarize_validated(&state, validated("The quick brown fox."))
            .await
            .unwrap();
        assert_eq!(response.summary, "A fox jumped.");
        assert_eq!(response.words, 3);
        assert_eq!(response.model, "test-model");
        let user = stub.last_user.lock().unwrap().clone().unwrap();
        assert!(user.ends_with("The quick brown fox."));
    }

    #[tokio::test]
    async fn test_provider_errors_propagate_categorized() {
        let stub = Arc::new(StubCompleter::with(|| {
            Err(LlmError::Permission {
                message: "model not available".into(),
            })
        }));
        let state = state_with(Some(stub), Config::for_tests());
        let err = summarize_validated(&state, validated("text")).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(LlmError::Permission { .. })));
    }
}
