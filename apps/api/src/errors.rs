use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::summarize::extract::ExtractError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every response body is `{"detail": ..., "code": ...}` with a short,
/// sanitized message. Provider and internal details only reach the log.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported media type")]
    UnsupportedMedia,

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Rate limited")]
    RateLimited,

    #[error("Provider credentials are not configured")]
    ProviderNotConfigured,

    #[error("Provider client is not initialized")]
    ProviderUninitialized,

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedMedia => AppError::UnsupportedMedia,
            other => AppError::Extraction(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", "Not found".to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnsupportedMedia => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                "Unsupported file type. Upload a .txt or .pdf file.".to_string(),
            ),
            AppError::Extraction(msg) => (StatusCode::BAD_REQUEST, "EXTRACTION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Unauthorized".to_string(),
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Rate limit exceeded. Please slow down.".to_string(),
            ),
            AppError::ProviderNotConfigured => (
                StatusCode::BAD_REQUEST,
                "PROVIDER_NOT_CONFIGURED",
                "Missing OPENAI_API_KEY. If using a local compatible server, set OPENAI_BASE_URL and a dummy key."
                    .to_string(),
            ),
            AppError::ProviderUninitialized => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PROVIDER_UNINITIALIZED",
                "Provider client not initialized. Check server configuration.".to_string(),
            ),
            AppError::Llm(err) => match err {
                LlmError::Auth { .. } => (
                    StatusCode::UNAUTHORIZED,
                    "PROVIDER_AUTH_ERROR",
                    "Model authentication failed. Check API key scopes/project.".to_string(),
                ),
                LlmError::Permission { .. } => (
                    StatusCode::FORBIDDEN,
                    "PROVIDER_PERMISSION_ERROR",
                    "Model access denied. Check your project's model permissions.".to_string(),
                ),
                LlmError::EmptyContent => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EMPTY_SUMMARY",
                    "The model returned an empty summary".to_string(),
                ),
                LlmError::Unavailable(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PROVIDER_UNAVAILABLE",
                    "Internal error".to_string(),
                ),
            },
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "detail": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
