pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    handler::Handler,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::access::rate_limit::{
    enforce_rate_limit, RateLimit, RouteLimit, DEFAULT_LIMIT, HEALTH_LIMIT, SUMMARIZE_FILE_LIMIT,
    SUMMARIZE_LIMIT,
};
use crate::access::{require_api_key, API_KEY_HEADER};
use crate::config::Config;
use crate::errors::AppError;
use crate::state::AppState;
use crate::summarize::handlers;

async fn not_found() -> AppError {
    AppError::NotFound
}

pub fn build_router(state: AppState) -> Router {
    let limiter = state.limiter.clone();
    let limited = |route: &'static str, limit: RateLimit| {
        middleware::from_fn_with_state(
            RouteLimit {
                limiter: limiter.clone(),
                route,
                limit,
            },
            enforce_rate_limit,
        )
    };
    let authenticated = || middleware::from_fn_with_state(state.clone(), require_api_key);
    let cors = cors_layer(&state.config);
    let max_upload_bytes = state.config.max_upload_bytes;

    // Layers added last run first: authentication precedes rate limiting.
    Router::new()
        .route(
            "/health",
            get(health::health_handler).layer(limited("/health", HEALTH_LIMIT)),
        )
        .route(
            "/summarize",
            post(handlers::handle_summarize)
                .layer(limited("/summarize", SUMMARIZE_LIMIT))
                .layer(authenticated()),
        )
        .route(
            "/summarize-file",
            post(handlers::handle_summarize_file)
                .layer(DefaultBodyLimit::max(max_upload_bytes))
                .layer(limited("/summarize-file", SUMMARIZE_FILE_LIMIT))
                .layer(authenticated()),
        )
        .fallback(not_found.layer(limited("*", DEFAULT_LIMIT)))
        .layer(cors)
        .with_state(state)
}

/// Only allowlisted origins may call with credentials; methods and headers
/// are restricted to what the API uses.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(API_KEY_HEADER),
        ])
}
