use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Liveness check. Unauthenticated, but rate-limited per address.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
