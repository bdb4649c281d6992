/*
 * Responsibility
 * - GET /health (liveness, no auth)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "message": "service is running",
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}
