/*
 * Responsibility
 * - GET /api/token-info: everything the gate learned about the token
 */
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::{api::extractors::AuthCtxExtractor, state::AppState};

fn rfc3339(ts: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(ts, 0).map(|t| t.to_rfc3339())
}

pub async fn token_info(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Json<Value> {
    let claims = &ctx.claims;
    let expires_in = claims.exp - Utc::now().timestamp();

    Json(json!({
        "message": "token is valid",
        "strategy": state.strategy.name(),
        "granted": ctx.granted,
        "claims": claims.as_ref(),
        "issued_at": claims.iat.and_then(rfc3339),
        "expires_at": rfc3339(claims.exp),
        "expires_in_seconds": expires_in.max(0),
    }))
}
