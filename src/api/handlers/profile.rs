/*
 * Responsibility
 * - GET /api/profile: identity derived from the verified token
 * - PUT /api/profile: validated echo (no storage)
 */
use axum::Json;
use serde_json::{Value, json};

use crate::{
    api::{
        dto::{identity::IdentityResponse, profile::UpdateProfileRequest},
        extractors::{AuthCtxExtractor, JsonBody},
    },
    error::AppError,
};

pub async fn get_profile(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<Value> {
    Json(json!({
        "message": format!("profile of {}", ctx.claims.username()),
        "profile": IdentityResponse::from(&ctx),
    }))
}

pub async fn update_profile(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    req.validate().map_err(AppError::bad_request)?;

    tracing::info!(sub = %ctx.claims.sub, "profile updated");

    Ok(Json(json!({
        "message": "profile updated",
        "request": req,
        "profile": IdentityResponse::from(&ctx),
    })))
}
