/*
 * Responsibility
 * - /api/resources handlers (demo data, nothing is persisted)
 * - Body via JsonBody → validate() → echo + identity
 */
use axum::{Json, extract::Path, http::StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    api::{
        dto::{
            identity::IdentityResponse,
            resources::{CreateResourceRequest, ResourceResponse, UpdateResourceRequest},
        },
        extractors::{AuthCtxExtractor, JsonBody},
    },
    error::AppError,
};

fn sample_resources() -> Vec<ResourceResponse> {
    [
        ("res-001", "Quarterly report", "Finance summary for Q3", "finance"),
        ("res-002", "Onboarding guide", "Checklist for new team members", "docs"),
        ("res-003", "Service map", "Dependencies between internal services", "platform"),
    ]
    .into_iter()
    .map(|(id, name, description, tag)| ResourceResponse {
        id: id.to_string(),
        name: name.to_string(),
        description: Some(description.to_string()),
        tags: vec![tag.to_string()],
        owner: "system".to_string(),
    })
    .collect()
}

pub async fn list_resources(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<Value> {
    let resources = sample_resources();
    Json(json!({
        "message": format!("{} resources available", resources.len()),
        "resources": resources,
        "user": IdentityResponse::from(&ctx),
    }))
}

pub async fn create_resource(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    JsonBody(req): JsonBody<CreateResourceRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let resource = ResourceResponse {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        description: req.description.clone(),
        tags: req.tags.clone(),
        owner: ctx.claims.sub.clone(),
    };
    tracing::info!(id = %resource.id, sub = %ctx.claims.sub, "resource created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "resource created",
            "resource": resource,
            "request": req,
            "user": IdentityResponse::from(&ctx),
        })),
    ))
}

pub async fn update_resource(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateResourceRequest>,
) -> Result<Json<Value>, AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let current = sample_resources().into_iter().find(|r| r.id == id);
    let name = match (req.name.as_deref(), current.as_ref()) {
        (Some(name), _) => name.trim().to_string(),
        (None, Some(existing)) => existing.name.clone(),
        // no sample to inherit from
        (None, None) => {
            return Err(AppError::bad_request(format!(
                "resource {id} does not exist, name is required"
            )));
        }
    };
    let resource = ResourceResponse {
        name,
        description: req
            .description
            .clone()
            .or_else(|| current.as_ref().and_then(|r| r.description.clone())),
        tags: current.map(|r| r.tags).unwrap_or_default(),
        owner: ctx.claims.sub.clone(),
        id,
    };
    tracing::info!(id = %resource.id, sub = %ctx.claims.sub, "resource updated");

    Ok(Json(json!({
        "message": format!("resource {} updated", resource.id),
        "resource": resource,
        "request": req,
        "user": IdentityResponse::from(&ctx),
    })))
}
