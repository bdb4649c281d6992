/*
 * Responsibility
 * - Application-wide AppError
 * - IntoResponse (HTTP status / WWW-Authenticate / JSON error body)
 * - Converts verification (AuthError) and authorization (Denied) failures uniformly
 * - Internal details are logged here and never sent to the client
 */
use std::collections::BTreeSet;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::{AuthError, Denied};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ErrorDetail>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Permission {
        required: BTreeSet<String>,
        actual: BTreeSet<String>,
    },
    Route {
        method: String,
        path: String,
    },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Forbidden(#[from] Denied),
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("request body too large")]
    PayloadTooLarge,
    #[error("no route for {method} {path}")]
    RouteNotFound { method: String, path: String },
    #[error("request timed out")]
    Timeout,
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }
}

// RFC 6750 section 3
fn www_authenticate(err: &AppError) -> Option<String> {
    match err {
        AppError::Auth(AuthError::MissingToken) => Some("Bearer".to_string()),
        AppError::Auth(AuthError::KeySourceUnavailable(_)) => None,
        AppError::Auth(e) => Some(format!(
            "Bearer error=\"invalid_token\", error_description=\"{}\"",
            e.code()
        )),
        AppError::Forbidden(denied) => Some(format!(
            "Bearer error=\"insufficient_scope\", scope=\"{}\"",
            denied.required.iter().cloned().collect::<Vec<_>>().join(" ")
        )),
        _ => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let challenge = www_authenticate(&self);

        let (status, code, message, detail) = match self {
            AppError::Auth(e) => {
                let status = match e {
                    AuthError::KeySourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::UNAUTHORIZED,
                };
                (status, e.code(), e.public_message(), None)
            }
            AppError::Forbidden(denied) => (
                StatusCode::FORBIDDEN,
                "InsufficientPermission",
                "insufficient permission".to_string(),
                Some(ErrorDetail::Permission {
                    required: denied.required,
                    actual: denied.actual,
                }),
            ),
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "InvalidRequest", message, None)
            }
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PayloadTooLarge",
                "request body too large".to_string(),
                None,
            ),
            AppError::RouteNotFound { method, path } => (
                StatusCode::NOT_FOUND,
                "RouteNotFound",
                format!("no route for {method} {path}"),
                Some(ErrorDetail::Route { method, path }),
            ),
            AppError::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                "RequestTimeout",
                "request timed out".to_string(),
                None,
            ),
            AppError::Internal(detail) => {
                tracing::error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalError",
                    "internal server error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message,
                detail,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(value) = challenge.and_then(|v| HeaderValue::from_str(&v).ok()) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }
}
