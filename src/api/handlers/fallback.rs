/*
 * Responsibility
 * - 404 for unknown paths and for known paths with an unsupported method
 * - Runs before (and without) the access gate
 */
use axum::{extract::OriginalUri, http::Method};

use crate::error::AppError;

pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::RouteNotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
